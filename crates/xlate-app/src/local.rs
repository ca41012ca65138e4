use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use xlate_router::{ContentClient, ContentSession, PopupState, TabHub, TranslateParams};

use crate::state::AppState;

/// Translate clipboard selections through a local tab and log the popup
pub async fn selection_loop(
    state: Arc<AppState>,
    hub: Arc<TabHub>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let (settings, interval, response_timeout) = {
        let config = state.config.read().await;
        (
            config.translator.clone(),
            Duration::from_millis(config.clipboard_interval_ms),
            config.network.response_timeout(),
        )
    };

    let client = ContentClient::new(hub.connect(), response_timeout);
    let tab_id = client.tab_id();
    let session = ContentSession::new(client, state.registry.clone(), settings)
        .with_history(state.history.clone());

    tracing::info!(%tab_id, "Starting clipboard watcher");

    let (text_tx, text_rx) = kanal::bounded_async::<String>(16);
    let watcher = tokio::spawn(xlate_io::clipboard::watch_selection(
        interval,
        cancel.clone(),
        move |text| {
            let tx = text_tx.clone();
            tokio::spawn(async move {
                if let Err(e) = tx.send(text).await {
                    tracing::error!("Failed to send clipboard text: {}", e);
                }
            });
        },
    ));

    loop {
        let received = tokio::select! {
            _ = cancel.cancelled() => break,
            received = text_rx.recv() => received,
        };

        let Ok(text) = received else {
            match watcher.await {
                Ok(Err(e)) => tracing::error!("Clipboard watcher error: {e}"),
                Ok(Ok(())) => {}
                Err(e) => tracing::error!("Clipboard watcher panicked: {e}"),
            }
            cancel.cancelled().await;
            hub.disconnect(tab_id);
            return Ok(());
        };

        session.set_selection(&text);
        if let Err(e) = session.translate(TranslateParams::default()).await {
            tracing::warn!("translation not delivered: {e}");
            continue;
        }
        report(&session.state());
    }

    tracing::info!("Clipboard watcher stopping");
    watcher.abort();
    hub.disconnect(tab_id);
    Ok(())
}

fn report(state: &PopupState) {
    if let Some(error) = &state.error {
        tracing::warn!(
            status = error.status_code,
            url = %error.request_url,
            "translation failed: {}",
            error.status_text
        );
    } else if let Some(result) = &state.translation {
        tracing::info!(
            vendor = %result.vendor_id,
            from = %result.source_lang,
            to = %result.target_lang,
            detected = ?result.detected_lang,
            "{}",
            result.translation
        );
    }
}
