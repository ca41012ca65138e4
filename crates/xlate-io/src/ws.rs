use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use xlate_router::{TabHub, TabPort};
use xlate_types::Message;

/// Accept content scripts over WebSocket; every connection becomes a tab.
///
/// Frames are JSON `Message`s in and `TabMessage`s out.
pub async fn serve_tabs(
    listener: TcpListener,
    hub: Arc<TabHub>,
    cancel: CancellationToken,
) -> Result<(), anyhow::Error> {
    tracing::info!("WebSocket bridge listening on {}", listener.local_addr()?);

    loop {
        let (stream, peer) = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("WebSocket bridge stopping");
                return Ok(());
            }
            accepted = listener.accept() => accepted?,
        };

        let hub = hub.clone();
        let cancel = cancel.child_token();
        tokio::spawn(async move {
            let port = hub.connect();
            let tab_id = port.tab_id();
            tracing::info!(%tab_id, %peer, "tab attached");

            if let Err(e) = bridge(stream, &port, cancel).await {
                tracing::warn!(%tab_id, "tab connection failed: {e}");
            }

            hub.disconnect(tab_id);
            tracing::info!(%tab_id, "tab detached");
        });
    }
}

async fn bridge(stream: TcpStream, port: &TabPort, cancel: CancellationToken) -> Result<(), anyhow::Error> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                write.send(WsMessage::Close(None)).await?;
                return Ok(());
            }
            frame = read.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => match serde_json::from_str::<Message>(text.as_str()) {
                    Ok(message) => port.send(message).await?,
                    Err(e) => tracing::warn!(tab = %port.tab_id(), "ignoring malformed message: {e}"),
                },
                Some(Ok(WsMessage::Close(_))) | None => return Ok(()),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            },
            reply = port.recv() => {
                let json = serde_json::to_string(&reply?)?;
                write.send(WsMessage::Text(json.into())).await?;
            }
        }
    }
}
