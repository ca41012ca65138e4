use std::sync::Arc;

use kanal::AsyncReceiver;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use xlate_router::{Background, TabHub, event_loop};
use xlate_types::Envelope;

use crate::local::selection_loop;
use crate::state::AppState;

/// Queued messages from all tabs towards the dispatcher
const INBOUND_CAPACITY: usize = 256;

/// Application controller for task spawning and lifecycle
pub struct AppController {
    state: Arc<AppState>,
    hub: Arc<TabHub>,
    inbound: AsyncReceiver<Envelope>,
    cancel_token: CancellationToken,
}

impl AppController {
    pub fn new(state: Arc<AppState>) -> Self {
        let (hub, inbound) = TabHub::new(INBOUND_CAPACITY);
        Self {
            state,
            hub: Arc::new(hub),
            inbound,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn hub(&self) -> &Arc<TabHub> {
        &self.hub
    }

    pub async fn spawn_tasks(&self) -> anyhow::Result<JoinSet<anyhow::Result<()>>> {
        let (listen_to_ws, ws_addr, watch_clipboard) = {
            let config = self.state.config.read().await;
            (
                config.network.listen_to_ws,
                config.network.ws_addr.clone(),
                config.watch_clipboard,
            )
        };

        let mut tasks = JoinSet::new();

        // Privileged-side dispatcher
        let background = Arc::new(Background::new(
            self.state.registry.clone(),
            self.state.tts.clone(),
            self.hub.clone(),
        ));
        tasks.spawn(event_loop(
            background,
            self.inbound.clone(),
            self.cancel_token.child_token(),
        ));

        // Content scripts
        if listen_to_ws {
            let listener = TcpListener::bind(&ws_addr).await?;
            tasks.spawn(xlate_io::ws::serve_tabs(
                listener,
                self.hub.clone(),
                self.cancel_token.child_token(),
            ));
        }

        // Clipboard as a local tab
        if watch_clipboard {
            tasks.spawn(selection_loop(
                self.state.clone(),
                self.hub.clone(),
                self.cancel_token.child_token(),
            ));
        }

        Ok(tasks)
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
