use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use kanal::{AsyncReceiver, AsyncSender};
use xlate_types::{Envelope, Message, TabId, TabMessage};

/// Per-tab buffer for replies that have not been read yet
const TAB_CAPACITY: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("{0} is not connected")]
    NotConnected(TabId),

    #[error("channel closed")]
    Closed,
}

/// Messaging between the privileged context and the connected tabs.
///
/// Every tab shares one inbound queue towards the dispatcher and gets its own
/// addressed reply channel.
pub struct TabHub {
    inbound: AsyncSender<Envelope>,
    tabs: Mutex<HashMap<TabId, AsyncSender<TabMessage>>>,
    next_tab: AtomicU64,
}

impl TabHub {
    /// The receiver is what the dispatcher loop reads
    pub fn new(capacity: usize) -> (Self, AsyncReceiver<Envelope>) {
        let (inbound, inbound_rx) = kanal::bounded_async(capacity);
        let hub = Self {
            inbound,
            tabs: Mutex::new(HashMap::new()),
            next_tab: AtomicU64::new(1),
        };
        (hub, inbound_rx)
    }

    pub fn connect(&self) -> TabPort {
        let tab_id = TabId(self.next_tab.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = kanal::bounded_async(TAB_CAPACITY);

        self.lock_tabs().insert(tab_id, tx);
        tracing::debug!(%tab_id, "tab connected");

        TabPort {
            tab_id,
            outbound: self.inbound.clone(),
            inbox: rx,
        }
    }

    /// Pending `recv` calls on the tab's port fail once it is gone
    pub fn disconnect(&self, tab_id: TabId) {
        if self.lock_tabs().remove(&tab_id).is_some() {
            tracing::debug!(%tab_id, "tab disconnected");
        }
    }

    pub fn is_connected(&self, tab_id: TabId) -> bool {
        self.lock_tabs().contains_key(&tab_id)
    }

    pub fn tab_count(&self) -> usize {
        self.lock_tabs().len()
    }

    pub async fn send_to_tab(&self, tab_id: TabId, message: TabMessage) -> Result<(), HubError> {
        let tx = self
            .lock_tabs()
            .get(&tab_id)
            .cloned()
            .ok_or(HubError::NotConnected(tab_id))?;

        if tx.send(message).await.is_err() {
            // port dropped without disconnecting
            self.disconnect(tab_id);
            return Err(HubError::Closed);
        }
        Ok(())
    }

    fn lock_tabs(&self) -> std::sync::MutexGuard<'_, HashMap<TabId, AsyncSender<TabMessage>>> {
        self.tabs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One tab's end of the hub
#[derive(Clone)]
pub struct TabPort {
    tab_id: TabId,
    outbound: AsyncSender<Envelope>,
    inbox: AsyncReceiver<TabMessage>,
}

impl TabPort {
    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    pub async fn send(&self, message: Message) -> Result<(), HubError> {
        self.outbound
            .send(Envelope {
                tab_id: self.tab_id,
                message,
            })
            .await
            .map_err(|_| HubError::Closed)
    }

    pub async fn recv(&self) -> Result<TabMessage, HubError> {
        self.inbox.recv().await.map_err(|_| HubError::Closed)
    }
}
