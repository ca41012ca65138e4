use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::oneshot;
use xlate_types::{RequestId, TranslateResultPayload};

/// One-shot reply subscriptions keyed by request id
#[derive(Default)]
pub(crate) struct Listeners {
    pending: Mutex<HashMap<RequestId, oneshot::Sender<TranslateResultPayload>>>,
}

impl Listeners {
    pub(crate) fn register(&self, request_id: RequestId) -> oneshot::Receiver<TranslateResultPayload> {
        let (tx, rx) = oneshot::channel();
        self.lock().insert(request_id, tx);
        rx
    }

    pub(crate) fn remove(&self, request_id: RequestId) {
        self.lock().remove(&request_id);
    }

    /// Hands the reply to its listener, which is unregistered in the same step.
    /// Returns false when nobody is waiting for it.
    pub(crate) fn resolve(&self, payload: TranslateResultPayload) -> bool {
        let Some(tx) = self.lock().remove(&payload.request_id) else {
            return false;
        };
        tx.send(payload).is_ok()
    }

    /// Drops every subscription, waking their callers with a closed channel
    pub(crate) fn clear(&self) {
        self.lock().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RequestId, oneshot::Sender<TranslateResultPayload>>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
