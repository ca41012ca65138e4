use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use xlate_types::{
    Message, PlayTextToSpeechPayload, RequestId, TabId, TabMessage, TranslatePayload,
    TranslationError, TranslationRequest, TranslationResult,
};

use crate::hub::TabPort;
use crate::listeners::Listeners;

/// How one translate call ended from the caller's point of view
#[derive(Debug, Clone, PartialEq)]
pub enum TranslateOutcome {
    Resolved(TranslationResult),
    Rejected(TranslationError),
    /// A newer request replaced this one before its reply arrived
    Superseded,
}

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("privileged context is unreachable")]
    ChannelClosed,

    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

/// Content-side end of the request router.
///
/// Requests go out over the tab's port; a background task routes replies to
/// the call that issued them by request id. Only the latest request (the
/// "last params") may update the caller, older replies come back as
/// [`TranslateOutcome::Superseded`].
pub struct ContentClient {
    port: TabPort,
    listeners: Arc<Listeners>,
    last_params: Mutex<Option<TranslationRequest>>,
    response_timeout: Option<Duration>,
    dispatcher: JoinHandle<()>,
}

impl ContentClient {
    /// Must be called inside a tokio runtime
    pub fn new(port: TabPort, response_timeout: Option<Duration>) -> Self {
        let listeners = Arc::new(Listeners::default());
        let dispatcher = tokio::spawn(dispatch_replies(port.clone(), listeners.clone()));

        Self {
            port,
            listeners,
            last_params: Mutex::new(None),
            response_timeout,
            dispatcher,
        }
    }

    pub fn tab_id(&self) -> TabId {
        self.port.tab_id()
    }

    pub fn last_params(&self) -> Option<TranslationRequest> {
        self.lock_last_params().clone()
    }

    /// Forget the last params; replies still in flight become superseded
    pub fn reset(&self) {
        *self.lock_last_params() = None;
    }

    pub async fn translate(&self, request: TranslationRequest) -> Result<TranslateOutcome, RouterError> {
        let request_id = RequestId::new();
        *self.lock_last_params() = Some(request.clone());

        let reply = self.listeners.register(request_id);
        tracing::debug!(tab = %self.tab_id(), %request_id, vendor = %request.vendor_id, "translate requested");

        let message = Message::TranslateText(TranslatePayload {
            request_id,
            request: request.clone(),
        });
        if self.port.send(message).await.is_err() {
            self.listeners.remove(request_id);
            return Err(RouterError::ChannelClosed);
        }

        let payload = match self.response_timeout {
            Some(limit) => match tokio::time::timeout(limit, reply).await {
                Ok(received) => received,
                Err(_) => {
                    self.listeners.remove(request_id);
                    tracing::warn!(%request_id, "no reply within {limit:?}");
                    return Err(RouterError::Timeout(limit));
                }
            },
            None => reply.await,
        }
        .map_err(|_| RouterError::ChannelClosed)?;

        if self.lock_last_params().as_ref() != Some(&request) {
            tracing::debug!(%request_id, "stale reply dropped");
            return Ok(TranslateOutcome::Superseded);
        }

        Ok(match payload.into_result() {
            Ok(result) => TranslateOutcome::Resolved(result),
            Err(err) => TranslateOutcome::Rejected(err),
        })
    }

    pub async fn play_text_to_speech(&self, payload: PlayTextToSpeechPayload) -> Result<(), RouterError> {
        self.port
            .send(Message::PlayTextToSpeech(payload))
            .await
            .map_err(|_| RouterError::ChannelClosed)
    }

    pub async fn stop_tts_playing(&self) -> Result<(), RouterError> {
        self.port
            .send(Message::StopTtsPlaying)
            .await
            .map_err(|_| RouterError::ChannelClosed)
    }

    fn lock_last_params(&self) -> std::sync::MutexGuard<'_, Option<TranslationRequest>> {
        self.last_params.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ContentClient {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

async fn dispatch_replies(port: TabPort, listeners: Arc<Listeners>) {
    while let Ok(message) = port.recv().await {
        match message {
            TabMessage::TranslateText(payload) => {
                let request_id = payload.request_id;
                if !listeners.resolve(payload) {
                    tracing::debug!(%request_id, "reply without a listener");
                }
            }
        }
    }

    tracing::debug!(tab = %port.tab_id(), "tab channel closed");
    listeners.clear();
}

#[cfg(test)]
mod tests {
    use kanal::AsyncReceiver;
    use tokio::time::timeout;
    use xlate_types::{Envelope, TranslateResultPayload};

    use super::*;
    use crate::hub::TabHub;

    const WAIT: Duration = Duration::from_secs(2);

    async fn next_request(inbound: &AsyncReceiver<Envelope>) -> (TabId, TranslatePayload) {
        let envelope = timeout(WAIT, inbound.recv()).await.unwrap().unwrap();
        match envelope.message {
            Message::TranslateText(payload) => (envelope.tab_id, payload),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    fn answer(payload: &TranslatePayload, translation: &str) -> TabMessage {
        let result = TranslationResult {
            original_text: payload.request.text.clone(),
            ..TranslationResult::from_translation(translation)
        };
        TabMessage::TranslateText(TranslateResultPayload::new(payload.request_id, Ok(result)))
    }

    #[tokio::test]
    async fn reply_resolves_the_request() {
        let (hub, inbound) = TabHub::new(8);
        let client = ContentClient::new(hub.connect(), None);
        let request = TranslationRequest::new("google", "en", "de", "hello");

        let call = client.translate(request.clone());
        let serve = async {
            let (tab_id, payload) = next_request(&inbound).await;
            assert_eq!(payload.request, request);
            hub.send_to_tab(tab_id, answer(&payload, "hallo")).await.unwrap();
        };

        let (outcome, ()) = tokio::join!(call, serve);
        match outcome.unwrap() {
            TranslateOutcome::Resolved(result) => assert_eq!(result.translation, "hallo"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_reply_is_rejected() {
        let (hub, inbound) = TabHub::new(8);
        let client = ContentClient::new(hub.connect(), None);
        let error = TranslationError::http("https://api.test", 429, "Too Many Requests", Some("{}".into()));

        let call = client.translate(TranslationRequest::new("google", "en", "de", "x"));
        let serve = async {
            let (tab_id, payload) = next_request(&inbound).await;
            let reply = TranslateResultPayload::new(payload.request_id, Err(error.clone()));
            hub.send_to_tab(tab_id, TabMessage::TranslateText(reply)).await.unwrap();
        };

        let (outcome, ()) = tokio::join!(call, serve);
        assert_eq!(outcome.unwrap(), TranslateOutcome::Rejected(error));
    }

    #[tokio::test]
    async fn stale_reply_is_superseded() {
        let (hub, inbound) = TabHub::new(8);
        let client = Arc::new(ContentClient::new(hub.connect(), None));
        let r1 = TranslationRequest::new("google", "en", "de", "first");
        let r2 = TranslationRequest::new("google", "en", "de", "second");

        let first = tokio::spawn({
            let client = client.clone();
            let r1 = r1.clone();
            async move { client.translate(r1).await }
        });
        let (tab_id, p1) = next_request(&inbound).await;

        let second = tokio::spawn({
            let client = client.clone();
            let r2 = r2.clone();
            async move { client.translate(r2).await }
        });
        let (_, p2) = next_request(&inbound).await;

        hub.send_to_tab(tab_id, answer(&p1, "erste")).await.unwrap();
        let first = timeout(WAIT, first).await.unwrap().unwrap().unwrap();
        assert_eq!(first, TranslateOutcome::Superseded);
        assert_eq!(client.last_params(), Some(r2));

        hub.send_to_tab(tab_id, answer(&p2, "zweite")).await.unwrap();
        let second = timeout(WAIT, second).await.unwrap().unwrap().unwrap();
        match second {
            TranslateOutcome::Resolved(result) => assert_eq!(result.translation, "zweite"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn identical_requests_get_their_own_replies() {
        let (hub, inbound) = TabHub::new(8);
        let client = Arc::new(ContentClient::new(hub.connect(), None));
        let request = TranslationRequest::new("google", "en", "de", "same");

        let calls: Vec<_> = (0..2)
            .map(|_| {
                let client = client.clone();
                let request = request.clone();
                tokio::spawn(async move { client.translate(request).await })
            })
            .collect();

        let (tab_id, a) = next_request(&inbound).await;
        let (_, b) = next_request(&inbound).await;
        assert_ne!(a.request_id, b.request_id);

        // answer in reverse order
        hub.send_to_tab(tab_id, answer(&b, "b")).await.unwrap();
        hub.send_to_tab(tab_id, answer(&a, "a")).await.unwrap();

        let mut translations = Vec::new();
        for call in calls {
            match timeout(WAIT, call).await.unwrap().unwrap().unwrap() {
                TranslateOutcome::Resolved(result) => translations.push(result.translation),
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        translations.sort();
        assert_eq!(translations, ["a", "b"]);
    }

    #[tokio::test]
    async fn missing_reply_times_out() {
        let (hub, _inbound) = TabHub::new(8);
        let client = ContentClient::new(hub.connect(), Some(Duration::from_millis(20)));

        let err = client
            .translate(TranslationRequest::new("google", "en", "de", "x"))
            .await
            .unwrap_err();

        assert!(matches!(err, RouterError::Timeout(_)));
        assert_eq!(client.listeners.len(), 0);
    }

    #[tokio::test]
    async fn disconnect_fails_pending_call() {
        let (hub, inbound) = TabHub::new(8);
        let client = ContentClient::new(hub.connect(), None);

        let call = client.translate(TranslationRequest::new("google", "en", "de", "x"));
        let drop_tab = async {
            let (tab_id, _) = next_request(&inbound).await;
            hub.disconnect(tab_id);
        };

        let (outcome, ()) = tokio::join!(call, drop_tab);
        assert!(matches!(outcome, Err(RouterError::ChannelClosed)));
    }

    #[tokio::test]
    async fn reset_supersedes_in_flight_request() {
        let (hub, inbound) = TabHub::new(8);
        let client = ContentClient::new(hub.connect(), None);

        let call = client.translate(TranslationRequest::new("google", "en", "de", "x"));
        let serve = async {
            let (tab_id, payload) = next_request(&inbound).await;
            client.reset();
            hub.send_to_tab(tab_id, answer(&payload, "y")).await.unwrap();
        };

        let (outcome, ()) = tokio::join!(call, serve);
        assert_eq!(outcome.unwrap(), TranslateOutcome::Superseded);
        assert_eq!(client.last_params(), None);
    }
}
