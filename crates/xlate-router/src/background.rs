use std::sync::Arc;

use kanal::AsyncReceiver;
use tokio_util::sync::CancellationToken;
use xlate_translator::{PlayTicket, TtsCoordinator, VendorRegistry};
use xlate_types::{
    Envelope, Message, PlayTextToSpeechPayload, TabId, TabMessage, TranslatePayload,
    TranslateResultPayload, TranslationError, TranslationResult,
};

use crate::hub::TabHub;

/// Privileged-context side of the router
pub struct Background {
    registry: Arc<VendorRegistry>,
    tts: Arc<TtsCoordinator>,
    hub: Arc<TabHub>,
}

impl Background {
    pub fn new(registry: Arc<VendorRegistry>, tts: Arc<TtsCoordinator>, hub: Arc<TabHub>) -> Self {
        Self { registry, tts, hub }
    }

    pub fn registry(&self) -> &Arc<VendorRegistry> {
        &self.registry
    }

    /// Handle one message. Translation and playback run on their own tasks so
    /// a slow backend never holds up the queue. A play claims the voice here,
    /// so a stop queued behind it still cancels it.
    pub async fn handle(self: &Arc<Self>, envelope: Envelope) {
        let Envelope { tab_id, message } = envelope;

        match message {
            Message::TranslateText(payload) => {
                let background = Arc::clone(self);
                tokio::spawn(async move { background.translate(tab_id, payload).await });
            }
            Message::PlayTextToSpeech(payload) => {
                let ticket = self.tts.begin_play();
                let background = Arc::clone(self);
                tokio::spawn(async move { background.play(ticket, payload).await });
            }
            Message::StopTtsPlaying => {
                tracing::debug!(%tab_id, "stop playing");
                self.tts.stop_all().await;
            }
        }
    }

    async fn translate(&self, tab_id: TabId, payload: TranslatePayload) {
        let TranslatePayload { request_id, request } = payload;
        tracing::debug!(%tab_id, %request_id, vendor = %request.vendor_id, "translate");

        let result = self
            .get_translation(
                &request.vendor_id,
                &request.source_lang,
                &request.target_lang,
                &request.text,
            )
            .await;
        let reply = TabMessage::TranslateText(TranslateResultPayload::new(request_id, result));

        if let Err(e) = self.hub.send_to_tab(tab_id, reply).await {
            tracing::warn!(%tab_id, %request_id, "reply not delivered: {e}");
        }
    }

    async fn get_translation(
        &self,
        vendor_id: &str,
        source_lang: &str,
        target_lang: &str,
        text: &str,
    ) -> Result<TranslationResult, TranslationError> {
        let Some(vendor) = self.registry.lookup(vendor_id) else {
            return Err(TranslationError::transport(vendor_id, "unknown vendor"));
        };
        vendor.get_translation(source_lang, target_lang, text).await
    }

    async fn play(&self, ticket: PlayTicket, payload: PlayTextToSpeechPayload) {
        let PlayTextToSpeechPayload { vendor_id, lang, text } = payload;
        if let Err(e) = self.tts.play_with(ticket, &vendor_id, &lang, &text).await {
            tracing::warn!(vendor = %vendor_id, "playback failed: {e}");
        }
    }
}

/// Dispatch messages from every tab until cancelled or the hub goes away
pub async fn event_loop(
    background: Arc<Background>,
    inbound: AsyncReceiver<Envelope>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    tracing::info!(vendors = background.registry.len(), "background dispatcher started");

    loop {
        let envelope = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("background dispatcher stopping");
                background.tts.stop_all().await;
                return Ok(());
            }
            received = inbound.recv() => received?,
        };

        background.handle(envelope).await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use async_trait::async_trait;
    use tokio::time::timeout;
    use xlate_translator::{FetchError, HttpFetch, HttpRequest, HttpResponse};
    use xlate_translator::testing::{StubFetch, StubVendor};
    use xlate_types::{RequestId, TranslationRequest};

    use super::*;
    use crate::content::{ContentClient, TranslateOutcome};
    use crate::test_support::{Fixture, NoAudio, RecordingSpeech};

    const WAIT: Duration = Duration::from_secs(2);

    fn stub() -> StubVendor {
        StubVendor::new("stub", &["en", "de"])
    }

    #[tokio::test]
    async fn translation_round_trip() {
        let fixture = Fixture::start(vec![stub()]);
        let client = ContentClient::new(fixture.hub.connect(), Some(WAIT));

        let outcome = client
            .translate(TranslationRequest::new("stub", "en", "de", "hello"))
            .await
            .unwrap();

        match outcome {
            TranslateOutcome::Resolved(result) => {
                assert_eq!(result.translation, "[de] hello");
                assert_eq!(result.vendor_id, "stub");
                assert_eq!(result.original_text, "hello");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn backend_error_reaches_the_tab() {
        let error = TranslationError::http(
            "https://api.stub.test/translate",
            429,
            "Too Many Requests",
            Some(r#"{"error":"slow down"}"#.to_string()),
        );
        let fixture = Fixture::start(vec![stub().reply(Err(error.clone()))]);
        let client = ContentClient::new(fixture.hub.connect(), Some(WAIT));

        let outcome = client
            .translate(TranslationRequest::new("stub", "en", "de", "hello"))
            .await
            .unwrap();

        assert_eq!(outcome, TranslateOutcome::Rejected(error));
    }

    #[tokio::test]
    async fn unknown_vendor_is_rejected() {
        let fixture = Fixture::start(vec![stub()]);
        let client = ContentClient::new(fixture.hub.connect(), Some(WAIT));

        let outcome = client
            .translate(TranslationRequest::new("bing", "en", "de", "hello"))
            .await
            .unwrap();

        match outcome {
            TranslateOutcome::Rejected(err) => {
                assert!(err.is_transport());
                assert_eq!(err.request_url, "bing");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(fixture.vendors[0].call_count(), 0);
    }

    #[tokio::test]
    async fn reply_to_closed_tab_is_dropped() {
        let fixture = Fixture::start(vec![stub()]);
        let port = fixture.hub.connect();
        let tab_id = port.tab_id();

        port.send(Message::TranslateText(TranslatePayload {
            request_id: RequestId::new(),
            request: TranslationRequest::new("stub", "en", "de", "hello"),
        }))
        .await
        .unwrap();
        fixture.hub.disconnect(tab_id);

        // the dispatcher keeps serving other tabs
        let client = ContentClient::new(fixture.hub.connect(), Some(WAIT));
        let outcome = client
            .translate(TranslationRequest::new("stub", "de", "en", "hallo"))
            .await
            .unwrap();
        assert!(matches!(outcome, TranslateOutcome::Resolved(_)));
    }

    async fn wait_for_speech(fixture: &Fixture, done: impl Fn(&[String]) -> bool) {
        timeout(WAIT, async {
            while !done(fixture.speech.entries().as_slice()) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn speech_messages_drive_the_coordinator() {
        let fixture = Fixture::start(vec![stub()]);
        let client = ContentClient::new(fixture.hub.connect(), Some(WAIT));

        client
            .play_text_to_speech(PlayTextToSpeechPayload {
                vendor_id: "stub".to_string(),
                lang: "en".to_string(),
                text: "hello".to_string(),
            })
            .await
            .unwrap();
        wait_for_speech(&fixture, |entries| entries.iter().any(|e| e == "speak en-GB hello")).await;

        client.stop_tts_playing().await.unwrap();
        wait_for_speech(&fixture, |entries| entries.iter().filter(|e| *e == "stop").count() >= 2).await;
    }

    #[tokio::test]
    async fn cancellation_stops_the_loop() {
        let registry = Arc::new(VendorRegistry::new());
        let tts = Arc::new(TtsCoordinator::new(
            registry.clone(),
            Arc::new(StubFetch::new()),
            Arc::new(RecordingSpeech::default()),
            Arc::new(NoAudio),
        ));
        let (hub, inbound) = TabHub::new(4);
        let background = Arc::new(Background::new(registry, tts, Arc::new(hub)));
        let cancel = CancellationToken::new();

        let task = tokio::spawn(event_loop(background, inbound, cancel.clone()));
        cancel.cancel();

        let result = timeout(WAIT, task).await.unwrap().unwrap();
        assert!(result.is_ok());
    }

    struct SlowFetch(Duration);

    #[async_trait]
    impl HttpFetch for SlowFetch {
        async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
            tokio::time::sleep(self.0).await;
            Err(FetchError::Network(format!("gave up on {}", request.url)))
        }
    }

    #[tokio::test]
    async fn stop_during_audio_download_keeps_queue_moving() {
        let fixture = Fixture::with_fetch(
            vec![
                StubVendor::new("g", &["en"]).with_audio(),
                StubVendor::new("s", &["en", "de"]),
            ],
            Arc::new(SlowFetch(Duration::from_millis(1500))),
        );
        let player = ContentClient::new(fixture.hub.connect(), Some(WAIT));
        let reader = ContentClient::new(fixture.hub.connect(), Some(WAIT));

        player
            .play_text_to_speech(PlayTextToSpeechPayload {
                vendor_id: "g".to_string(),
                lang: "en".to_string(),
                text: "hello".to_string(),
            })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        player.stop_tts_playing().await.unwrap();

        let started = Instant::now();
        let outcome = reader
            .translate(TranslationRequest::new("s", "en", "de", "hello"))
            .await
            .unwrap();

        assert!(matches!(outcome, TranslateOutcome::Resolved(_)));
        assert!(started.elapsed() < Duration::from_millis(500));
    }
}
