use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use xlate_types::TranslationError;

use crate::fetch::{HttpFetch, HttpRequest};
use crate::registry::VendorRegistry;

#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    #[error("unknown vendor: {0}")]
    UnknownVendor(String),

    #[error("audio fetch failed: {0}")]
    Fetch(#[from] TranslationError),

    #[error("audio output failed: {0}")]
    Output(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechOptions {
    pub lang: String,
    pub rate: f32,
}

/// System text-to-speech
pub trait SpeechEngine: Send + Sync {
    fn speak(&self, text: &str, options: &SpeechOptions) -> Result<(), TtsError>;

    /// Must be harmless when nothing is speaking
    fn stop(&self);
}

/// Downloaded speech audio
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub url: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Turns clips into playable tracks
pub trait AudioOutput: Send + Sync {
    fn load(&self, clip: AudioClip) -> Result<Box<dyn AudioTrack>, TtsError>;
}

/// A loaded clip. Dropping it releases the decoded audio.
pub trait AudioTrack: Send {
    /// Starts or resumes playback
    fn play(&mut self) -> Result<(), TtsError>;

    fn pause(&mut self);
}

/// Per-vendor audio state
#[derive(Default)]
pub(crate) struct Playback {
    last_audio_url: Option<String>,
    track: Option<Box<dyn AudioTrack>>,
}

impl Playback {
    fn pause(&mut self) {
        if let Some(track) = self.track.as_mut() {
            track.pause();
        }
    }

    fn release(&mut self) {
        if let Some(mut track) = self.track.take() {
            track.pause();
        }
        self.last_audio_url = None;
    }
}

/// Locale the system engine should use for a vendor language code
pub fn system_speech_lang(lang: &str) -> String {
    match lang {
        "en" => "en-GB".to_string(),
        other => other.to_string(),
    }
}

/// Claim on the voice taken when a play is requested. Any later play or
/// stop invalidates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayTicket(u64);

/// Plays text through a vendor's audio endpoint or the system engine, one voice at a time
pub struct TtsCoordinator {
    registry: Arc<VendorRegistry>,
    fetch: Arc<dyn HttpFetch>,
    speech: Arc<dyn SpeechEngine>,
    audio: Arc<dyn AudioOutput>,
    use_system_engine: AtomicBool,
    generation: AtomicU64,
}

impl TtsCoordinator {
    pub fn new(
        registry: Arc<VendorRegistry>,
        fetch: Arc<dyn HttpFetch>,
        speech: Arc<dyn SpeechEngine>,
        audio: Arc<dyn AudioOutput>,
    ) -> Self {
        Self {
            registry,
            fetch,
            speech,
            audio,
            use_system_engine: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Skip vendor audio endpoints and always use the system engine
    pub fn set_use_system_engine(&self, enabled: bool) {
        self.use_system_engine.store(enabled, Ordering::Relaxed);
    }

    pub fn begin_play(&self) -> PlayTicket {
        PlayTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn is_current(&self, ticket: PlayTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    pub async fn play_text(&self, vendor_id: &str, lang: &str, text: &str) -> Result<(), TtsError> {
        let ticket = self.begin_play();
        self.play_with(ticket, vendor_id, lang, text).await
    }

    /// Play under a ticket taken earlier; does nothing once the ticket is stale
    pub async fn play_with(
        &self,
        ticket: PlayTicket,
        vendor_id: &str,
        lang: &str,
        text: &str,
    ) -> Result<(), TtsError> {
        self.halt_all().await;

        let vendor = self
            .registry
            .lookup(vendor_id)
            .ok_or_else(|| TtsError::UnknownVendor(vendor_id.to_string()))?;

        if !self.is_current(ticket) {
            tracing::debug!(vendor = vendor_id, "play superseded");
            return Ok(());
        }

        let audio_url = vendor
            .vendor()
            .audio_url(lang, text)
            .filter(|_| !self.use_system_engine.load(Ordering::Relaxed));

        let Some(url) = audio_url else {
            let options = SpeechOptions {
                lang: system_speech_lang(lang),
                rate: 1.0,
            };
            tracing::debug!(vendor = vendor_id, lang = %options.lang, "system speech");
            return self.speech.speak(text, &options);
        };

        {
            let mut playback = vendor.playback.lock().await;
            if playback.last_audio_url.as_deref() == Some(url.as_str())
                && let Some(track) = playback.track.as_mut()
            {
                tracing::debug!(vendor = vendor_id, "resuming cached audio");
                return track.play();
            }
            playback.release();
        }

        // download without holding the playback lock
        let clip = self.fetch_audio(&url, vendor.vendor().audio_format()).await?;
        tracing::debug!(vendor = vendor_id, bytes = clip.data.len(), "audio fetched");

        let mut playback = vendor.playback.lock().await;
        if !self.is_current(ticket) {
            tracing::debug!(vendor = vendor_id, "play superseded, audio discarded");
            return Ok(());
        }

        let mut track = self.audio.load(clip)?;
        track.play()?;
        playback.track = Some(track);
        playback.last_audio_url = Some(url);

        Ok(())
    }

    /// Stop speech and release one vendor's audio, so the next play fetches again
    pub async fn stop_playing(&self, vendor_id: &str) -> Result<(), TtsError> {
        let vendor = self
            .registry
            .lookup(vendor_id)
            .ok_or_else(|| TtsError::UnknownVendor(vendor_id.to_string()))?;

        self.generation.fetch_add(1, Ordering::SeqCst);
        self.speech.stop();
        vendor.playback.lock().await.release();
        Ok(())
    }

    pub async fn stop_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.speech.stop();
        for vendor in self.registry.list() {
            vendor.playback.lock().await.release();
        }
    }

    /// Silence everything but keep fetched audio for a replay
    async fn halt_all(&self) {
        self.speech.stop();
        for vendor in self.registry.list() {
            vendor.playback.lock().await.pause();
        }
    }

    async fn fetch_audio(&self, url: &str, fallback_mime: &str) -> Result<AudioClip, TtsError> {
        let response = self
            .fetch
            .fetch(HttpRequest::get(url))
            .await
            .map_err(|e| TranslationError::transport(url, e.to_string()))?;

        if !response.is_success() {
            return Err(TranslationError::http(
                &response.url,
                response.status,
                &response.status_text,
                Some(response.text()),
            )
            .into());
        }

        Ok(AudioClip {
            url: url.to_string(),
            mime_type: response
                .content_type
                .unwrap_or_else(|| fallback_mime.to_string()),
            data: response.body,
        })
    }
}
