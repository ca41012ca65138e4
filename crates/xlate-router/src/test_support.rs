use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use xlate_translator::testing::{StubFetch, StubVendor};
use xlate_translator::{
    AudioClip, AudioOutput, AudioTrack, FixedDisplayLanguage, HttpFetch, SpeechEngine,
    SpeechOptions, TtsCoordinator, TtsError, VendorHandle, VendorRegistry,
};

use crate::background::{Background, event_loop};
use crate::hub::TabHub;

#[derive(Default)]
pub(crate) struct RecordingSpeech(Mutex<Vec<String>>);

impl RecordingSpeech {
    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl SpeechEngine for RecordingSpeech {
    fn speak(&self, text: &str, options: &SpeechOptions) -> Result<(), TtsError> {
        self.0.lock().unwrap().push(format!("speak {} {text}", options.lang));
        Ok(())
    }

    fn stop(&self) {
        self.0.lock().unwrap().push("stop".to_string());
    }
}

pub(crate) struct NoAudio;

impl AudioOutput for NoAudio {
    fn load(&self, _clip: AudioClip) -> Result<Box<dyn AudioTrack>, TtsError> {
        Err(TtsError::Output("no audio device".to_string()))
    }
}

/// A running privileged side over stub vendors
pub(crate) struct Fixture {
    pub(crate) hub: Arc<TabHub>,
    pub(crate) registry: Arc<VendorRegistry>,
    pub(crate) speech: Arc<RecordingSpeech>,
    pub(crate) vendors: Vec<Arc<StubVendor>>,
    cancel: CancellationToken,
}

impl Fixture {
    pub(crate) fn start(vendors: Vec<StubVendor>) -> Self {
        Self::with_fetch(vendors, Arc::new(StubFetch::new()))
    }

    pub(crate) fn with_fetch(vendors: Vec<StubVendor>, fetch: Arc<dyn HttpFetch>) -> Self {
        let vendors: Vec<Arc<StubVendor>> = vendors.into_iter().map(Arc::new).collect();
        let mut registry = VendorRegistry::new();
        for vendor in &vendors {
            let id = xlate_translator::Vendor::id(vendor.as_ref()).to_string();
            registry.register(
                id,
                VendorHandle::new(vendor.clone(), Arc::new(FixedDisplayLanguage::new("en"))),
            );
        }
        let registry = Arc::new(registry);

        let speech = Arc::new(RecordingSpeech::default());
        let tts = Arc::new(TtsCoordinator::new(
            registry.clone(),
            fetch,
            speech.clone(),
            Arc::new(NoAudio),
        ));

        let (hub, inbound) = TabHub::new(16);
        let hub = Arc::new(hub);
        let cancel = CancellationToken::new();
        let background = Arc::new(Background::new(registry.clone(), tts, hub.clone()));
        tokio::spawn(event_loop(background, inbound, cancel.clone()));

        Self {
            hub,
            registry,
            speech,
            vendors,
            cancel,
        }
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
