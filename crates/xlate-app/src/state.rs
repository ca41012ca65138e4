use std::sync::Arc;

use tokio::sync::RwLock;
use xlate_config::Config;
use xlate_router::MemoryHistory;
use xlate_translator::{
    DisplayLanguage, FixedDisplayLanguage, HttpFetch, ReqwestFetch, SystemDisplayLanguage,
    TtsCoordinator, VendorRegistry,
};

use crate::speech::{CommandAudio, CommandSpeech};

pub struct AppState {
    pub config: Arc<RwLock<Config>>,
    pub registry: Arc<VendorRegistry>,
    pub tts: Arc<TtsCoordinator>,
    pub history: Arc<MemoryHistory>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let fetch: Arc<dyn HttpFetch> = Arc::new(ReqwestFetch::new(config.network.request_timeout())?);
        Ok(Self::with_fetch(config, fetch))
    }

    /// Wire every service over the given HTTP capability
    pub fn with_fetch(config: Config, fetch: Arc<dyn HttpFetch>) -> Self {
        let locale: Arc<dyn DisplayLanguage> = match &config.translator.display_language {
            Some(tag) => Arc::new(FixedDisplayLanguage::new(tag.clone())),
            None => Arc::new(SystemDisplayLanguage),
        };

        let mut registry = VendorRegistry::new();
        xlate_vendors::register_all(&mut registry, &config.vendors, fetch.clone(), locale);
        if registry.lookup(&config.translator.vendor).is_none() {
            tracing::warn!("default vendor {} is not enabled", config.translator.vendor);
        }
        let registry = Arc::new(registry);

        let tts = TtsCoordinator::new(
            registry.clone(),
            fetch,
            Arc::new(CommandSpeech::new(&config.tts)),
            Arc::new(CommandAudio::new(&config.tts)),
        );
        tts.set_use_system_engine(config.tts.use_system_engine);

        let history = Arc::new(MemoryHistory::new(config.translator.history_limit));

        Self {
            config: Arc::new(RwLock::new(config)),
            registry,
            tts: Arc::new(tts),
            history,
        }
    }
}
