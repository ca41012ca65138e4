use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use self::network::NetworkConfig;
use self::translator::TranslatorConfig;
use self::tts::TtsConfig;
use self::vendors::VendorsConfig;

pub mod network;
pub mod translator;
pub mod tts;
pub mod vendors;

fn default_clipboard_interval_ms() -> u64 {
    500
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub translator: TranslatorConfig,
    pub vendors: VendorsConfig,
    pub tts: TtsConfig,

    /// Treat clipboard changes as text selections of a local tab
    pub watch_clipboard: bool,
    #[serde(default = "default_clipboard_interval_ms")]
    pub clipboard_interval_ms: u64,
}

impl Config {
    /// Defaults overridden by environment variables
    pub fn new() -> Self {
        Config {
            network: NetworkConfig::new(),
            translator: TranslatorConfig::new(),
            vendors: VendorsConfig::new(),
            tts: TtsConfig::new(),

            watch_clipboard: env_parse("WATCH_CLIPBOARD", false),
            clipboard_interval_ms: env_parse("CLIPBOARD_INTERVAL_MS", default_clipboard_interval_ms()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            translator: TranslatorConfig::default(),
            vendors: VendorsConfig::default(),
            tts: TtsConfig::default(),
            watch_clipboard: false,
            clipboard_interval_ms: default_clipboard_interval_ms(),
        }
    }
}

pub(crate) fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub(crate) fn env_string(key: &str, default: String) -> String {
    env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or(default)
}
