use std::env;

use serde::{Deserialize, Serialize};

use crate::{env_parse, env_string};

fn default_vendor() -> String {
    "google".to_string()
}

fn default_from_lang() -> String {
    "auto".to_string()
}

fn default_to_lang() -> String {
    "en".to_string()
}

fn default_history_enabled() -> bool {
    true
}

fn default_history_limit() -> usize {
    200
}

/// User-facing translation settings
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct TranslatorConfig {
    #[serde(default = "default_vendor")]
    pub vendor: String,
    #[serde(default = "default_from_lang")]
    pub from_lang: String,
    #[serde(default = "default_to_lang")]
    pub to_lang: String,
    /// Overrides the display language taken from the system locale
    #[serde(default)]
    pub display_language: Option<String>,
    #[serde(default)]
    pub auto_play_text: bool,
    #[serde(default = "default_history_enabled")]
    pub history_enabled: bool,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl TranslatorConfig {
    pub fn new() -> Self {
        Self {
            vendor: env_string("XLATE_VENDOR", default_vendor()),
            from_lang: env_string("XLATE_FROM", default_from_lang()),
            to_lang: env_string("XLATE_TO", default_to_lang()),
            display_language: env::var("XLATE_DISPLAY_LANGUAGE").ok().filter(|v| !v.is_empty()),
            auto_play_text: env_parse("XLATE_AUTO_PLAY", false),
            history_enabled: env_parse("XLATE_HISTORY", default_history_enabled()),
            history_limit: env_parse("XLATE_HISTORY_LIMIT", default_history_limit()),
        }
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            vendor: default_vendor(),
            from_lang: default_from_lang(),
            to_lang: default_to_lang(),
            display_language: None,
            auto_play_text: false,
            history_enabled: default_history_enabled(),
            history_limit: default_history_limit(),
        }
    }
}
