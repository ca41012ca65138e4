use serde::{Deserialize, Serialize};

use crate::env_string;

fn default_true() -> bool {
    true
}

fn default_google_url() -> String {
    "https://translate.googleapis.com".to_string()
}

fn default_deepl_url() -> String {
    "https://api-free.deepl.com/v2/translate".to_string()
}

fn default_libre_url() -> String {
    "http://localhost:5000".to_string()
}

/// Backend endpoints and credentials, one section per vendor
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct VendorsConfig {
    pub google: GoogleConfig,
    pub deepl: DeeplConfig,
    pub libre: LibreConfig,
}

impl VendorsConfig {
    pub fn new() -> Self {
        let deepl_key = env_string("DEEPL_API_KEY", String::new());
        let libre_url = env_string("LIBRE_TRANSLATE_URL", String::new());

        Self {
            google: GoogleConfig {
                enabled: true,
                api_url: env_string("GOOGLE_TRANSLATE_URL", default_google_url()),
            },
            deepl: DeeplConfig {
                enabled: !deepl_key.is_empty(),
                api_key: deepl_key,
                api_url: env_string("DEEPL_API_URL", default_deepl_url()),
            },
            libre: LibreConfig {
                enabled: !libre_url.is_empty(),
                api_url: if libre_url.is_empty() { default_libre_url() } else { libre_url },
                api_key: env_string("LIBRE_TRANSLATE_API_KEY", String::new()),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct GoogleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_google_url")]
    pub api_url: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: default_google_url(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct DeeplConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_deepl_url")]
    pub api_url: String,
}

impl Default for DeeplConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            api_url: default_deepl_url(),
        }
    }
}

/// Self-hosted or public LibreTranslate instance
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct LibreConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_libre_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
}

impl Default for LibreConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: default_libre_url(),
            api_key: String::new(),
        }
    }
}
