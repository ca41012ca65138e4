use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{env_parse, env_string};

fn default_request_timeout_ms() -> u64 {
    15_000
}

fn default_response_timeout_ms() -> u64 {
    30_000
}

fn default_listen_to_ws() -> bool {
    true
}

fn default_ws_addr() -> String {
    "127.0.0.1:7878".to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct NetworkConfig {
    /// HTTP timeout for vendor and audio requests
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// How long a tab waits for a TRANSLATE_TEXT reply, 0 waits forever
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
    /// Accept content scripts over WebSocket
    #[serde(default = "default_listen_to_ws")]
    pub listen_to_ws: bool,
    #[serde(default = "default_ws_addr")]
    pub ws_addr: String,
}

impl NetworkConfig {
    pub fn new() -> Self {
        Self {
            request_timeout_ms: env_parse("REQUEST_TIMEOUT_MS", default_request_timeout_ms()),
            response_timeout_ms: env_parse("RESPONSE_TIMEOUT_MS", default_response_timeout_ms()),
            listen_to_ws: env_parse("LISTEN_TO_WS", default_listen_to_ws()),
            ws_addr: env_string("WS_ADDR", default_ws_addr()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        (self.response_timeout_ms > 0).then(|| Duration::from_millis(self.response_timeout_ms))
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            response_timeout_ms: default_response_timeout_ms(),
            listen_to_ws: default_listen_to_ws(),
            ws_addr: default_ws_addr(),
        }
    }
}
