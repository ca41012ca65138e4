use serde::{Deserialize, Serialize};

use crate::{env_parse, env_string};

fn default_speech_command() -> String {
    "espeak-ng".to_string()
}

fn default_player_command() -> String {
    "mpv".to_string()
}

fn default_player_args() -> Vec<String> {
    vec!["--no-video".to_string(), "--really-quiet".to_string()]
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct TtsConfig {
    /// Always speak through the system engine, even if a vendor streams audio
    #[serde(default)]
    pub use_system_engine: bool,
    /// Invoked as `<command> -v <lang> <text>`
    #[serde(default = "default_speech_command")]
    pub speech_command: String,
    /// Invoked as `<command> <args..> <audio file>`
    #[serde(default = "default_player_command")]
    pub player_command: String,
    #[serde(default = "default_player_args")]
    pub player_args: Vec<String>,
}

impl TtsConfig {
    pub fn new() -> Self {
        Self {
            use_system_engine: env_parse("XLATE_SYSTEM_TTS", false),
            speech_command: env_string("XLATE_SPEECH_COMMAND", default_speech_command()),
            player_command: env_string("XLATE_AUDIO_PLAYER", default_player_command()),
            player_args: default_player_args(),
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            use_system_engine: false,
            speech_command: default_speech_command(),
            player_command: default_player_command(),
            player_args: default_player_args(),
        }
    }
}
