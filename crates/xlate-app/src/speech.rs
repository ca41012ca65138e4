use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tokio::process::{Child, Command};
use xlate_config::tts::TtsConfig;
use xlate_translator::{AudioClip, AudioOutput, AudioTrack, SpeechEngine, SpeechOptions, TtsError};

/// espeak's default speed in words per minute
const BASE_WORDS_PER_MINUTE: f32 = 175.0;

/// System speech through an external command, `<command> -v <lang> -s <wpm> <text>`
pub struct CommandSpeech {
    command: String,
    current: Mutex<Option<Child>>,
}

impl CommandSpeech {
    pub fn new(config: &TtsConfig) -> Self {
        Self {
            command: config.speech_command.clone(),
            current: Mutex::new(None),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Child>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SpeechEngine for CommandSpeech {
    fn speak(&self, text: &str, options: &SpeechOptions) -> Result<(), TtsError> {
        let words_per_minute = (BASE_WORDS_PER_MINUTE * options.rate).round() as u32;

        let child = Command::new(&self.command)
            .arg("-v")
            .arg(&options.lang)
            .arg("-s")
            .arg(words_per_minute.to_string())
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TtsError::Output(format!("{}: {e}", self.command)))?;

        // replacing the previous child kills it
        *self.lock() = Some(child);
        Ok(())
    }

    fn stop(&self) {
        if let Some(mut child) = self.lock().take() {
            let _ = child.start_kill();
        }
    }
}

/// Plays downloaded audio by handing a temp file to a player command
pub struct CommandAudio {
    command: String,
    args: Vec<String>,
}

impl CommandAudio {
    pub fn new(config: &TtsConfig) -> Self {
        Self {
            command: config.player_command.clone(),
            args: config.player_args.clone(),
        }
    }

    /// Write the clip to a temp file named after its mime type
    pub fn store(&self, clip: AudioClip) -> Result<CommandTrack, TtsError> {
        let mut file = tempfile::Builder::new()
            .prefix("xlate-")
            .suffix(extension(&clip.mime_type))
            .tempfile()
            .map_err(|e| TtsError::Output(format!("temp file: {e}")))?;
        file.write_all(&clip.data)
            .map_err(|e| TtsError::Output(format!("temp file: {e}")))?;

        tracing::debug!(url = %clip.url, path = %file.path().display(), "audio stored");

        Ok(CommandTrack {
            file,
            command: self.command.clone(),
            args: self.args.clone(),
            player: None,
        })
    }
}

impl AudioOutput for CommandAudio {
    fn load(&self, clip: AudioClip) -> Result<Box<dyn AudioTrack>, TtsError> {
        Ok(Box::new(self.store(clip)?))
    }
}

fn extension(mime_type: &str) -> &'static str {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    match essence {
        "audio/mpeg" | "audio/mp3" => ".mp3",
        "audio/ogg" => ".ogg",
        "audio/wav" | "audio/x-wav" => ".wav",
        _ => ".audio",
    }
}

/// Pausing kills the player, so a resume starts from the beginning.
/// Dropping the track deletes the file.
pub struct CommandTrack {
    file: NamedTempFile,
    command: String,
    args: Vec<String>,
    player: Option<Child>,
}

impl CommandTrack {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl AudioTrack for CommandTrack {
    fn play(&mut self) -> Result<(), TtsError> {
        if let Some(player) = self.player.as_mut()
            && matches!(player.try_wait(), Ok(None))
        {
            return Ok(());
        }

        let child = Command::new(&self.command)
            .args(&self.args)
            .arg(self.file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TtsError::Output(format!("{}: {e}", self.command)))?;

        self.player = Some(child);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(mut player) = self.player.take() {
            let _ = player.start_kill();
        }
    }
}
