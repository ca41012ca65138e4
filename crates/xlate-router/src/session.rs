use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use xlate_config::translator::TranslatorConfig;
use xlate_translator::{VendorRegistry, is_rtl};
use xlate_types::{PlayTextToSpeechPayload, TranslationError, TranslationRequest, TranslationResult};

use crate::content::{ContentClient, RouterError, TranslateOutcome};

/// Receives every translation shown to the user
pub trait HistoryStore: Send + Sync {
    fn save(&self, result: &TranslationResult);
}

/// Newest first, bounded
pub struct MemoryHistory {
    limit: usize,
    entries: Mutex<VecDeque<TranslationResult>>,
}

impl MemoryHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn entries(&self) -> Vec<TranslationResult> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<TranslationResult>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl HistoryStore for MemoryHistory {
    fn save(&self, result: &TranslationResult) {
        let mut entries = self.lock();
        if entries.front() == Some(result) {
            return;
        }
        entries.push_front(result.clone());
        entries.truncate(self.limit);
    }
}

/// What the popup would render
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopupState {
    pub translation: Option<TranslationResult>,
    pub error: Option<TranslationError>,
    pub loading: bool,
    /// Translation is in a right-to-left script
    pub rtl: bool,
}

impl PopupState {
    pub fn is_hidden(&self) -> bool {
        self.translation.is_none() && self.error.is_none()
    }
}

/// Partial translate parameters; gaps are filled from settings and the selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslateParams {
    pub vendor: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub text: Option<String>,
}

impl TranslateParams {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// Content-context controller behind the popup: selection, translate,
/// vendor cycling, playback and hide
pub struct ContentSession {
    client: ContentClient,
    registry: Arc<VendorRegistry>,
    settings: TranslatorConfig,
    history: Option<Arc<dyn HistoryStore>>,
    selection: Mutex<String>,
    state: Mutex<PopupState>,
}

impl ContentSession {
    pub fn new(client: ContentClient, registry: Arc<VendorRegistry>, settings: TranslatorConfig) -> Self {
        Self {
            client,
            registry,
            settings,
            history: None,
            selection: Mutex::new(String::new()),
            state: Mutex::new(PopupState::default()),
        }
    }

    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn state(&self) -> PopupState {
        self.lock_state().clone()
    }

    pub fn selection(&self) -> String {
        lock(&self.selection).clone()
    }

    pub fn set_selection(&self, text: &str) {
        *lock(&self.selection) = text.trim().to_string();
    }

    pub fn last_params(&self) -> Option<TranslationRequest> {
        self.client.last_params()
    }

    /// No-op for empty text or a repeat of the last params
    pub async fn translate(&self, params: TranslateParams) -> Result<(), RouterError> {
        let request = self.fill(params);
        if request.text.is_empty() {
            return Ok(());
        }
        if self.client.last_params().as_ref() == Some(&request) {
            tracing::debug!(vendor = %request.vendor_id, "same params, not translating again");
            return Ok(());
        }

        self.lock_state().loading = true;

        let outcome = match self.client.translate(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.lock_state().loading = false;
                return Err(e);
            }
        };

        match outcome {
            TranslateOutcome::Resolved(result) => {
                {
                    let mut state = self.lock_state();
                    state.rtl = is_rtl(&result.target_lang);
                    state.translation = Some(result.clone());
                    state.error = None;
                    state.loading = false;
                }

                if self.settings.history_enabled
                    && let Some(history) = &self.history
                {
                    history.save(&result);
                }
                if self.settings.auto_play_text {
                    self.play_text().await?;
                }
            }
            TranslateOutcome::Rejected(err) => {
                tracing::debug!(status = err.status_code, url = %err.request_url, "translation rejected");
                let mut state = self.lock_state();
                state.error = Some(err);
                state.loading = false;
            }
            TranslateOutcome::Superseded => {}
        }

        Ok(())
    }

    /// Same text and pair on the next vendor that supports it
    pub async fn translate_next(&self, reverse: bool) -> Result<(), RouterError> {
        let Some(last) = self.client.last_params() else {
            return Ok(());
        };

        let Some(next) = self
            .registry
            .next(&last.vendor_id, &last.source_lang, &last.target_lang, reverse)
        else {
            tracing::debug!(vendor = %last.vendor_id, "no other vendor for this pair");
            return Ok(());
        };

        self.translate(TranslateParams {
            vendor: Some(next.id().to_string()),
            from: Some(last.source_lang),
            to: Some(last.target_lang),
            text: Some(last.text),
        })
        .await
    }

    /// Speak the original text of the shown translation
    pub async fn play_text(&self) -> Result<(), RouterError> {
        let Some(translation) = self.lock_state().translation.clone() else {
            return Ok(());
        };

        let lang = translation
            .detected_lang
            .clone()
            .unwrap_or_else(|| translation.source_lang.clone());

        self.client
            .play_text_to_speech(PlayTextToSpeechPayload {
                vendor_id: translation.vendor_id,
                lang,
                text: translation.original_text,
            })
            .await
    }

    pub async fn stop_playing(&self) -> Result<(), RouterError> {
        self.client.stop_tts_playing().await
    }

    pub async fn hide(&self) -> Result<(), RouterError> {
        if self.lock_state().is_hidden() {
            return Ok(());
        }

        *self.lock_state() = PopupState::default();
        self.client.reset();
        lock(&self.selection).clear();
        self.stop_playing().await
    }

    fn fill(&self, params: TranslateParams) -> TranslationRequest {
        let settings = &self.settings;
        TranslationRequest::new(
            params.vendor.unwrap_or_else(|| settings.vendor.clone()),
            params.from.unwrap_or_else(|| settings.from_lang.clone()),
            params.to.unwrap_or_else(|| settings.to_lang.clone()),
            params.text.unwrap_or_else(|| self.selection()),
        )
    }

    fn lock_state(&self) -> MutexGuard<'_, PopupState> {
        lock(&self.state)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
