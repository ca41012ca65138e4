use std::sync::Arc;

use tokio::sync::Mutex;
use xlate_types::{AUTO, LanguageCode, TranslationError, TranslationRequest, TranslationResult};

use crate::locale::{DisplayLanguage, LocaleError};
use crate::tts::Playback;
use crate::vendor::{Vendor, VendorDescriptor};

/// A registered vendor together with the state only its own flows may touch
pub struct VendorHandle {
    vendor: Arc<dyn Vendor>,
    locale: Arc<dyn DisplayLanguage>,
    state: Mutex<VendorState>,
    pub(crate) playback: Mutex<Playback>,
}

#[derive(Default)]
struct VendorState {
    /// Last successful result and the request it answered
    last: Option<(TranslationRequest, TranslationResult)>,
    last_error: Option<TranslationError>,
    /// Set only while a swapped retry is running
    auto_swap_used: bool,
}

impl VendorState {
    fn cached(&self, request: &TranslationRequest) -> Option<TranslationResult> {
        self.last
            .as_ref()
            .filter(|(last, _)| last == request)
            .map(|(_, result)| result.clone())
    }
}

impl VendorHandle {
    pub fn new(vendor: Arc<dyn Vendor>, locale: Arc<dyn DisplayLanguage>) -> Self {
        Self {
            vendor,
            locale,
            state: Mutex::new(VendorState::default()),
            playback: Mutex::new(Playback::default()),
        }
    }

    pub fn id(&self) -> &str {
        self.vendor.id()
    }

    pub fn descriptor(&self) -> &VendorDescriptor {
        self.vendor.descriptor()
    }

    pub fn vendor(&self) -> &Arc<dyn Vendor> {
        &self.vendor
    }

    pub fn can_translate(&self, source_lang: &str, target_lang: &str) -> bool {
        self.vendor.can_translate(source_lang, target_lang)
    }

    pub async fn last_result(&self) -> Option<TranslationResult> {
        self.state.lock().await.last.as_ref().map(|(_, r)| r.clone())
    }

    pub async fn last_error(&self) -> Option<TranslationError> {
        self.state.lock().await.last_error.clone()
    }

    /// Translate through the one-entry cache and the auto-swap retry.
    ///
    /// Calls into the same vendor are serialized on its state lock. At most
    /// two raw backend calls are made per invocation.
    pub async fn get_translation(
        &self,
        source_lang: &str,
        target_lang: &str,
        text: &str,
    ) -> Result<TranslationResult, TranslationError> {
        let mut state = self.state.lock().await;
        // an aborted call may have left the guard set
        state.auto_swap_used = false;
        let mut request = TranslationRequest::new(self.id(), source_lang, target_lang, text);

        loop {
            if let Some(cached) = state.cached(&request) {
                tracing::debug!(vendor = self.id(), "serving last result");
                state.auto_swap_used = false;
                return Ok(cached);
            }

            let max_len = self.descriptor().max_text_length;
            let text = truncate_chars(&request.text, max_len);
            if text.len() < request.text.len() {
                tracing::debug!(vendor = self.id(), max_len, "text truncated");
            }

            state.last_error = None;
            let raw = self
                .vendor
                .translate_raw(&request.source_lang, &request.target_lang, text)
                .await;

            let mut result = match raw {
                Ok(result) => result,
                Err(err) => {
                    tracing::warn!(
                        vendor = self.id(),
                        status = err.status_code,
                        url = %err.request_url,
                        "translation failed: {}",
                        err.status_text
                    );
                    state.last_error = Some(err.clone());
                    state.auto_swap_used = false;
                    return Err(err);
                }
            };

            result.vendor_id = self.id().to_string();
            result.original_text = text.to_string();
            result.source_lang = request.source_lang.clone();
            result.target_lang = request.target_lang.clone();
            state.last = Some((request.clone(), result.clone()));

            if self.vendor.use_auto_swap() && !state.auto_swap_used {
                match plan_auto_swap(&result, self.locale.as_ref()) {
                    Ok(Some(plan)) => {
                        tracing::debug!(
                            vendor = self.id(),
                            reason = ?plan.reason,
                            from = %plan.source_lang,
                            to = %plan.target_lang,
                            "auto-swap retry"
                        );
                        state.auto_swap_used = true;
                        request = TranslationRequest::new(
                            self.id(),
                            plan.source_lang,
                            plan.target_lang,
                            result.original_text,
                        );
                        continue;
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(vendor = self.id(), "auto-swap skipped: {err}");
                    }
                }
            }

            state.auto_swap_used = false;
            return Ok(result);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HeuristicError {
    #[error("display language unavailable: {0}")]
    DisplayLanguage(#[from] LocaleError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapReason {
    /// Translation came back identical to the input
    EchoedText,
    /// Backend detected something other than the requested source
    OtherLanguageDetected,
    /// Auto-detect found the text is already in the target language
    DetectedTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPlan {
    pub source_lang: LanguageCode,
    pub target_lang: LanguageCode,
    pub reason: SwapReason,
}

/// Decide whether a stamped result deserves one retry with another language pair
pub fn plan_auto_swap(
    result: &TranslationResult,
    locale: &dyn DisplayLanguage,
) -> Result<Option<SwapPlan>, HeuristicError> {
    // blank means nothing was detected
    let detected = result
        .detected_lang
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    if result.source_lang != AUTO {
        let same_text =
            result.original_text.trim().to_lowercase() == result.translation.trim().to_lowercase();
        let other_detected = detected.filter(|d| *d != result.source_lang);

        let plan = match (other_detected, same_text) {
            (Some(detected), _) => SwapPlan {
                source_lang: detected.to_string(),
                target_lang: result.source_lang.clone(),
                reason: SwapReason::OtherLanguageDetected,
            },
            (None, true) => SwapPlan {
                source_lang: result.target_lang.clone(),
                target_lang: result.source_lang.clone(),
                reason: SwapReason::EchoedText,
            },
            (None, false) => return Ok(None),
        };
        return Ok(Some(plan));
    }

    let Some(detected) = detected else {
        return Ok(None);
    };
    if detected != result.target_lang {
        return Ok(None);
    }

    let display = locale.display_language()?;
    if display == result.target_lang {
        return Ok(None);
    }

    Ok(Some(SwapPlan {
        source_lang: detected.to_string(),
        target_lang: display,
        reason: SwapReason::DetectedTarget,
    }))
}

/// First `max` chars of `text`
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
