use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type LanguageCode = String;

/// Source language sentinel asking the backend to detect the language
pub const AUTO: &str = "auto";

/// What the content context asks a vendor to translate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    pub vendor_id: String,
    pub source_lang: LanguageCode,
    pub target_lang: LanguageCode,
    pub text: String,
}

impl TranslationRequest {
    pub fn new(
        vendor_id: impl Into<String>,
        source_lang: impl Into<LanguageCode>,
        target_lang: impl Into<LanguageCode>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            vendor_id: vendor_id.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            text: text.into(),
        }
    }

    pub fn is_auto_detect(&self) -> bool {
        self.source_lang == AUTO
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub vendor_id: String,
    pub original_text: String,
    pub source_lang: LanguageCode,
    pub target_lang: LanguageCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_lang: Option<LanguageCode>,
    pub translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    /// Corrected input the backend suggests, when it thinks the text was misspelled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell_correction: Option<String>,
    /// Backend order is kept as-is
    #[serde(default)]
    pub dictionary: Vec<DictionaryEntry>,
}

impl TranslationResult {
    /// Bare result as returned by a backend, before request metadata is stamped on
    pub fn from_translation(translation: impl Into<String>) -> Self {
        Self {
            translation: translation.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    pub word_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    pub meanings: Vec<Meaning>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    pub word: String,
    pub translations: Vec<String>,
    /// Usage examples, each a source sentence with its translations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Vec<String>>,
}

/// Failed vendor call, detailed enough to link back to the failing endpoint.
///
/// `status_code` is `0` when no HTTP response was received at all
/// (timeout, connection failure, request never sent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{status_code} {status_text} ({request_url})")]
pub struct TranslationError {
    pub request_url: String,
    pub status_code: u16,
    pub status_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_failure_reason: Option<String>,
}

impl TranslationError {
    pub fn http(
        request_url: impl Into<String>,
        status_code: u16,
        status_text: impl Into<String>,
        raw_response_body: Option<String>,
    ) -> Self {
        Self {
            request_url: request_url.into(),
            status_code,
            status_text: status_text.into(),
            raw_response_body,
            parse_failure_reason: None,
        }
    }

    /// Error raised before or instead of an HTTP response
    pub fn transport(request_url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::http(request_url, 0, reason, None)
    }

    pub fn with_parse_failure(mut self, reason: impl Into<String>) -> Self {
        self.parse_failure_reason = Some(reason.into());
        self
    }

    pub fn is_transport(&self) -> bool {
        self.status_code == 0
    }
}

/// Correlates one `TRANSLATE_TEXT` request with its reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}
