use std::collections::BTreeMap;

use async_trait::async_trait;
use xlate_types::{AUTO, LanguageCode, TranslationError, TranslationResult};

/// Language code -> human readable name
pub type LanguageTable = BTreeMap<LanguageCode, String>;

pub fn language_table(entries: &[(&str, &str)]) -> LanguageTable {
    entries
        .iter()
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect()
}

/// Static facts about a backend, fixed for the process lifetime
#[derive(Debug, Clone)]
pub struct VendorDescriptor {
    /// Code name, e.g. "google"
    pub id: String,
    pub title: String,
    pub public_url: String,
    pub api_url: String,
    /// May contain `auto`
    pub source_languages: LanguageTable,
    pub target_languages: LanguageTable,
    /// Longest URL the backend accepts for GET requests
    pub max_url_length: usize,
    /// Longer texts are cut before sending
    pub max_text_length: usize,
    pub supports_dictionary: bool,
}

impl VendorDescriptor {
    /// Target languages default to the source table without `auto`
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        public_url: impl Into<String>,
        api_url: impl Into<String>,
        source_languages: LanguageTable,
    ) -> Self {
        let mut target_languages = source_languages.clone();
        target_languages.remove(AUTO);

        Self {
            id: id.into(),
            title: title.into(),
            public_url: public_url.into(),
            api_url: api_url.into(),
            source_languages,
            target_languages,
            max_url_length: 2048,
            max_text_length: usize::MAX,
            supports_dictionary: false,
        }
    }

    pub fn with_target_languages(mut self, target_languages: LanguageTable) -> Self {
        self.target_languages = target_languages;
        self
    }

    pub fn with_max_url_length(mut self, max_url_length: usize) -> Self {
        self.max_url_length = max_url_length;
        self
    }

    pub fn with_max_text_length(mut self, max_text_length: usize) -> Self {
        self.max_text_length = max_text_length;
        self
    }

    pub fn with_dictionary(mut self) -> Self {
        self.supports_dictionary = true;
        self
    }

    pub fn can_translate(&self, source_lang: &str, target_lang: &str) -> bool {
        self.source_languages.contains_key(source_lang)
            && self.target_languages.contains_key(target_lang)
    }

    pub fn language_name(&self, code: &str) -> Option<&str> {
        self.source_languages
            .get(code)
            .or_else(|| self.target_languages.get(code))
            .map(String::as_str)
    }
}

/// Translation backend interface
#[async_trait]
pub trait Vendor: Send + Sync {
    fn descriptor(&self) -> &VendorDescriptor;

    /// One network call to the backend, parsed into a bare result.
    ///
    /// Request metadata (vendor, original text, language pair) is stamped on
    /// by the caller afterwards.
    async fn translate_raw(
        &self,
        source_lang: &str,
        target_lang: &str,
        text: &str,
    ) -> Result<TranslationResult, TranslationError>;

    fn id(&self) -> &str {
        &self.descriptor().id
    }

    fn can_translate(&self, source_lang: &str, target_lang: &str) -> bool {
        self.descriptor().can_translate(source_lang, target_lang)
    }

    /// Streaming speech endpoint, if the backend has one
    fn audio_url(&self, _lang: &str, _text: &str) -> Option<String> {
        None
    }

    fn audio_format(&self) -> &str {
        "audio/mpeg"
    }

    /// Whether results from this backend go through the auto-swap retry
    fn use_auto_swap(&self) -> bool {
        true
    }
}
