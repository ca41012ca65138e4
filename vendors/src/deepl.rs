use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use xlate_translator::fetch::fetch_json;
use xlate_translator::{HttpFetch, HttpRequest, Vendor, VendorDescriptor, language_table};
use xlate_types::{AUTO, TranslationError, TranslationResult};

use crate::languages;

/// DeepL API, needs an auth key
pub struct DeeplVendor {
    fetch: Arc<dyn HttpFetch>,
    api_key: String,
    descriptor: VendorDescriptor,
}

impl DeeplVendor {
    pub fn new(fetch: Arc<dyn HttpFetch>, api_key: String, api_url: String) -> Self {
        let descriptor = VendorDescriptor::new(
            "deepl",
            "DeepL",
            "https://www.deepl.com/translator",
            api_url,
            language_table(languages::DEEPL),
        )
        .with_max_text_length(30_000);

        Self {
            fetch,
            api_key,
            descriptor,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeeplResponse {
    translations: Vec<DeeplTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeeplTranslation {
    text: String,
    detected_source_language: Option<String>,
}

#[async_trait]
impl Vendor for DeeplVendor {
    fn descriptor(&self) -> &VendorDescriptor {
        &self.descriptor
    }

    async fn translate_raw(
        &self,
        source_lang: &str,
        target_lang: &str,
        text: &str,
    ) -> Result<TranslationResult, TranslationError> {
        let api_url = &self.descriptor.api_url;
        if self.api_key.is_empty() {
            return Err(TranslationError::transport(api_url, "DeepL API key is not configured"));
        }

        let source = source_lang.to_uppercase();
        let target = target_lang.to_uppercase();
        let mut params = vec![("text", text), ("target_lang", target.as_str())];
        if source_lang != AUTO {
            params.push(("source_lang", source.as_str()));
        }

        let request = HttpRequest::post(api_url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .form(&params);

        let response: DeeplResponse = fetch_json(self.fetch.as_ref(), request).await?;

        let translation = response.translations.into_iter().next().ok_or_else(|| {
            TranslationError::http(api_url, 200, "OK", None).with_parse_failure("no translation in response")
        })?;

        Ok(TranslationResult {
            detected_lang: translation
                .detected_source_language
                .map(|lang| lang.to_lowercase()),
            ..TranslationResult::from_translation(translation.text)
        })
    }
}
