use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use xlate_translator::fetch::fetch_json;
use xlate_translator::{HttpFetch, HttpRequest, Vendor, VendorDescriptor, language_table};
use xlate_types::{TranslationError, TranslationResult};

use crate::languages;

/// LibreTranslate instance, public or self-hosted
pub struct LibreVendor {
    fetch: Arc<dyn HttpFetch>,
    api_key: String,
    descriptor: VendorDescriptor,
}

impl LibreVendor {
    pub fn new(fetch: Arc<dyn HttpFetch>, api_url: String, api_key: String) -> Self {
        let api_url = api_url.trim_end_matches('/').to_string();
        let descriptor = VendorDescriptor::new(
            "libre",
            "LibreTranslate",
            "https://libretranslate.com",
            api_url,
            language_table(languages::LIBRE),
        )
        .with_max_text_length(2000);

        Self {
            fetch,
            api_key,
            descriptor,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibreResponse {
    translated_text: String,
    detected_language: Option<DetectedLanguage>,
}

#[derive(Debug, Deserialize)]
struct DetectedLanguage {
    language: String,
}

#[async_trait]
impl Vendor for LibreVendor {
    fn descriptor(&self) -> &VendorDescriptor {
        &self.descriptor
    }

    async fn translate_raw(
        &self,
        source_lang: &str,
        target_lang: &str,
        text: &str,
    ) -> Result<TranslationResult, TranslationError> {
        let mut body = json!({
            "q": text,
            "source": source_lang,
            "target": target_lang,
            "format": "text",
        });
        if !self.api_key.is_empty() {
            body["api_key"] = json!(self.api_key);
        }

        let request = HttpRequest::post(format!("{}/translate", self.descriptor.api_url)).json(body);
        let response: LibreResponse = fetch_json(self.fetch.as_ref(), request).await?;

        Ok(TranslationResult {
            detected_lang: response.detected_language.map(|d| d.language),
            ..TranslationResult::from_translation(response.translated_text)
        })
    }
}

#[cfg(test)]
mod tests {
    use xlate_translator::Body;
    use xlate_translator::testing::StubFetch;

    use super::*;

    #[tokio::test]
    async fn posts_json_and_reads_detection() {
        let fetch = Arc::new(StubFetch::new());
        fetch.push_json(
            200,
            json!({
                "translatedText": "Hello",
                "detectedLanguage": { "confidence": 90.0, "language": "es" }
            }),
        );

        let vendor = LibreVendor::new(fetch.clone(), "http://localhost:5000/".to_string(), "k".to_string());
        let result = vendor.translate_raw("auto", "en", "Hola").await.unwrap();

        assert_eq!(result.translation, "Hello");
        assert_eq!(result.detected_lang.as_deref(), Some("es"));

        let request = &fetch.requests()[0];
        assert_eq!(request.url, "http://localhost:5000/translate");
        let Some(Body::Json(body)) = &request.body else {
            panic!("expected json body");
        };
        assert_eq!(body["source"], "auto");
        assert_eq!(body["api_key"], "k");
    }

    #[tokio::test]
    async fn key_is_omitted_when_empty() {
        let fetch = Arc::new(StubFetch::new());
        fetch.push_json(200, json!({ "translatedText": "Hello" }));

        let vendor = LibreVendor::new(fetch.clone(), "http://localhost:5000".to_string(), String::new());
        let result = vendor.translate_raw("es", "en", "Hola").await.unwrap();

        assert_eq!(result.detected_lang, None);
        let Some(Body::Json(body)) = &fetch.requests()[0].body else {
            panic!("expected json body");
        };
        assert!(body.get("api_key").is_none());
    }

    #[tokio::test]
    async fn transport_failure_keeps_url() {
        let fetch = Arc::new(StubFetch::new());
        fetch.push_error(xlate_translator::FetchError::Timeout);

        let vendor = LibreVendor::new(fetch, "http://localhost:5000".to_string(), String::new());
        let err = vendor.translate_raw("es", "en", "Hola").await.unwrap_err();

        assert_eq!(err.status_code, 0);
        assert_eq!(err.status_text, "request timed out");
        assert_eq!(err.request_url, "http://localhost:5000/translate");
    }
}
