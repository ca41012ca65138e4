use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use xlate_translator::fetch::{fetch_json, url_with_query};
use xlate_translator::{HttpFetch, HttpRequest, Vendor, VendorDescriptor, language_table};
use xlate_types::{DictionaryEntry, Meaning, TranslationError, TranslationResult};

use crate::languages;

/// The speech endpoint refuses longer input
const MAX_TTS_TEXT: usize = 200;

/// Google Translate web endpoint, no key required
pub struct GoogleVendor {
    fetch: Arc<dyn HttpFetch>,
    descriptor: VendorDescriptor,
}

impl GoogleVendor {
    pub fn new(fetch: Arc<dyn HttpFetch>, api_url: String) -> Self {
        let api_url = api_url.trim_end_matches('/').to_string();
        let descriptor = VendorDescriptor::new(
            "google",
            "Google",
            "https://translate.google.com",
            api_url,
            language_table(languages::GOOGLE),
        )
        .with_max_url_length(2048)
        .with_max_text_length(5000)
        .with_dictionary();

        Self { fetch, descriptor }
    }

    fn endpoint(&self) -> String {
        format!("{}/translate_a/single", self.descriptor.api_url)
    }
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    sentences: Vec<Sentence>,
    #[serde(default)]
    dict: Vec<DictGroup>,
    src: Option<String>,
    spell: Option<Spell>,
}

#[derive(Debug, Deserialize)]
struct Spell {
    spell_res: Option<String>,
}

/// Either a translated chunk or the transliteration line
#[derive(Debug, Deserialize)]
struct Sentence {
    trans: Option<String>,
    src_translit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DictGroup {
    pos: String,
    #[serde(default)]
    entry: Vec<DictTerm>,
}

#[derive(Debug, Deserialize)]
struct DictTerm {
    word: String,
    #[serde(default)]
    reverse_translation: Vec<String>,
}

impl From<GoogleResponse> for TranslationResult {
    fn from(response: GoogleResponse) -> Self {
        let translation: String = response
            .sentences
            .iter()
            .filter_map(|s| s.trans.as_deref())
            .collect();

        let transcription = response
            .sentences
            .iter()
            .filter_map(|s| s.src_translit.as_deref())
            .find(|t| !t.is_empty())
            .map(str::to_string);

        let dictionary = response
            .dict
            .into_iter()
            .map(|group| DictionaryEntry {
                word_type: group.pos,
                transcription: None,
                meanings: group
                    .entry
                    .into_iter()
                    .map(|term| Meaning {
                        word: term.word,
                        translations: term.reverse_translation,
                        examples: Vec::new(),
                    })
                    .collect(),
            })
            .collect();

        let spell_correction = response
            .spell
            .and_then(|s| s.spell_res)
            .filter(|s| !s.is_empty());

        TranslationResult {
            detected_lang: response.src,
            transcription,
            spell_correction,
            dictionary,
            ..TranslationResult::from_translation(translation)
        }
    }
}

#[async_trait]
impl Vendor for GoogleVendor {
    fn descriptor(&self) -> &VendorDescriptor {
        &self.descriptor
    }

    async fn translate_raw(
        &self,
        source_lang: &str,
        target_lang: &str,
        text: &str,
    ) -> Result<TranslationResult, TranslationError> {
        let params = [
            ("client", "gtx"),
            ("dj", "1"),
            ("ie", "UTF-8"),
            ("oe", "UTF-8"),
            ("sl", source_lang),
            ("tl", target_lang),
            ("hl", target_lang),
            ("dt", "t"),
            ("dt", "bd"),
            ("dt", "rm"),
            ("dt", "qca"),
        ];

        let endpoint = self.endpoint();
        let mut get_params = params.to_vec();
        get_params.push(("q", text));
        let get_url = url_with_query(&endpoint, &get_params)?;

        let request = if get_url.len() <= self.descriptor.max_url_length {
            HttpRequest::get(get_url)
        } else {
            tracing::debug!(len = get_url.len(), "url too long, sending text as form data");
            HttpRequest::post(url_with_query(&endpoint, &params)?).form(&[("q", text)])
        };

        let response: GoogleResponse = fetch_json(self.fetch.as_ref(), request).await?;
        Ok(response.into())
    }

    fn audio_url(&self, lang: &str, text: &str) -> Option<String> {
        if text.chars().count() > MAX_TTS_TEXT {
            return None;
        }

        let endpoint = format!("{}/translate_tts", self.descriptor.api_url);
        let params = [
            ("client", "gtx"),
            ("ie", "UTF-8"),
            ("tl", lang),
            ("q", text),
        ];
        url_with_query(&endpoint, &params).ok()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use xlate_translator::testing::StubFetch;
    use xlate_translator::{Body, Method};

    use super::*;

    fn vendor(fetch: Arc<StubFetch>) -> GoogleVendor {
        GoogleVendor::new(fetch, "https://translate.googleapis.com/".to_string())
    }

    #[tokio::test]
    async fn parses_sentences_dictionary_and_detection() {
        let fetch = Arc::new(StubFetch::new());
        fetch.push_json(
            200,
            json!({
                "sentences": [
                    { "trans": "Hello, ", "orig": "Привет, " },
                    { "trans": "world", "orig": "мир" },
                    { "translit": "", "src_translit": "Privet, mir" }
                ],
                "dict": [
                    {
                        "pos": "noun",
                        "terms": ["world", "peace"],
                        "entry": [
                            { "word": "world", "reverse_translation": ["мир", "свет"], "score": 0.5 },
                            { "word": "peace", "reverse_translation": ["мир"] }
                        ]
                    }
                ],
                "src": "ru"
            }),
        );

        let result = vendor(fetch.clone())
            .translate_raw("auto", "en", "Привет, мир")
            .await
            .unwrap();

        assert_eq!(result.translation, "Hello, world");
        assert_eq!(result.detected_lang.as_deref(), Some("ru"));
        assert_eq!(result.transcription.as_deref(), Some("Privet, mir"));
        assert_eq!(result.dictionary.len(), 1);
        assert_eq!(result.dictionary[0].word_type, "noun");
        assert_eq!(result.dictionary[0].meanings[0].word, "world");
        assert_eq!(result.dictionary[0].meanings[0].translations, ["мир", "свет"]);
        assert_eq!(result.dictionary[0].meanings[1].word, "peace");

        let request = &fetch.requests()[0];
        assert_eq!(request.method, Method::Get);
        assert!(request.url.starts_with("https://translate.googleapis.com/translate_a/single?"));
        assert!(request.url.contains("sl=auto"));
        assert!(request.url.contains("tl=en"));
    }

    #[tokio::test]
    async fn spelling_suggestion_is_kept() {
        let fetch = Arc::new(StubFetch::new());
        fetch.push_json(
            200,
            json!({
                "sentences": [{ "trans": "Welt", "orig": "wrld" }],
                "spell": { "spell_html_res": "<b><i>world</i></b>", "spell_res": "world" },
                "src": "en"
            }),
        );

        let result = vendor(fetch.clone()).translate_raw("en", "de", "wrld").await.unwrap();

        assert_eq!(result.spell_correction.as_deref(), Some("world"));
        assert!(fetch.requests()[0].url.contains("dt=qca"));
    }

    #[tokio::test]
    async fn long_text_is_posted() {
        let fetch = Arc::new(StubFetch::new());
        fetch.push_json(200, json!({ "sentences": [{ "trans": "ok" }] }));
        let text = "a".repeat(3000);

        vendor(fetch.clone())
            .translate_raw("en", "ru", &text)
            .await
            .unwrap();

        let request = &fetch.requests()[0];
        assert_eq!(request.method, Method::Post);
        assert!(!request.url.contains("q="));
        assert_eq!(request.body, Some(Body::Form(vec![("q".to_string(), text)])));
    }

    #[tokio::test]
    async fn rate_limit_surfaces_status_and_body() {
        let fetch = Arc::new(StubFetch::new());
        let body = json!({ "error": { "code": 429, "message": "Too many requests" } });
        fetch.push_json(429, body.clone());

        let err = vendor(fetch).translate_raw("en", "ru", "hi").await.unwrap_err();

        assert_eq!(err.status_code, 429);
        assert_eq!(err.raw_response_body, Some(body.to_string()));
        assert!(err.request_url.contains("translate_a/single"));
    }

    #[test]
    fn audio_url_only_for_short_text() {
        let vendor = vendor(Arc::new(StubFetch::new()));
        let url = vendor.audio_url("en", "hello world").unwrap();
        assert_eq!(
            url,
            "https://translate.googleapis.com/translate_tts?client=gtx&ie=UTF-8&tl=en&q=hello+world"
        );
        assert!(vendor.audio_url("en", &"x".repeat(201)).is_none());
    }

    #[test]
    fn declares_dictionary_and_pairs() {
        let vendor = vendor(Arc::new(StubFetch::new()));
        assert!(vendor.descriptor().supports_dictionary);
        assert!(vendor.can_translate("auto", "zh-CN"));
        assert!(!vendor.can_translate("en", "auto"));
    }
}
