//! Scripted stand-ins for the network and for backends.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use xlate_types::{TranslationError, TranslationResult};

use crate::fetch::{FetchError, HttpFetch, HttpRequest, HttpResponse};
use crate::vendor::{Vendor, VendorDescriptor, language_table};

/// Replays queued responses in order and records every request
#[derive(Default)]
pub struct StubFetch {
    responses: Mutex<VecDeque<Result<StubResponse, FetchError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

struct StubResponse {
    status: u16,
    status_text: String,
    content_type: Option<String>,
    body: Vec<u8>,
}

impl StubFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, status: u16, value: serde_json::Value) -> &Self {
        self.push_body(status, Some("application/json"), value.to_string().into_bytes())
    }

    pub fn push_text(&self, status: u16, body: &str) -> &Self {
        self.push_body(status, Some("text/plain"), body.as_bytes().to_vec())
    }

    pub fn push_body(&self, status: u16, content_type: Option<&str>, body: Vec<u8>) -> &Self {
        let status_text = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();

        self.responses.lock().unwrap().push_back(Ok(StubResponse {
            status,
            status_text,
            content_type: content_type.map(str::to_string),
            body,
        }));
        self
    }

    pub fn push_error(&self, error: FetchError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpFetch for StubFetch {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Network(format!("no scripted response for {url}"))));

        next.map(|r| HttpResponse {
            url,
            status: r.status,
            status_text: r.status_text,
            content_type: r.content_type,
            body: r.body,
        })
    }
}

/// Backend answering from a queue; once the queue is empty it echoes
/// `"[<target>] <text>"` without a detected language
pub struct StubVendor {
    descriptor: VendorDescriptor,
    replies: Mutex<VecDeque<Result<TranslationResult, TranslationError>>>,
    calls: Mutex<Vec<(String, String, String)>>,
    streams_audio: bool,
    auto_swap: bool,
}

impl StubVendor {
    pub fn new(id: &str, languages: &[&str]) -> Self {
        let table: Vec<(&str, &str)> = languages.iter().map(|l| (*l, *l)).collect();
        let descriptor = VendorDescriptor::new(
            id,
            id.to_uppercase(),
            format!("https://{id}.test"),
            format!("https://api.{id}.test/translate"),
            language_table(&table),
        );

        Self {
            descriptor,
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            streams_audio: false,
            auto_swap: true,
        }
    }

    pub fn with_max_text_length(mut self, max: usize) -> Self {
        self.descriptor = self.descriptor.with_max_text_length(max);
        self
    }

    pub fn with_audio(mut self) -> Self {
        self.streams_audio = true;
        self
    }

    pub fn without_auto_swap(mut self) -> Self {
        self.auto_swap = false;
        self
    }

    pub fn reply(self, reply: Result<TranslationResult, TranslationError>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    /// Bare result with an optional detected language
    pub fn result(translation: &str, detected: Option<&str>) -> TranslationResult {
        TranslationResult {
            detected_lang: detected.map(str::to_string),
            ..TranslationResult::from_translation(translation)
        }
    }

    /// (source, target, text) of every raw call
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Vendor for StubVendor {
    fn descriptor(&self) -> &VendorDescriptor {
        &self.descriptor
    }

    async fn translate_raw(
        &self,
        source_lang: &str,
        target_lang: &str,
        text: &str,
    ) -> Result<TranslationResult, TranslationError> {
        self.calls.lock().unwrap().push((
            source_lang.to_string(),
            target_lang.to_string(),
            text.to_string(),
        ));

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(TranslationResult::from_translation(format!("[{target_lang}] {text}"))))
    }

    fn audio_url(&self, lang: &str, text: &str) -> Option<String> {
        self.streams_audio
            .then(|| format!("https://audio.{}.test/tts?tl={lang}&q={text}", self.descriptor.id))
    }

    fn use_auto_swap(&self) -> bool {
        self.auto_swap
    }
}
