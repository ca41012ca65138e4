use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use xlate_types::TranslationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn form(mut self, pairs: &[(&str, &str)]) -> Self {
        self.body = Some(Body::Form(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        self
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = Some(Body::Json(value));
        self
    }
}

/// Append url-encoded query pairs to `base`
pub fn url_with_query(base: &str, pairs: &[(&str, &str)]) -> Result<String, TranslationError> {
    reqwest::Url::parse_with_params(base, pairs)
        .map(String::from)
        .map_err(|e| TranslationError::transport(base, format!("invalid url: {e}")))
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Cross-origin HTTP capability, only available in the privileged context
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// Send `request` and decode a JSON body, folding every failure into a `TranslationError`
pub async fn fetch_json<T: DeserializeOwned>(
    fetch: &dyn HttpFetch,
    request: HttpRequest,
) -> Result<T, TranslationError> {
    let url = request.url.clone();
    let response = fetch
        .fetch(request)
        .await
        .map_err(|e| TranslationError::transport(url, e.to_string()))?;

    parse_json(response)
}

/// Non-2xx statuses are errors even when the body is valid JSON; the raw body is always kept
pub fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, TranslationError> {
    let body = response.text();
    let error = TranslationError::http(
        &response.url,
        response.status,
        &response.status_text,
        Some(body.clone()),
    );

    let value: serde_json::Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => return Err(error.with_parse_failure(e.to_string())),
    };

    if !response.is_success() {
        return Err(error);
    }

    serde_json::from_value(value).map_err(|e| error.with_parse_failure(e.to_string()))
}

/// `HttpFetch` over a shared reqwest client
#[derive(Clone)]
pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .referer(false)
            .build()
            .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        builder = match &request.body {
            Some(Body::Form(pairs)) => builder.form(pairs),
            Some(Body::Json(value)) => builder.json(value),
            None => builder,
        };

        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        let url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        tracing::debug!(%url, status = status.as_u16(), bytes = body.len(), "fetched");

        Ok(HttpResponse {
            url,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            content_type,
            body: body.to_vec(),
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_builder() {
        FetchError::InvalidRequest(e.to_string())
    } else {
        FetchError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Reply {
        text: String,
    }

    fn response(status: u16, status_text: &str, body: &str) -> HttpResponse {
        HttpResponse {
            url: "https://api.test/translate".to_string(),
            status,
            status_text: status_text.to_string(),
            content_type: Some("application/json".to_string()),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn rate_limited_json_keeps_status_and_body() {
        let body = r#"{"error":{"code":429,"message":"Too many requests"}}"#;
        let err = parse_json::<Reply>(response(429, "Too Many Requests", body)).unwrap_err();

        assert_eq!(err.status_code, 429);
        assert_eq!(err.status_text, "Too Many Requests");
        assert_eq!(err.raw_response_body.as_deref(), Some(body));
        assert_eq!(err.parse_failure_reason, None);
        assert_eq!(err.request_url, "https://api.test/translate");
    }

    #[test]
    fn html_body_reports_parse_failure() {
        let err = parse_json::<Reply>(response(200, "OK", "<html>captcha</html>")).unwrap_err();
        assert_eq!(err.status_code, 200);
        assert!(err.parse_failure_reason.is_some());
        assert_eq!(err.raw_response_body.as_deref(), Some("<html>captcha</html>"));
    }

    #[test]
    fn unexpected_shape_reports_parse_failure() {
        let err = parse_json::<Reply>(response(200, "OK", r#"{"other":1}"#)).unwrap_err();
        assert!(err.parse_failure_reason.unwrap().contains("text"));
    }

    #[test]
    fn success_decodes() {
        let reply = parse_json::<Reply>(response(200, "OK", r#"{"text":"hi"}"#)).unwrap();
        assert_eq!(reply.text, "hi");
    }

    #[test]
    fn query_pairs_are_encoded() {
        let url = url_with_query("https://api.test/t", &[("q", "a b&c"), ("tl", "en")]).unwrap();
        assert_eq!(url, "https://api.test/t?q=a+b%26c&tl=en");
    }
}
