use serde::{Deserialize, Serialize};

use crate::types::{RequestId, TabId, TranslationError, TranslationRequest, TranslationResult};

/// Content context -> privileged context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    TranslateText(TranslatePayload),
    PlayTextToSpeech(PlayTextToSpeechPayload),
    StopTtsPlaying,
}

/// Privileged context -> one tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TabMessage {
    TranslateText(TranslateResultPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatePayload {
    pub request_id: RequestId,
    #[serde(flatten)]
    pub request: TranslationRequest,
}

/// Exactly one of `data` / `error` is set by the privileged side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResultPayload {
    pub request_id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<TranslationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TranslationError>,
}

impl TranslateResultPayload {
    pub fn new(request_id: RequestId, result: Result<TranslationResult, TranslationError>) -> Self {
        match result {
            Ok(data) => Self {
                request_id,
                data: Some(data),
                error: None,
            },
            Err(error) => Self {
                request_id,
                data: None,
                error: Some(error),
            },
        }
    }

    pub fn into_result(self) -> Result<TranslationResult, TranslationError> {
        match (self.data, self.error) {
            (_, Some(error)) => Err(error),
            (Some(data), None) => Ok(data),
            (None, None) => Err(TranslationError::transport("", "empty TRANSLATE_TEXT reply")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayTextToSpeechPayload {
    pub vendor_id: String,
    pub lang: String,
    pub text: String,
}

/// A message plus the tab it came from, as seen by the privileged dispatcher
#[derive(Debug, Clone)]
pub struct Envelope {
    pub tab_id: TabId,
    pub message: Message,
}
