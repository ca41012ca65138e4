pub mod message;
pub mod types;

pub use message::{
    Envelope, Message, PlayTextToSpeechPayload, TabMessage, TranslatePayload,
    TranslateResultPayload,
};
pub use types::{
    AUTO, DictionaryEntry, LanguageCode, Meaning, RequestId, TabId, TranslationError,
    TranslationRequest, TranslationResult,
};
