pub mod engine;
pub mod fetch;
pub mod locale;
pub mod registry;
pub mod tts;
pub mod vendor;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use engine::{HeuristicError, SwapPlan, SwapReason, VendorHandle, plan_auto_swap};
pub use fetch::{
    Body, FetchError, HttpFetch, HttpRequest, HttpResponse, Method, ReqwestFetch, fetch_json,
    parse_json, url_with_query,
};
pub use locale::{DisplayLanguage, FixedDisplayLanguage, LocaleError, SystemDisplayLanguage, is_rtl};
pub use registry::VendorRegistry;
pub use tts::{
    AudioClip, AudioOutput, AudioTrack, PlayTicket, SpeechEngine, SpeechOptions, TtsCoordinator,
    TtsError,
    system_speech_lang,
};
pub use vendor::{LanguageTable, Vendor, VendorDescriptor, language_table};
pub use xlate_types::{LanguageCode, TranslationError, TranslationResult};
