use std::env;

use xlate_types::LanguageCode;

#[derive(Debug, thiserror::Error)]
pub enum LocaleError {
    #[error("no display language set (checked {0})")]
    Unavailable(String),

    #[error("malformed language tag: {0:?}")]
    Malformed(String),
}

/// The user's preferred display language, as a bare primary subtag ("en", "pt")
pub trait DisplayLanguage: Send + Sync {
    fn display_language(&self) -> Result<LanguageCode, LocaleError>;
}

/// Configured display language
pub struct FixedDisplayLanguage(String);

impl FixedDisplayLanguage {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

impl DisplayLanguage for FixedDisplayLanguage {
    fn display_language(&self) -> Result<LanguageCode, LocaleError> {
        primary_subtag(&self.0)
    }
}

/// Reads the POSIX locale variables on every call
pub struct SystemDisplayLanguage;

const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

impl DisplayLanguage for SystemDisplayLanguage {
    fn display_language(&self) -> Result<LanguageCode, LocaleError> {
        let tag = LOCALE_VARS
            .iter()
            .filter_map(|key| env::var(key).ok())
            .find(|v| !v.is_empty() && v != "C" && v != "POSIX")
            .ok_or_else(|| LocaleError::Unavailable(LOCALE_VARS.join(", ")))?;

        primary_subtag(&tag)
    }
}

/// "en-US", "en_US.UTF-8", "pt_BR@euro" -> "en" / "pt"
pub fn primary_subtag(tag: &str) -> Result<LanguageCode, LocaleError> {
    let primary = tag
        .split(['-', '_', '.', '@'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    let valid = (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic());
    if !valid {
        return Err(LocaleError::Malformed(tag.to_string()));
    }

    Ok(primary)
}

/// Scripts written right to left
pub fn is_rtl(lang: &str) -> bool {
    matches!(lang, "ar" | "he" | "iw" | "fa" | "ur")
}
