//! Translation dictionaries consumed by views.
//!
//! The locale collaborator owns the copy; the core only guarantees that a
//! lookup never fails. Missing keys resolve to a caller-supplied fallback or
//! to the empty string.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Language code used to select a dictionary (for example `en` or `pt-BR`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

/// Validation errors returned by [`LanguageCode::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageCodeValidationError {
    Empty,
    InvalidCharacters { code: String },
}

impl fmt::Display for LanguageCodeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "language code must not be empty"),
            Self::InvalidCharacters { code } => {
                write!(
                    f,
                    "language code '{code}' may only contain ASCII letters and hyphens"
                )
            }
        }
    }
}

impl std::error::Error for LanguageCodeValidationError {}

impl LanguageCode {
    /// Validate and construct a language code.
    ///
    /// # Examples
    /// ```
    /// use portal::domain::LanguageCode;
    ///
    /// assert_eq!(LanguageCode::new("pt-BR").expect("valid").as_ref(), "pt-BR");
    /// assert!(LanguageCode::new("../etc").is_err());
    /// ```
    pub fn new(raw: impl Into<String>) -> Result<Self, LanguageCodeValidationError> {
        let code = raw.into();
        if code.trim().is_empty() {
            return Err(LanguageCodeValidationError::Empty);
        }
        let valid = code.chars().all(|ch| ch.is_ascii_alphabetic() || ch == '-')
            && !code.starts_with('-')
            && !code.ends_with('-');
        if !valid {
            return Err(LanguageCodeValidationError::InvalidCharacters { code });
        }
        Ok(Self(code))
    }
}

impl AsRef<str> for LanguageCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = LanguageCodeValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LanguageCode> for String {
    fn from(value: LanguageCode) -> Self {
        value.0
    }
}

/// Translation keys mapped to strings for one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    language: LanguageCode,
    entries: BTreeMap<String, String>,
}

impl Dictionary {
    /// Build a dictionary from loaded entries.
    pub fn new(language: LanguageCode, entries: BTreeMap<String, String>) -> Self {
        Self { language, entries }
    }

    /// Dictionary with no entries; every lookup falls back.
    pub fn empty(language: LanguageCode) -> Self {
        Self::new(language, BTreeMap::new())
    }

    /// Language the entries belong to.
    pub fn language(&self) -> &LanguageCode {
        &self.language
    }

    /// Number of loaded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries were loaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `key`, returning the empty string when it is missing.
    ///
    /// # Examples
    /// ```
    /// use std::collections::BTreeMap;
    /// use portal::domain::{Dictionary, LanguageCode};
    ///
    /// let en = LanguageCode::new("en").expect("valid");
    /// let dict = Dictionary::new(
    ///     en,
    ///     BTreeMap::from([("stock.title".to_owned(), "Blood stock".to_owned())]),
    /// );
    /// assert_eq!(dict.translate("stock.title"), "Blood stock");
    /// assert_eq!(dict.translate("missing.key"), "");
    /// ```
    pub fn translate(&self, key: &str) -> &str {
        self.translate_or(key, "")
    }

    /// Look up `key`, returning `fallback` when it is missing.
    pub fn translate_or<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.entries.get(key).map_or(fallback, String::as_str)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for dictionary lookup and language code validation.

    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn english() -> Dictionary {
        Dictionary::new(
            LanguageCode::new("en").expect("valid code"),
            BTreeMap::from([
                ("request.urgent".to_owned(), "Urgent".to_owned()),
                ("stock.empty".to_owned(), String::new()),
            ]),
        )
    }

    #[rstest]
    fn known_keys_translate(english: Dictionary) {
        assert_eq!(english.translate("request.urgent"), "Urgent");
        assert_eq!(english.len(), 2);
    }

    #[rstest]
    fn missing_keys_fall_back(english: Dictionary) {
        assert_eq!(english.translate("request.unknown"), "");
        assert_eq!(english.translate_or("request.unknown", "Unknown"), "Unknown");
    }

    #[rstest]
    fn present_but_empty_values_are_returned_as_is(english: Dictionary) {
        assert_eq!(english.translate_or("stock.empty", "fallback"), "");
    }

    #[rstest]
    #[case("")]
    #[case("  ")]
    #[case("en_GB")]
    #[case("-en")]
    #[case("en/")]
    fn invalid_language_codes_are_rejected(#[case] raw: &str) {
        assert!(LanguageCode::new(raw).is_err());
    }
}
