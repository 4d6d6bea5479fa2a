//! Driven port for locale dictionaries.

use async_trait::async_trait;

use crate::domain::{Dictionary, LanguageCode};

/// Port for loading the translation dictionary of one language.
///
/// Loading never fails from the caller's point of view: adapters that cannot
/// reach their backing store answer with an empty dictionary, and lookups
/// then fall back per [`Dictionary::translate`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DictionarySource: Send + Sync {
    /// Return the dictionary for `language`.
    async fn get_dictionary(&self, language: &LanguageCode) -> Dictionary;
}

/// Fixture source that knows no translations.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDictionarySource;

#[async_trait]
impl DictionarySource for FixtureDictionarySource {
    async fn get_dictionary(&self, language: &LanguageCode) -> Dictionary {
        Dictionary::empty(language.clone())
    }
}
