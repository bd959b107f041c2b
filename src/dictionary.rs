use std::fmt::Display;
use std::sync::Arc;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DictionaryType {
    Main,
    UserHistory,
    Personalization,
    User,
    Contacts,
    Contextual,
}

impl DictionaryType {
    // Order in which dictionaries are asked for suggestions
    pub const ORDERED: [DictionaryType; 6] = [
        DictionaryType::Main,
        DictionaryType::UserHistory,
        DictionaryType::Personalization,
        DictionaryType::User,
        DictionaryType::Contacts,
        DictionaryType::Contextual,
    ];

    // Everything but the main dictionary
    pub const SUB_TYPES: [DictionaryType; 5] = [
        DictionaryType::UserHistory,
        DictionaryType::Personalization,
        DictionaryType::User,
        DictionaryType::Contacts,
        DictionaryType::Contextual,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DictionaryType::Main => "main",
            DictionaryType::UserHistory => "history",
            DictionaryType::Personalization => "personalization",
            DictionaryType::User => "user",
            DictionaryType::Contacts => "contacts",
            DictionaryType::Contextual => "contextual",
        }
    }
}

impl Display for DictionaryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    // The code of the word is exactly the typed code
    Correction,
    // The code of the word starts with the typed code
    Completion,
}

pub const MAX_SCORE: i32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestedWord {
    pub word: String,
    pub code: String,
    pub score: i32,
    pub kind: SuggestionKind,
    pub source: DictionaryType,
    pub index: usize,
}

impl SuggestedWord {
    pub fn new(
        word: &str,
        code: &str,
        typed_code: &str,
        source: DictionaryType,
        index: usize,
    ) -> Self {
        let kind = if code.len() == typed_code.len() {
            SuggestionKind::Correction
        } else {
            SuggestionKind::Completion
        };
        let score = MAX_SCORE.saturating_sub(i32::try_from(index).unwrap_or(i32::MAX));
        Self {
            word: word.to_string(),
            code: code.to_string(),
            score,
            kind,
            source,
            index,
        }
    }
}

pub trait Dictionary: Send + Sync {
    fn dictionary_type(&self) -> DictionaryType;

    // Candidates for the typed code, best first, at most `limit` of them
    fn suggestions(&self, typed_code: &str, limit: usize) -> Vec<SuggestedWord>;

    // Is the word found in the dictionary, whatever its code?
    fn is_valid_word(&self, word: &str) -> bool;

    // Has the backing data been loaded?
    fn is_initialized(&self) -> bool;

    // Release the backing data. Calling it twice is harmless
    fn close(&self);

    fn add_entry(&self, _code: &str, _word: &str) -> Result<()> {
        bail!("{} dictionary is read-only", self.dictionary_type())
    }

    // Returns true if the word was present
    fn remove_word(&self, _word: &str) -> bool {
        false
    }
}

// Do both handles point to the same dictionary instance?
pub fn same_dictionary(a: &Arc<dyn Dictionary>, b: &Arc<dyn Dictionary>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

#[cfg(test)]
mod tests;
