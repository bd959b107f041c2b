// Dictionaries updated while the input method runs: user history,
// personalization, contextual predictions and contacts.

use anyhow::{bail, Result};
use log::debug;
use parking_lot::RwLock;

use crate::lexicon::{to_suggestions, CodeIndex, CodePattern, DEFAULT_WILDCARD};
use crate::{Dictionary, DictionaryType, Locale, SuggestedWord};

pub struct DynamicDictionary {
    dictionary_type: DictionaryType,
    locale: Locale,
    // None once closed
    index: RwLock<Option<CodeIndex>>,
    wildcard: char,
    completion: bool,
}

impl DynamicDictionary {
    pub fn new(dictionary_type: DictionaryType, locale: &Locale) -> Self {
        Self {
            dictionary_type,
            locale: locale.clone(),
            index: RwLock::new(Some(CodeIndex::default())),
            wildcard: DEFAULT_WILDCARD,
            completion: true,
        }
    }

    pub fn with_wildcard(mut self, wildcard: char) -> Self {
        self.wildcard = wildcard;
        self
    }

    pub fn with_completion(mut self, completion: bool) -> Self {
        self.completion = completion;
        self
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }
}

impl Dictionary for DynamicDictionary {
    fn dictionary_type(&self) -> DictionaryType {
        self.dictionary_type
    }

    fn suggestions(&self, typed_code: &str, limit: usize) -> Vec<SuggestedWord> {
        let pattern = match CodePattern::parse(typed_code, self.wildcard, self.completion) {
            Some(p) => p,
            None => return vec![],
        };
        let guard = self.index.read();
        match guard.as_ref() {
            Some(index) => {
                to_suggestions(&index.lookup(&pattern, limit), typed_code, self.dictionary_type)
            }
            None => vec![],
        }
    }

    fn is_valid_word(&self, word: &str) -> bool {
        self.index
            .read()
            .as_ref()
            .map_or(false, |index| index.contains(word))
    }

    fn is_initialized(&self) -> bool {
        self.index.read().is_some()
    }

    fn close(&self) {
        if self.index.write().take().is_some() {
            debug!("Closed {} dictionary for {}", self.dictionary_type, self.locale);
        }
    }

    fn add_entry(&self, code: &str, word: &str) -> Result<()> {
        let mut guard = self.index.write();
        let index = match guard.as_mut() {
            Some(i) => i,
            None => bail!("{} dictionary is closed", self.dictionary_type),
        };
        index.insert(code, word);
        Ok(())
    }

    fn remove_word(&self, word: &str) -> bool {
        self.index
            .write()
            .as_mut()
            .map_or(false, |index| index.remove_word(word))
    }
}
