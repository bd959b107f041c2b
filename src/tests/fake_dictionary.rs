use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::{Dictionary, DictionaryType, Locale, SuggestedWord};

// Exact code matches only, in insertion order
pub(crate) struct FakeDictionary {
    dictionary_type: DictionaryType,
    locale: Locale,
    entries: RwLock<Vec<(String, String)>>,
    close_count: AtomicUsize,
}

impl FakeDictionary {
    pub(crate) fn new(dictionary_type: DictionaryType, locale: &Locale) -> Self {
        Self {
            dictionary_type,
            locale: locale.clone(),
            entries: RwLock::new(vec![]),
            close_count: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_entry(self, code: &str, word: &str) -> Self {
        self.entries
            .write()
            .push((code.to_string(), word.to_string()));
        self
    }

    pub(crate) fn locale(&self) -> &Locale {
        &self.locale
    }

    pub(crate) fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.close_count() > 0
    }
}

impl Dictionary for FakeDictionary {
    fn dictionary_type(&self) -> DictionaryType {
        self.dictionary_type
    }

    fn suggestions(&self, typed_code: &str, limit: usize) -> Vec<SuggestedWord> {
        if self.is_closed() {
            return vec![];
        }
        self.entries
            .read()
            .iter()
            .filter(|(code, _)| code == typed_code)
            .take(limit)
            .enumerate()
            .map(|(i, (code, word))| {
                SuggestedWord::new(word, code, typed_code, self.dictionary_type, i)
            })
            .collect()
    }

    fn is_valid_word(&self, word: &str) -> bool {
        !self.is_closed() && self.entries.read().iter().any(|(_, w)| w == word)
    }

    fn is_initialized(&self) -> bool {
        !self.is_closed()
    }

    fn close(&self) {
        self.close_count.fetch_add(1, Ordering::SeqCst);
    }
}
