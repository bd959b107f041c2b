use std::sync::Arc;

use serde::Serialize;

use crate::{Dictionary, DictionaryType, Locale, SuggestedWord};

pub const MAX_SUGGESTIONS: usize = 18;

// Whatever holds the code being typed
pub trait Composer {
    fn typed_code(&self) -> &str;
}

impl Composer for str {
    fn typed_code(&self) -> &str {
        self
    }
}

impl Composer for String {
    fn typed_code(&self) -> &str {
        self.as_str()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuggestionContext {
    pub is_beginning_of_sentence: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionResults {
    locale: Option<Locale>,
    is_beginning_of_sentence: bool,
    max_size: usize,
    words: Vec<SuggestedWord>,
    // Every candidate returned by the dictionaries, before truncation
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_suggestions: Option<Vec<SuggestedWord>>,
}

impl SuggestionResults {
    pub fn new(
        locale: Option<Locale>,
        max_size: usize,
        is_beginning_of_sentence: bool,
        keep_raw_suggestions: bool,
    ) -> Self {
        Self {
            locale,
            is_beginning_of_sentence,
            max_size,
            words: Vec::with_capacity(max_size),
            raw_suggestions: if keep_raw_suggestions {
                Some(vec![])
            } else {
                None
            },
        }
    }

    pub fn locale(&self) -> Option<&Locale> {
        self.locale.as_ref()
    }

    pub fn is_beginning_of_sentence(&self) -> bool {
        self.is_beginning_of_sentence
    }

    pub fn words(&self) -> &[SuggestedWord] {
        &self.words
    }

    pub fn raw_suggestions(&self) -> Option<&[SuggestedWord]> {
        self.raw_suggestions.as_deref()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.words.len() >= self.max_size
    }

    pub fn remaining(&self) -> usize {
        self.max_size.saturating_sub(self.words.len())
    }

    pub fn keeps_raw_suggestions(&self) -> bool {
        self.raw_suggestions.is_some()
    }

    // Append in order as many candidates as there is room for
    pub fn extend(&mut self, suggestions: Vec<SuggestedWord>) {
        if let Some(raw) = self.raw_suggestions.as_mut() {
            raw.extend(suggestions.iter().cloned());
        }
        let remaining = self.remaining();
        self.words.extend(suggestions.into_iter().take(remaining));
    }

    pub fn into_words(self) -> Vec<SuggestedWord> {
        self.words
    }
}

// Ask each dictionary in turn, in priority order, until the results are full
pub(crate) fn collect<'a>(
    dictionaries: impl Iterator<Item = (DictionaryType, &'a Arc<dyn Dictionary>)>,
    typed_code: &str,
    mut results: SuggestionResults,
) -> SuggestionResults {
    let keep_raw = results.keeps_raw_suggestions();
    for (_, dictionary) in dictionaries {
        if results.is_full() && !keep_raw {
            break;
        }
        let limit = if keep_raw {
            results.max_size
        } else {
            results.remaining()
        };
        results.extend(dictionary.suggestions(typed_code, limit));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(w: &str, source: DictionaryType, index: usize) -> SuggestedWord {
        SuggestedWord::new(w, "ab", "ab", source, index)
    }

    #[test]
    fn test_composer_for_strings() {
        assert_eq!("wq".typed_code(), "wq");
        assert_eq!(String::from("wqvb").typed_code(), "wqvb");
    }

    #[test]
    fn test_results_are_capped() {
        let mut results = SuggestionResults::new(None, 2, false, false);
        results.extend(vec![
            word("a", DictionaryType::Main, 0),
            word("b", DictionaryType::Main, 1),
            word("c", DictionaryType::Main, 2),
        ]);

        assert!(results.is_full());
        assert_eq!(results.remaining(), 0);
        let words: Vec<_> = results.words().iter().map(|s| s.word.as_str()).collect();
        assert_eq!(words, &["a", "b"]);
        assert!(results.raw_suggestions().is_none());
    }

    #[test]
    fn test_raw_suggestions_are_not_truncated() {
        let mut results = SuggestionResults::new(None, 1, true, true);
        results.extend(vec![
            word("a", DictionaryType::Main, 0),
            word("b", DictionaryType::Main, 1),
        ]);

        assert_eq!(results.len(), 1);
        assert_eq!(results.raw_suggestions().map(|r| r.len()), Some(2));
        assert!(results.is_beginning_of_sentence());
    }

    #[test]
    fn test_serialize_results() {
        let mut results =
            SuggestionResults::new(Some(Locale::simplified_chinese()), 18, false, false);
        results.extend(vec![word("工", DictionaryType::Main, 0)]);

        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json["locale"], "zh_CN");
        assert_eq!(json["words"][0]["word"], "工");
        assert_eq!(json["words"][0]["source"], "main");
        assert_eq!(json["words"][0]["kind"], "correction");
        assert!(json.get("raw_suggestions").is_none());
    }
}
