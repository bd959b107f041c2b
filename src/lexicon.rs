use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use parking_lot::RwLock;

use crate::{Dictionary, DictionaryType, SuggestedWord};

pub const DEFAULT_WILDCARD: char = 'z';

// A small sample of Wubi 86 codes, used when no lexicon file is configured
pub const BUNDLED_LEXICON: &str = include_str!("../data/wubi.txt");

// What the user typed, ready to be matched against codes.
// `None` stands for the wildcard key, which matches any single character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodePattern {
    symbols: Vec<Option<char>>,
    completion: bool,
}

impl CodePattern {
    // Returns None when the code can not match anything
    pub fn parse(code: &str, wildcard: char, completion: bool) -> Option<Self> {
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphabetic() || c == wildcard) {
            return None;
        }
        let symbols = code
            .chars()
            .map(|c| if c == wildcard { None } else { Some(c) })
            .collect();
        Some(Self {
            symbols,
            completion,
        })
    }

    // The part of the code before the first wildcard
    pub fn literal_prefix(&self) -> String {
        self.symbols.iter().map_while(|s| *s).collect()
    }

    pub fn matches(&self, code: &str) -> bool {
        let mut chars = code.chars();
        for symbol in &self.symbols {
            match (chars.next(), symbol) {
                (None, _) => return false,
                (Some(_), None) => (),
                (Some(c), Some(s)) if c == *s => (),
                _ => return false,
            }
        }
        self.completion || chars.next().is_none()
    }

    // Pattern for a SQL LIKE clause
    pub fn to_like_pattern(&self) -> String {
        let mut res: String = self
            .symbols
            .iter()
            .map(|s| s.unwrap_or('_'))
            .collect();
        if self.completion {
            res.push('%');
        }
        res
    }
}

// Parse a lexicon in the `code word [word]*` format.
// Words of a given code keep the order of the source.
pub fn parse_lexicon(reader: impl BufRead) -> Result<CodeIndex> {
    let mut index = CodeIndex::default();
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Could not read lexicon line {}", i + 1))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let code = match fields.next() {
            Some(c) => c,
            None => continue,
        };
        let mut words = fields.peekable();
        if words.peek().is_none() {
            warn!("Lexicon line {}: no word for code '{}'", i + 1, code);
            continue;
        }
        for word in words {
            index.insert(code, word);
        }
    }
    Ok(index)
}

// Read the lexicon at `path`, or the bundled one
pub fn read_lexicon(path: Option<&Path>) -> Result<CodeIndex> {
    match path {
        Some(p) => {
            let file = File::open(p)
                .with_context(|| format!("Could not open lexicon {}", p.display()))?;
            parse_lexicon(BufReader::new(file))
                .with_context(|| format!("Could not parse lexicon {}", p.display()))
        }
        None => parse_lexicon(BUNDLED_LEXICON.as_bytes()),
    }
}

#[derive(Debug, Default, Clone)]
pub struct CodeIndex {
    entries: BTreeMap<String, Vec<String>>,
    words: HashSet<String>,
}

impl CodeIndex {
    pub fn insert(&mut self, code: &str, word: &str) {
        self.entries
            .entry(code.to_string())
            .or_default()
            .push(word.to_string());
        self.words.insert(word.to_string());
    }

    pub fn remove_word(&mut self, word: &str) -> bool {
        if !self.words.remove(word) {
            return false;
        }
        self.entries.retain(|_, words| {
            words.retain(|w| w != word);
            !words.is_empty()
        });
        true
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn num_codes(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // (code, word) pairs in ascending code order, source order within a code
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(code, words)| words.iter().map(move |w| (code.as_str(), w.as_str())))
    }

    pub fn lookup(&self, pattern: &CodePattern, limit: usize) -> Vec<(&str, &str)> {
        let prefix = pattern.literal_prefix();
        self.entries
            .range(prefix.clone()..)
            .take_while(|(code, _)| code.starts_with(&prefix))
            .filter(|(code, _)| pattern.matches(code))
            .flat_map(|(code, words)| words.iter().map(move |w| (code.as_str(), w.as_str())))
            .take(limit)
            .collect()
    }
}

pub(crate) fn to_suggestions(
    matches: &[(&str, &str)],
    typed_code: &str,
    source: DictionaryType,
) -> Vec<SuggestedWord> {
    matches
        .iter()
        .enumerate()
        .map(|(i, (code, word))| SuggestedWord::new(word, code, typed_code, source, i))
        .collect()
}

// The main lexicon, fully loaded in memory
pub struct StaticLexicon {
    dictionary_type: DictionaryType,
    index: RwLock<Option<Arc<CodeIndex>>>,
    wildcard: char,
    completion: bool,
}

impl StaticLexicon {
    pub fn new(dictionary_type: DictionaryType, index: CodeIndex) -> Self {
        Self {
            dictionary_type,
            index: RwLock::new(Some(Arc::new(index))),
            wildcard: DEFAULT_WILDCARD,
            completion: true,
        }
    }

    pub fn from_reader(dictionary_type: DictionaryType, reader: impl BufRead) -> Result<Self> {
        let index = parse_lexicon(reader)?;
        debug!("Loaded {} codes for {} dictionary", index.num_codes(), dictionary_type);
        Ok(Self::new(dictionary_type, index))
    }

    pub fn from_path(dictionary_type: DictionaryType, path: &Path) -> Result<Self> {
        let index = read_lexicon(Some(path))?;
        info!("Read {} codes from {}", index.num_codes(), path.display());
        Ok(Self::new(dictionary_type, index))
    }

    pub fn bundled(dictionary_type: DictionaryType) -> Result<Self> {
        Self::from_reader(dictionary_type, BUNDLED_LEXICON.as_bytes())
    }

    pub fn with_wildcard(mut self, wildcard: char) -> Self {
        self.wildcard = wildcard;
        self
    }

    pub fn with_completion(mut self, completion: bool) -> Self {
        self.completion = completion;
        self
    }

    fn snapshot(&self) -> Option<Arc<CodeIndex>> {
        self.index.read().clone()
    }
}

impl Dictionary for StaticLexicon {
    fn dictionary_type(&self) -> DictionaryType {
        self.dictionary_type
    }

    fn suggestions(&self, typed_code: &str, limit: usize) -> Vec<SuggestedWord> {
        let index = match self.snapshot() {
            Some(i) => i,
            None => return vec![],
        };
        let pattern = match CodePattern::parse(typed_code, self.wildcard, self.completion) {
            Some(p) => p,
            None => return vec![],
        };
        let matches = index.lookup(&pattern, limit);
        to_suggestions(&matches, typed_code, self.dictionary_type)
    }

    fn is_valid_word(&self, word: &str) -> bool {
        self.snapshot().map_or(false, |i| i.contains(word))
    }

    fn is_initialized(&self) -> bool {
        self.index.read().is_some()
    }

    fn close(&self) {
        self.index.write().take();
    }
}
