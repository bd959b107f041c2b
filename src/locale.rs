use std::fmt::Display;

use anyhow::{bail, Result};
use regex::Regex;
use serde::{Serialize, Serializer};

lazy_static! {
    static ref LOCALE_RE: Regex = Regex::new(r"^([A-Za-z]{2,3})(?:[_-]([A-Za-z]{2}|[0-9]{3}))?$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    language: String,
    country: Option<String>,
}

impl Locale {
    pub fn new(tag: &str) -> Result<Self> {
        let captures = match LOCALE_RE.captures(tag.trim()) {
            Some(c) => c,
            None => bail!("'{}' is not a valid locale tag", tag),
        };
        let language = captures[1].to_lowercase();
        let country = captures.get(2).map(|m| m.as_str().to_uppercase());
        Ok(Self { language, country })
    }

    pub fn simplified_chinese() -> Self {
        Self {
            language: "zh".to_string(),
            country: Some("CN".to_string()),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    // Lower-case `word` using the casing rules of this locale
    pub fn to_lowercase(&self, word: &str) -> String {
        match self.language.as_str() {
            // Dotted and dotless i are distinct letters in these languages
            "tr" | "az" => {
                let mut res = String::with_capacity(word.len());
                for c in word.chars() {
                    match c {
                        'I' => res.push('ı'),
                        'İ' => res.push('i'),
                        _ => res.extend(c.to_lowercase()),
                    }
                }
                res
            }
            _ => word.to_lowercase(),
        }
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.country {
            Some(c) => write!(f, "{}_{}", self.language, c),
            None => write!(f, "{}", self.language),
        }
    }
}

impl Serialize for Locale {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locale_tags() {
        assert_eq!(Locale::new("zh_CN").unwrap(), Locale::simplified_chinese());
        assert_eq!(Locale::new("zh-cn").unwrap(), Locale::simplified_chinese());

        let english = Locale::new("en").unwrap();
        assert_eq!(english.language(), "en");
        assert_eq!(english.country(), None);
        assert_eq!(english.to_string(), "en");
    }

    #[test]
    fn test_reject_invalid_tags() {
        assert!(Locale::new("").is_err());
        assert!(Locale::new("zh_CN.UTF-8").is_err());
        assert!(Locale::new("../etc").is_err());
    }

    #[test]
    fn test_locale_aware_lowercase() {
        let english = Locale::new("en_US").unwrap();
        assert_eq!(english.to_lowercase("CAT"), "cat");

        let turkish = Locale::new("tr_TR").unwrap();
        assert_eq!(turkish.to_lowercase("KIRMIZI"), "kırmızı");
        assert_eq!(turkish.to_lowercase("İSTANBUL"), "istanbul");
    }
}
