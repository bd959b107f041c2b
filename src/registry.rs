use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, ensure, Result};
use log::info;

use crate::config::{Backend, Settings};
use crate::lexicon::read_lexicon;
use crate::sql::default_db_path;
use crate::{Dictionary, DictionaryType, DynamicDictionary, Locale, SqlDictionary, StaticLexicon};

pub type MainFactory = dyn Fn(&Locale) -> Result<Arc<dyn Dictionary>> + Send + Sync;
// Sub dictionaries also get a name prefix, used for the files they may own
pub type SubFactory = dyn Fn(&Locale, &str) -> Result<Arc<dyn Dictionary>> + Send + Sync;

// Knows how to build each kind of dictionary
#[derive(Default)]
pub struct DictionaryRegistry {
    main: Option<Box<MainFactory>>,
    subs: HashMap<DictionaryType, Box<SubFactory>>,
}

impl DictionaryRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_main<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Locale) -> Result<Arc<dyn Dictionary>> + Send + Sync + 'static,
    {
        self.main = Some(Box::new(factory));
        self
    }

    pub fn with_sub<F>(mut self, dictionary_type: DictionaryType, factory: F) -> Self
    where
        F: Fn(&Locale, &str) -> Result<Arc<dyn Dictionary>> + Send + Sync + 'static,
    {
        match dictionary_type {
            DictionaryType::Main => {
                self.main = Some(Box::new(move |locale: &Locale| factory(locale, "")));
            }
            _ => {
                self.subs.insert(dictionary_type, Box::new(factory));
            }
        }
        self
    }

    pub fn has(&self, dictionary_type: DictionaryType) -> bool {
        match dictionary_type {
            DictionaryType::Main => self.main.is_some(),
            _ => self.subs.contains_key(&dictionary_type),
        }
    }

    pub fn create_main(&self, locale: &Locale) -> Result<Arc<dyn Dictionary>> {
        let factory = self
            .main
            .as_ref()
            .ok_or_else(|| anyhow!("No main dictionary registered"))?;
        factory(locale)
    }

    pub fn create_sub(
        &self,
        dictionary_type: DictionaryType,
        locale: &Locale,
        prefix: &str,
    ) -> Result<Arc<dyn Dictionary>> {
        let factory = self
            .subs
            .get(&dictionary_type)
            .ok_or_else(|| anyhow!("No {} dictionary registered", dictionary_type))?;
        factory(locale, prefix)
    }

    // The dictionaries used by the wubinput binary
    pub fn from_settings(settings: &Settings) -> Self {
        let main_settings = settings.clone();
        let mut registry =
            Self::new().with_main(move |locale: &Locale| open_main(&main_settings, locale));

        let user_settings = settings.clone();
        registry = registry.with_sub(DictionaryType::User, move |locale: &Locale, prefix: &str| {
            check_prefix(prefix)?;
            let data_dir = user_settings.data_dir()?;
            let url = default_db_path(&data_dir, &format!("{}user_{}", prefix, locale))?;
            let dictionary = SqlDictionary::open(DictionaryType::User, &url)?
                .with_wildcard(user_settings.wildcard)
                .with_completion(user_settings.completion);
            Ok(Arc::new(dictionary))
        });

        for dictionary_type in [
            DictionaryType::UserHistory,
            DictionaryType::Personalization,
            DictionaryType::Contacts,
            DictionaryType::Contextual,
        ] {
            let wildcard = settings.wildcard;
            let completion = settings.completion;
            registry = registry.with_sub(dictionary_type, move |locale: &Locale, _prefix: &str| {
                Ok(Arc::new(
                    DynamicDictionary::new(dictionary_type, locale)
                        .with_wildcard(wildcard)
                        .with_completion(completion),
                ))
            });
        }
        registry
    }
}

// The prefix ends up in a file name inside the data directory
fn check_prefix(prefix: &str) -> Result<()> {
    ensure!(
        prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
        "Invalid dictionary name prefix: {:?}",
        prefix
    );
    Ok(())
}

// The main lexicon only exists for the configured locale
fn open_main(settings: &Settings, locale: &Locale) -> Result<Arc<dyn Dictionary>> {
    let main_locale = settings.main_locale()?;
    ensure!(*locale == main_locale, "No main lexicon for {}", locale);
    match settings.backend {
        Backend::Memory => {
            let index = read_lexicon(settings.lexicon_path.as_deref())?;
            info!("Loaded {} codes for {}", index.num_codes(), locale);
            let lexicon = StaticLexicon::new(DictionaryType::Main, index)
                .with_wildcard(settings.wildcard)
                .with_completion(settings.completion);
            Ok(Arc::new(lexicon))
        }
        Backend::Sqlite => {
            let dictionary = open_main_db(settings, locale)?;
            dictionary.populate_if_needed(|| read_lexicon(settings.lexicon_path.as_deref()))?;
            Ok(Arc::new(dictionary))
        }
    }
}

pub fn open_main_db(settings: &Settings, locale: &Locale) -> Result<SqlDictionary> {
    let data_dir = settings.data_dir()?;
    let url = default_db_path(&data_dir, &format!("main_{}", locale))?;
    Ok(SqlDictionary::open(DictionaryType::Main, &url)?
        .with_wildcard(settings.wildcard)
        .with_completion(settings.completion))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings(temp_dir: &TempDir, backend: Backend) -> Settings {
        Settings {
            data_dir: Some(temp_dir.path().to_path_buf()),
            backend,
            ..Default::default()
        }
    }

    fn words(dictionary: &dyn Dictionary, code: &str) -> Vec<String> {
        dictionary
            .suggestions(code, 10)
            .into_iter()
            .map(|s| s.word)
            .collect()
    }

    #[test]
    fn test_empty_registry() {
        let registry = DictionaryRegistry::new();
        let locale = Locale::simplified_chinese();

        assert!(!registry.has(DictionaryType::Main));
        assert!(registry.create_main(&locale).is_err());
        assert!(registry
            .create_sub(DictionaryType::User, &locale, "")
            .is_err());
    }

    #[test]
    fn test_main_registered_as_sub() {
        let registry = DictionaryRegistry::new().with_sub(DictionaryType::Main, |locale, _| {
            Ok(Arc::new(DynamicDictionary::new(DictionaryType::Main, locale)))
        });

        assert!(registry.has(DictionaryType::Main));
        let main = registry.create_main(&Locale::simplified_chinese()).unwrap();
        assert_eq!(main.dictionary_type(), DictionaryType::Main);
    }

    #[test]
    fn test_memory_main_dictionary() {
        let temp_dir = TempDir::new().unwrap();
        let registry = DictionaryRegistry::from_settings(&settings(&temp_dir, Backend::Memory));

        let main = registry.create_main(&Locale::simplified_chinese()).unwrap();

        assert!(main.is_initialized());
        assert_eq!(words(main.as_ref(), "wqvb"), &["你好"]);
    }

    #[test]
    fn test_sqlite_main_dictionary() {
        let temp_dir = TempDir::new().unwrap();
        let registry = DictionaryRegistry::from_settings(&settings(&temp_dir, Backend::Sqlite));

        let main = registry.create_main(&Locale::simplified_chinese()).unwrap();

        assert_eq!(words(main.as_ref(), "wqvb"), &["你好"]);
        assert!(temp_dir.path().join("main_zh_CN.db").exists());
    }

    #[test]
    fn test_no_main_dictionary_for_other_locales() {
        let temp_dir = TempDir::new().unwrap();
        let registry = DictionaryRegistry::from_settings(&settings(&temp_dir, Backend::Memory));

        assert!(registry.create_main(&Locale::new("en_US").unwrap()).is_err());
    }

    #[test]
    fn test_user_dictionary_file_uses_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let registry = DictionaryRegistry::from_settings(&settings(&temp_dir, Backend::Memory));

        let user = registry
            .create_sub(DictionaryType::User, &Locale::simplified_chinese(), "test_")
            .unwrap();
        user.add_entry("wq", "你").unwrap();

        assert_eq!(user.dictionary_type(), DictionaryType::User);
        assert!(temp_dir.path().join("test_user_zh_CN.db").exists());
        assert!(user.is_valid_word("你"));
    }

    #[test]
    fn test_user_dictionary_prefix_stays_in_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        let settings = Settings {
            data_dir: Some(data_dir.clone()),
            ..Default::default()
        };
        let registry = DictionaryRegistry::from_settings(&settings);
        let locale = Locale::simplified_chinese();

        for prefix in ["../escape_", "sub/", "..\\", "a b"] {
            assert!(registry
                .create_sub(DictionaryType::User, &locale, prefix)
                .is_err());
        }
        assert!(!temp_dir.path().join("escape_user_zh_CN.db").exists());
        assert!(!data_dir.join("sub").exists());
    }

    #[test]
    fn test_completion_setting_applies_to_every_dictionary() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings {
            completion: false,
            ..settings(&temp_dir, Backend::Memory)
        };
        let registry = DictionaryRegistry::from_settings(&settings);
        let locale = Locale::simplified_chinese();

        let main = registry.create_main(&locale).unwrap();
        assert_eq!(words(main.as_ref(), "wq"), &["你"]);

        let user = registry
            .create_sub(DictionaryType::User, &locale, "")
            .unwrap();
        user.add_entry("wqvb", "你好").unwrap();
        assert!(words(user.as_ref(), "wq").is_empty());

        for dictionary_type in DictionaryType::SUB_TYPES {
            if dictionary_type == DictionaryType::User {
                continue;
            }
            let dictionary = registry.create_sub(dictionary_type, &locale, "").unwrap();
            dictionary.add_entry("wqvb", "你好").unwrap();
            assert!(words(dictionary.as_ref(), "wq").is_empty());
            assert_eq!(words(dictionary.as_ref(), "wqvb"), &["你好"]);
        }
    }

    #[test]
    fn test_dynamic_sub_dictionaries() {
        let temp_dir = TempDir::new().unwrap();
        let registry = DictionaryRegistry::from_settings(&settings(&temp_dir, Backend::Memory));
        let locale = Locale::simplified_chinese();

        for dictionary_type in DictionaryType::SUB_TYPES {
            assert!(registry.has(dictionary_type));
            let dictionary = registry.create_sub(dictionary_type, &locale, "").unwrap();
            assert_eq!(dictionary.dictionary_type(), dictionary_type);
        }
    }
}
