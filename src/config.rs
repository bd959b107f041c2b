use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, ensure, Context, Result};
use directories_next::ProjectDirs;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::lexicon::DEFAULT_WILDCARD;
use crate::suggestions::MAX_SUGGESTIONS;
use crate::Locale;

pub const DATA_DIR_ENV: &str = "WUBINPUT_DATA_DIR";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("info", "wubinput", "wubinput").ok_or_else(|| {
        anyhow!("Need a home directory to get application directories for wubinput")
    })
}

// Where the main lexicon lives at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    // Text lexicon to load. The bundled sample is used when not set
    pub lexicon_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub backend: Backend,
    pub main_locale: String,
    pub max_suggestions: usize,
    pub wildcard: char,
    pub completion: bool,
    pub keep_raw_suggestions: bool,
    pub load_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lexicon_path: None,
            data_dir: None,
            backend: Backend::Memory,
            main_locale: "zh_CN".to_string(),
            max_suggestions: MAX_SUGGESTIONS,
            wildcard: DEFAULT_WILDCARD,
            completion: true,
            keep_raw_suggestions: false,
            load_timeout_ms: 5000,
        }
    }
}

impl Settings {
    pub fn default_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join(SETTINGS_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read settings from {}", path.display()))?;
        let settings: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Could not parse settings from {}", path.display()))?;
        settings
            .validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    // Load the settings file from the config directory if there is one
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load(&path)
        } else {
            debug!("No settings in {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.main_locale()?;
        ensure!(self.max_suggestions > 0, "max_suggestions must be positive");
        ensure!(
            self.wildcard.is_ascii_alphabetic(),
            "wildcard must be an ASCII letter, got '{}'",
            self.wildcard
        );
        Ok(())
    }

    pub fn main_locale(&self) -> Result<Locale> {
        Locale::new(&self.main_locale).with_context(|| "Invalid main_locale")
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    // The environment variable wins over the settings file
    pub fn data_dir(&self) -> Result<PathBuf> {
        self.data_dir_from(std::env::var_os(DATA_DIR_ENV))
    }

    fn data_dir_from(&self, env_value: Option<OsString>) -> Result<PathBuf> {
        if let Some(value) = env_value.filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(value));
        }
        if let Some(data_dir) = &self.data_dir {
            return Ok(data_dir.clone());
        }
        Ok(project_dirs()?.data_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_fields_use_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, r#"{ "backend": "sqlite", "max_suggestions": 5 }"#).unwrap();

        let settings = Settings::load(&path).unwrap();

        assert_eq!(settings.backend, Backend::Sqlite);
        assert_eq!(settings.max_suggestions, 5);
        assert_eq!(settings.wildcard, 'z');
        assert!(settings.completion);
        assert_eq!(settings.main_locale().unwrap(), Locale::simplified_chinese());
        assert_eq!(settings.load_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_reject_invalid_settings() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(SETTINGS_FILE_NAME);

        std::fs::write(&path, r#"{ "main_locale": "zh_CN.UTF-8" }"#).unwrap();
        assert!(Settings::load(&path).is_err());

        std::fs::write(&path, r#"{ "max_suggestions": 0 }"#).unwrap();
        assert!(Settings::load(&path).is_err());

        std::fs::write(&path, r#"{ "backend": "redis" }"#).unwrap();
        assert!(Settings::load(&path).is_err());

        std::fs::write(&path, r#"{ "max_suggestion": 3 }"#).unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn test_missing_settings_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Settings::load(&temp_dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn test_data_dir_precedence() {
        let settings = Settings {
            data_dir: Some(PathBuf::from("/from/settings")),
            ..Default::default()
        };

        assert_eq!(
            settings.data_dir_from(Some(OsString::from("/from/env"))).unwrap(),
            PathBuf::from("/from/env")
        );
        assert_eq!(
            settings.data_dir_from(Some(OsString::new())).unwrap(),
            PathBuf::from("/from/settings")
        );
        assert_eq!(
            settings.data_dir_from(None).unwrap(),
            PathBuf::from("/from/settings")
        );
    }
}
