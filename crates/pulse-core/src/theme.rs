//! Light/dark preference, persisted as a single key in a small JSON
//! key-value file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Reads and writes the theme key. Other keys in the file are preserved.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/pulse/prefs.json`
    pub fn default_location() -> Result<Self, StoreError> {
        Ok(Self::new(crate::config::config_dir()?.join("prefs.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file, missing key or an unknown value all fall back to the
    /// default theme.
    pub fn load(&self) -> Theme {
        match self.read_all() {
            Ok(prefs) => prefs
                .get(THEME_KEY)
                .and_then(Value::as_str)
                .and_then(Theme::parse)
                .unwrap_or_default(),
            Err(e) => {
                tracing::debug!("theme preference unavailable ({e}), using default");
                Theme::default()
            }
        }
    }

    /// Leaves the file untouched if it exists but cannot be read as a JSON
    /// object.
    pub fn save(&self, theme: Theme) -> Result<(), StoreError> {
        let mut prefs = self.read_all()?;
        prefs.insert(THEME_KEY.to_string(), Value::from(theme.as_str()));

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&prefs)?)?;
        Ok(())
    }

    fn read_all(&self) -> Result<Map<String, Value>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_and_parse() {
        assert_eq!(Theme::Dark.toggle(), Theme::Light);
        assert_eq!(Theme::Light.toggle(), Theme::Dark);
        assert_eq!(Theme::parse(" Light "), Some(Theme::Light));
        assert_eq!(Theme::parse("sepia"), None);
    }

    #[test]
    fn test_missing_file_defaults_to_dark() {
        let dir = tempfile::tempdir().unwrap();
        let store = ThemeStore::new(dir.path().join("prefs.json"));
        assert_eq!(store.load(), Theme::Dark);
    }

    #[test]
    fn test_save_then_load_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"language": "ru"}"#).unwrap();

        let store = ThemeStore::new(&path);
        store.save(Theme::Light).unwrap();
        assert_eq!(store.load(), Theme::Light);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"language\""));
    }

    #[test]
    fn test_save_keeps_non_string_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"font_size": 14, "language": "ru", "beta": true}"#).unwrap();

        ThemeStore::new(&path).save(Theme::Light).unwrap();

        let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["font_size"], 14);
        assert_eq!(saved["language"], "ru");
        assert_eq!(saved["beta"], true);
        assert_eq!(saved["theme"], "light");
    }

    #[test]
    fn test_unreadable_prefs_are_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{ not json").unwrap();

        let store = ThemeStore::new(&path);
        assert!(matches!(store.save(Theme::Light), Err(StoreError::Json(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
        assert_eq!(store.load(), Theme::Dark);
    }

    #[test]
    fn test_non_string_theme_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"theme": 1}"#).unwrap();
        assert_eq!(ThemeStore::new(&path).load(), Theme::Dark);
    }

    #[test]
    fn test_garbage_value_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"theme": "neon"}"#).unwrap();
        assert_eq!(ThemeStore::new(&path).load(), Theme::Dark);
    }
}
