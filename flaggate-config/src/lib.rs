// Property sources for the flaggate feature-gating engine

pub mod env;
pub mod error;
pub mod layered;
pub mod loader;
pub mod source;

pub use env::{EnvLoader, EnvPropertySource};
pub use error::{ConfigError, Result};
pub use layered::LayeredPropertySource;
pub use loader::{ConfigLoader, FileFormat};
pub use source::{EmptySource, PropertySource, parse_bool};

use flaggate_log::debug;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// In-memory property store.
///
/// Filled from the environment, `.env` files, property files or explicit
/// `set` calls, then handed to the flag engine as its [`PropertySource`].
/// Clones share the same underlying table.
#[derive(Clone, Default)]
pub struct PropertyStore {
    properties: Arc<RwLock<HashMap<String, Value>>>,
    env_prefix: Option<String>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose `load_env` only picks up `<prefix>_*` variables
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            properties: Arc::default(),
            env_prefix: Some(prefix.into()),
        }
    }

    /// Copy matching environment variables into the store
    pub fn load_env(&self) -> usize {
        let loader = EnvLoader::new(self.env_prefix.clone());
        let vars = loader.load();
        let count = vars.len();

        let mut properties = self.properties.write();
        for (key, value) in vars {
            properties.insert(key, Value::String(value));
        }

        debug!(target: "flaggate::properties", "loaded {} properties from environment", count);
        count
    }

    /// Apply a `.env` file to the process environment, then `load_env`.
    ///
    /// Without a path a missing `.env` in the working directory is ignored.
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<usize> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        Ok(self.load_env())
    }

    /// Merge a property file, choosing the format by extension
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let loader = ConfigLoader::auto(path.as_ref())?;
        self.load_file_as(path, &loader)
    }

    /// Merge a property file with an explicit loader
    pub fn load_file_as(&self, path: impl AsRef<Path>, loader: &ConfigLoader) -> Result<usize> {
        let flat = loader.load_file(path.as_ref())?;
        let count = flat.len();

        self.properties.write().extend(flat);

        debug!(
            target: "flaggate::properties",
            fields: [("path", path.as_ref().display())],
            "loaded {} properties from file",
            count
        );
        Ok(count)
    }

    /// Set a property value
    pub fn set<T: serde::Serialize>(&self, key: &str, value: T) -> Result<()> {
        let value =
            serde_json::to_value(value).map_err(|e| ConfigError::SerializationError(e.to_string()))?;

        self.properties.write().insert(key.to_string(), value);
        Ok(())
    }

    /// Remove a property, returning whether it was present
    pub fn remove(&self, key: &str) -> bool {
        self.properties.write().remove(key).is_some()
    }

    pub fn has(&self, key: &str) -> bool {
        self.properties.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.properties.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.properties.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.read().is_empty()
    }

    /// Copy every entry of `other` into this store, replacing existing keys
    pub fn merge(&self, other: &PropertyStore) {
        if Arc::ptr_eq(&self.properties, &other.properties) {
            return;
        }

        let entries: Vec<(String, Value)> = other
            .properties
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.properties.write().extend(entries);
    }
}

impl PropertySource for PropertyStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        match self.properties.read().get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.has(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_set_and_get_bool() {
        let store = PropertyStore::new();
        store.set("tv.dvr", true).unwrap();
        store.set("tv.tuner", "off").unwrap();
        store.set("tv.pip", 1).unwrap();

        assert!(store.get_bool("tv.dvr", false));
        assert!(!store.get_bool("tv.tuner", true));
        assert!(store.get_bool("tv.pip", false));
    }

    #[test]
    fn test_unparseable_values_use_default() {
        let store = PropertyStore::new();
        store.set("number", 7).unwrap();
        store.set("list", vec![true]).unwrap();
        store.set("null", Value::Null).unwrap();

        assert!(store.get_bool("number", true));
        assert!(!store.get_bool("list", false));
        assert!(store.get_bool("null", true));
        assert!(store.get_raw("null").is_none());
    }

    #[test]
    fn test_has_remove_keys() {
        let store = PropertyStore::new();
        store.set("b", true).unwrap();
        store.set("a", false).unwrap();

        assert!(store.has("a"));
        assert_eq!(store.keys(), vec!["a".to_string(), "b".to_string()]);
        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clones_share_table() {
        let store = PropertyStore::new();
        let view = store.clone();
        store.set("shared", true).unwrap();

        assert!(view.get_bool("shared", false));
    }

    #[test]
    fn test_merge() {
        let base = PropertyStore::new();
        base.set("a", true).unwrap();

        let extra = PropertyStore::new();
        extra.set("a", false).unwrap();
        extra.set("b", true).unwrap();

        base.merge(&extra);
        base.merge(&base.clone());

        assert!(!base.get_bool("a", true));
        assert!(base.get_bool("b", false));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[tv]\ndvr = \"yes\"\ntuner = false").unwrap();

        let store = PropertyStore::new();
        assert_eq!(store.load_file(file.path()).unwrap(), 2);
        assert!(store.get_bool("tv.dvr", false));
        assert!(!store.get_bool("tv.tuner", true));
    }

    #[test]
    fn test_load_missing_file() {
        let store = PropertyStore::new();
        let result = store.load_file("/nonexistent/flaggate/flags.json");
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn test_load_dotenv_missing_path() {
        let store = PropertyStore::with_prefix("FLAGGATE_TEST_99999");
        let result = store.load_dotenv(Some(Path::new("/nonexistent/.env")));
        assert!(result.is_err());
    }
}
