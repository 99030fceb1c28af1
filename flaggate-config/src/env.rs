// Environment variable sources
//
// Property keys map onto variable names by upper-casing, turning `.` into
// `__` and `-` into `_`: `tv.dvr-enabled` with prefix `APP` is
// `APP_TV__DVR_ENABLED`. The reverse mapping is used when bulk loading.
//
// The reverse is lossy: `-` comes back as `_`, and a segment ending in `_`
// runs into the following `__` (`a_.b` is `A___B`, read back as `a._b`).

use crate::source::PropertySource;
use std::collections::HashMap;
use std::env;

/// Environment variable name for a property key.
pub fn env_var_name(prefix: Option<&str>, key: &str) -> String {
    let body = key
        .to_uppercase()
        .replace('.', "__")
        .replace('-', "_");

    match prefix {
        Some(prefix) => format!("{}_{}", prefix, body),
        None => body,
    }
}

/// Property key for an environment variable name (prefix already removed).
pub fn property_key(var: &str) -> String {
    var.to_lowercase().replace("__", ".")
}

/// Bulk environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load every variable carrying the prefix, keyed by property key
    pub fn load(&self) -> HashMap<String, String> {
        self.collect(env::vars())
    }

    fn collect(&self, vars: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
        let mut properties = HashMap::new();

        for (var, value) in vars {
            match self.prefix {
                Some(ref prefix) => {
                    if let Some(rest) = var
                        .strip_prefix(prefix.as_str())
                        .and_then(|rest| rest.strip_prefix('_'))
                    {
                        properties.insert(property_key(rest), value);
                    }
                }
                None => {
                    properties.insert(property_key(&var), value);
                }
            }
        }

        properties
    }

    /// Read the variable backing a single property key
    pub fn load_var(&self, key: &str) -> Option<String> {
        env::var(env_var_name(self.prefix.as_deref(), key)).ok()
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Live view of the process environment.
///
/// Each lookup reads the variable again; flag memoization keeps this off the
/// hot path.
#[derive(Debug, Clone, Default)]
pub struct EnvPropertySource {
    prefix: Option<String>,
}

impl EnvPropertySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl PropertySource for EnvPropertySource {
    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(env_var_name(self.prefix.as_deref(), key)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // std::env::set_var is unsafe under edition 2024, so these tests feed
    // synthetic variables through `collect` or rely on PATH.

    #[test]
    fn test_env_var_name() {
        assert_eq!(env_var_name(None, "tv.dvr"), "TV__DVR");
        assert_eq!(
            env_var_name(Some("APP"), "tv.dvr-enabled"),
            "APP_TV__DVR_ENABLED"
        );
    }

    #[test]
    fn test_env_var_name_nested_key() {
        assert_eq!(
            env_var_name(Some("APP"), "tv.dvr.enabled"),
            "APP_TV__DVR__ENABLED"
        );
        assert_eq!(property_key("TV__DVR__ENABLED"), "tv.dvr.enabled");
    }

    #[test]
    fn test_property_key_loses_dashes_and_trailing_underscores() {
        assert_eq!(property_key(&env_var_name(None, "tv.dvr-enabled")), "tv.dvr_enabled");
        assert_eq!(property_key(&env_var_name(None, "a_.b")), "a._b");
    }

    #[test]
    fn test_property_key_inverts_name() {
        assert_eq!(property_key("TV__DVR_ENABLED"), "tv.dvr_enabled");
        assert_eq!(property_key(&env_var_name(None, "a.b.c")), "a.b.c");
    }

    #[test]
    fn test_collect_with_prefix() {
        let loader = EnvLoader::new(Some("APP".to_string()));
        let vars = vec![
            ("APP_TV__DVR".to_string(), "1".to_string()),
            ("APPLE".to_string(), "skip".to_string()),
            ("OTHER_X".to_string(), "skip".to_string()),
        ];

        let loaded = loader.collect(vars.into_iter());
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("tv.dvr").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_missing_var() {
        let loader = EnvLoader::new(Some("FLAGGATE_TEST".to_string()));
        assert!(loader.load_var("missing.var.67890").is_none());

        let source = EnvPropertySource::with_prefix("FLAGGATE_TEST");
        assert!(source.get_bool("missing.var.67890", true));
    }

    #[test]
    fn test_path_is_visible() {
        if std::env::var("PATH").is_ok() {
            assert!(EnvPropertySource::new().contains("path"));
        }
    }
}
