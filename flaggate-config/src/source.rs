// PropertySource - the boundary flag predicates read settings through

use flaggate_log::debug;
use std::sync::Arc;

/// An untyped key/value source of settings.
///
/// Implementors only provide raw string lookup. Boolean resolution is shared
/// so every source degrades malformed values the same way.
pub trait PropertySource: Send + Sync {
    /// Raw value stored under `key`, if any.
    fn get_raw(&self, key: &str) -> Option<String>;

    /// Whether `key` is present, regardless of whether it parses.
    fn contains(&self, key: &str) -> bool {
        self.get_raw(key).is_some()
    }

    /// Resolve `key` as a boolean.
    ///
    /// A missing key or a value that is not a recognised boolean spelling
    /// yields `default`. This never fails.
    fn get_bool(&self, key: &str, default: bool) -> bool {
        let Some(raw) = self.get_raw(key) else {
            return default;
        };

        match parse_bool(&raw) {
            Some(value) => value,
            None => {
                debug!(
                    target: "flaggate::properties",
                    fields: [("key", key), ("raw", raw), ("default", default)],
                    "malformed boolean property, using default"
                );
                default
            }
        }
    }
}

impl<T: PropertySource + ?Sized> PropertySource for Arc<T> {
    fn get_raw(&self, key: &str) -> Option<String> {
        (**self).get_raw(key)
    }

    fn contains(&self, key: &str) -> bool {
        (**self).contains(key)
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        (**self).get_bool(key, default)
    }
}

impl<T: PropertySource + ?Sized> PropertySource for Box<T> {
    fn get_raw(&self, key: &str) -> Option<String> {
        (**self).get_raw(key)
    }
}

/// Parse the boolean spellings accepted by system properties.
///
/// `1 y yes on true` are true, `0 n no off false` are false, compared
/// case-insensitively after trimming. Anything else is `None`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "y" | "yes" | "on" | "true" => Some(true),
        "0" | "n" | "no" | "off" | "false" => Some(false),
        _ => None,
    }
}

/// A source with no keys. Every lookup yields the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySource;

impl PropertySource for EmptySource {
    fn get_raw(&self, _key: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fixed(HashMap<&'static str, &'static str>);

    impl PropertySource for Fixed {
        fn get_raw(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    #[test]
    fn test_parse_bool_spellings() {
        for raw in ["1", "y", "YES", " on ", "True"] {
            assert_eq!(parse_bool(raw), Some(true), "{raw}");
        }
        for raw in ["0", "N", "no", "OFF", "false\n"] {
            assert_eq!(parse_bool(raw), Some(false), "{raw}");
        }
        for raw in ["", "2", "enabled", "t"] {
            assert_eq!(parse_bool(raw), None, "{raw}");
        }
    }

    #[test]
    fn test_get_bool_falls_back_to_default() {
        let source = Fixed(HashMap::from([("good", "yes"), ("bad", "maybe")]));

        assert!(source.get_bool("good", false));
        assert!(source.get_bool("bad", true));
        assert!(!source.get_bool("bad", false));
        assert!(source.get_bool("missing", true));
        assert!(source.contains("bad"));
        assert!(!source.contains("missing"));
    }

    #[test]
    fn test_empty_source() {
        assert!(EmptySource.get_bool("anything", true));
        assert!(!EmptySource.get_bool("anything", false));
    }

    #[test]
    fn test_shared_source_delegates() {
        let source: Arc<dyn PropertySource> = Arc::new(Fixed(HashMap::from([("k", "off")])));
        assert!(!source.get_bool("k", true));
    }
}
