// Spy property source for verifying which properties a flag read

use flaggate_config::{PropertySource, PropertyStore};
use parking_lot::Mutex;
use std::sync::Arc;

/// Property source that records every key looked up.
///
/// Wraps a [`PropertyStore`] so values can still be set from the test.
/// Clones share both the store and the lookup log.
#[derive(Clone, Default)]
pub struct CountingPropertySource {
    store: PropertyStore,
    lookups: Arc<Mutex<Vec<String>>>,
}

impl CountingPropertySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spy over an existing store
    pub fn wrap(store: PropertyStore) -> Self {
        Self {
            store,
            lookups: Arc::default(),
        }
    }

    /// Set a property value on the wrapped store
    pub fn set<T: serde::Serialize>(&self, key: &str, value: T) -> flaggate_config::Result<()> {
        self.store.set(key, value)
    }

    pub fn store(&self) -> &PropertyStore {
        &self.store
    }

    /// Total number of lookups
    pub fn lookup_count(&self) -> usize {
        self.lookups.lock().len()
    }

    /// Number of lookups of one key
    pub fn lookups_of(&self, key: &str) -> usize {
        self.lookups.lock().iter().filter(|k| *k == key).count()
    }

    pub fn was_read(&self, key: &str) -> bool {
        self.lookups_of(key) > 0
    }

    /// Keys in lookup order
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().clone()
    }

    pub fn clear_lookups(&self) {
        self.lookups.lock().clear();
    }
}

impl PropertySource for CountingPropertySource {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.lookups.lock().push(key.to_string());
        self.store.get_raw(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_lookups() {
        let spy = CountingPropertySource::new();
        spy.set("tv.dvr", true).unwrap();

        assert!(spy.get_bool("tv.dvr", false));
        assert!(!spy.get_bool("tv.pip", false));
        assert!(spy.get_bool("tv.dvr", false));

        assert_eq!(spy.lookup_count(), 3);
        assert_eq!(spy.lookups_of("tv.dvr"), 2);
        assert!(spy.was_read("tv.pip"));
        assert!(!spy.was_read("tv.tuner"));
        assert_eq!(spy.lookups(), vec!["tv.dvr", "tv.pip", "tv.dvr"]);

        spy.clear_lookups();
        assert_eq!(spy.lookup_count(), 0);
    }

    #[test]
    fn test_clones_share_log() {
        let spy = CountingPropertySource::new();
        let view = spy.clone();

        let _ = view.get_raw("x");
        assert_eq!(spy.lookup_count(), 1);
    }

    #[test]
    fn test_wrap_existing_store() {
        let store = PropertyStore::new();
        store.set("app.system", "yes").unwrap();

        let spy = CountingPropertySource::wrap(store.clone());
        assert!(spy.get_bool("app.system", false));

        store.set("app.system", "no").unwrap();
        assert!(!spy.store().get_bool("app.system", true));
    }
}
