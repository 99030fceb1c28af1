//! Test override registry.

use crate::predicate::FlagName;
use flaggate_log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Process-wide table of test-injected flag values.
///
/// Read-only outside this crate. Mutations go through [`FlagEngine`], which
/// rejects undeclared flag names.
///
/// [`FlagEngine`]: crate::FlagEngine
///
/// Empty in production. Outside test mode `get` answers without touching the
/// lock; installing an override switches test mode on, so the fast path never
/// hides an installed value.
///
/// Every mutation bumps a generation counter. The engine tags its memoized
/// values with the generation they were computed under and discards them once
/// it moves, which is how `reset_all` and override changes clear the
/// evaluation cache.
///
/// Overrides are not cleared automatically. A test that installs one and
/// never resets leaks it into every later evaluation.
#[derive(Debug, Default)]
pub struct OverrideRegistry {
    overrides: RwLock<HashMap<FlagName, bool>>,
    test_mode: AtomicBool,
    generation: AtomicU64,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace an override. Last write wins.
    pub(crate) fn set_override(&self, flag: &str, value: bool) {
        {
            let mut overrides = self.overrides.write();
            overrides.insert(flag.to_string(), value);
            self.test_mode.store(true, Ordering::Release);
            self.bump();
        }
        debug!(
            target: "flaggate::overrides",
            fields: [("flag", flag), ("value", value)],
            "override installed"
        );
    }

    /// Remove one override. Returns the value it held, if any.
    pub(crate) fn clear_override(&self, flag: &str) -> Option<bool> {
        let removed = {
            let mut overrides = self.overrides.write();
            let removed = overrides.remove(flag);
            self.bump();
            removed
        };
        debug!(
            target: "flaggate::overrides",
            fields: [("flag", flag)],
            "override cleared"
        );
        removed
    }

    /// Remove every override and invalidate memoized flag values.
    pub(crate) fn reset_all(&self) {
        let cleared = {
            let mut overrides = self.overrides.write();
            let cleared = overrides.len();
            overrides.clear();
            self.bump();
            cleared
        };
        debug!(target: "flaggate::overrides", "registry reset, {} override(s) dropped", cleared);
    }

    /// `reset_all`, then enter test mode.
    pub(crate) fn init_for_test(&self) {
        self.clear_with_mode(true);
    }

    /// `reset_all`, then return to production mode.
    ///
    /// The mode switch happens under the same write lock as the clear, so a
    /// concurrent `set_override` lands either before (and is dropped) or
    /// after (and turns test mode back on).
    pub(crate) fn exit_test_mode(&self) {
        self.clear_with_mode(false);
    }

    fn clear_with_mode(&self, test_mode: bool) {
        let cleared = {
            let mut overrides = self.overrides.write();
            let cleared = overrides.len();
            overrides.clear();
            self.test_mode.store(test_mode, Ordering::Release);
            self.bump();
            cleared
        };
        debug!(
            target: "flaggate::overrides",
            fields: [("test_mode", test_mode)],
            "registry reset, {} override(s) dropped",
            cleared
        );
    }

    pub fn is_test_mode(&self) -> bool {
        self.test_mode.load(Ordering::Acquire)
    }

    /// Override for `flag`, if one is installed.
    pub fn get(&self, flag: &str) -> Option<bool> {
        if !self.is_test_mode() {
            return None;
        }
        self.overrides.read().get(flag).copied()
    }

    /// Installed overrides, sorted by flag name.
    pub fn entries(&self) -> Vec<(FlagName, bool)> {
        let mut entries: Vec<(FlagName, bool)> = self
            .overrides
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.overrides.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.read().is_empty()
    }

    /// Current mutation generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}
