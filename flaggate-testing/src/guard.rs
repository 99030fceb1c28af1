// Scoped test mode for a flag engine

use flaggate_features::{FlagEngine, Result};

/// Holds an engine in test mode for the guard's lifetime.
///
/// Creation calls `init_for_test`. Dropping the guard, including during a
/// panic unwinding out of a failed assertion, drops every override and
/// memoized value and returns the engine to production mode.
pub struct FlagTestGuard<'a> {
    engine: &'a FlagEngine,
}

impl<'a> FlagTestGuard<'a> {
    pub fn new(engine: &'a FlagEngine) -> Self {
        engine.init_for_test();
        Self { engine }
    }

    /// Force a flag for the rest of the test
    pub fn set(&self, flag: &str, value: bool) -> Result<&Self> {
        self.engine.set_override(flag, value)?;
        Ok(self)
    }

    /// Force several flags at once
    pub fn set_all<'f>(&self, flags: impl IntoIterator<Item = (&'f str, bool)>) -> Result<&Self> {
        for (flag, value) in flags {
            self.engine.set_override(flag, value)?;
        }
        Ok(self)
    }

    pub fn clear(&self, flag: &str) -> &Self {
        self.engine.clear_override(flag);
        self
    }

    pub fn engine(&self) -> &FlagEngine {
        self.engine
    }
}

impl Drop for FlagTestGuard<'_> {
    fn drop(&mut self) {
        self.engine.exit_test_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flaggate_config::EmptySource;
    use flaggate_features::{BuildVariant, FixedBuildContext, FlagError, FlagTable, Predicate};
    use std::sync::Arc;

    fn engine() -> FlagEngine {
        let table = FlagTable::new()
            .declare("dvr", Predicate::constant(false))
            .unwrap()
            .declare("pip", Predicate::constant(true))
            .unwrap();
        FlagEngine::new(
            table,
            Arc::new(EmptySource),
            Arc::new(FixedBuildContext(BuildVariant::User)),
        )
    }

    #[test]
    fn test_guard_scopes_overrides() {
        let engine = engine();
        {
            let guard = FlagTestGuard::new(&engine);
            guard.set("dvr", true).unwrap().set("pip", false).unwrap();

            assert!(engine.is_test_mode());
            assert!(engine.evaluate("dvr").unwrap());
            assert!(!engine.evaluate("pip").unwrap());

            guard.clear("pip");
            assert!(guard.engine().evaluate("pip").unwrap());
        }

        assert!(!engine.is_test_mode());
        assert!(engine.overrides().is_empty());
        assert!(!engine.evaluate("dvr").unwrap());
    }

    #[test]
    fn test_guard_rejects_unknown_flag() {
        let engine = engine();
        let guard = FlagTestGuard::new(&engine);

        assert!(matches!(
            guard.set_all([("dvr", true), ("typo", true)]),
            Err(FlagError::UnknownFlag(ref name)) if name == "typo"
        ));
    }

    #[test]
    fn test_guard_resets_after_panic() {
        let engine = engine();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let guard = FlagTestGuard::new(&engine);
            guard.set("dvr", true).unwrap();
            panic!("assertion failed inside test");
        }));

        assert!(result.is_err());
        assert!(engine.overrides().is_empty());
        assert!(!engine.evaluate("dvr").unwrap());
    }
}
