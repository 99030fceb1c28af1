//! Optional process-wide engine.
//!
//! Applications that consult flags from many places install one engine at
//! startup. Installation happens once; tests that need isolation build their
//! own [`FlagEngine`] instead of reaching for the global.

use crate::engine::FlagEngine;
use crate::error::{FlagError, Result};
use flaggate_log::info;
use once_cell::sync::OnceCell;

static ENGINE: OnceCell<FlagEngine> = OnceCell::new();

/// Install the process-wide engine.
///
/// Returns the engine back as `Err` when one is already installed.
pub fn install(engine: FlagEngine) -> std::result::Result<&'static FlagEngine, FlagEngine> {
    match ENGINE.try_insert(engine) {
        Ok(installed) => {
            info!(target: "flaggate::global", "process-wide flag engine installed");
            Ok(installed)
        }
        Err((_, rejected)) => Err(rejected),
    }
}

/// The installed engine, if any.
pub fn engine() -> Option<&'static FlagEngine> {
    ENGINE.get()
}

/// Evaluate a flag on the installed engine.
pub fn is_enabled(flag: &str) -> Result<bool> {
    engine().ok_or(FlagError::NotInstalled)?.evaluate(flag)
}

/// Whether the installed engine is in test mode.
pub fn is_running_in_test() -> bool {
    engine().is_some_and(FlagEngine::is_test_mode)
}
