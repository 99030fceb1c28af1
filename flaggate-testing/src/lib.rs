//! Testing utilities for flaggate.
//!
//! - [`FlagTestGuard`] - scoped test mode that cannot leak overrides
//! - [`CountingPropertySource`] - property spy for asserting which keys a
//!   flag read, e.g. to check AND/OR short-circuiting
//! - [`engine_for_test`] - engine over a spy and a fixed build variant
//!
//! ```
//! use flaggate_features::{BuildVariant, FlagTable, Predicate};
//! use flaggate_testing::*;
//!
//! let table = FlagTable::new().declare(
//!     "dvr",
//!     Predicate::and([
//!         Predicate::variant_in([BuildVariant::Eng]),
//!         Predicate::property("app.system", false),
//!     ]),
//! )?;
//! let (engine, properties) = engine_for_test(table, BuildVariant::User);
//!
//! assert!(!engine.evaluate("dvr")?);
//! assert!(!properties.was_read("app.system"));
//!
//! let guard = FlagTestGuard::new(&engine);
//! guard.set("dvr", true)?;
//! assert!(engine.evaluate("dvr")?);
//! # Ok::<(), flaggate_features::FlagError>(())
//! ```

pub mod guard;
pub mod spy;

pub use guard::FlagTestGuard;
pub use spy::CountingPropertySource;

use flaggate_features::{BuildVariant, FixedBuildContext, FlagEngine, FlagTable};
use std::sync::Arc;

/// Build an engine reading a fresh [`CountingPropertySource`] under a fixed
/// build variant. The returned spy shares state with the engine's source.
pub fn engine_for_test(
    table: FlagTable,
    variant: BuildVariant,
) -> (FlagEngine, CountingPropertySource) {
    let properties = CountingPropertySource::new();
    let engine = FlagEngine::new(
        table,
        Arc::new(properties.clone()),
        Arc::new(FixedBuildContext(variant)),
    );
    (engine, properties)
}
