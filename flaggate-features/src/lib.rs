//! Feature gating for flaggate
//!
//! Boolean capability flags declared once, composed from simpler predicates,
//! resolved against properties and the build variant, and overridable
//! during tests.
//!
//! # Features
//!
//! - **Predicates** - constants, properties, build variants, flag references
//!   and AND/OR/NOT composition
//! - **Memoization** - each flag is computed once per process until reset
//! - **Cycle detection** - at validation time and during evaluation
//! - **Test overrides** - force any flag on or off without restarting
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use flaggate_config::PropertyStore;
//! use flaggate_features::*;
//!
//! let table = FlagTable::new()
//!     .declare("tuner", Predicate::property("tv.tuner", true))?
//!     .declare(
//!         "pip",
//!         Predicate::and([
//!             Predicate::flag("tuner"),
//!             Predicate::not(Predicate::variant_in([BuildVariant::User])),
//!         ]),
//!     )?;
//!
//! let engine = FlagEngine::new(
//!     table,
//!     Arc::new(PropertyStore::new()),
//!     Arc::new(FixedBuildContext(BuildVariant::Eng)),
//! );
//! engine.validate()?;
//!
//! if engine.is_enabled("pip")? {
//!     // Show picture-in-picture controls
//! }
//! # Ok::<(), FlagError>(())
//! ```
//!
//! # Overrides in tests
//!
//! ```
//! # use std::sync::Arc;
//! # use flaggate_config::EmptySource;
//! # use flaggate_features::*;
//! # let table = FlagTable::new().declare("dvr", Predicate::constant(false))?;
//! # let engine = FlagEngine::new(table, Arc::new(EmptySource), Arc::new(FixedBuildContext(BuildVariant::User)));
//! engine.init_for_test();
//! engine.set_override("dvr", true)?;
//! assert!(engine.evaluate("dvr")?);
//!
//! engine.reset_all();
//! assert!(!engine.evaluate("dvr")?);
//! # Ok::<(), FlagError>(())
//! ```

pub mod engine;
pub mod error;
pub mod global;
pub mod overrides;
pub mod predicate;
pub mod table;
pub mod variant;

pub use engine::{FlagEngine, FlagSnapshot, FlagState, ValueSource};
pub use error::{FlagError, Result};
pub use overrides::OverrideRegistry;
pub use predicate::{CompositeOp, FlagName, Predicate};
pub use table::{FlagDeclaration, FlagTable};
pub use variant::{BuildContext, BuildVariant, FixedBuildContext, ProcessBuildContext};
