// flaggate - feature gating with composable flags and test overrides
//
// Flags are declared once in a table, composed from properties, the build
// variant and each other, memoized on first evaluation and overridable from
// tests.

// Re-export the engine
pub use flaggate_features::*;

// Property sources
pub use flaggate_config::{
    ConfigError, ConfigLoader, EmptySource, EnvPropertySource, FileFormat,
    LayeredPropertySource, PropertySource, PropertyStore,
};

// Logging
pub use flaggate_log;

// Re-export optional crates
#[cfg(feature = "testing")]
pub use flaggate_testing;

/// Prelude for convenient imports
pub mod prelude {
    pub use flaggate_config::{PropertySource, PropertyStore};
    pub use flaggate_features::{
        BuildContext, BuildVariant, FixedBuildContext, FlagEngine, FlagError, FlagTable,
        Predicate, ProcessBuildContext,
    };

    #[cfg(feature = "testing")]
    pub use flaggate_testing::{CountingPropertySource, FlagTestGuard};
}
