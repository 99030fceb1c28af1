//! Build variant and the build context boundary.

use flaggate_config::EnvLoader;
use flaggate_log::warn;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Build configuration a process was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildVariant {
    /// Local development build
    Debug,
    /// Engineering build with every diagnostic enabled
    Eng,
    /// Release build that still allows debugging
    UserDebug,
    /// Shipping build
    User,
}

impl BuildVariant {
    pub const ALL: [BuildVariant; 4] = [
        BuildVariant::Debug,
        BuildVariant::Eng,
        BuildVariant::UserDebug,
        BuildVariant::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildVariant::Debug => "debug",
            BuildVariant::Eng => "eng",
            BuildVariant::UserDebug => "userdebug",
            BuildVariant::User => "user",
        }
    }

    /// Every variant except `User` permits debugging.
    pub fn is_debuggable(&self) -> bool {
        !matches!(self, BuildVariant::User)
    }

    /// Variant implied by the compiler profile this crate was built with.
    pub fn from_profile() -> Self {
        if cfg!(debug_assertions) {
            BuildVariant::Debug
        } else {
            BuildVariant::User
        }
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(BuildVariant::Debug),
            "eng" => Ok(BuildVariant::Eng),
            "userdebug" => Ok(BuildVariant::UserDebug),
            "user" | "release" => Ok(BuildVariant::User),
            other => Err(format!("unknown build variant: {}", other)),
        }
    }
}

/// Source of the current build variant.
///
/// Implementations must return the same value for the whole process
/// lifetime.
pub trait BuildContext: Send + Sync {
    fn current_variant(&self) -> BuildVariant;
}

/// A build context pinned to one variant. Used in tests and embedders that
/// know their variant at compile time.
#[derive(Debug, Clone, Copy)]
pub struct FixedBuildContext(pub BuildVariant);

impl BuildContext for FixedBuildContext {
    fn current_variant(&self) -> BuildVariant {
        self.0
    }
}

static PROCESS_VARIANT: OnceCell<BuildVariant> = OnceCell::new();

/// Build context resolved once per process.
///
/// Reads `FLAGGATE_BUILD_VARIANT` on first use and falls back to the
/// compiler profile (`debug` with debug assertions, `user` otherwise) when
/// the variable is unset or unrecognised.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessBuildContext;

impl ProcessBuildContext {
    fn resolve() -> BuildVariant {
        let loader = EnvLoader::new(Some("FLAGGATE".to_string()));
        Self::resolve_from(loader.load_var("build_variant"))
    }

    /// Variant for a raw `FLAGGATE_BUILD_VARIANT` value.
    fn resolve_from(raw: Option<String>) -> BuildVariant {
        match raw {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                warn!(
                    target: "flaggate::build",
                    fields: [("raw", raw)],
                    "{}, falling back to compiler profile",
                    err
                );
                BuildVariant::from_profile()
            }),
            None => BuildVariant::from_profile(),
        }
    }
}

impl BuildContext for ProcessBuildContext {
    fn current_variant(&self) -> BuildVariant {
        *PROCESS_VARIANT.get_or_init(Self::resolve)
    }
}
