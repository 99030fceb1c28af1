//! Flag engine errors

use thiserror::Error;

/// Errors raised while declaring or evaluating flags.
///
/// Bad external configuration is never an error here: malformed property
/// values resolve to their declared default. These variants all describe a
/// defect in flag declarations or a misspelt flag name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    /// Evaluation or override requested for a name that was never declared.
    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    /// The flag reference graph loops back on itself.
    #[error("flag cycle detected: {}", .path.join(" -> "))]
    Cycle {
        /// Flags along the loop, starting and ending with the same name.
        path: Vec<String>,
    },

    /// A flag name was declared twice.
    #[error("flag declared twice: {0}")]
    DuplicateFlag(String),

    /// A composite operator received the wrong number of operands.
    #[error("{op} takes {expected} operand(s), got {actual} in flag {flag}")]
    InvalidArity {
        flag: String,
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The process-wide engine was used before `global::install`.
    #[error("no flag engine installed")]
    NotInstalled,
}

pub type Result<T> = std::result::Result<T, FlagError>;
