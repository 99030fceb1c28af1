//! Flag predicates
//!
//! A predicate is a small immutable expression tree describing how a flag's
//! value is derived from constants, properties, the build variant and other
//! flags.

use crate::error::{FlagError, Result};
use crate::variant::BuildVariant;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable, unique flag identifier.
pub type FlagName = String;

/// Boolean combinator of a composite predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeOp {
    And,
    Or,
    Not,
}

impl CompositeOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositeOp::And => "AND",
            CompositeOp::Or => "OR",
            CompositeOp::Not => "NOT",
        }
    }
}

/// Expression deciding a flag's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Fixed value.
    Constant(bool),

    /// Boolean property, `default` when missing or malformed.
    PropertyLookup { key: String, default: bool },

    /// True when the current build variant is in the set.
    BuildVariantIn(BTreeSet<BuildVariant>),

    /// Value of another declared flag, including its overrides.
    Flag(FlagName),

    /// AND / OR over any number of operands, NOT over exactly one.
    Composite {
        op: CompositeOp,
        operands: Vec<Predicate>,
    },
}

impl Predicate {
    pub fn constant(value: bool) -> Self {
        Predicate::Constant(value)
    }

    pub fn property(key: impl Into<String>, default: bool) -> Self {
        Predicate::PropertyLookup {
            key: key.into(),
            default,
        }
    }

    pub fn variant_in(variants: impl IntoIterator<Item = BuildVariant>) -> Self {
        Predicate::BuildVariantIn(variants.into_iter().collect())
    }

    pub fn flag(name: impl Into<FlagName>) -> Self {
        Predicate::Flag(name.into())
    }

    pub fn and(operands: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Composite {
            op: CompositeOp::And,
            operands: operands.into_iter().collect(),
        }
    }

    pub fn or(operands: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Composite {
            op: CompositeOp::Or,
            operands: operands.into_iter().collect(),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(operand: Predicate) -> Self {
        Predicate::Composite {
            op: CompositeOp::Not,
            operands: vec![operand],
        }
    }

    /// Names of flags referenced anywhere in this tree, in evaluation order.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Flag(name) => out.push(name),
            Predicate::Composite { operands, .. } => {
                for operand in operands {
                    operand.collect_references(out);
                }
            }
            _ => {}
        }
    }

    /// Check operator arity throughout the tree.
    pub(crate) fn check_arity(&self, flag: &str) -> Result<()> {
        if let Predicate::Composite { op, operands } = self {
            if *op == CompositeOp::Not && operands.len() != 1 {
                return Err(FlagError::InvalidArity {
                    flag: flag.to_string(),
                    op: op.as_str(),
                    expected: 1,
                    actual: operands.len(),
                });
            }
            for operand in operands {
                operand.check_arity(flag)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Constant(value) => write!(f, "{}", value),
            Predicate::PropertyLookup { key, default } => write!(f, "prop({})={}", key, default),
            Predicate::BuildVariantIn(variants) => {
                let names: Vec<&str> = variants.iter().map(|v| v.as_str()).collect();
                write!(f, "variant in {{{}}}", names.join(", "))
            }
            Predicate::Flag(name) => write!(f, "flag({})", name),
            Predicate::Composite { op, operands } => {
                write!(f, "{}(", op.as_str())?;
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", operand)?;
                }
                f.write_str(")")
            }
        }
    }
}
