//! Declarative flag table.

use crate::error::{FlagError, Result};
use crate::predicate::{FlagName, Predicate};
use serde::Serialize;
use std::collections::HashMap;

/// One declared flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagDeclaration {
    pub name: FlagName,
    pub predicate: Predicate,
    pub description: Option<String>,
}

/// Name to predicate table, built once at startup.
///
/// Declarations keep their insertion order. Names are unique; a table is
/// handed to the engine by value and never modified afterwards.
///
/// ```
/// use flaggate_features::{BuildVariant, FlagTable, Predicate};
///
/// let table = FlagTable::new()
///     .declare("system_app", Predicate::property("app.system", false))?
///     .declare_described(
///         "dvr",
///         Predicate::and([
///             Predicate::variant_in([BuildVariant::Eng, BuildVariant::UserDebug]),
///             Predicate::flag("system_app"),
///         ]),
///         "Recording support",
///     )?;
///
/// assert_eq!(table.names().collect::<Vec<_>>(), ["system_app", "dvr"]);
/// # Ok::<(), flaggate_features::FlagError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlagTable {
    declarations: Vec<FlagDeclaration>,
    index: HashMap<FlagName, usize>,
}

impl FlagTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a flag.
    pub fn declare(self, name: impl Into<FlagName>, predicate: Predicate) -> Result<Self> {
        self.insert(name.into(), predicate, None)
    }

    /// Declare a flag with a human readable description.
    pub fn declare_described(
        self,
        name: impl Into<FlagName>,
        predicate: Predicate,
        description: impl Into<String>,
    ) -> Result<Self> {
        self.insert(name.into(), predicate, Some(description.into()))
    }

    fn insert(
        mut self,
        name: FlagName,
        predicate: Predicate,
        description: Option<String>,
    ) -> Result<Self> {
        if self.index.contains_key(&name) {
            return Err(FlagError::DuplicateFlag(name));
        }
        predicate.check_arity(&name)?;

        self.index.insert(name.clone(), self.declarations.len());
        self.declarations.push(FlagDeclaration {
            name,
            predicate,
            description,
        });
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&FlagDeclaration> {
        self.index.get(name).map(|&i| &self.declarations[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Declared names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.declarations.iter().map(|d| d.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlagDeclaration> {
        self.declarations.iter()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}
