//! Flag evaluation engine.
//!
//! Resolution order for a flag is override, then memoized value, then the
//! predicate tree. Memoized values are tagged with the override registry's
//! generation and ignored once it moves.

use crate::error::{FlagError, Result};
use crate::overrides::OverrideRegistry;
use crate::predicate::{CompositeOp, FlagName, Predicate};
use crate::table::FlagTable;
use crate::variant::{BuildContext, BuildVariant, ProcessBuildContext};
use flaggate_config::{EnvPropertySource, PropertySource};
use flaggate_log::{error, info, trace, warn};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct EvaluationCache {
    generation: u64,
    values: HashMap<FlagName, bool>,
}

/// Per-call resolution state. Never shared between threads.
struct Resolution {
    generation: u64,
    stack: Vec<FlagName>,
}

/// A resolved value and whether any override fed into it.
#[derive(Clone, Copy)]
struct Resolved {
    value: bool,
    overridden: bool,
}

/// Where a snapshot value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Override,
    Cached,
    Computed,
    Error,
}

/// One row of [`FlagEngine::snapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct FlagState {
    pub name: FlagName,
    pub value: Option<bool>,
    pub source: ValueSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Diagnostic dump of every declared flag.
#[derive(Debug, Clone, Serialize)]
pub struct FlagSnapshot {
    pub build_variant: BuildVariant,
    pub test_mode: bool,
    pub flags: Vec<FlagState>,
}

/// Evaluates declared flags against properties and the build variant.
///
/// ```
/// use std::sync::Arc;
/// use flaggate_config::PropertyStore;
/// use flaggate_features::*;
///
/// let properties = PropertyStore::new();
/// properties.set("app.system", true)?;
///
/// let table = FlagTable::new()
///     .declare("system_app", Predicate::property("app.system", false))?
///     .declare(
///         "dvr",
///         Predicate::and([
///             Predicate::variant_in([BuildVariant::Eng, BuildVariant::UserDebug]),
///             Predicate::flag("system_app"),
///         ]),
///     )?;
///
/// let engine = FlagEngine::new(
///     table,
///     Arc::new(properties),
///     Arc::new(FixedBuildContext(BuildVariant::User)),
/// );
/// engine.validate()?;
///
/// assert!(!engine.evaluate("dvr")?);
///
/// engine.init_for_test();
/// engine.set_override("dvr", true)?;
/// assert!(engine.evaluate("dvr")?);
///
/// engine.reset_all();
/// assert!(!engine.evaluate("dvr")?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct FlagEngine {
    table: FlagTable,
    properties: Arc<dyn PropertySource>,
    build: Arc<dyn BuildContext>,
    cache: RwLock<EvaluationCache>,
    overrides: OverrideRegistry,
}

impl FlagEngine {
    pub fn new(
        table: FlagTable,
        properties: Arc<dyn PropertySource>,
        build: Arc<dyn BuildContext>,
    ) -> Self {
        info!(
            target: "flaggate::engine",
            fields: [("flags", table.len())],
            "flag table registered"
        );

        Self {
            table,
            properties,
            build,
            cache: RwLock::new(EvaluationCache::default()),
            overrides: OverrideRegistry::new(),
        }
    }

    /// Engine reading properties from the environment and the build variant
    /// from [`ProcessBuildContext`].
    pub fn from_env(table: FlagTable, property_prefix: Option<&str>) -> Self {
        let properties = match property_prefix {
            Some(prefix) => EnvPropertySource::with_prefix(prefix),
            None => EnvPropertySource::new(),
        };
        Self::new(table, Arc::new(properties), Arc::new(ProcessBuildContext))
    }

    pub fn table(&self) -> &FlagTable {
        &self.table
    }

    /// Read-only view of installed overrides.
    ///
    /// Overrides are installed through [`set_override`](Self::set_override),
    /// which checks the name against the table:
    ///
    /// ```compile_fail
    /// # use std::sync::Arc;
    /// # use flaggate_config::EmptySource;
    /// # use flaggate_features::*;
    /// # let table = FlagTable::new().declare("dvr", Predicate::constant(false)).unwrap();
    /// # let engine = FlagEngine::new(table, Arc::new(EmptySource), Arc::new(FixedBuildContext(BuildVariant::User)));
    /// engine.overrides().set_override("dvrr", true);
    /// ```
    pub fn overrides(&self) -> &OverrideRegistry {
        &self.overrides
    }

    pub fn build_variant(&self) -> BuildVariant {
        self.build.current_variant()
    }

    /// Check that every flag reference resolves and the reference graph has
    /// no cycle. Call once after registration.
    pub fn validate(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        fn visit<'a>(
            table: &'a FlagTable,
            name: &'a str,
            marks: &mut HashMap<&'a str, Mark>,
            path: &mut Vec<&'a str>,
        ) -> Result<()> {
            match marks.get(name).copied().unwrap_or(Mark::Unvisited) {
                Mark::Done => return Ok(()),
                Mark::InProgress => {
                    let start = path.iter().position(|n| *n == name).unwrap_or(0);
                    let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                    cycle.push(name.to_string());
                    return Err(FlagError::Cycle { path: cycle });
                }
                Mark::Unvisited => {}
            }

            let declaration = table
                .get(name)
                .ok_or_else(|| FlagError::UnknownFlag(name.to_string()))?;

            marks.insert(name, Mark::InProgress);
            path.push(name);
            for reference in declaration.predicate.references() {
                visit(table, reference, marks, path)?;
            }
            path.pop();
            marks.insert(name, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        let mut path = Vec::new();
        for name in self.table.names() {
            if let Err(err) = visit(&self.table, name, &mut marks, &mut path) {
                error!(
                    target: "flaggate::engine",
                    fields: [("flag", name)],
                    "invalid flag declarations: {}",
                    err
                );
                return Err(err);
            }
        }
        Ok(())
    }

    /// Value of a declared flag.
    pub fn evaluate(&self, flag: &str) -> Result<bool> {
        if !self.table.contains(flag) {
            return Err(FlagError::UnknownFlag(flag.to_string()));
        }

        let mut resolution = Resolution {
            generation: self.overrides.generation(),
            stack: Vec::new(),
        };
        let resolved = self.resolve(flag, &mut resolution).inspect_err(|err| {
            if let FlagError::Cycle { .. } = err {
                error!(target: "flaggate::engine", fields: [("flag", flag)], "{}", err);
            }
        })?;
        Ok(resolved.value)
    }

    /// Alias of [`evaluate`](Self::evaluate) reading as a feature check.
    pub fn is_enabled(&self, flag: &str) -> Result<bool> {
        self.evaluate(flag)
    }

    /// Evaluate a flag expected to be on, logging a warning tagged with
    /// `tag` when it is off. The caller decides how to degrade.
    pub fn check_enabled(&self, flag: &str, tag: &str) -> Result<bool> {
        let enabled = self.evaluate(flag)?;
        if !enabled {
            warn!(
                target: "flaggate::engine",
                fields: [("flag", flag), ("tag", tag)],
                "feature is not enabled"
            );
        }
        Ok(enabled)
    }

    fn resolve(&self, flag: &str, resolution: &mut Resolution) -> Result<Resolved> {
        if let Some(value) = self.overrides.get(flag) {
            return Ok(Resolved {
                value,
                overridden: true,
            });
        }

        if let Some(value) = self.cached(flag, resolution.generation) {
            return Ok(Resolved {
                value,
                overridden: false,
            });
        }

        if let Some(start) = resolution.stack.iter().position(|n| n == flag) {
            let mut path = resolution.stack[start..].to_vec();
            path.push(flag.to_string());
            return Err(FlagError::Cycle { path });
        }

        let declaration = self
            .table
            .get(flag)
            .ok_or_else(|| FlagError::UnknownFlag(flag.to_string()))?;

        resolution.stack.push(flag.to_string());
        let resolved = self.compute(&declaration.predicate, resolution)?;
        resolution.stack.pop();

        trace!(
            target: "flaggate::engine",
            fields: [("flag", flag), ("value", resolved.value)],
            "flag computed"
        );

        if !resolved.overridden {
            self.memoize(flag, resolved.value, resolution.generation);
        }
        Ok(resolved)
    }

    fn compute(&self, predicate: &Predicate, resolution: &mut Resolution) -> Result<Resolved> {
        let value = match predicate {
            Predicate::Constant(value) => *value,
            Predicate::PropertyLookup { key, default } => self.properties.get_bool(key, *default),
            Predicate::BuildVariantIn(variants) => variants.contains(&self.build.current_variant()),
            Predicate::Flag(name) => return self.resolve(name, resolution),
            Predicate::Composite { op, operands } => {
                return self.compute_composite(*op, operands, resolution);
            }
        };
        Ok(Resolved {
            value,
            overridden: false,
        })
    }

    fn compute_composite(
        &self,
        op: CompositeOp,
        operands: &[Predicate],
        resolution: &mut Resolution,
    ) -> Result<Resolved> {
        let mut overridden = false;

        // AND stops at the first false, OR at the first true.
        let (short_circuit_on, otherwise) = match op {
            CompositeOp::And => (false, true),
            CompositeOp::Or => (true, false),
            CompositeOp::Not => {
                let operand = operands.first().ok_or_else(|| FlagError::InvalidArity {
                    flag: resolution.stack.last().cloned().unwrap_or_default(),
                    op: op.as_str(),
                    expected: 1,
                    actual: 0,
                })?;
                let inner = self.compute(operand, resolution)?;
                return Ok(Resolved {
                    value: !inner.value,
                    overridden: inner.overridden,
                });
            }
        };

        for operand in operands {
            let inner = self.compute(operand, resolution)?;
            overridden |= inner.overridden;
            if inner.value == short_circuit_on {
                return Ok(Resolved {
                    value: short_circuit_on,
                    overridden,
                });
            }
        }

        Ok(Resolved {
            value: otherwise,
            overridden,
        })
    }

    fn cached(&self, flag: &str, generation: u64) -> Option<bool> {
        let cache = self.cache.read();
        if cache.generation != generation {
            return None;
        }
        cache.values.get(flag).copied()
    }

    fn memoize(&self, flag: &str, value: bool, generation: u64) {
        let mut cache = self.cache.write();
        if cache.generation != generation {
            // A value computed under an older generation is stale.
            if generation < cache.generation {
                return;
            }
            cache.values.clear();
            cache.generation = generation;
        }
        cache.values.entry(flag.to_string()).or_insert(value);
    }

    // ------------------------------------------------------------------
    // Test lifecycle
    // ------------------------------------------------------------------

    /// Install an override for a declared flag.
    pub fn set_override(&self, flag: &str, value: bool) -> Result<()> {
        if !self.table.contains(flag) {
            return Err(FlagError::UnknownFlag(flag.to_string()));
        }
        self.overrides.set_override(flag, value);
        Ok(())
    }

    pub fn clear_override(&self, flag: &str) -> Option<bool> {
        self.overrides.clear_override(flag)
    }

    /// Drop all overrides and memoized values.
    pub fn reset_all(&self) {
        self.overrides.reset_all();
    }

    pub fn init_for_test(&self) {
        self.overrides.init_for_test();
    }

    /// Drop all overrides and memoized values and return to production mode.
    pub fn exit_test_mode(&self) {
        self.overrides.exit_test_mode();
    }

    pub fn is_test_mode(&self) -> bool {
        self.overrides.is_test_mode()
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Resolve every declared flag and report where each value came from.
    pub fn snapshot(&self) -> FlagSnapshot {
        let generation = self.overrides.generation();

        let flags = self
            .table
            .iter()
            .map(|declaration| {
                let name = declaration.name.clone();
                let description = declaration.description.clone();

                let (value, source, error) = if let Some(value) = self.overrides.get(&name) {
                    (Some(value), ValueSource::Override, None)
                } else if let Some(value) = self.cached(&name, generation) {
                    (Some(value), ValueSource::Cached, None)
                } else {
                    match self.evaluate(&name) {
                        Ok(value) => (Some(value), ValueSource::Computed, None),
                        Err(err) => (None, ValueSource::Error, Some(err.to_string())),
                    }
                };

                FlagState {
                    name,
                    value,
                    source,
                    error,
                    description,
                }
            })
            .collect();

        FlagSnapshot {
            build_variant: self.build.current_variant(),
            test_mode: self.overrides.is_test_mode(),
            flags,
        }
    }
}

impl std::fmt::Debug for FlagEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlagEngine")
            .field("flags", &self.table.len())
            .field("build_variant", &self.build.current_variant())
            .field("test_mode", &self.overrides.is_test_mode())
            .field("overrides", &self.overrides.len())
            .finish()
    }
}
