//! flaggate logging
//!
//! Structured logging used across the flaggate crates, controlled through
//! `FLAGGATE_*` environment variables.
//!
//! Flag evaluation is usually silent; the interesting events are override
//! changes, registry resets, malformed property values and declaration
//! defects. Those are emitted with key/value fields so a JSON log line carries
//! the flag name and value without string parsing.
//!
//! # Usage
//!
//! ```rust
//! use flaggate_log::{debug, info, warn};
//!
//! info!("flag table registered with {} flags", 12);
//! debug!(target: "flaggate::overrides", "override cleared");
//! warn!(fields: [("flag", "dvr"), ("tag", "DvrManager")], "feature is disabled");
//! ```
//!
//! # Environment Variables
//!
//! - `FLAGGATE_DEBUG=1` - Enable debug logging
//! - `FLAGGATE_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `FLAGGATE_LOG_FORMAT=pretty|json|compact` - Set output format
//! - `FLAGGATE_LOG_COLOR=1|0` - Enable/disable colors
//! - `FLAGGATE_LOG_TIMESTAMPS=1|0` - Include timestamps
//! - `FLAGGATE_LOG_MODULE=1|0` - Include the log target

use once_cell::sync::Lazy;
use std::env;
use std::io::Write;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

// ============================================================================
// Log Levels
// ============================================================================

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    /// Per-evaluation detail
    Trace = 0,
    /// Override and cache lifecycle
    Debug = 1,
    /// Registration events
    Info = 2,
    /// Soft precondition failures
    Warn = 3,
    /// Declaration defects
    Error = 4,
    /// Logging disabled
    Off = 5,
}

impl Level {
    /// Upper-case level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Off => "OFF",
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            4 => Level::Error,
            _ => Level::Off,
        }
    }

    #[cfg(feature = "color")]
    fn colored(&self) -> colored::ColoredString {
        use colored::Colorize;
        match self {
            Level::Trace => "TRACE".magenta(),
            Level::Debug => "DEBUG".blue(),
            Level::Info => "INFO".green(),
            Level::Warn => "WARN".yellow(),
            Level::Error => "ERROR".red().bold(),
            Level::Off => "OFF".white(),
        }
    }
}

impl FromStr for Level {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "off" | "none" => Ok(Level::Off),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => Level::Trace,
            log::Level::Debug => Level::Debug,
            log::Level::Info => Level::Info,
            log::Level::Warn => Level::Warn,
            log::Level::Error => Level::Error,
        }
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Human-readable, one field per column
    Pretty,
    /// Short single-line format
    Compact,
    /// One JSON object per line
    Json,
}

impl FromStr for Format {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Format::Pretty),
            "compact" => Ok(Format::Compact),
            "json" => Ok(Format::Json),
            _ => Err(()),
        }
    }
}

// ============================================================================
// Global Configuration
// ============================================================================

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

static LOG_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

static CONFIG: Lazy<LogConfig> = Lazy::new(LogConfig::from_env);

/// Logging configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether debug mode is enabled
    pub debug: bool,
    /// Minimum log level
    pub level: Level,
    /// Output format
    pub format: Format,
    /// Whether colors are enabled
    pub color: bool,
    /// Whether to include timestamps
    pub timestamps: bool,
    /// Whether to include the log target
    pub module_path: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: Level::Info,
            format: Format::Json,
            color: false,
            timestamps: true,
            module_path: true,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

impl LogConfig {
    /// Build the config from `FLAGGATE_*` variables and publish the level
    /// to the global atomics.
    pub fn from_env() -> Self {
        let debug = env_flag("FLAGGATE_DEBUG").unwrap_or(false);

        let level = env::var("FLAGGATE_LOG_LEVEL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(if debug { Level::Debug } else { Level::Info });

        let format = env::var("FLAGGATE_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Format::Json);

        let color = env_flag("FLAGGATE_LOG_COLOR").unwrap_or_else(|| {
            env::var("NO_COLOR").is_err() && env::var("TERM").is_ok()
        });

        let config = Self {
            debug,
            level,
            format,
            color,
            timestamps: env_flag("FLAGGATE_LOG_TIMESTAMPS").unwrap_or(true),
            module_path: env_flag("FLAGGATE_LOG_MODULE").unwrap_or(true),
        };

        DEBUG_ENABLED.store(config.debug, Ordering::SeqCst);
        LOG_LEVEL.store(config.level as u8, Ordering::SeqCst);

        config
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Initialize the logging system eagerly.
///
/// The first log macro does this implicitly.
pub fn init() {
    Lazy::force(&CONFIG);
}

/// Check if debug logging is enabled.
#[inline]
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Check if a log level is enabled.
#[inline]
pub fn is_level_enabled(level: Level) -> bool {
    level as u8 >= LOG_LEVEL.load(Ordering::Relaxed)
}

/// Current minimum level.
pub fn current_level() -> Level {
    Level::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Set log level at runtime.
pub fn set_level(level: Level) {
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

/// Enable or disable debug mode at runtime.
pub fn set_debug(enabled: bool) {
    DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    if enabled && current_level() > Level::Debug {
        set_level(Level::Debug);
    }
}

/// The global configuration.
pub fn config() -> &'static LogConfig {
    &CONFIG
}

/// Route records emitted through the `log` facade into flaggate output.
///
/// Returns `false` when another `log` logger is already installed.
pub fn install_log_bridge() -> bool {
    static BRIDGE: LogBridge = LogBridge;
    init();
    if log::set_logger(&BRIDGE).is_err() {
        return false;
    }
    log::set_max_level(log::LevelFilter::Trace);
    true
}

struct LogBridge;

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        is_level_enabled(metadata.level().into())
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            emit(
                record.level().into(),
                record.target(),
                &record.args().to_string(),
                &[],
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

// ============================================================================
// Log Output
// ============================================================================

/// Emit a record. Used by the macros.
#[doc(hidden)]
pub fn emit(level: Level, target: &str, message: &str, fields: &[(&str, &str)]) {
    if !is_level_enabled(level) {
        return;
    }

    let config = config();
    let line = match config.format {
        Format::Pretty => render_pretty(level, target, message, fields, config),
        Format::Compact => render_compact(level, target, message, fields, config),
        Format::Json => render_json(level, target, message, fields),
    };

    let _ = writeln!(std::io::stderr().lock(), "{}", line);
}

fn render_fields(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_pretty(
    level: Level,
    target: &str,
    message: &str,
    fields: &[(&str, &str)],
    config: &LogConfig,
) -> String {
    let mut out = String::new();

    if config.timestamps {
        let now = chrono::Local::now();
        out.push_str(&now.format("%Y-%m-%d %H:%M:%S%.3f ").to_string());
    }

    #[cfg(feature = "color")]
    let level_text = if config.color {
        format!("{:5}", level.colored())
    } else {
        format!("{:5}", level.as_str())
    };
    #[cfg(not(feature = "color"))]
    let level_text = format!("{:5}", level.as_str());

    out.push_str(&level_text);
    out.push(' ');

    if config.module_path && !target.is_empty() {
        out.push_str(&format!("[{}] ", target));
    }

    out.push_str(message);

    if !fields.is_empty() {
        out.push(' ');
        out.push_str(&render_fields(fields));
    }

    out
}

fn render_compact(
    level: Level,
    target: &str,
    message: &str,
    fields: &[(&str, &str)],
    config: &LogConfig,
) -> String {
    let mut out = String::new();

    if config.timestamps {
        out.push_str(&chrono::Local::now().format("%H:%M:%S ").to_string());
    }

    out.push(level.as_str().chars().next().unwrap_or('?'));
    out.push(' ');

    if config.module_path && !target.is_empty() {
        out.push_str(target);
        out.push_str(": ");
    }

    out.push_str(message);

    if !fields.is_empty() {
        out.push_str(" {");
        out.push_str(&render_fields(fields));
        out.push('}');
    }

    out
}

#[cfg(feature = "json")]
fn render_json(level: Level, target: &str, message: &str, fields: &[(&str, &str)]) -> String {
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Record<'a> {
        timestamp: String,
        level: &'a str,
        target: &'a str,
        message: &'a str,
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        fields: BTreeMap<&'a str, &'a str>,
    }

    let record = Record {
        timestamp: chrono::Utc::now().to_rfc3339(),
        level: level.as_str(),
        target,
        message,
        fields: fields.iter().copied().collect(),
    };

    serde_json::to_string(&record).unwrap_or_else(|_| message.to_string())
}

#[cfg(not(feature = "json"))]
fn render_json(level: Level, target: &str, message: &str, fields: &[(&str, &str)]) -> String {
    let mut out = format!(
        r#"{{"timestamp":"{}","level":"{}","target":"{}","message":"{}""#,
        chrono::Utc::now().to_rfc3339(),
        level.as_str(),
        escape_json(target),
        escape_json(message)
    );
    if !fields.is_empty() {
        let rendered = fields
            .iter()
            .map(|(k, v)| format!(r#""{}":"{}""#, escape_json(k), escape_json(v)))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&format!(r#","fields":{{{}}}"#, rendered));
    }
    out.push('}');
    out
}

#[cfg(not(feature = "json"))]
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => result.push_str(&format!("\\u{:04x}", c as u32)),
            c => result.push(c),
        }
    }
    result
}

// ============================================================================
// Macros
// ============================================================================

/// Shared expansion for the level macros.
#[doc(hidden)]
#[macro_export]
macro_rules! __emit {
    ($level:expr, $enabled:expr, target: $target:expr, fields: [$(($k:expr, $v:expr)),* $(,)?], $($arg:tt)+) => {
        if $enabled {
            $crate::emit($level, $target, &format!($($arg)+), &[$(($k, &*$v.to_string())),*]);
        }
    };
    ($level:expr, $enabled:expr, target: $target:expr, $($arg:tt)+) => {
        if $enabled {
            $crate::emit($level, $target, &format!($($arg)+), &[]);
        }
    };
    ($level:expr, $enabled:expr, fields: [$(($k:expr, $v:expr)),* $(,)?], $($arg:tt)+) => {
        if $enabled {
            $crate::emit($level, module_path!(), &format!($($arg)+), &[$(($k, &*$v.to_string())),*]);
        }
    };
    ($level:expr, $enabled:expr, $($arg:tt)+) => {
        if $enabled {
            $crate::emit($level, module_path!(), &format!($($arg)+), &[]);
        }
    };
}

/// Log a trace message.
#[macro_export]
macro_rules! trace {
    ($($arg:tt)+) => {
        $crate::__emit!($crate::Level::Trace, $crate::is_level_enabled($crate::Level::Trace), $($arg)+)
    };
}

/// Log a debug message.
///
/// Enabled by `FLAGGATE_DEBUG=1` or `FLAGGATE_LOG_LEVEL=debug`.
///
/// # Example
///
/// ```rust
/// use flaggate_log::debug;
///
/// let flag = "dvr";
/// debug!("override cleared for {}", flag);
/// debug!(target: "flaggate::overrides", "registry reset");
/// debug!(fields: [("flag", flag), ("value", true)], "override installed");
/// ```
#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {
        $crate::__emit!(
            $crate::Level::Debug,
            $crate::is_debug_enabled() || $crate::is_level_enabled($crate::Level::Debug),
            $($arg)+
        )
    };
}

/// Log an info message.
#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {
        $crate::__emit!($crate::Level::Info, $crate::is_level_enabled($crate::Level::Info), $($arg)+)
    };
}

/// Log a warning message.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {
        $crate::__emit!($crate::Level::Warn, $crate::is_level_enabled($crate::Level::Warn), $($arg)+)
    };
}

/// Log an error message.
#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {
        $crate::__emit!($crate::Level::Error, $crate::is_level_enabled($crate::Level::Error), $($arg)+)
    };
}

// ============================================================================
// Tracing Integration
// ============================================================================

#[cfg(feature = "tracing")]
pub mod tracing_compat {
    //! Subscriber for applications that log through `tracing`, filtered at
    //! the level configured by `FLAGGATE_LOG_LEVEL`.

    use super::*;

    /// Create a tracing subscriber that respects the flaggate config.
    pub fn subscriber() -> impl tracing::Subscriber {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::{EnvFilter, fmt};

        let config = config();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.as_str().to_lowercase()));

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(config.color))
    }
}

// ============================================================================
// Tests
// ============================================================================
