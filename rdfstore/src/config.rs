//! Store configuration module.
//!
//! This module provides configuration loading for triple stores from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `RDFSTORE_MODULE`: Name of the storage module to instantiate (default: `hexastore`)
//! - `RDFSTORE_GC_TOMBSTONE_THRESHOLD`: Pending tombstones that wake the collector (default: `1024`)
//! - `RDFSTORE_GC_BATCH_SIZE`: Tombstones processed per collection tick (default: `100`)
//!
//! # Invariants
//!
//! - `module` is never empty
//! - `gc_tombstone_threshold` and `gc_batch_size` are at least 1

/// Triple store configuration.
///
/// # Post-conditions
///
/// When constructed via `from_env()` or `default()`, all invariants of the
/// module documentation hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Name of the storage module, looked up in the storage registry.
    pub module: String,
    /// Number of pending tombstones after which removals wake the collector.
    pub gc_tombstone_threshold: usize,
    /// Maximum number of tombstones processed per collection tick.
    pub gc_batch_size: usize,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            module: Self::DEFAULT_MODULE.to_owned(),
            gc_tombstone_threshold: Self::DEFAULT_GC_TOMBSTONE_THRESHOLD,
            gc_batch_size: Self::DEFAULT_GC_BATCH_SIZE,
        }
    }
}

impl StoreConfig {
    /// Default storage module name.
    pub const DEFAULT_MODULE: &'static str = "hexastore";
    /// Default tombstone threshold.
    pub const DEFAULT_GC_TOMBSTONE_THRESHOLD: usize = 1024;
    /// Default collection batch size.
    pub const DEFAULT_GC_BATCH_SIZE: usize = 100;

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `RDFSTORE_MODULE` is set but empty
    /// - a numeric variable is set but not a positive integer
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let module = Self::load_module(&lookup)?;
        let gc_tombstone_threshold = Self::load_positive(
            &lookup,
            "RDFSTORE_GC_TOMBSTONE_THRESHOLD",
            Self::DEFAULT_GC_TOMBSTONE_THRESHOLD,
        )?;
        let gc_batch_size =
            Self::load_positive(&lookup, "RDFSTORE_GC_BATCH_SIZE", Self::DEFAULT_GC_BATCH_SIZE)?;

        Ok(Self {
            module,
            gc_tombstone_threshold,
            gc_batch_size,
        })
    }

    /// Load the module name.
    ///
    /// Returns the default if not set.
    fn load_module<F>(lookup: &F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup("RDFSTORE_MODULE") {
            Some(module) if module.is_empty() => Err(ConfigError::InvalidValue {
                name: "RDFSTORE_MODULE".to_owned(),
                message: "must not be empty".to_owned(),
            }),
            Some(module) => Ok(module),
            None => Ok(Self::DEFAULT_MODULE.to_owned()),
        }
    }

    /// Load a positive integer.
    ///
    /// Returns `default` if not set.
    fn load_positive<F>(lookup: &F, name: &str, default: usize) -> Result<usize, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(value) = lookup(name) else {
            return Ok(default);
        };
        match value.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::InvalidValue {
                name: name.to_owned(),
                message: format!("'{value}' is not a positive integer"),
            }),
        }
    }
}
