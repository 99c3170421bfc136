//! Registry of storage modules, keyed by name.
//!
//! A hosting query engine instantiates stores by module name. The process-wide
//! registry returned by `global()` is built once, on first use, with the
//! built-in modules; custom registries are assembled with
//! `StorageRegistry::builder()`. Neither can be modified after it is built.
//!
//! # Built-in modules
//!
//! - `hexastore`: the three-index triple store
//! - `memory`: alias of `hexastore`
//!
//! # Invariants
//!
//! - Module names are unique within a registry
//! - The registry is read-only once built

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::config::{ConfigError, StoreConfig};
use crate::storage::{GcConfig, TripleStore, spawn_gc_task};

/// Builds a store from its name and configuration.
pub type StoreConstructor = fn(&str, StoreConfig) -> TripleStore;

fn hexastore(name: &str, config: StoreConfig) -> TripleStore {
    TripleStore::new(name, config)
}

/// Read-only map from module name to constructor.
#[derive(Debug, Clone)]
pub struct StorageRegistry {
    constructors: HashMap<String, StoreConstructor>,
}

impl StorageRegistry {
    /// Start building a registry with no module.
    #[must_use]
    pub fn builder() -> StorageRegistryBuilder {
        StorageRegistryBuilder::default()
    }

    /// A registry holding the built-in modules.
    #[must_use]
    pub fn with_builtins() -> Self {
        Self::builder()
            .register(StoreConfig::DEFAULT_MODULE, hexastore)
            .register("memory", hexastore)
            .build()
    }

    /// Check if a module is registered.
    #[must_use]
    pub fn contains(&self, module: &str) -> bool {
        self.constructors.contains_key(module)
    }

    /// Registered module names, sorted.
    #[must_use]
    pub fn modules(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiate a module.
    ///
    /// Inside a tokio runtime, a background garbage collection task is
    /// spawned for the new store; it exits when the store is dropped.
    ///
    /// # Errors
    ///
    /// `RegistryError::UnknownModule` if no module is registered under `module`.
    #[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected
    pub fn create(
        &self,
        module: &str,
        config: StoreConfig,
    ) -> Result<Arc<TripleStore>, RegistryError> {
        let constructor = self
            .constructors
            .get(module)
            .ok_or_else(|| RegistryError::UnknownModule(module.to_owned()))?;

        let gc_config = GcConfig::from(&config);
        let store = Arc::new(constructor(module, config));

        // Only spawn if we're inside a tokio runtime (may not be in some test contexts)
        if tokio::runtime::Handle::try_current().is_ok() {
            let _gc_handle = spawn_gc_task(Arc::downgrade(&store), store.gc_notify(), gc_config);
        }

        tracing::info!("Created triple store from module '{module}'");
        Ok(store)
    }

    /// Instantiate the module a configuration names.
    pub fn create_from_config(&self, config: StoreConfig) -> Result<Arc<TripleStore>, RegistryError> {
        let module = config.module.clone();
        self.create(&module, config)
    }

    /// Instantiate the module named by the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or names an unknown
    /// module.
    pub fn create_from_env(&self) -> Result<Arc<TripleStore>, RegistryError> {
        self.create_from_config(StoreConfig::from_env()?)
    }
}

/// Collects modules for a `StorageRegistry`.
#[derive(Debug, Default)]
pub struct StorageRegistryBuilder {
    constructors: HashMap<String, StoreConstructor>,
}

impl StorageRegistryBuilder {
    /// Register a module. A later registration under the same name wins.
    #[must_use]
    pub fn register(mut self, module: impl Into<String>, constructor: StoreConstructor) -> Self {
        self.constructors.insert(module.into(), constructor);
        self
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> StorageRegistry {
        StorageRegistry {
            constructors: self.constructors,
        }
    }
}

/// The process-wide registry, built with the built-in modules on first use.
pub fn global() -> &'static StorageRegistry {
    static REGISTRY: OnceLock<StorageRegistry> = OnceLock::new();
    REGISTRY.get_or_init(StorageRegistry::with_builtins)
}

/// Errors that can occur when instantiating a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No module is registered under this name.
    UnknownModule(String),
    /// The configuration could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownModule(name) => write!(f, "unknown storage module: {name}"),
            Self::Config(e) => write!(f, "configuration error: {e}"),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::UnknownModule(_) => None,
        }
    }
}

impl From<ConfigError> for RegistryError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
