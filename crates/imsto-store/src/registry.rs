use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use imsto_config::Config;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::file::{self, FileWagon};
use crate::memory::{self, InMemoryWagon};
use crate::traits::Wagon;
use crate::StoreResult;

/// Config key naming the engine of a namespace.
pub const ENGINE_KEY: &str = "engine";

/// Builds an engine for a namespace from configuration.
pub type EngineCtor =
    Box<dyn Fn(&str, &dyn Config) -> StoreResult<Arc<dyn Wagon>> + Send + Sync>;

/// Errors from engine registration and namespace resolution.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An engine name was registered twice. This is a wiring defect.
    #[error("engine {0:?} is already registered")]
    DuplicateEngineRegistration(String),

    #[error("invalid engine name {0:?}")]
    InvalidEngineName(String),

    #[error("roof {roof:?} names unknown engine {engine:?}")]
    UnknownEngine { roof: String, engine: String },

    #[error("roof {0:?} has no engine configured")]
    UnconfiguredNamespace(String),

    #[error("engine {engine:?} failed to open roof {roof:?}: {source}")]
    Engine {
        roof: String,
        engine: String,
        #[source]
        source: StoreError,
    },
}

/// Name-keyed table of engine constructors.
///
/// Built once during startup and shared read-only afterwards; there is no
/// deregistration. The registry does not cache engines. Callers that
/// resolve the same roof repeatedly should keep the returned handle.
#[derive(Default)]
pub struct EngineRegistry {
    ctors: BTreeMap<String, EngineCtor>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `file` and `memory` engines.
    pub fn with_builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry
            .register(file::ENGINE_NAME, |roof, config| {
                Ok(Arc::new(FileWagon::from_config(roof, config)?) as Arc<dyn Wagon>)
            })?
            .register(memory::ENGINE_NAME, |roof, config| {
                Ok(Arc::new(InMemoryWagon::from_config(roof, config)?) as Arc<dyn Wagon>)
            })?;
        Ok(registry)
    }

    /// Add a constructor under `name`.
    ///
    /// Fails on an empty name or one that is already taken; an existing
    /// registration is never replaced.
    pub fn register<F>(&mut self, name: &str, ctor: F) -> Result<&mut Self, RegistryError>
    where
        F: Fn(&str, &dyn Config) -> StoreResult<Arc<dyn Wagon>> + Send + Sync + 'static,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::InvalidEngineName(name.to_string()));
        }
        if self.ctors.contains_key(name) {
            return Err(RegistryError::DuplicateEngineRegistration(name.to_string()));
        }
        self.ctors.insert(name.to_string(), Box::new(ctor));
        debug!(engine = name, "engine registered");
        Ok(self)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.ctors.contains_key(name)
    }

    /// Registered engine names, sorted.
    pub fn engine_names(&self) -> Vec<&str> {
        self.ctors.keys().map(String::as_str).collect()
    }

    /// Construct the engine configured for `roof`.
    pub fn resolve(&self, roof: &str, config: &dyn Config) -> Result<Arc<dyn Wagon>, RegistryError> {
        if !config.has_section(roof) {
            return Err(RegistryError::UnconfiguredNamespace(roof.to_string()));
        }
        let engine = config
            .value(roof, ENGINE_KEY)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RegistryError::UnconfiguredNamespace(roof.to_string()))?;

        let ctor = self.ctors.get(&engine).ok_or_else(|| RegistryError::UnknownEngine {
            roof: roof.to_string(),
            engine: engine.clone(),
        })?;
        let wagon = ctor(roof, config).map_err(|source| RegistryError::Engine {
            roof: roof.to_string(),
            engine: engine.clone(),
            source,
        })?;
        info!(roof, %engine, "engine resolved");
        Ok(wagon)
    }
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.engine_names())
            .finish()
    }
}
