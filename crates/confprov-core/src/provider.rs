//! Service facade over the registry and the resolution engine.
//!
//! All state lives in one [`Registry`] behind a reader/writer lock:
//!
//! - `init`, `init_manifest` and `shutdown` take the write lock for their
//!   whole duration, including directory scans
//! - `fetch`, `info` and `health` take the read lock, so fetches run
//!   concurrently and each parses its documents independently

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::registry::Registry;
use crate::resolve;
use crate::store::{DocumentStore, FileStore};
use crate::value::{Mapping, Value};

/// Provider type reported by [`Provider::info`] unless overridden
pub const DEFAULT_PROVIDER_TYPE: &str = "file";

/// Static metadata for the facade
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    /// Version string reported by `info`
    pub version: String,
    /// Provider type reported by `info`
    pub provider_type: String,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            provider_type: DEFAULT_PROVIDER_TYPE.to_string(),
        }
    }
}

/// Result of [`Provider::info`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Info {
    pub version: String,
    #[serde(rename = "type")]
    pub provider_type: String,
}

/// Coarse health state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

/// Result of [`Provider::health`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub status: HealthStatus,
    pub message: String,
}

/// Result of [`Provider::fetch`]: always a mapping
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FetchResponse {
    pub value: Mapping,
}

impl FetchResponse {
    /// Convert to the external JSON shape.
    ///
    /// JSON has no NaN or infinity, so a document holding one is rejected
    /// rather than silently turned into null.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        if let Some(key) = self
            .value
            .iter()
            .find_map(|(key, value)| has_non_finite(value).then_some(key))
        {
            return Err(
                Error::internal("failed to convert document to external representation")
                    .with_cause(format!("{:?} holds a non-finite float", key)),
            );
        }

        serde_json::to_value(&self.value).map_err(|e| {
            Error::internal("failed to convert document to external representation").with_cause(e)
        })
    }

    pub fn into_inner(self) -> Mapping {
        self.value
    }
}

fn has_non_finite(value: &Value) -> bool {
    match value {
        Value::Float(f) => !f.is_finite(),
        Value::Sequence(items) => items.iter().any(has_non_finite),
        Value::Mapping(map) => map.values().any(has_non_finite),
        _ => false,
    }
}

/// Multi-instance configuration provider
pub struct Provider {
    options: ProviderOptions,
    store: Arc<dyn DocumentStore>,
    registry: RwLock<Registry>,
}

impl Provider {
    /// Create a provider over `store` with default metadata
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_options(store, ProviderOptions::default())
    }

    /// Create a provider with custom metadata
    pub fn with_options(store: Arc<dyn DocumentStore>, options: ProviderOptions) -> Self {
        let registry = Registry::new(store.extensions().to_vec());
        Self {
            options,
            store,
            registry: RwLock::new(registry),
        }
    }

    /// Register one instance. See [`Registry::init`] for the rollback rules.
    pub fn init(&self, alias: &str, config: &Mapping, relative_base: Option<&Path>) -> Result<()> {
        self.registry.write().init(alias, config, relative_base)
    }

    /// Initialize every instance a manifest declares, in order.
    ///
    /// Stops at the first failure; by then the registry has already applied
    /// its rollback rules.
    pub fn init_manifest(&self, manifest: &Manifest) -> Result<()> {
        let mut registry = self.registry.write();
        for entry in &manifest.instances {
            registry.init(&entry.alias, &entry.config, manifest.source())?;
        }
        Ok(())
    }

    /// Resolve a fetch path against the current registry
    pub fn fetch(&self, path: &[String]) -> Result<FetchResponse> {
        let registry = self.registry.read();
        let value = resolve::resolve(&registry, self.store.as_ref(), path)?;
        Ok(FetchResponse { value })
    }

    pub fn info(&self) -> Info {
        Info {
            version: self.options.version.clone(),
            provider_type: self.options.provider_type.clone(),
        }
    }

    /// Healthy while at least one instance is registered
    pub fn health(&self) -> Health {
        if self.registry.read().is_empty() {
            Health {
                status: HealthStatus::Degraded,
                message: "no instances initialized".to_string(),
            }
        } else {
            Health {
                status: HealthStatus::Ok,
                message: "healthy".to_string(),
            }
        }
    }

    /// Drop every instance. Safe to call repeatedly.
    pub fn shutdown(&self) {
        self.registry.write().reset();
    }

    /// Run `f` against a read-locked view of the registry
    pub fn with_registry<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
        f(&*self.registry.read())
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new(Arc::new(FileStore::yaml()))
    }
}
