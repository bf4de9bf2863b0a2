//! Fetch path resolution
//!
//! A fetch runs `validate -> detect mode -> load file(s) -> navigate -> shape`
//! against a read-only view of the [`Registry`]. Nothing is cached between
//! calls; every document is parsed fresh from the [`DocumentStore`].
//!
//! Path layout depends on the [`Mode`]:
//!
//! ```text
//! explicit:  [alias, file, key, key, ...]
//! implicit:  [file, key, key, ...]          (exactly one instance)
//! ```
//!
//! `file` may be [`WILDCARD`] to deep-merge every document of the instance
//! in ascending base name order. A trailing [`WILDCARD`] after the keys
//! returns the mapping reached so far.

use std::fmt;

use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::registry::{Mode, Registry};
use crate::store::DocumentStore;
use crate::value::{merge_mappings, Mapping, Value};

/// Reserved path segment for merge-all and trailing expansion
pub const WILDCARD: &str = "*";

/// Key used to wrap non-mapping results
pub const VALUE_KEY: &str = "value";

/// Resolve `path` to a map-shaped document
pub fn resolve(registry: &Registry, store: &dyn DocumentStore, path: &[String]) -> Result<Mapping> {
    let target = Target::locate(registry, path)?;

    log::debug!(
        "Fetching from provider instance: alias={:?} path={:?} mode={}",
        target.instance.alias(),
        path,
        target.mode
    );

    let document = load(target.instance, store, target.file)?;
    let value = navigate(document, path, target.keys_start, &target)?;
    Ok(shape(value))
}

/// Wrap scalars and sequences so every result is a mapping
pub fn shape(value: Value) -> Mapping {
    match value {
        Value::Mapping(map) => map,
        other => {
            let mut wrapped = Mapping::with_capacity(1);
            wrapped.insert(VALUE_KEY.to_string(), other);
            wrapped
        }
    }
}

/// Parse every document of `instance` and deep-merge them in ascending base
/// name order; later files win on collisions.
pub fn merge_all(instance: &Instance, store: &dyn DocumentStore) -> Result<Mapping> {
    let mut merged = Mapping::new();
    for (base_name, path) in instance.files() {
        let document = parse(store, instance, base_name, path)?;
        merge_mappings(&mut merged, document);
    }
    Ok(merged)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Addressing {
    Explicit,
    Implicit,
}

impl fmt::Display for Addressing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Addressing::Explicit => f.write_str("explicit"),
            Addressing::Implicit => f.write_str("implicit"),
        }
    }
}

/// Instance and file a path addresses, plus where the nested keys begin
struct Target<'a> {
    instance: &'a Instance,
    file: &'a str,
    keys_start: usize,
    mode: Addressing,
}

impl<'a> Target<'a> {
    fn locate(registry: &'a Registry, path: &'a [String]) -> Result<Self> {
        let Some(first) = path.first() else {
            return Err(Error::invalid_input("path cannot be empty"));
        };
        if first.is_empty() {
            return Err(Error::invalid_input("path[0] cannot be empty"));
        }

        match registry.detect_mode(first) {
            Mode::Explicit(instance) => {
                let file = path.get(1).ok_or_else(|| {
                    Error::invalid_input("path must contain at least [alias, filename]")
                })?;
                Ok(Self {
                    instance,
                    file,
                    keys_start: 2,
                    mode: Addressing::Explicit,
                })
            }
            Mode::Implicit(instance) => Ok(Self {
                instance,
                file: first,
                keys_start: 1,
                mode: Addressing::Implicit,
            }),
            Mode::Uninitialized => Err(Error::not_initialized()),
            Mode::Ambiguous => Err(Error::not_found(format!(
                "provider instance {:?} not found (hint: with multiple instances, path must start with alias)",
                first
            ))),
        }
    }
}

fn load(instance: &Instance, store: &dyn DocumentStore, file: &str) -> Result<Mapping> {
    if file == WILDCARD {
        return merge_all(instance, store);
    }

    let path = instance.file(file).ok_or_else(|| {
        Error::not_found(format!(
            "file {:?} not found in provider instance {:?}",
            file,
            instance.alias()
        ))
    })?;
    parse(store, instance, file, path)
}

fn parse(
    store: &dyn DocumentStore,
    instance: &Instance,
    base_name: &str,
    path: &std::path::Path,
) -> Result<Mapping> {
    store.parse(path).map_err(|e| {
        Error::internal(format!(
            "failed to parse file {:?} in provider instance {:?}",
            base_name,
            instance.alias()
        ))
        .with_cause(e)
    })
}

fn navigate(document: Mapping, path: &[String], start: usize, target: &Target<'_>) -> Result<Value> {
    let mut current = Value::Mapping(document);

    for (index, key) in path.iter().enumerate().skip(start) {
        let is_last = index + 1 == path.len();

        if key == WILDCARD {
            if !is_last {
                return Err(Error::invalid_input(format!(
                    "cannot navigate to path {:?}: wildcard at index {} must be the last element",
                    path, index
                )));
            }
            if !current.is_mapping() {
                return Err(Error::invalid_input(format!(
                    "cannot expand path {:?}: element at index {} is a {}, not a map",
                    path,
                    index,
                    current.type_name()
                )));
            }
            break;
        }

        current = match current {
            Value::Mapping(mut map) => map.swap_remove(key.as_str()).ok_or_else(|| {
                Error::not_found(format!(
                    "path element {:?} not found in file {:?} (provider instance {:?})",
                    key,
                    target.file,
                    target.instance.alias()
                ))
            })?,
            other => {
                return Err(Error::invalid_input(format!(
                    "cannot navigate to path {:?}: element at index {} is not a map (found {})",
                    path,
                    index,
                    other.type_name()
                )));
            }
        };
    }

    Ok(current)
}
