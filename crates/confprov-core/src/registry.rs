//! Instance registry with all-or-nothing registration.
//!
//! The registry owns every [`Instance`] together with two indexes that must
//! stay consistent with it:
//!
//! 1. `instances`: alias -> instance
//! 2. `directory_index`: canonical directory -> alias (duplicate guard)
//! 3. `order`: committed aliases in registration order (rollback sequence)
//!
//! A registration step either commits to all three or leaves them untouched.
//! When a registration fails after earlier ones succeeded, every committed
//! instance is rolled back so callers never observe a partial set.
//! Registering a directory another alias already owns is the one refusal
//! that leaves the committed set in place.

use std::collections::HashMap;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::value::{Mapping, Value};

/// Config key holding the instance directory
pub const DIRECTORY_KEY: &str = "directory";

/// How the first segment of a fetch path addresses the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode<'a> {
    /// Segment 0 names a registered alias
    Explicit(&'a Instance),
    /// Exactly one instance exists and segment 0 is a file name in it
    Implicit(&'a Instance),
    /// Several instances exist and segment 0 names none of them
    Ambiguous,
    /// No instance is registered
    Uninitialized,
}

/// Outcome of a failed registration step
enum Rejection {
    /// Roll back every committed instance
    Abort(Error),
    /// Refuse this call only
    Refuse(Error),
}

/// Owns all provider instances
#[derive(Debug, Clone)]
pub struct Registry {
    extensions: Vec<String>,
    instances: HashMap<String, Instance>,
    directory_index: HashMap<PathBuf, String>,
    order: Vec<String>,
}

impl Registry {
    /// Create an empty registry that indexes files with the given extensions
    pub fn new(extensions: Vec<String>) -> Self {
        Self {
            extensions,
            instances: HashMap::new(),
            directory_index: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register an instance from an init config mapping.
    ///
    /// `config` must carry a string `directory`; other keys are ignored.
    pub fn init(&mut self, alias: &str, config: &Mapping, relative_base: Option<&Path>) -> Result<()> {
        let outcome = self
            .check_alias(alias)
            .and_then(|()| directory_from_config(config))
            .map_err(Rejection::Abort)
            .and_then(|directory| self.prepare(alias, directory, relative_base));
        self.settle(alias, outcome)
    }

    /// Register `raw_directory` under `alias`.
    ///
    /// A relative directory is resolved against the directory containing
    /// `relative_base` when given, otherwise against the working directory.
    pub fn register(&mut self, alias: &str, raw_directory: &str, relative_base: Option<&Path>) -> Result<()> {
        let outcome = self
            .check_alias(alias)
            .map_err(Rejection::Abort)
            .and_then(|()| self.prepare(alias, raw_directory, relative_base));
        self.settle(alias, outcome)
    }

    /// Drop every instance unconditionally
    pub fn reset(&mut self) {
        if !self.order.is_empty() {
            log::info!("Resetting registry: {} instance(s) removed", self.order.len());
        }
        self.instances.clear();
        self.directory_index.clear();
        self.order.clear();
    }

    /// Decide how a fetch path whose first segment is `first` addresses the
    /// registry. Always returns one of the four modes.
    pub fn detect_mode(&self, first: &str) -> Mode<'_> {
        if let Some(instance) = self.instances.get(first) {
            return Mode::Explicit(instance);
        }
        match self.order.as_slice() {
            [] => Mode::Uninitialized,
            [only] => self
                .instances
                .get(only)
                .map_or(Mode::Uninitialized, Mode::Implicit),
            _ => Mode::Ambiguous,
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn get(&self, alias: &str) -> Option<&Instance> {
        self.instances.get(alias)
    }

    /// Alias owning a canonical directory
    pub fn owner_of(&self, directory: &Path) -> Option<&str> {
        self.directory_index.get(directory).map(String::as_str)
    }

    /// Aliases in registration order
    pub fn aliases(&self) -> &[String] {
        &self.order
    }

    /// Instances in registration order
    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.order.iter().filter_map(|alias| self.instances.get(alias))
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Alias checks run before anything in the config is looked at
    fn check_alias(&self, alias: &str) -> Result<()> {
        if alias.is_empty() {
            return Err(Error::invalid_input("alias cannot be empty"));
        }
        if self.instances.contains_key(alias) {
            return Err(Error::alias_taken());
        }
        Ok(())
    }

    fn prepare(
        &self,
        alias: &str,
        raw_directory: &str,
        relative_base: Option<&Path>,
    ) -> std::result::Result<Instance, Rejection> {
        let directory = absolute_directory(raw_directory, relative_base).map_err(Rejection::Abort)?;
        check_directory(&directory).map_err(Rejection::Abort)?;

        let canonical = std::fs::canonicalize(&directory).map_err(|e| {
            Rejection::Abort(Error::internal("failed to canonicalize path").with_cause(e))
        })?;

        if let Some(owner) = self.owner_of(&canonical) {
            return Err(Rejection::Refuse(Error::directory_taken(&canonical, owner, alias)));
        }

        Instance::scan(alias, &canonical, &self.extensions).map_err(Rejection::Abort)
    }

    fn settle(&mut self, alias: &str, outcome: std::result::Result<Instance, Rejection>) -> Result<()> {
        match outcome {
            Ok(instance) => {
                self.commit(instance);
                Ok(())
            }
            Err(Rejection::Refuse(err)) => Err(err.for_alias(alias)),
            Err(Rejection::Abort(err)) => {
                let err = err.for_alias(alias);
                if self.order.is_empty() {
                    return Err(err);
                }
                let count = self.rollback_all();
                Err(err.with_rollback(count))
            }
        }
    }

    fn commit(&mut self, instance: Instance) {
        log::info!(
            "Initialized provider instance: alias={:?} directory={:?} files={}",
            instance.alias(),
            instance.directory().display().to_string(),
            instance.files().len()
        );

        let alias = instance.alias().to_string();
        self.directory_index
            .insert(instance.directory().to_path_buf(), alias.clone());
        self.order.push(alias.clone());
        self.instances.insert(alias, instance);
    }

    /// Remove every committed instance, newest first. Returns how many were
    /// removed.
    fn rollback_all(&mut self) -> usize {
        let count = self.order.len();
        while let Some(alias) = self.order.pop() {
            log::warn!("Rolling back provider instance: alias={:?}", alias);
            if let Some(instance) = self.instances.remove(&alias) {
                self.directory_index.remove(instance.directory());
            }
        }
        self.instances.clear();
        self.directory_index.clear();
        count
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(vec!["yaml".into(), "yml".into()])
    }
}

fn directory_from_config(config: &Mapping) -> Result<&str> {
    match config.get(DIRECTORY_KEY) {
        None => Err(Error::invalid_input(format!(
            "missing required config key '{}'",
            DIRECTORY_KEY
        ))),
        Some(Value::String(directory)) => Ok(directory.as_str()),
        Some(other) => Err(Error::invalid_input(format!(
            "{} must be a string, got {}",
            DIRECTORY_KEY,
            other.type_name()
        ))),
    }
}

fn absolute_directory(raw: &str, relative_base: Option<&Path>) -> Result<PathBuf> {
    let raw_path = Path::new(raw);
    let joined = match relative_base {
        Some(base) if raw_path.is_relative() => base
            .parent()
            .map_or_else(|| raw_path.to_path_buf(), |parent| parent.join(raw_path)),
        _ => raw_path.to_path_buf(),
    };

    std::path::absolute(&joined).map_err(|e| {
        Error::invalid_input(format!("failed to resolve path to absolute: {:?}", raw)).with_cause(e)
    })
}

fn check_directory(directory: &Path) -> Result<()> {
    let metadata = std::fs::metadata(directory).map_err(|e| {
        if e.kind() == IoErrorKind::NotFound {
            Error::not_found(format!("directory does not exist: {}", directory.display()))
        } else {
            Error::internal("failed to stat directory").with_cause(e)
        }
    })?;

    if !metadata.is_dir() {
        return Err(Error::invalid_input(format!(
            "path is not a directory: {}",
            directory.display()
        )));
    }

    Ok(())
}
