//! Manifest of provider instances to initialize.
//!
//! ```yaml
//! instances:
//!   - alias: local
//!     config:
//!       directory: ./configs
//!   - alias: shared
//!     config:
//!       directory: /etc/configs
//! ```
//!
//! Relative directories resolve against the manifest's own directory.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::registry::DIRECTORY_KEY;
use crate::value::{Mapping, Value};

/// One instance declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceEntry {
    pub alias: String,
    /// Init config; `directory` is required, other keys are ignored
    #[serde(default)]
    pub config: Mapping,
}

impl InstanceEntry {
    /// Entry whose config only carries a directory
    pub fn new(alias: impl Into<String>, directory: impl Into<String>) -> Self {
        let mut config = Mapping::new();
        config.insert(DIRECTORY_KEY.to_string(), Value::String(directory.into()));
        Self {
            alias: alias.into(),
            config,
        }
    }
}

/// Ordered list of instances plus the file they were read from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub instances: Vec<InstanceEntry>,
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a manifest from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::invalid_input("invalid provider manifest").with_cause(e))
    }

    /// Load a manifest file; its path becomes the relative base for every entry
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            let message = format!("failed to read manifest {}", path.display());
            if e.kind() == IoErrorKind::NotFound {
                Error::not_found(message).with_cause(e)
            } else {
                Error::internal(message).with_cause(e)
            }
        })?;

        let mut manifest = Self::from_yaml(&content)?;
        manifest.source = Some(path.to_path_buf());
        Ok(manifest)
    }

    /// Append an instance declaration
    pub fn push(&mut self, entry: InstanceEntry) -> &mut Self {
        self.instances.push(entry);
        self
    }

    /// Base path relative directories resolve against
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
