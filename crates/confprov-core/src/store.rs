//! Document store: turns a file on disk into a parsed [`Mapping`].
//!
//! The resolution engine only depends on the [`DocumentStore`] trait; the
//! bundled [`FileStore`] decodes YAML or JSON documents with serde.

use std::path::{Path, PathBuf};

use crate::value::{Mapping, Value};

/// Reasons a single document could not be produced
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file content is not valid for the store's format
    #[error("syntax error in {}: {message}", path.display())]
    Syntax { path: PathBuf, message: String },
    /// The document root is not a mapping
    #[error("document root in {} must be a mapping, got {found}", path.display())]
    NotAMapping { path: PathBuf, found: &'static str },
}

/// Parses configuration documents by absolute path.
///
/// Implementations must be safe to call from many readers at once and must
/// not cache: every call reflects the file as it is on disk.
pub trait DocumentStore: Send + Sync {
    /// File extensions (without the leading dot) this store understands
    fn extensions(&self) -> &[String];

    /// Parse the file at `path` into a document
    fn parse(&self, path: &Path) -> Result<Mapping, ParseError>;
}

/// Serialization format understood by [`FileStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

/// Document store backed by YAML or JSON files
#[derive(Debug, Clone)]
pub struct FileStore {
    format: Format,
    extensions: Vec<String>,
}

impl FileStore {
    /// YAML documents with `.yaml` or `.yml` extensions
    pub fn yaml() -> Self {
        Self {
            format: Format::Yaml,
            extensions: vec!["yaml".into(), "yml".into()],
        }
    }

    /// JSON documents with the `.json` extension
    pub fn json() -> Self {
        Self {
            format: Format::Json,
            extensions: vec!["json".into()],
        }
    }

    /// Replace the recognized extensions
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.into().trim_start_matches('.').to_string())
            .collect();
        self
    }

    /// Format this store decodes
    pub fn format(&self) -> Format {
        self.format
    }

    fn decode(&self, path: &Path, content: &str) -> Result<Value, ParseError> {
        let syntax = |message: String| ParseError::Syntax {
            path: path.to_path_buf(),
            message,
        };
        match self.format {
            Format::Yaml => serde_yaml::from_str(content).map_err(|e| syntax(e.to_string())),
            Format::Json => serde_json::from_str(content).map_err(|e| syntax(e.to_string())),
        }
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::yaml()
    }
}

impl DocumentStore for FileStore {
    fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn parse(&self, path: &Path) -> Result<Mapping, ParseError> {
        let content = std::fs::read_to_string(path).map_err(|source| ParseError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        log::trace!("Parsing document: {}", path.display());

        // An empty YAML file decodes to null; treat it as an empty document.
        if content.trim().is_empty() {
            return Ok(Mapping::new());
        }

        match self.decode(path, &content)? {
            Value::Mapping(map) => Ok(map),
            Value::Null => Ok(Mapping::new()),
            other => Err(ParseError::NotAMapping {
                path: path.to_path_buf(),
                found: other.type_name(),
            }),
        }
    }
}
