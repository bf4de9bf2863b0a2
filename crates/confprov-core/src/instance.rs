//! One provider instance: an alias bound to a directory of documents.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A registered configuration directory.
///
/// Instances are immutable once created. A rescan produces a new instance
/// rather than editing `files` in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    alias: String,
    directory: PathBuf,
    /// base name -> absolute file path, ordered by base name
    files: BTreeMap<String, PathBuf>,
    ready: bool,
}

impl Instance {
    /// Build an instance by scanning `directory` (already canonical) for
    /// files carrying one of `extensions`.
    ///
    /// Only regular entries directly inside the directory are considered.
    /// Fails when two files share a base name or when nothing matches.
    pub fn scan(alias: &str, directory: &Path, extensions: &[String]) -> Result<Self> {
        let files = enumerate_files(directory, extensions)?;
        Ok(Self {
            alias: alias.to_string(),
            directory: directory.to_path_buf(),
            files,
            ready: true,
        })
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Canonical directory this instance was registered with
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Base names with their absolute paths, in ascending base name order
    pub fn files(&self) -> &BTreeMap<String, PathBuf> {
        &self.files
    }

    /// Absolute path of the document with the given base name
    pub fn file(&self, base_name: &str) -> Option<&Path> {
        self.files.get(base_name).map(PathBuf::as_path)
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

fn enumerate_files(directory: &Path, extensions: &[String]) -> Result<BTreeMap<String, PathBuf>> {
    let entries = std::fs::read_dir(directory).map_err(|e| {
        Error::internal(format!(
            "failed to read directory {:?}",
            directory.display().to_string()
        ))
        .with_cause(e)
    })?;

    let mut files = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            Error::internal(format!(
                "failed to read directory {:?}",
                directory.display().to_string()
            ))
            .with_cause(e)
        })?;

        let path = entry.path();
        // Follows symlinks, so a link to a directory is skipped as well
        if path.is_dir() {
            continue;
        }

        let Some(name) = base_name(&path, extensions) else {
            continue;
        };

        if files.contains_key(&name) {
            return Err(Error::internal(format!(
                "duplicate file base name {:?} in directory {:?}",
                name,
                directory.display().to_string()
            ))
            .with_help("Remove or rename one of the files sharing this base name"));
        }

        files.insert(name, directory.join(entry.file_name()));
    }

    if files.is_empty() {
        return Err(Error::internal(format!(
            "no {} files found in directory {:?}",
            describe_extensions(extensions),
            directory.display().to_string()
        )));
    }

    Ok(files)
}

/// File name with a recognized extension stripped, if it has one
fn base_name(path: &Path, extensions: &[String]) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    extensions.iter().find_map(|ext| {
        let stem = file_name.strip_suffix(ext.as_str())?.strip_suffix('.')?;
        (!stem.is_empty()).then(|| stem.to_string())
    })
}

fn describe_extensions(extensions: &[String]) -> String {
    extensions
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn yaml_ext() -> Vec<String> {
        vec!["yaml".into(), "yml".into()]
    }

    fn fixture(name: &str, files: &[&str]) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).unwrap();
        for file in files {
            std::fs::write(dir.join(file), "key: value\n").unwrap();
        }
        dir.canonicalize().unwrap()
    }

    #[test]
    fn test_scan_collects_base_names() {
        let dir = fixture(
            "confprov_test_instance_scan",
            &["database.yaml", "network.yml", "notes.txt", "README"],
        );
        std::fs::create_dir_all(dir.join("nested.yaml")).unwrap();

        let instance = Instance::scan("local", &dir, &yaml_ext()).unwrap();

        assert_eq!(instance.alias(), "local");
        assert_eq!(instance.directory(), dir.as_path());
        assert!(instance.is_ready());
        let names: Vec<_> = instance.files().keys().cloned().collect();
        assert_eq!(names, vec!["database", "network"]);
        assert_eq!(
            instance.file("network"),
            Some(dir.join("network.yml").as_path())
        );
        assert!(instance.file("nested").is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_scan_orders_lexicographically() {
        let dir = fixture(
            "confprov_test_instance_order",
            &["beta.yaml", "Zeta.yaml", "alpha.yaml", "10.yaml", "9.yaml"],
        );

        let instance = Instance::scan("local", &dir, &yaml_ext()).unwrap();
        let names: Vec<_> = instance.files().keys().cloned().collect();
        assert_eq!(names, vec!["10", "9", "Zeta", "alpha", "beta"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_scan_rejects_duplicate_base_name() {
        let dir = fixture("confprov_test_instance_dup", &["app.yaml", "app.yml"]);

        let err = Instance::scan("local", &dir, &yaml_ext()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert!(err.message.contains("duplicate file base name \"app\""));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_scan_rejects_empty_directory() {
        let dir = fixture("confprov_test_instance_empty", &["notes.txt", ".yaml"]);

        let err = Instance::scan("local", &dir, &yaml_ext()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert!(err.message.contains("no .yaml/.yml files found"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_base_name() {
        let ext = yaml_ext();
        assert_eq!(base_name(Path::new("/x/app.yaml"), &ext), Some("app".into()));
        assert_eq!(base_name(Path::new("/x/app.v2.yml"), &ext), Some("app.v2".into()));
        assert_eq!(base_name(Path::new("/x/appyaml"), &ext), None);
        assert_eq!(base_name(Path::new("/x/app.YAML"), &ext), None);
        assert_eq!(base_name(Path::new("/x/.yaml"), &ext), None);
    }
}
