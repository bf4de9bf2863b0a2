//! Error types for confprov
//!
//! Every failure carries a kind that maps onto an external status name, a
//! human readable message, and optional help, cause, and rollback context.

use std::fmt;
use std::path::Path;

/// Result type alias for confprov operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for confprov operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Primary message, already prefixed with the alias where one applies
    pub message: String,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
    /// Number of instances discarded by a registration rollback
    pub rolled_back: Option<usize>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed request shape (empty alias, bad path, navigation into a scalar)
    InvalidInput,
    /// Addressed directory, instance, file, or key does not exist
    NotFound,
    /// Duplicate alias or duplicate directory
    Conflict,
    /// The registry is not in a state that can serve the request
    FailedPrecondition,
    /// Filesystem, canonicalization, parse, or conversion failure
    Internal,
}

impl ErrorKind {
    /// External status name reported to callers of the facade
    pub fn status(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "INVALID_ARGUMENT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict | ErrorKind::FailedPrecondition => "FAILED_PRECONDITION",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::InvalidInput => "Invalid input",
            ErrorKind::NotFound => "Not found",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::FailedPrecondition => "Failed precondition",
            ErrorKind::Internal => "Internal error",
        };
        f.write_str(label)
    }
}

impl Error {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            help: None,
            cause: None,
            rolled_back: None,
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a failed precondition error
    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FailedPrecondition, message)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Alias already registered
    pub fn alias_taken() -> Self {
        Self::conflict("provider instance already initialized")
            .with_help("Call shutdown before re-initializing an alias")
    }

    /// Canonical directory already owned by another alias
    pub fn directory_taken(directory: &Path, owner: &str, alias: &str) -> Self {
        Self::conflict(format!(
            "directory {:?} already registered by provider instance {:?}, cannot register as {:?}",
            directory.display().to_string(),
            owner,
            alias
        ))
        .with_help(format!(
            "Reuse alias {:?} or point {:?} at a different directory",
            owner, alias
        ))
    }

    /// Fetch against an empty registry
    pub fn not_initialized() -> Self {
        Self::failed_precondition("no provider instances initialized")
            .with_help("Call init with an alias and a directory first")
    }

    /// Prefix the message with the alias the failing call was made for
    pub fn for_alias(mut self, alias: &str) -> Self {
        self.message = format!("alias {:?}: {}", alias, self.message);
        self
    }

    /// Record that a registration rollback discarded `count` instances
    pub fn with_rollback(mut self, count: usize) -> Self {
        self.message = format!(
            "{}; rolled back all {} instance(s)",
            self.message, count
        );
        self.rolled_back = Some(count);
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Add underlying cause to the error
    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    /// External status name for this error
    pub fn status(&self) -> &'static str {
        self.kind.status()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;

        if let Some(cause) = &self.cause {
            write!(f, "\n  Cause: {}", cause)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorKind::InvalidInput.status(), "INVALID_ARGUMENT");
        assert_eq!(ErrorKind::NotFound.status(), "NOT_FOUND");
        assert_eq!(ErrorKind::Conflict.status(), "FAILED_PRECONDITION");
        assert_eq!(ErrorKind::FailedPrecondition.status(), "FAILED_PRECONDITION");
        assert_eq!(ErrorKind::Internal.status(), "INTERNAL");
    }

    #[test]
    fn test_alias_taken_display() {
        let err = Error::alias_taken().for_alias("local");
        let display = format!("{}", err);

        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(display.contains("Conflict: alias \"local\": provider instance already initialized"));
        assert!(display.contains("Help:"));
    }

    #[test]
    fn test_directory_taken_names_both_aliases() {
        let err = Error::directory_taken(Path::new("/etc/configs"), "first", "second");

        assert!(err.message.contains("/etc/configs"));
        assert!(err.message.contains("\"first\""));
        assert!(err.message.contains("\"second\""));
    }

    #[test]
    fn test_for_alias_and_rollback() {
        let err = Error::invalid_input("path is not a directory: /tmp/x")
            .for_alias("shared")
            .with_rollback(2);

        assert_eq!(err.rolled_back, Some(2));
        assert_eq!(
            err.message,
            "alias \"shared\": path is not a directory: /tmp/x; rolled back all 2 instance(s)"
        );
    }

    #[test]
    fn test_with_cause() {
        let err = Error::internal("failed to canonicalize path").with_cause("permission denied");
        let display = format!("{}", err);

        assert!(display.contains("Internal error: failed to canonicalize path"));
        assert!(display.contains("Cause: permission denied"));
        assert!(err.rolled_back.is_none());
    }

    #[test]
    fn test_not_initialized() {
        let err = Error::not_initialized();
        assert_eq!(err.kind, ErrorKind::FailedPrecondition);
        assert_eq!(err.status(), "FAILED_PRECONDITION");
    }
}
