//! Error types for plugin-center
//!
//! This module defines all error types used by the registry pipeline.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type for registry generation.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The plugins root directory does not exist. Fatal for the whole run.
    #[error("plugins dir not found: {}", .0.display())]
    MissingPluginRoot(PathBuf),

    /// A manifest file exists but could not be read or parsed.
    #[error("Malformed manifest {}: {reason}", path.display())]
    MalformedManifest { path: PathBuf, reason: String },

    /// Configuration-related errors (invalid mode, empty repository name, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Zip archive write failures
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// A specialized `Result` type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistryError::Config("empty repository name".to_string());
        assert_eq!(err.to_string(), "Configuration error: empty repository name");
    }

    #[test]
    fn test_missing_plugin_root_display() {
        let err = RegistryError::MissingPluginRoot(PathBuf::from("/work/plugins"));
        assert_eq!(err.to_string(), "plugins dir not found: /work/plugins");
    }

    #[test]
    fn test_malformed_manifest_display() {
        let err = RegistryError::MalformedManifest {
            path: PathBuf::from("plugins/bad/manifest.yaml"),
            reason: "did not find expected node content".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Malformed manifest plugins/bad/manifest.yaml"));
        assert!(msg.contains("did not find expected node content"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RegistryError = io_err.into();
        assert!(matches!(err, RegistryError::Io(_)));
    }

    #[test]
    fn test_result_type() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}
