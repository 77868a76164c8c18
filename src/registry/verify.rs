//! Consumer-side integrity check of a generated registry.
//!
//! Recomputes the SHA-256 of every packaged artifact a registry document
//! lists and compares it with the recorded digest.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::packaging::sha256_file;

use super::types::{RegistryDocument, VersionEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyStatus {
    /// Digest on disk matches the document.
    Verified,
    /// Artifact present but its bytes differ from what was recorded.
    Mismatch { expected: String, actual: String },
    /// No artifact file at the resolved location.
    Missing,
    /// Reference-mode entry; there is nothing to hash.
    NotPackaged,
}

impl VerifyStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Mismatch { .. } | Self::Missing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub plugin: String,
    pub version: String,
    pub artifact: Option<PathBuf>,
    pub status: VerifyStatus,
}

#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    pub outcomes: Vec<VerifyOutcome>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        !self.outcomes.iter().any(|o| o.status.is_failure())
    }

    pub fn failures(&self) -> impl Iterator<Item = &VerifyOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_failure())
    }

    pub fn verified_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == VerifyStatus::Verified)
            .count()
    }
}

/// Read a registry document from disk.
pub fn load_document(path: &Path) -> Result<RegistryDocument> {
    let content = fs::read_to_string(path)?;
    RegistryDocument::from_yaml(&content)
}

/// Check every packaged version in `document` against `artifacts_dir`.
///
/// Artifacts are located by the last path segment of each `source` URL.
pub fn verify_registry(document: &RegistryDocument, artifacts_dir: &Path) -> Result<VerifyReport> {
    let mut report = VerifyReport::default();

    for (plugin, entry) in &document.plugins {
        for (version, version_entry) in &entry.versions {
            let outcome = match version_entry {
                VersionEntry::Reference(_) => VerifyOutcome {
                    plugin: plugin.clone(),
                    version: version.clone(),
                    artifact: None,
                    status: VerifyStatus::NotPackaged,
                },
                VersionEntry::Packaged(packaged) => {
                    let artifact = packaged.artifact_name().map(|name| artifacts_dir.join(name));
                    let status = match &artifact {
                        Some(path) if path.is_file() => {
                            let actual = sha256_file(path)?;
                            if actual.eq_ignore_ascii_case(packaged.sha256.trim()) {
                                VerifyStatus::Verified
                            } else {
                                VerifyStatus::Mismatch {
                                    expected: packaged.sha256.clone(),
                                    actual,
                                }
                            }
                        }
                        _ => VerifyStatus::Missing,
                    };
                    VerifyOutcome {
                        plugin: plugin.clone(),
                        version: version.clone(),
                        artifact,
                        status,
                    }
                }
            };

            match &outcome.status {
                VerifyStatus::Verified => {
                    info!(plugin = %plugin, version = %version, "Artifact verified")
                }
                VerifyStatus::Mismatch { expected, actual } => warn!(
                    plugin = %plugin,
                    version = %version,
                    expected = %expected,
                    actual = %actual,
                    "Artifact digest mismatch"
                ),
                VerifyStatus::Missing => {
                    warn!(plugin = %plugin, version = %version, "Artifact missing")
                }
                VerifyStatus::NotPackaged => {}
            }
            report.outcomes.push(outcome);
        }
    }

    Ok(report)
}
