//! Registry document types.
//!
//! The document is written as YAML with keys in declaration order, so the
//! struct field order below is the on-disk key order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Format tag written to `apiVersion`.
pub const API_VERSION: &str = "v1";

/// `updatedAt` format: UTC, second precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// The single aggregated registry document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    #[serde(rename = "updatedAt")]
    pub updated_at: String,

    /// Entries keyed by plugin directory name, lexicographically ordered.
    #[serde(default)]
    pub plugins: BTreeMap<String, RegistryEntry>,
}

impl RegistryDocument {
    /// An empty document stamped with `updated_at`.
    pub fn new(updated_at: DateTime<Utc>) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            updated_at: format_timestamp(updated_at),
            plugins: BTreeMap::new(),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn plugin_names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }
}

/// Everything the registry knows about one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Display name from the manifest, or the directory name.
    pub desc: String,

    pub repo: String,

    /// `plugins/<key>`
    pub subpath: String,

    #[serde(rename = "ref")]
    pub reference: String,

    /// Capabilities of the version just processed.
    #[serde(default)]
    pub shims: Vec<String>,

    #[serde(default)]
    pub versions: BTreeMap<String, VersionEntry>,
}

/// How to obtain one version of a plugin.
///
/// Serialized untagged: the YAML holds exactly the fields of the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionEntry {
    Packaged(PackagedVersion),
    Reference(ReferenceVersion),
}

impl VersionEntry {
    pub fn shims(&self) -> &[String] {
        match self {
            Self::Packaged(v) => &v.shims,
            Self::Reference(v) => &v.shims,
        }
    }

    pub fn as_packaged(&self) -> Option<&PackagedVersion> {
        match self {
            Self::Packaged(v) => Some(v),
            Self::Reference(_) => None,
        }
    }
}

/// A pre-built archive addressed by URL and digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagedVersion {
    pub source: String,
    pub sha256: String,
    #[serde(default)]
    pub shims: Vec<String>,
}

impl PackagedVersion {
    /// The artifact file name: the last path segment of `source`.
    pub fn artifact_name(&self) -> Option<&str> {
        self.source
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty() && *name != "." && *name != "..")
    }
}

/// A direct reference into the source repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceVersion {
    pub repo: String,
    pub subpath: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub shims: Vec<String>,
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
