//! Plugin types for plugin-center
//!
//! This module defines the manifest structure parsed from a plugin's
//! `manifest.yaml`, `manifest.yml`, or `manifest.json`, and the on-disk
//! plugin directory that owns it.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

/// Version recorded for plugins whose manifest does not declare one.
pub const DEFAULT_VERSION: &str = "0.0.0";

/// The normalized manifest of a single plugin.
///
/// Every field has a default, so an empty manifest file is valid.
///
/// # Example
///
/// ```yaml
/// name: Tester
/// version: 1.2.0
/// expose:
///   - run
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginManifest {
    /// Display name. Falls back to the plugin directory name when absent.
    pub name: Option<String>,

    /// Version string, `"0.0.0"` when the manifest declares none.
    pub version: String,

    /// Capability identifiers the plugin exposes, in declaration order.
    pub expose: Vec<String>,
}

impl Default for PluginManifest {
    fn default() -> Self {
        Self {
            name: None,
            version: DEFAULT_VERSION.to_string(),
            expose: Vec::new(),
        }
    }
}

impl PluginManifest {
    /// Human-readable name, using `key` when the manifest has no usable name.
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => key,
        }
    }
}

/// A manifest exactly as written on disk, before defaults are applied.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawManifest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub version: Option<RawVersion>,

    #[serde(default)]
    pub expose: Option<Vec<String>>,
}

/// `version: 1.2` is a number to YAML and JSON but a version string to us.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawVersion {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl RawVersion {
    /// Zero and the empty string count as "not declared".
    fn is_unset(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Integer(n) => *n == 0,
            Self::Float(f) => *f == 0.0,
        }
    }
}

impl fmt::Display for RawVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s.trim()),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
            Self::Float(x) => write!(f, "{}", x),
        }
    }
}

/// The version ends up in the artifact file name, so it must stay a single
/// path component.
fn check_version(version: &str) -> Result<(), String> {
    if version == "." || version == ".." {
        return Err(format!("invalid version '{}'", version));
    }
    if version.contains(['/', '\\', '\0']) {
        return Err(format!("version '{}' contains a path separator", version));
    }
    Ok(())
}

impl TryFrom<RawManifest> for PluginManifest {
    type Error = String;

    fn try_from(raw: RawManifest) -> Result<Self, Self::Error> {
        let version = raw
            .version
            .filter(|v| !v.is_unset())
            .map(|v| v.to_string())
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        check_version(&version)?;

        Ok(Self {
            name: raw.name,
            version,
            expose: raw.expose.unwrap_or_default(),
        })
    }
}

/// A plugin directory paired with its loaded manifest.
#[derive(Debug, Clone)]
pub struct PluginSource {
    /// Directory name; the plugin's registry key.
    pub key: String,

    /// The directory the plugin was loaded from.
    pub path: PathBuf,

    /// The parsed manifest.
    pub manifest: PluginManifest,
}

impl PluginSource {
    pub fn display_name(&self) -> &str {
        self.manifest.display_name(&self.key)
    }

    pub fn version(&self) -> &str {
        &self.manifest.version
    }

    /// Registry `subpath` of this plugin inside the source repository.
    pub fn subpath(&self) -> String {
        format!("plugins/{}", self.key)
    }
}
