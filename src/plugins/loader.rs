//! Plugin discovery and manifest loading for plugin-center
//!
//! This module lists plugin directories under the plugins root, resolves
//! each directory's manifest file, and parses it into a [`PluginManifest`].
//! A directory without a manifest is not an error: loading returns
//! `Ok(None)` and the caller decides to skip it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{RegistryError, Result};

use super::types::{PluginManifest, PluginSource, RawManifest};

/// Accepted manifest file names, in precedence order.
pub const MANIFEST_CANDIDATES: [&str; 3] = ["manifest.yaml", "manifest.yml", "manifest.json"];

/// List the immediate subdirectories of `root`, sorted by name.
///
/// Regular files and other non-directories are ignored. Returns
/// [`RegistryError::MissingPluginRoot`] if `root` is not a directory.
pub fn discover_plugin_dirs(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !root.is_dir() {
        return Err(RegistryError::MissingPluginRoot(root.to_path_buf()));
    }

    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            debug!(path = %path.display(), "Skipping plugin directory with non UTF-8 name");
            continue;
        };
        dirs.push((name, path));
    }

    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(dirs)
}

/// Find the manifest file of a plugin directory.
///
/// Returns the first of [`MANIFEST_CANDIDATES`] that exists as a file.
pub fn locate_manifest(dir: &Path) -> Option<PathBuf> {
    MANIFEST_CANDIDATES
        .iter()
        .map(|candidate| dir.join(candidate))
        .find(|path| path.is_file())
}

/// Load the manifest of a plugin directory.
///
/// # Returns
/// - `Ok(Some(manifest))` when a manifest resolved and parsed
/// - `Ok(None)` when the directory has no manifest file
///
/// # Errors
/// - `RegistryError::MalformedManifest` if the file cannot be read or parsed
pub fn load_manifest(dir: &Path) -> Result<Option<PluginManifest>> {
    match locate_manifest(dir) {
        Some(path) => parse_manifest_file(&path).map(Some),
        None => Ok(None),
    }
}

/// Load a plugin directory into a [`PluginSource`] keyed by its directory name.
pub fn load_plugin(key: &str, dir: &Path) -> Result<Option<PluginSource>> {
    Ok(load_manifest(dir)?.map(|manifest| PluginSource {
        key: key.to_string(),
        path: dir.to_path_buf(),
        manifest,
    }))
}

/// Parse one manifest file, choosing the format by extension.
///
/// `.json` files are parsed as JSON, everything else as YAML. A file
/// holding an empty (null) document yields the default manifest. A version
/// that is not usable as a file name component is malformed.
pub fn parse_manifest_file(path: &Path) -> Result<PluginManifest> {
    let malformed = |reason: String| RegistryError::MalformedManifest {
        path: path.to_path_buf(),
        reason,
    };

    let content = fs::read_to_string(path).map_err(|e| malformed(e.to_string()))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let raw = if is_json {
        parse_json(&content)
    } else {
        parse_yaml(&content)
    }
    .map_err(malformed)?;

    PluginManifest::try_from(raw).map_err(malformed)
}

fn parse_yaml(content: &str) -> std::result::Result<RawManifest, String> {
    let value: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    if value.is_null() {
        return Ok(RawManifest::default());
    }
    serde_yaml::from_value(value).map_err(|e| e.to_string())
}

fn parse_json(content: &str) -> std::result::Result<RawManifest, String> {
    let value: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    if value.is_null() {
        return Ok(RawManifest::default());
    }
    serde_json::from_value(value).map_err(|e| e.to_string())
}
