//! Plugin discovery and manifests
//!
//! Each plugin lives in its own directory under `<workspace>/plugins/`. The
//! directory name is the plugin's registry key; the directory holds one
//! manifest file plus whatever files the plugin ships.
//!
//! # Architecture
//!
//! - **types**: Core data structures (`PluginManifest`, `PluginSource`)
//! - **loader**: Directory discovery and manifest resolution/parsing
//!
//! # Plugin Directory Structure
//!
//! ```text
//! plugins/
//! ├── tester/
//! │   ├── manifest.yaml
//! │   └── main.py
//! └── formatter/
//!     ├── manifest.json
//!     └── bin/
//!         └── format.sh
//! ```
//!
//! Manifest files are resolved in the order `manifest.yaml`,
//! `manifest.yml`, `manifest.json`; the first one present wins.

mod loader;
pub mod types;

pub use loader::{
    discover_plugin_dirs, load_manifest, load_plugin, locate_manifest, parse_manifest_file,
    MANIFEST_CANDIDATES,
};
pub use types::{PluginManifest, PluginSource, DEFAULT_VERSION};
