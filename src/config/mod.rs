//! Registry generation configuration
//!
//! Configuration is resolved once, up front, into a [`RegistryConfig`] that is
//! handed to the [`RegistryAssembler`](crate::registry::RegistryAssembler).
//! Nothing below this module reads the process environment.
//!
//! # Environment
//!
//! | variable            | default                                                |
//! |---------------------|--------------------------------------------------------|
//! | `GITHUB_WORKSPACE`  | `.`                                                    |
//! | `REPO_FULL_NAME`    | `systemnb/lyenv-plugin-center`                         |
//! | `DEFAULT_REF`       | `main`                                                 |
//! | `REGISTRY_MODE`     | `packaged`                                             |
//! | `ARTIFACT_BASE_URL` | `https://raw.githubusercontent.com/<repo>/main/artifacts` |
//! | `REGISTRY_STRICT`   | `false`                                                |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

pub const ENV_WORKSPACE: &str = "GITHUB_WORKSPACE";
pub const ENV_REPO: &str = "REPO_FULL_NAME";
pub const ENV_DEFAULT_REF: &str = "DEFAULT_REF";
pub const ENV_MODE: &str = "REGISTRY_MODE";
pub const ENV_BASE_URL: &str = "ARTIFACT_BASE_URL";
pub const ENV_STRICT: &str = "REGISTRY_STRICT";

pub const DEFAULT_WORKSPACE: &str = ".";
pub const DEFAULT_REPO: &str = "systemnb/lyenv-plugin-center";
pub const DEFAULT_REF: &str = "main";

/// Directory under the workspace holding one subdirectory per plugin.
pub const PLUGINS_DIR_NAME: &str = "plugins";
/// Directory under the workspace receiving packaged archives.
pub const ARTIFACTS_DIR_NAME: &str = "artifacts";
/// Registry document file name under the workspace.
pub const INDEX_FILE_NAME: &str = "index.yaml";

/// How each version entry tells the consumer to obtain the plugin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Pre-built zip archive addressed by URL and SHA-256.
    #[default]
    Packaged,
    /// Direct reference into the source repository; nothing is built.
    Reference,
}

impl FromStr for OutputMode {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "packaged" | "package" | "artifacts" => Ok(Self::Packaged),
            "reference" | "ref" | "source" => Ok(Self::Reference),
            other => Err(RegistryError::Config(format!(
                "unknown registry mode '{}': expected 'packaged' or 'reference'",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Packaged => f.write_str("packaged"),
            Self::Reference => f.write_str("reference"),
        }
    }
}

/// Everything the registry pipeline needs to know about its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Repository checkout containing `plugins/`.
    pub workspace: PathBuf,

    /// Full repository name (`owner/name`) recorded in every entry.
    pub repo: String,

    /// Branch or tag recorded as `ref`.
    pub default_ref: String,

    /// Version entry shape to emit.
    pub mode: OutputMode,

    /// Base URL prefixed to artifact file names. Derived from `repo` when `None`.
    pub artifact_base_url: Option<String>,

    /// Registry document path. Defaults to `<workspace>/index.yaml`.
    pub output: Option<PathBuf>,

    /// Abort the run on the first malformed manifest instead of skipping it.
    pub strict: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from(DEFAULT_WORKSPACE),
            repo: DEFAULT_REPO.to_string(),
            default_ref: DEFAULT_REF.to_string(),
            mode: OutputMode::default(),
            artifact_base_url: None,
            output: None,
            strict: false,
        }
    }
}

impl RegistryConfig {
    /// Create a default configuration rooted at `workspace`.
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            ..Self::default()
        }
    }

    /// Build configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(workspace) = get(ENV_WORKSPACE) {
            config.workspace = PathBuf::from(workspace);
        }
        if let Some(repo) = get(ENV_REPO) {
            config.repo = repo.trim().to_string();
        }
        if let Some(reference) = get(ENV_DEFAULT_REF) {
            config.default_ref = reference.trim().to_string();
        }
        if let Some(mode) = get(ENV_MODE) {
            config.mode = mode.parse()?;
        }
        if let Some(base) = get(ENV_BASE_URL) {
            config.artifact_base_url = Some(base.trim().to_string());
        }
        if let Some(strict) = get(ENV_STRICT) {
            config.strict = parse_flag(ENV_STRICT, &strict)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would produce unusable entries.
    pub fn validate(&self) -> Result<()> {
        if self.repo.trim().is_empty() {
            return Err(RegistryError::Config(
                "repository name must not be empty".to_string(),
            ));
        }
        if self.default_ref.trim().is_empty() {
            return Err(RegistryError::Config(
                "default ref must not be empty".to_string(),
            ));
        }
        if let Some(base) = &self.artifact_base_url {
            if base.trim().is_empty() {
                return Err(RegistryError::Config(
                    "artifact base URL must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.workspace.join(PLUGINS_DIR_NAME)
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.workspace.join(ARTIFACTS_DIR_NAME)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.workspace.join(INDEX_FILE_NAME))
    }

    /// Base URL for artifact `source` fields, without a trailing slash.
    ///
    /// Artifacts are served from the `main` branch after merge, independent
    /// of `default_ref`.
    pub fn artifact_base_url(&self) -> String {
        match &self.artifact_base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!(
                "https://raw.githubusercontent.com/{}/main/{}",
                self.repo, ARTIFACTS_DIR_NAME
            ),
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(RegistryError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}
