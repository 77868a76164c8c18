//! Plugin invocation contract
//!
//! A plugin runtime invokes a plugin by writing one JSON [`PluginRequest`]
//! to its stdin and reading one JSON [`PluginResponse`] from its stdout.
//! The registry's `shims` advertise which actions a plugin answers; this
//! module only defines the message shapes, it never spawns anything.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// `status` value of a successful response.
pub const STATUS_OK: &str = "ok";

/// Persisted state handed to the plugin, split by scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub plugin: Map<String, Value>,
    #[serde(default)]
    pub global: Map<String, Value>,
}

/// Request sent to a plugin via stdin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginRequest {
    /// The shim being invoked (e.g. `"run"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// How the runtime will merge returned mutations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_strategy: Option<String>,

    #[serde(default)]
    pub config: ConfigSnapshot,

    /// Runtime-specific fields, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PluginRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            ..Self::default()
        }
    }
}

/// Partial state updates the runtime merges after the call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mutations {
    /// Updates scoped to the invoked plugin's own config.
    #[serde(default)]
    pub plugin: Map<String, Value>,
    /// Updates to the shared global config.
    #[serde(default)]
    pub global: Map<String, Value>,
}

impl Mutations {
    pub fn is_empty(&self) -> bool {
        self.plugin.is_empty() && self.global.is_empty()
    }
}

/// Response read from a plugin's stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginResponse {
    /// `"ok"` on success; anything else is an error indicator.
    pub status: String,

    #[serde(default)]
    pub logs: Vec<String>,

    #[serde(default)]
    pub artifacts: Vec<Value>,

    #[serde(default)]
    pub mutations: Mutations,
}

impl PluginResponse {
    pub fn ok() -> Self {
        Self {
            status: STATUS_OK.to_string(),
            logs: Vec::new(),
            artifacts: Vec::new(),
            mutations: Mutations::default(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            logs: vec![message.into()],
            ..Self::ok()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Parse the single JSON object a plugin printed.
    pub fn from_json(stdout: &str) -> Result<Self> {
        Ok(serde_json::from_str(stdout.trim())?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
