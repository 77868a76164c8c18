//! plugin-center - Versioned plugin registry generator

pub mod config;
pub mod error;
pub mod packaging;
pub mod plugins;
pub mod protocol;
pub mod registry;
pub mod utils;

pub use config::{OutputMode, RegistryConfig};
pub use error::{RegistryError, Result};
pub use registry::{RegistryAssembler, RegistryDocument};
