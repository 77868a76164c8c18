//! Registry document generation and verification
//!
//! # Architecture
//!
//! - **types**: the `index.yaml` document (`RegistryDocument`, `RegistryEntry`, `VersionEntry`)
//! - **assembler**: discovery → manifest → (package → hash) → entry, then write
//! - **verify**: recompute artifact digests against an existing document
//!
//! # Usage
//!
//! ```rust,no_run
//! use plugin_center::config::RegistryConfig;
//! use plugin_center::registry::RegistryAssembler;
//!
//! let config = RegistryConfig::from_env().unwrap();
//! let report = RegistryAssembler::new(config).run().unwrap();
//! println!("{} plugins, {} skipped", report.plugin_count(), report.skipped.len());
//! ```

mod assembler;
pub mod types;
mod verify;

pub use assembler::{GenerationReport, RegistryAssembler, SkipReason, SkippedPlugin};
pub use types::{
    format_timestamp, PackagedVersion, ReferenceVersion, RegistryDocument, RegistryEntry,
    VersionEntry, API_VERSION, TIMESTAMP_FORMAT,
};
pub use verify::{load_document, verify_registry, VerifyOutcome, VerifyReport, VerifyStatus};
