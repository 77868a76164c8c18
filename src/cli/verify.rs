//! `verify` command: check artifacts against a registry document.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use plugin_center::config::RegistryConfig;
use plugin_center::registry::{load_document, verify_registry, VerifyStatus};

pub(crate) fn cmd_verify(
    config: RegistryConfig,
    registry: Option<PathBuf>,
    artifacts: Option<PathBuf>,
) -> Result<()> {
    let registry = registry.unwrap_or_else(|| config.output_path());
    let artifacts = artifacts.unwrap_or_else(|| config.artifacts_dir());

    let document = load_document(&registry)
        .with_context(|| format!("Failed to read registry document {}", registry.display()))?;
    let report = verify_registry(&document, &artifacts)
        .with_context(|| format!("Failed to verify artifacts in {}", artifacts.display()))?;

    for outcome in &report.outcomes {
        let label = match &outcome.status {
            VerifyStatus::Verified => "ok".to_string(),
            VerifyStatus::NotPackaged => "not packaged".to_string(),
            VerifyStatus::Missing => "MISSING".to_string(),
            VerifyStatus::Mismatch { expected, actual } => {
                format!("MISMATCH (expected {}, got {})", expected, actual)
            }
        };
        println!("{} {}: {}", outcome.plugin, outcome.version, label);
    }

    let failures = report.failures().count();
    if failures > 0 {
        bail!("{} artifact(s) failed verification", failures);
    }

    println!("Verified {} artifact(s)", report.verified_count());
    Ok(())
}
