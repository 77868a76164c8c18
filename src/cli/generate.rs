//! `generate` command: build artifacts and the registry document.

use std::path::Path;

use anyhow::{Context, Result};

use plugin_center::config::{OutputMode, RegistryConfig};
use plugin_center::registry::{GenerationReport, RegistryAssembler};

pub(crate) fn cmd_generate(config: RegistryConfig) -> Result<()> {
    config
        .validate()
        .with_context(|| "Invalid configuration")?;

    let assembler = RegistryAssembler::new(config);
    let report = assembler
        .generate()
        .with_context(|| "Failed to generate registry")?;
    let out = assembler
        .write(&report.document)
        .with_context(|| "Failed to write registry document")?;

    print!("{}", summary(&report, &out, assembler.config()));
    Ok(())
}

/// Final stdout report. Individual skips are already logged by the assembler.
fn summary(report: &GenerationReport, out: &Path, config: &RegistryConfig) -> String {
    let mut text = format!("Generated: {}\n", out.display());
    if config.mode == OutputMode::Packaged {
        text.push_str(&format!("Artifacts dir: {}\n", config.artifacts_dir().display()));
    }
    text.push_str(&format!(
        "Plugins: {} registered, {} skipped\n",
        report.plugin_count(),
        report.skipped.len()
    ));
    text
}
