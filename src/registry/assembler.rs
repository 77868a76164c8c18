//! Registry assembly: discovery, per-plugin entries, and document output.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{OutputMode, RegistryConfig};
use crate::error::{RegistryError, Result};
use crate::packaging::{artifact_file_name, package_dir, sha256_file, ArchiveSummary};
use crate::plugins::{discover_plugin_dirs, load_plugin, PluginSource};
use crate::utils::fs::{parent_dir, publish, staging_file};

use super::types::{
    PackagedVersion, ReferenceVersion, RegistryDocument, RegistryEntry, VersionEntry,
};

/// Why a plugin directory is absent from the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// None of the accepted manifest files exist.
    MissingManifest,
    /// A manifest exists but could not be read or parsed.
    MalformedManifest(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPlugin {
    pub key: String,
    pub reason: SkipReason,
}

/// Outcome of one generation run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub document: RegistryDocument,
    /// Plugin directories left out, in discovery order.
    pub skipped: Vec<SkippedPlugin>,
    /// Archives written (packaged mode only), in discovery order.
    pub artifacts: Vec<ArchiveSummary>,
}

impl GenerationReport {
    pub fn plugin_count(&self) -> usize {
        self.document.plugins.len()
    }
}

/// Builds the registry document from a plugins directory.
///
/// Each run starts from an empty document; nothing from a previous
/// `index.yaml` is carried over.
#[derive(Debug, Clone)]
pub struct RegistryAssembler {
    config: RegistryConfig,
}

impl RegistryAssembler {
    pub fn new(config: RegistryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Generate the document and write it to the configured output path.
    pub fn run(&self) -> Result<GenerationReport> {
        let report = self.generate()?;
        self.write(&report.document)?;
        Ok(report)
    }

    /// Generate the document stamped with the current time.
    pub fn generate(&self) -> Result<GenerationReport> {
        self.generate_at(Utc::now())
    }

    /// Generate the document stamped with `now`.
    ///
    /// # Errors
    /// - `RegistryError::MissingPluginRoot` if `<workspace>/plugins` is missing
    /// - I/O or archive errors while packaging (packaged mode)
    /// - `RegistryError::MalformedManifest` in strict mode
    pub fn generate_at(&self, now: DateTime<Utc>) -> Result<GenerationReport> {
        let plugins_dir = self.config.plugins_dir();
        let dirs = discover_plugin_dirs(&plugins_dir)?;

        if self.config.mode == OutputMode::Packaged {
            fs::create_dir_all(self.config.artifacts_dir())?;
        }

        let mut report = GenerationReport {
            document: RegistryDocument::new(now),
            skipped: Vec::new(),
            artifacts: Vec::new(),
        };

        for (key, dir) in dirs {
            let plugin = match load_plugin(&key, &dir) {
                Ok(Some(plugin)) => plugin,
                Ok(None) => {
                    warn!(plugin = %key, "skip {}: no manifest", key);
                    report.skipped.push(SkippedPlugin {
                        key,
                        reason: SkipReason::MissingManifest,
                    });
                    continue;
                }
                Err(e @ RegistryError::MalformedManifest { .. }) if !self.config.strict => {
                    warn!(plugin = %key, error = %e, "skip {}: malformed manifest", key);
                    report.skipped.push(SkippedPlugin {
                        key,
                        reason: SkipReason::MalformedManifest(e.to_string()),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            let version = self.version_entry(&plugin, &mut report.artifacts)?;
            let entry = self.entry(&plugin, version);

            info!(
                plugin = %plugin.key,
                version = %plugin.version(),
                shims = entry.shims.len(),
                mode = %self.config.mode,
                "Registered plugin"
            );
            report.document.plugins.insert(plugin.key, entry);
        }

        Ok(report)
    }

    /// Serialize `document` and replace the file at the output path.
    ///
    /// The YAML is written to a temporary file in the same directory and
    /// renamed into place, so a failed write leaves any prior document intact.
    pub fn write(&self, document: &RegistryDocument) -> Result<PathBuf> {
        let out = self.config.output_path();
        let yaml = document.to_yaml()?;

        fs::create_dir_all(parent_dir(&out))?;

        let mut tmp = staging_file(&out)?;
        tmp.write_all(yaml.as_bytes())?;
        publish(tmp, &out)?;

        info!(path = %out.display(), plugins = document.plugins.len(), "Generated registry");
        Ok(out)
    }

    fn version_entry(
        &self,
        plugin: &PluginSource,
        artifacts: &mut Vec<ArchiveSummary>,
    ) -> Result<VersionEntry> {
        let shims = plugin.manifest.expose.clone();

        match self.config.mode {
            OutputMode::Packaged => {
                let file_name = artifact_file_name(&plugin.key, plugin.version());
                let dest = self.config.artifacts_dir().join(&file_name);

                let summary = package_dir(&plugin.path, &dest)?;
                let sha256 = sha256_file(&summary.path)?;
                debug!(plugin = %plugin.key, artifact = %file_name, sha256 = %sha256, "Hashed artifact");
                artifacts.push(summary);

                Ok(VersionEntry::Packaged(PackagedVersion {
                    source: format!("{}/{}", self.config.artifact_base_url(), file_name),
                    sha256,
                    shims,
                }))
            }
            OutputMode::Reference => Ok(VersionEntry::Reference(ReferenceVersion {
                repo: self.config.repo.clone(),
                subpath: plugin.subpath(),
                reference: self.config.default_ref.clone(),
                shims,
            })),
        }
    }

    fn entry(&self, plugin: &PluginSource, version: VersionEntry) -> RegistryEntry {
        let mut entry = RegistryEntry {
            desc: plugin.display_name().to_string(),
            repo: self.config.repo.clone(),
            subpath: plugin.subpath(),
            reference: self.config.default_ref.clone(),
            shims: version.shims().to_vec(),
            versions: Default::default(),
        };
        entry.versions.insert(plugin.version().to_string(), version);
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packaging::is_valid_digest;
    use chrono::TimeZone;
    use std::path::Path;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    fn add_plugin(workspace: &Path, key: &str, manifest: Option<(&str, &str)>) -> PathBuf {
        let dir = workspace.join("plugins").join(key);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("main.py"), format!("print('{}')\n", key)).unwrap();
        if let Some((file, content)) = manifest {
            fs::write(dir.join(file), content).unwrap();
        }
        dir
    }

    fn config(workspace: &Path, mode: OutputMode) -> RegistryConfig {
        RegistryConfig {
            repo: "acme/plugins".to_string(),
            mode,
            artifact_base_url: Some("https://cdn.example.com/artifacts".to_string()),
            ..RegistryConfig::new(workspace)
        }
    }

    #[test]
    fn test_packaged_scenario() {
        let tmp = TempDir::new().unwrap();
        add_plugin(
            tmp.path(),
            "tester",
            Some((
                "manifest.yaml",
                "name: Tester\nversion: 1.2.0\nexpose:\n  - run\n",
            )),
        );

        let assembler = RegistryAssembler::new(config(tmp.path(), OutputMode::Packaged));
        let report = assembler.generate_at(fixed_time()).unwrap();

        let artifact = tmp.path().join("artifacts/tester-1.2.0.zip");
        assert!(artifact.is_file());
        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(report.artifacts[0].path, artifact);

        let entry = &report.document.plugins["tester"];
        assert_eq!(entry.desc, "Tester");
        assert_eq!(entry.repo, "acme/plugins");
        assert_eq!(entry.subpath, "plugins/tester");
        assert_eq!(entry.reference, "main");
        assert_eq!(entry.shims, vec!["run"]);

        let version = entry.versions["1.2.0"].as_packaged().unwrap();
        assert_eq!(
            version.source,
            "https://cdn.example.com/artifacts/tester-1.2.0.zip"
        );
        assert!(is_valid_digest(&version.sha256));
        assert_eq!(version.sha256, sha256_file(&artifact).unwrap());
        assert_eq!(version.shims, vec!["run"]);
        assert_eq!(report.document.updated_at, "2026-10-18T12:00:00Z");
    }

    #[test]
    fn test_reference_mode_builds_nothing() {
        let tmp = TempDir::new().unwrap();
        add_plugin(
            tmp.path(),
            "tester",
            Some(("manifest.json", r#"{"version": "0.4.0", "expose": ["build", "test"]}"#)),
        );

        let assembler = RegistryAssembler::new(config(tmp.path(), OutputMode::Reference));
        let report = assembler.generate_at(fixed_time()).unwrap();

        assert!(!tmp.path().join("artifacts").exists());
        assert!(report.artifacts.is_empty());

        let entry = &report.document.plugins["tester"];
        assert_eq!(entry.desc, "tester");
        assert_eq!(entry.shims, vec!["build", "test"]);
        match &entry.versions["0.4.0"] {
            VersionEntry::Reference(v) => {
                assert_eq!(v.repo, "acme/plugins");
                assert_eq!(v.subpath, "plugins/tester");
                assert_eq!(v.reference, "main");
                assert_eq!(v.shims, vec!["build", "test"]);
            }
            other => panic!("expected reference version, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_manifest_is_skipped() {
        let tmp = TempDir::new().unwrap();
        add_plugin(tmp.path(), "alpha", Some(("manifest.yaml", "version: 1.0.0\n")));
        add_plugin(tmp.path(), "bare", None);
        add_plugin(tmp.path(), "omega", Some(("manifest.yml", "expose: [go]\n")));

        let assembler = RegistryAssembler::new(config(tmp.path(), OutputMode::Packaged));
        let report = assembler.generate_at(fixed_time()).unwrap();

        let keys: Vec<&str> = report.document.plugin_names().collect();
        assert_eq!(keys, vec!["alpha", "omega"]);
        assert_eq!(
            report.skipped,
            vec![SkippedPlugin {
                key: "bare".to_string(),
                reason: SkipReason::MissingManifest,
            }]
        );
        assert!(!tmp.path().join("artifacts/bare-0.0.0.zip").exists());
        assert!(tmp.path().join("artifacts/omega-0.0.0.zip").is_file());
    }

    #[test]
    fn test_malformed_manifest_is_skipped_by_default() {
        let tmp = TempDir::new().unwrap();
        add_plugin(tmp.path(), "broken", Some(("manifest.json", "{ nope")));
        add_plugin(tmp.path(), "good", Some(("manifest.yaml", "name: Good\n")));

        let assembler = RegistryAssembler::new(config(tmp.path(), OutputMode::Reference));
        let report = assembler.generate_at(fixed_time()).unwrap();

        assert_eq!(report.plugin_count(), 1);
        assert!(report.document.plugins.contains_key("good"));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].key, "broken");
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::MalformedManifest(_)
        ));
    }

    #[test]
    fn test_unusable_version_does_not_block_other_plugins() {
        let tmp = TempDir::new().unwrap();
        add_plugin(tmp.path(), "alpha", Some(("manifest.yaml", "version: 1.0.0\n")));
        add_plugin(tmp.path(), "beta", Some(("manifest.yaml", "version: \"1.0/beta\"\n")));
        add_plugin(tmp.path(), "delta", Some(("manifest.yaml", "version: \"..\"\n")));
        add_plugin(tmp.path(), "gamma", Some(("manifest.yaml", "version: 2.0.0\n")));

        let assembler = RegistryAssembler::new(config(tmp.path(), OutputMode::Packaged));
        let report = assembler.run().unwrap();

        let keys: Vec<&str> = report.document.plugin_names().collect();
        assert_eq!(keys, vec!["alpha", "gamma"]);
        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(skipped, vec!["beta", "delta"]);
        assert!(report
            .skipped
            .iter()
            .all(|s| matches!(s.reason, SkipReason::MalformedManifest(_))));

        assert!(tmp.path().join("index.yaml").is_file());
        let mut artifacts: Vec<String> = fs::read_dir(tmp.path().join("artifacts"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        artifacts.sort();
        assert_eq!(artifacts, vec!["alpha-1.0.0.zip", "gamma-2.0.0.zip"]);
    }

    #[test]
    fn test_malformed_manifest_aborts_in_strict_mode() {
        let tmp = TempDir::new().unwrap();
        add_plugin(tmp.path(), "broken", Some(("manifest.yaml", "name: [oops\n")));

        let config = RegistryConfig {
            strict: true,
            ..config(tmp.path(), OutputMode::Reference)
        };
        let err = RegistryAssembler::new(config)
            .generate_at(fixed_time())
            .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedManifest { .. }));
    }

    #[test]
    fn test_missing_plugin_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let assembler = RegistryAssembler::new(config(tmp.path(), OutputMode::Packaged));
        assert!(matches!(
            assembler.run(),
            Err(RegistryError::MissingPluginRoot(_))
        ));
        assert!(!tmp.path().join("index.yaml").exists());
        assert!(!tmp.path().join("artifacts").exists());
    }

    #[test]
    fn test_missing_plugin_root_leaves_prior_document() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.yaml"), "previous").unwrap();

        let assembler = RegistryAssembler::new(config(tmp.path(), OutputMode::Reference));
        assert!(assembler.run().is_err());
        assert_eq!(
            fs::read_to_string(tmp.path().join("index.yaml")).unwrap(),
            "previous"
        );
    }

    #[test]
    fn test_non_directories_in_root_are_ignored() {
        let tmp = TempDir::new().unwrap();
        add_plugin(tmp.path(), "tester", Some(("manifest.yaml", "")));
        fs::write(tmp.path().join("plugins/README.md"), "docs").unwrap();

        let assembler = RegistryAssembler::new(config(tmp.path(), OutputMode::Reference));
        let report = assembler.generate_at(fixed_time()).unwrap();
        assert_eq!(report.document.plugin_names().collect::<Vec<_>>(), vec!["tester"]);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_run_writes_and_replaces_document() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("plugins")).unwrap();
        fs::write(tmp.path().join("index.yaml"), "stale: true\n").unwrap();
        add_plugin(tmp.path(), "tester", Some(("manifest.yaml", "expose: [run]\n")));

        let assembler = RegistryAssembler::new(config(tmp.path(), OutputMode::Reference));
        assembler.run().unwrap();

        let written = fs::read_to_string(tmp.path().join("index.yaml")).unwrap();
        assert!(!written.contains("stale"));
        let doc = RegistryDocument::from_yaml(&written).unwrap();
        assert_eq!(doc.api_version, "v1");
        assert_eq!(doc.plugins["tester"].shims, vec!["run"]);
    }

    #[test]
    fn test_write_to_custom_output_creates_parent() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("public/registry/index.yaml");
        let config = RegistryConfig {
            output: Some(out.clone()),
            ..config(tmp.path(), OutputMode::Reference)
        };

        let written = RegistryAssembler::new(config)
            .write(&RegistryDocument::new(fixed_time()))
            .unwrap();
        assert_eq!(written, out);
        assert!(out.is_file());
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let tmp = TempDir::new().unwrap();
        add_plugin(
            tmp.path(),
            "tester",
            Some(("manifest.yaml", "name: Tester\nversion: 1.2.0\nexpose: [run]\n")),
        );
        add_plugin(tmp.path(), "builder", Some(("manifest.yaml", "expose: [build, test]\n")));

        let assembler = RegistryAssembler::new(config(tmp.path(), OutputMode::Packaged));
        let first = assembler.generate_at(fixed_time()).unwrap();
        let second = assembler.generate_at(fixed_time()).unwrap();
        assert_eq!(first.document, second.document);
    }
}
