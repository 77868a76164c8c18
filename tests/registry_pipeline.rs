//! End-to-end runs of the registry pipeline against a scratch workspace.

use std::fs;
use std::path::Path;

use plugin_center::config::{OutputMode, RegistryConfig};
use plugin_center::packaging::{is_valid_digest, sha256_file};
use plugin_center::error::RegistryError;
use plugin_center::registry::{load_document, verify_registry, RegistryAssembler};
use tempfile::TempDir;

fn write_plugin(workspace: &Path, key: &str, files: &[(&str, &str)]) {
    let dir = workspace.join("plugins").join(key);
    fs::create_dir_all(&dir).unwrap();
    for (name, content) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

fn packaged_config(workspace: &Path) -> RegistryConfig {
    RegistryConfig {
        repo: "acme/plugin-center".to_string(),
        mode: OutputMode::Packaged,
        ..RegistryConfig::new(workspace)
    }
}

#[test]
fn tester_plugin_is_packaged_hashed_and_registered() {
    let tmp = TempDir::new().unwrap();
    write_plugin(
        tmp.path(),
        "tester",
        &[
            (
                "manifest.yaml",
                "name: Tester\nversion: 1.2.0\nexpose: [\"run\"]\n",
            ),
            ("main.py", "import sys, json\n"),
        ],
    );

    let report = RegistryAssembler::new(packaged_config(tmp.path()))
        .run()
        .unwrap();
    assert_eq!(report.plugin_count(), 1);

    let artifact = tmp.path().join("artifacts/tester-1.2.0.zip");
    assert!(artifact.is_file());

    let doc = load_document(&tmp.path().join("index.yaml")).unwrap();
    let entry = &doc.plugins["tester"];
    assert_eq!(entry.desc, "Tester");
    assert_eq!(entry.shims, vec!["run"]);

    let version = entry.versions["1.2.0"].as_packaged().unwrap();
    assert_eq!(
        version.source,
        "https://raw.githubusercontent.com/acme/plugin-center/main/artifacts/tester-1.2.0.zip"
    );
    assert!(is_valid_digest(&version.sha256));
    assert_eq!(version.sha256, sha256_file(&artifact).unwrap());
    assert_eq!(version.shims, vec!["run"]);

    assert!(verify_registry(&doc, &tmp.path().join("artifacts"))
        .unwrap()
        .is_ok());
}

#[test]
fn plugin_keys_are_exactly_the_dirs_with_manifests() {
    let tmp = TempDir::new().unwrap();
    write_plugin(tmp.path(), "c-json", &[("manifest.json", r#"{"expose": []}"#)]);
    write_plugin(tmp.path(), "a-yaml", &[("manifest.yaml", "expose: [build, test]\n")]);
    write_plugin(tmp.path(), "b-none", &[("main.py", "pass\n")]);
    write_plugin(tmp.path(), "d-yml", &[("manifest.yml", "version: 3.0.1\n")]);

    let report = RegistryAssembler::new(RegistryConfig {
        mode: OutputMode::Reference,
        ..RegistryConfig::new(tmp.path())
    })
    .run()
    .unwrap();

    let keys: Vec<&str> = report.document.plugin_names().collect();
    assert_eq!(keys, vec!["a-yaml", "c-json", "d-yml"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].key, "b-none");

    let entry = &report.document.plugins["a-yaml"];
    assert_eq!(entry.shims, vec!["build", "test"]);
    assert_eq!(entry.versions["0.0.0"].shims(), entry.shims.as_slice());
}

#[test]
fn index_yaml_lists_plugins_in_name_order() {
    let tmp = TempDir::new().unwrap();
    for key in ["zulu", "alpha", "mike"] {
        write_plugin(tmp.path(), key, &[("manifest.yaml", "expose: [run]\n")]);
    }

    RegistryAssembler::new(packaged_config(tmp.path()))
        .run()
        .unwrap();

    let yaml = fs::read_to_string(tmp.path().join("index.yaml")).unwrap();
    assert!(yaml.starts_with("apiVersion: v1\n"));
    let alpha = yaml.find("  alpha:").unwrap();
    let mike = yaml.find("  mike:").unwrap();
    let zulu = yaml.find("  zulu:").unwrap();
    assert!(alpha < mike && mike < zulu);
}

#[test]
fn missing_plugins_root_fails_without_writing() {
    let tmp = TempDir::new().unwrap();
    let err = RegistryAssembler::new(packaged_config(tmp.path()))
        .run()
        .unwrap_err();

    assert!(matches!(err, RegistryError::MissingPluginRoot(_)));
    assert!(!tmp.path().join("index.yaml").exists());
}
