//! CLI tests that drive the `rfsync` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const INDEX_PATH: &str = ".obsidian/plugins/obsidian-ragflow-sync/synced-notes.json";

fn rfsync_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_rfsync"))
}

/// Temp dir with a `vault/` of three notes plus one excluded template, and a
/// settings file pointing at `base_url`.
fn setup_test_env(base_url: &str, api_key: &str) -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let vault = root.join("vault");
    fs::create_dir_all(vault.join("projects")).unwrap();
    fs::create_dir_all(vault.join("_templates")).unwrap();
    fs::write(
        vault.join("alpha.md"),
        "# Alpha\n\nNotes about Rust ownership and borrowing.\n\nLifetimes are covered too.",
    )
    .unwrap();
    fs::write(
        vault.join("beta.md"),
        "# Beta\n\nA short note on deployment pipelines.",
    )
    .unwrap();
    fs::write(
        vault.join("projects/gamma.md"),
        "# Gamma\n\nKubernetes and Docker are mentioned here.",
    )
    .unwrap();
    fs::write(vault.join("_templates/daily.md"), "# {{date}}").unwrap();
    fs::write(vault.join("diagram.png"), [0u8, 1, 2, 3]).unwrap();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_content = format!(
        r#"[ragflow]
api_key = "{}"
base_url = "{}"
knowledge_base = "obsidian"

[vault]
root = "{}"

[sync]
chunk_size = 50
poll_interval_ms = 20
exclude_folders = ["_templates", ".obsidian"]
"#,
        api_key,
        base_url,
        vault.display()
    );
    let config_path = config_dir.join("rfsync.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path, vault)
}

fn run_rfsync(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = rfsync_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("--progress")
        .arg("off")
        .args(args)
        .env_remove("RAGFLOW_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run rfsync binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_sync_three_notes_from_scratch() {
    let mut server = mockito::Server::new();
    let (_tmp, config_path, vault) = setup_test_env(&server.url(), "test-key");

    let list = server
        .mock("GET", "/api/v1/datasets")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":0,"data":[]}"#)
        .expect(1)
        .create();
    let create_dataset = server
        .mock("POST", "/api/v1/datasets")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":0,"data":{"id":"ds-1","name":"obsidian"}}"#)
        .expect(1)
        .create();
    let create_document = server
        .mock("POST", "/api/v1/datasets/ds-1/documents")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":0,"data":[{"id":"doc-1","name":"note.md","dataset_id":"ds-1"}]}"#)
        .expect(3)
        .create();
    let add_chunk = server
        .mock(
            "POST",
            mockito::Matcher::Regex(r"^/api/v1/datasets/ds-1/documents/doc-1/chunks$".to_string()),
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":0,"data":{"id":"c-1","content":"x","document_id":"doc-1"}}"#)
        .expect_at_least(3)
        .create();

    let (stdout, stderr, success) = run_rfsync(&config_path, &["sync"]);
    assert!(success, "sync failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("notes: 3"), "stdout={}", stdout);
    assert!(stdout.contains("processed: 3"));
    assert!(stdout.contains("succeeded: 3"));
    assert!(stdout.contains("failed: 0"));
    assert!(stdout.contains("ok"));

    list.assert();
    create_dataset.assert();
    create_document.assert();
    add_chunk.assert();

    let raw = fs::read_to_string(vault.join(INDEX_PATH)).unwrap();
    let index: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entries = index.as_object().unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.contains_key("projects/gamma.md"));
    assert!(!entries.contains_key("_templates/daily.md"));
    for entry in entries.values() {
        assert_eq!(entry["status"], "success");
        assert_eq!(entry["documentId"], "doc-1");
    }
}

#[test]
fn test_sync_requires_api_key() {
    let mut server = mockito::Server::new();
    let any = server
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create();
    let (_tmp, config_path, vault) = setup_test_env(&server.url(), "");

    let (stdout, stderr, success) = run_rfsync(&config_path, &["sync"]);
    assert!(!success, "sync should refuse to start: stdout={}", stdout);
    assert!(stderr.contains("API key is not set"), "stderr={}", stderr);
    assert!(!vault.join(INDEX_PATH).exists());
    any.assert();
}

#[test]
fn test_sync_reports_dataset_failure() {
    let mut server = mockito::Server::new();
    let (_tmp, config_path, _vault) = setup_test_env(&server.url(), "test-key");
    let _list = server
        .mock("GET", "/api/v1/datasets")
        .with_status(401)
        .create();
    let _create = server
        .mock("POST", "/api/v1/datasets")
        .with_status(500)
        .with_body("internal error")
        .create();

    let (stdout, stderr, success) = run_rfsync(&config_path, &["sync"]);
    assert!(!success);
    assert!(stdout.contains("processed: 0"), "stdout={}", stdout);
    assert!(stderr.contains("Sync failed"), "stderr={}", stderr);
}

#[test]
fn test_status_on_fresh_vault() {
    let (_tmp, config_path, _vault) = setup_test_env("http://127.0.0.1:9", "test-key");

    let (stdout, stderr, success) = run_rfsync(&config_path, &["status"]);
    assert!(success, "status failed: stderr={}", stderr);
    assert!(stdout.contains("Notes:          0"));
    assert!(stdout.contains("Last sync:      never"));
}

#[test]
fn test_status_lists_failed_notes() {
    let (_tmp, config_path, vault) = setup_test_env("http://127.0.0.1:9", "test-key");
    let index_file = vault.join(INDEX_PATH);
    fs::create_dir_all(index_file.parent().unwrap()).unwrap();
    fs::write(
        &index_file,
        r#"{
  "alpha.md": {"path":"alpha.md","hash":"abc","documentId":"doc-1","lastSynced":1700000000000,"status":"success"},
  "beta.md": {"path":"beta.md","hash":"","documentId":"","lastSynced":1700000001000,"status":"failed","error":"HTTP error! status: 500"}
}"#,
    )
    .unwrap();

    let (stdout, _, success) = run_rfsync(&config_path, &["status"]);
    assert!(success);
    assert!(stdout.contains("Synced:         1"));
    assert!(stdout.contains("Failed:         1"));
    assert!(stdout.contains("beta.md"));
    assert!(stdout.contains("HTTP error! status: 500"));
}

#[test]
fn test_settings_set_and_show() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("config").join("rfsync.toml");

    let (_, stderr, success) =
        run_rfsync(&config_path, &["settings", "set", "exclude-folders", " drafts, archive ,"]);
    assert!(success, "settings set failed: {}", stderr);
    let (_, _, success) = run_rfsync(&config_path, &["settings", "set", "api-key", "ragflow-abcdefgh1234"]);
    assert!(success);

    let (stdout, _, success) = run_rfsync(&config_path, &["settings", "show"]);
    assert!(success);
    assert!(stdout.contains("drafts,archive"), "stdout={}", stdout);
    assert!(stdout.contains("1234"));
    assert!(!stdout.contains("ragflow-abcdefgh1234"));

    let saved = fs::read_to_string(&config_path).unwrap();
    assert!(saved.contains("exclude_folders = ["));
    assert!(saved.contains("\"drafts\""));
}

#[test]
fn test_settings_rejects_bad_chunk_size() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("rfsync.toml");

    let (_, stderr, success) = run_rfsync(&config_path, &["settings", "set", "chunk-size", "0"]);
    assert!(!success);
    assert!(stderr.contains("chunk-size must be a positive integer"));
    assert!(!config_path.exists());
}

#[test]
fn test_startup_disabled_does_nothing() {
    let (_tmp, config_path, _vault) = setup_test_env("http://127.0.0.1:9", "test-key");

    let (stdout, _, success) = run_rfsync(&config_path, &["startup"]);
    assert!(success);
    assert!(stdout.contains("startup sync disabled"));
}
