use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Runs the binary inside `dir` with an empty config file.
fn braggard(dir: &Path) -> Command {
    let config = dir.join("braggard.toml");
    if !config.exists() {
        fs::write(&config, "").unwrap();
    }
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_braggard"));
    cmd.current_dir(dir)
        .arg("--config")
        .arg(&config)
        .env_remove("BRAGGARD_TOKEN")
        .env_remove("GITHUB_TOKEN")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_version() {
    let temp_dir = TempDir::new().unwrap();
    braggard(temp_dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_collect_without_handle_fails() {
    let temp_dir = TempDir::new().unwrap();
    braggard(temp_dir.path())
        .arg("collect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("user.handle"));
}

#[test]
fn test_collect_rejects_invalid_since() {
    let temp_dir = TempDir::new().unwrap();
    braggard(temp_dir.path())
        .args(["collect", "octo", "--since", "last tuesday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid setting: since"));
    assert!(!temp_dir.path().join("data").exists());
}

#[test]
fn test_analyze_empty_data_dir_fails() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir(temp_dir.path().join("data")).unwrap();

    braggard(temp_dir.path())
        .arg("analyze")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no snapshot"));
}

#[test]
fn test_analyze_then_render() {
    let temp_dir = TempDir::new().unwrap();
    let data = temp_dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(
        data.join("demo-20250101T000000Z.json"),
        r#"[{"name": "ferris", "stargazer_count": 3, "primary_language": "Rust",
             "ci_statuses": ["SUCCESS", "FAILURE"]}]"#,
    )
    .unwrap();

    braggard(temp_dir.path())
        .arg("analyze")
        .assert()
        .success()
        .stdout(predicate::str::contains("Summarized 1 repositories (3 stars)"));
    assert!(temp_dir.path().join("summary.json").exists());

    braggard(temp_dir.path())
        .args(["render", "--format", "markdown"])
        .assert()
        .success();
    let readme = fs::read_to_string(temp_dir.path().join("docs").join("README.md")).unwrap();
    assert!(readme.contains("| ferris | 3 | 50.0% |"));
}

#[test]
fn test_render_rejects_unknown_format() {
    let temp_dir = TempDir::new().unwrap();
    braggard(temp_dir.path())
        .args(["render", "--format", "pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pdf"));
}

#[test]
fn test_invalid_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("braggard.toml"), "[user\nhandle = ").unwrap();

    braggard(temp_dir.path())
        .arg("analyze")
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}
