// domain-sweep/tests/cli_integration.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Command isolated from the user's config files and environment.
fn sweep(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("domain-sweep").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env("RUST_LOG", "off");
    for var in [
        "DS_TLD",
        "DS_LENGTH",
        "DS_ALPHABET",
        "DS_RESOLVERS",
        "DS_TIMEOUT",
        "DS_RETRIES",
        "DS_CONCURRENCY",
        "DS_QUEUE_CAPACITY",
        "DS_OUTPUT",
        "DS_CHECKPOINT",
        "DS_SAMPLE_RATE",
        "DS_SKIP_RECORDED",
        "DS_CONFIG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_main_flags() {
    let dir = TempDir::new().unwrap();
    sweep(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--tld"))
        .stdout(predicate::str::contains("--alphabet"))
        .stdout(predicate::str::contains("--resolver"))
        .stdout(predicate::str::contains("--sample-rate"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_dry_run_lists_candidates_in_order() {
    let dir = TempDir::new().unwrap();
    let in_order = r"(?s)aa\.test.*ab\.test.*ba\.test.*bb\.test";
    sweep(&dir)
        .args(["--tld", "test", "--length", "2", "--alphabet", "ab"])
        .args(["--dry-run", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4 candidates"))
        .stdout(predicate::str::is_match(in_order).unwrap());

    // No DNS traffic and no files touched
    assert!(!dir.path().join("available.txt").exists());
    assert!(!dir.path().join("progress.txt").exists());
}

#[test]
fn test_dry_run_honors_checkpoint() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("progress.txt"), "ba.test\n").unwrap();

    sweep(&dir)
        .args(["-t", "test", "-l", "2", "-a", "ab", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ba.test"))
        .stdout(predicate::str::contains("bb.test"))
        .stdout(predicate::str::contains("aa.test").not());

    sweep(&dir)
        .args(["-t", "test", "-l", "2", "-a", "ab", "--dry-run"])
        .arg("--no-resume")
        .assert()
        .success()
        .stdout(predicate::str::contains("aa.test"))
        .stdout(predicate::str::contains("disabled"));
}

#[test]
fn test_dry_run_rejects_foreign_checkpoint() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("progress.txt"), "abc.com").unwrap();

    sweep(&dir)
        .args(["-t", "test", "-l", "2", "-a", "ab", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid checkpoint"));
}

#[test]
fn test_invalid_alphabet_fails() {
    let dir = TempDir::new().unwrap();
    sweep(&dir)
        .args(["--alphabet", "a-z_", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("alphabet"));
}

#[test]
fn test_invalid_length_fails() {
    let dir = TempDir::new().unwrap();
    sweep(&dir)
        .args(["--length", "0", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("length"));
}

#[test]
fn test_config_file_is_applied() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("domain-sweep.toml"),
        "[scan]\ntld = \"io\"\nlength = 1\nalphabet = \"xyz\"\n",
    )
    .unwrap();

    sweep(&dir)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 candidates"))
        .stdout(predicate::str::contains("x.io"));

    // CLI beats the file
    sweep(&dir)
        .args(["--tld", "dev", "--dry-run", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("x.dev"));
}

#[test]
fn test_environment_overrides_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("domain-sweep.toml"),
        "[scan]\ntld = \"io\"\nlength = 1\nalphabet = \"q\"\n",
    )
    .unwrap();

    sweep(&dir)
        .env("DS_TLD", "net")
        .args(["--dry-run", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("q.net"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    sweep(&dir)
        .args(["--config", "nope.toml", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config file"));
}

#[test]
fn test_malformed_config_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[resolvers]\nservers = [\"not-an-ip\"]\n").unwrap();

    sweep(&dir)
        .arg("--config")
        .arg(&path)
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid resolver address"));
}

#[test]
fn test_invalid_timeout_flag_fails() {
    let dir = TempDir::new().unwrap();
    sweep(&dir)
        .args(["--timeout", "soon", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--timeout"));
}
