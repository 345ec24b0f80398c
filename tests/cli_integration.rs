//! Integration tests for the CipherCell CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! The master password is supplied through `CIPHERCELL_PASSWORD`; commands
//! that need further interactive input (item passwords, confirmations)
//! are only checked up to the point where they would prompt.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PASSWORD: &str = "correct-horse-battery";

/// Helper: get a Command pointing at the ciphercell binary.
fn ciphercell(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("ciphercell").expect("binary should exist");
    cmd.current_dir(dir)
        .env_remove("CIPHERCELL_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

/// A project directory with cheap key derivation settings.
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join(".ciphercell.toml"),
        "argon2_memory_kib = 8192\nargon2_iterations = 1\nargon2_parallelism = 1\n",
    )
    .unwrap();
    tmp
}

fn init(dir: &Path) {
    ciphercell(dir)
        .args(["init", "--email", "me@example.com"])
        .env("CIPHERCELL_PASSWORD", PASSWORD)
        .assert()
        .success()
        .stdout(predicate::str::contains("Vault created"));
}

#[test]
fn help_flag_shows_usage() {
    let tmp = TempDir::new().unwrap();
    ciphercell(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Client-side encrypted password vault"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("copy"))
        .stdout(predicate::str::contains("shell"));
}

#[test]
fn version_flag_shows_version() {
    let tmp = TempDir::new().unwrap();
    ciphercell(tmp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ciphercell"));
}

#[test]
fn no_args_shows_help() {
    let tmp = TempDir::new().unwrap();
    ciphercell(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn status_without_vault_suggests_init() {
    let tmp = project();
    ciphercell(tmp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No vault yet"));
}

#[test]
fn init_creates_a_locked_vault() {
    let tmp = project();
    init(tmp.path());

    assert!(tmp.path().join(".ciphercell").join("vault.json").exists());

    let record: serde_json::Value = serde_json::from_slice(
        &std::fs::read(tmp.path().join(".ciphercell").join("vault.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(record["salt"].as_array().unwrap().len(), 16);
    assert!(record["encryptedVault"]["iv"].is_array());

    ciphercell(tmp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("locked"));
}

#[test]
fn init_respects_vault_dir_flag() {
    let tmp = project();
    ciphercell(tmp.path())
        .args(["init", "--email", "me@example.com", "--vault-dir", "secrets"])
        .env("CIPHERCELL_PASSWORD", PASSWORD)
        .assert()
        .success();

    assert!(tmp.path().join("secrets").join("vault.json").exists());
}

#[test]
fn init_rejects_short_password() {
    let tmp = project();
    ciphercell(tmp.path())
        .args(["init", "--email", "me@example.com"])
        .env("CIPHERCELL_PASSWORD", "short")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 12"));

    assert!(!tmp.path().join(".ciphercell").join("vault.json").exists());
}

#[test]
fn init_rejects_bad_email() {
    let tmp = project();
    ciphercell(tmp.path())
        .args(["init", "--email", "not-an-email"])
        .env("CIPHERCELL_PASSWORD", PASSWORD)
        .assert()
        .failure()
        .stderr(predicate::str::contains("valid email"));
}

#[test]
fn init_twice_fails() {
    let tmp = project();
    init(tmp.path());

    ciphercell(tmp.path())
        .args(["init", "--email", "me@example.com"])
        .env("CIPHERCELL_PASSWORD", PASSWORD)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn list_on_fresh_vault_is_empty() {
    let tmp = project();
    init(tmp.path());

    ciphercell(tmp.path())
        .arg("list")
        .env("CIPHERCELL_PASSWORD", PASSWORD)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 item(s)"));
}

#[test]
fn list_without_vault_fails() {
    let tmp = project();
    ciphercell(tmp.path())
        .arg("list")
        .env("CIPHERCELL_PASSWORD", PASSWORD)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No vault exists"));
}

#[test]
fn wrong_password_locks_out_across_runs() {
    let tmp = project();
    init(tmp.path());

    ciphercell(tmp.path())
        .arg("list")
        .env("CIPHERCELL_PASSWORD", "wrong-password-123")
        .assert()
        .failure()
        .stderr(predicate::str::contains("wrong master password"));

    // The lockout is persisted, so even the right password is refused now.
    ciphercell(tmp.path())
        .arg("list")
        .env("CIPHERCELL_PASSWORD", PASSWORD)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Too many failed attempts"));

    ciphercell(tmp.path())
        .arg("status")
        .assert()
        .success()
        .stderr(predicate::str::contains("Locked out after 1 failed attempt"));

    assert!(tmp.path().join(".ciphercell").join("lockout.json").exists());
}

#[test]
fn add_rejects_unknown_category_before_prompting() {
    let tmp = project();
    init(tmp.path());

    ciphercell(tmp.path())
        .args(["add", "Bank", "--category", "Crypto"])
        .env("CIPHERCELL_PASSWORD", PASSWORD)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown category"));
}

#[test]
fn broken_config_is_reported() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join(".ciphercell.toml"), "not valid {{toml").unwrap();

    ciphercell(tmp.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file error"));
}
