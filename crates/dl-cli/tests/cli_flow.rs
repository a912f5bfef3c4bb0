//! End-to-end tests running the `dl` binary against a temporary database.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn dl_binary() -> String {
    env!("CARGO_BIN_EXE_dl").to_string()
}

/// Writes a config file pointing at a database inside `temp`.
fn write_config(temp: &Path) -> PathBuf {
    let config_path = temp.join("config.toml");
    let db_path = temp.join("data").join("ledger.db");
    std::fs::write(
        &config_path,
        format!(
            "database_path = {:?}\nadmin_ids = [\"9\"]\n",
            db_path.display().to_string()
        ),
    )
    .unwrap();
    config_path
}

fn dl(temp: &Path, args: &[&str]) -> Output {
    let config_path = write_config(temp);
    Command::new(dl_binary())
        .env("HOME", temp)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("DL_DATABASE_PATH")
        .env_remove("DL_ADMIN_IDS")
        .arg("--config")
        .arg(&config_path)
        .args(args)
        .output()
        .expect("failed to run dl")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "dl should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn test_clock_in_twice_is_rejected() {
    let temp = TempDir::new().unwrap();

    let first = stdout(&dl(temp.path(), &["clock-in", "--driver", "1001"]));
    assert!(first.starts_with("Clocked in at "));

    let second = dl(temp.path(), &["clock-in", "--driver", "1001"]);
    assert!(!second.status.success());
    let stderr = String::from_utf8_lossy(&second.stderr);
    assert!(stderr.contains("already clocked in"), "stderr: {stderr}");

    let out = stdout(&dl(temp.path(), &["clock-out", "--driver", "1001"]));
    assert!(out.contains("Worked: "), "stdout: {out}");
    assert!(temp.path().join("data").join("ledger.db").exists());
}

#[test]
fn test_claim_and_topup_persist_between_runs() {
    let temp = TempDir::new().unwrap();

    let out = stdout(&dl(
        temp.path(),
        &[
            "claim", "--driver", "1001", "--category", "toll", "--amount", "50",
            "--proof", "photo-1",
        ],
    ));
    assert!(out.contains("Balance: -50.00"), "stdout: {out}");

    let out = stdout(&dl(
        temp.path(),
        &["topup", "--admin", "9", "--driver", "1001", "--amount", "100"],
    ));
    assert!(out.contains("Balance: 50.00"), "stdout: {out}");

    let out = stdout(&dl(temp.path(), &["balance", "--driver", "1001"]));
    assert_eq!(out.trim(), "Balance for User 1001: 50.00");
}

#[test]
fn test_non_admin_cannot_top_up() {
    let temp = TempDir::new().unwrap();
    let output = dl(
        temp.path(),
        &["topup", "--admin", "5", "--driver", "1001", "--amount", "10"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not authorized"));
}

#[test]
fn test_export_is_json() {
    let temp = TempDir::new().unwrap();
    stdout(&dl(
        temp.path(),
        &["register", "--driver", "42", "--username", "siti"],
    ));
    stdout(&dl(temp.path(), &["off-day", "--driver", "42", "--date", "2025-03-01"]));

    let out = stdout(&dl(temp.path(), &["export"]));
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["timezone"], "Asia/Kuala_Lumpur");
    assert_eq!(value["drivers"].as_array().unwrap().len(), 1);
}

#[test]
fn test_no_command_prints_help() {
    let temp = TempDir::new().unwrap();
    let out = stdout(&dl(temp.path(), &[]));
    assert!(out.contains("Usage: dl"), "stdout: {out}");
}
