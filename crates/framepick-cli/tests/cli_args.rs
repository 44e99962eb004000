//! CLI argument validation tests.
//!
//! Tests command-line argument parsing, validation, and error handling.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use assert_cmd::Command;
use framepick_test_support::{write_cascade_set, SyntheticImageBuilder, NEVER_FIRES_CASCADE};
use predicates::prelude::*;
use tempfile::TempDir;

/// A workspace with one image and a set of never-firing cascades.
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let cascades = dir.path().join("cascades");
    std::fs::create_dir(&cascades).unwrap();
    write_cascade_set(&cascades, NEVER_FIRES_CASCADE).unwrap();
    SyntheticImageBuilder::sharp_image()
        .write_png(dir.path(), "test")
        .unwrap();
    dir
}

fn framepick(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("framepick").unwrap();
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .arg("--cascades-dir")
        .arg(dir.path().join("cascades"));
    cmd
}

// === Missing/Invalid Path Tests ===

#[test]
fn test_missing_path_shows_error() {
    let mut cmd = Command::cargo_bin("framepick").unwrap();
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("No paths specified"));
}

#[test]
fn test_nonexistent_path_warns_but_continues() {
    let dir = workspace();
    framepick(&dir)
        .arg("/nonexistent/path/to/image.jpg")
        .assert()
        .code(0)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_empty_directory() {
    let dir = workspace();
    let empty = dir.path().join("empty");
    std::fs::create_dir(&empty).unwrap();

    framepick(&dir)
        .arg(&empty)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("\"count\":0"));
}

#[test]
fn test_missing_cascades_is_fatal() {
    let dir = workspace();
    let mut cmd = Command::cargo_bin("framepick").unwrap();
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .arg("--cascades-dir")
        .arg(dir.path().join("nowhere"))
        .arg("test.png");

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("models fetch"));
}

// === Format Validation Tests ===

#[test]
fn test_invalid_format_rejected() {
    let dir = workspace();
    framepick(&dir)
        .arg("--format")
        .arg("xml")
        .arg("test.png")
        .assert()
        .failure()
        .stderr(predicate::str::contains("json").or(predicate::str::contains("jsonl")));
}

#[test]
fn test_valid_formats_accepted() {
    let dir = workspace();
    for format in ["json", "jsonl"] {
        framepick(&dir)
            .arg("--format")
            .arg(format)
            .arg("test.png")
            .assert()
            .code(0);
    }
}

// === Numeric Validation Tests ===

#[test]
fn test_zero_top_n_rejected() {
    let dir = workspace();
    framepick(&dir)
        .arg("--top-n")
        .arg("0")
        .arg("test.png")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 1"));
}

#[test]
fn test_negative_weight_rejected() {
    let dir = workspace();
    framepick(&dir)
        .arg("--smiles-weight=-1")
        .arg("test.png")
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-negative"));
}

#[test]
fn test_non_numeric_weight_rejected() {
    let dir = workspace();
    framepick(&dir)
        .arg("--faces-weight")
        .arg("abc")
        .arg("test.png")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid number"));
}

#[test]
fn test_zero_max_kb_rejected() {
    let dir = workspace();
    framepick(&dir)
        .arg("--max-kb")
        .arg("0")
        .arg("test.png")
        .assert()
        .failure();
}

#[test]
fn test_threads_accepted() {
    let dir = workspace();
    framepick(&dir)
        .arg("--threads")
        .arg("2")
        .arg("test.png")
        .assert()
        .code(0);
}

// === Subcommands ===

#[test]
fn test_explicit_rank_subcommand() {
    let dir = workspace();
    let mut cmd = Command::cargo_bin("framepick").unwrap();
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .arg("rank")
        .arg("--cascades-dir")
        .arg(dir.path().join("cascades"))
        .arg("test.png");

    cmd.assert()
        .code(0)
        .stdout(predicate::str::contains("\"top\""));
}

#[test]
fn test_models_path() {
    let dir = workspace();
    let mut cmd = Command::cargo_bin("framepick").unwrap();
    cmd.env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .arg("models")
        .arg("path")
        .arg("--cascades-dir")
        .arg(dir.path().join("cascades"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("cascades"));
}

#[test]
fn test_models_list_reports_installed() {
    let dir = workspace();
    let mut cmd = Command::cargo_bin("framepick").unwrap();
    cmd.env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .arg("models")
        .arg("list")
        .arg("--cascades-dir")
        .arg(dir.path().join("cascades"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("3/3 cascades installed"))
        .stdout(predicate::str::contains("haarcascade_smile.xml"));
}

// === Verbosity Level Tests ===

#[test]
fn test_verbosity_levels() {
    let dir = workspace();
    for flag in ["-v", "-vv", "-vvv"] {
        framepick(&dir).arg(flag).arg("test.png").assert().code(0);
    }
}

#[test]
fn test_help_mentions_commands() {
    Command::cargo_bin("framepick")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("rank"))
        .stdout(predicate::str::contains("models"));
}
