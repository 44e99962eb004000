//! Output format validation tests.
//!
//! Tests JSON/JSONL output format correctness and required field presence.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::fs;

use assert_cmd::Command;
use framepick_test_support::{write_cascade_set, SyntheticImageBuilder, NEVER_FIRES_CASCADE};
use serde_json::Value;
use tempfile::TempDir;

/// Two good images, one corrupt file, and never-firing cascades.
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let cascades = dir.path().join("cascades");
    fs::create_dir(&cascades).unwrap();
    write_cascade_set(&cascades, NEVER_FIRES_CASCADE).unwrap();

    let photos = dir.path().join("photos");
    fs::create_dir(&photos).unwrap();
    SyntheticImageBuilder::sharp_image()
        .write_png(&photos, "a_sharp")
        .unwrap();
    SyntheticImageBuilder::flat_image()
        .write_jpeg(&photos, "b_flat", 90)
        .unwrap();
    fs::write(photos.join("c_broken.jpg"), SyntheticImageBuilder::truncated_jpeg()).unwrap();
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

// === JSON Format Tests ===

#[test]
fn test_json_report_fields() {
    let dir = workspace();
    let output = framepick(&dir).arg("photos").output().unwrap();

    // One image could not be scored
    assert_eq!(output.status.code(), Some(1));

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["count"], 3);
    assert_eq!(value["all"].as_array().unwrap().len(), 3);
    assert_eq!(value["top"].as_array().unwrap().len(), 2);
    assert!(value["saved"].as_array().unwrap().is_empty());
    assert!(value["generated_at"].is_string());

    for result in value["top"].as_array().unwrap() {
        for key in ["filename", "score", "sharpness", "brightness", "faces", "eyes_open", "smiles"] {
            assert!(result.get(key).is_some(), "missing {key} in {result}");
        }
    }
}

#[test]
fn test_failures_listed_in_input_order() {
    let dir = workspace();
    let output = framepick(&dir).arg("photos").output().unwrap();
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();

    let all = value["all"].as_array().unwrap();
    assert!(all[0]["filename"].as_str().unwrap().ends_with("a_sharp.png"));
    assert!(all[2]["filename"].as_str().unwrap().ends_with("c_broken.jpg"));
    assert_eq!(all[2]["error"], "cannot_decode_image");
    assert!(all[2].get("score").is_none());
}

#[test]
fn test_top_sorted_descending() {
    let dir = workspace();
    let output = framepick(&dir).arg("photos").output().unwrap();
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();

    let scores: Vec<f64> = value["top"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["score"].as_f64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    assert!(value["top"][0]["filename"]
        .as_str()
        .unwrap()
        .ends_with("a_sharp.png"));
}

#[test]
fn test_pretty_output() {
    let dir = workspace();
    let output = framepick(&dir).arg("--pretty").arg("photos").output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(stdout.lines().count() > 10);
    assert!(serde_json::from_str::<Value>(&stdout).is_ok());
}

// === JSONL Format Tests ===

#[test]
fn test_jsonl_format_single_object_per_line() {
    let dir = workspace();
    let output = framepick(&dir)
        .arg("--format")
        .arg("jsonl")
        .arg("photos")
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    let lines: Vec<Value> = stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(Value::is_object));
    assert_eq!(lines[0]["rank"], 1);
    assert_eq!(lines[1]["rank"], 2);
    assert!(lines[2].get("rank").is_none());
}

// === Selection Store ===

#[test]
fn test_save_dir_copies_originals() {
    let dir = workspace();
    let picks = dir.path().join("picks");
    let output = framepick(&dir)
        .arg("--top-n")
        .arg("1")
        .arg("--save-dir")
        .arg(&picks)
        .arg("--base-url")
        .arg("https://photos.example.com/picks")
        .arg("photos")
        .output()
        .unwrap();
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();

    let saved = value["saved"].as_array().unwrap();
    assert_eq!(saved.len(), 1);
    let name = saved[0]["saved_as"].as_str().unwrap();
    assert!(name.ends_with(".png"));
    assert_eq!(
        saved[0]["url"],
        format!("https://photos.example.com/picks/{name}")
    );
    assert_eq!(value["top"][0]["url"], saved[0]["url"]);

    let original = fs::read(dir.path().join("photos").join("a_sharp.png")).unwrap();
    assert_eq!(fs::read(picks.join(name)).unwrap(), original);
}

#[test]
fn test_same_file_twice_gets_two_placements() {
    let dir = workspace();
    let picks = dir.path().join("picks");
    let output = framepick(&dir)
        .arg("--format")
        .arg("jsonl")
        .arg("--top-n")
        .arg("2")
        .arg("--save-dir")
        .arg(&picks)
        .arg("photos/a_sharp.png")
        .arg("photos/a_sharp.png")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));

    let lines: Vec<Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["filename"], lines[1]["filename"]);
    assert_eq!(lines[0]["rank"], 1);
    assert_eq!(lines[1]["rank"], 2);
    assert_ne!(lines[0]["saved_as"], lines[1]["saved_as"]);
    assert_eq!(fs::read_dir(&picks).unwrap().count(), 2);
}
