//! CLI end-to-end tests
//!
//! Tests for the dvrindex command-line interface.

use assert_cmd::prelude::*;
use dvrindex_store::{IndexEntry, SegmentList, SegmentPath};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the dvrindex binary
#[allow(deprecated)]
fn dvrindex_cmd() -> Command {
    Command::cargo_bin("dvrindex").unwrap()
}

fn write_index(path: &Path, entries: &[(u64, u64)]) {
    let mut raw = Vec::new();
    for &(ts, off) in entries {
        raw.extend_from_slice(&IndexEntry::new(ts, off).encode());
    }
    fs::write(path, raw).unwrap();
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = dvrindex_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = dvrindex_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dvrindex"));
}

#[test]
fn test_cli_append_then_lookup() {
    let dir = tempdir().unwrap();
    let index = dir.path().join("seg.ts.idx");

    for (ts, off) in [(10, 100), (20, 200), (20, 250), (30, 300)] {
        dvrindex_cmd()
            .args(["append", index.to_str().unwrap(), &ts.to_string(), &off.to_string()])
            .assert()
            .success();
    }

    dvrindex_cmd()
        .args(["lookup", index.to_str().unwrap(), "25"])
        .assert()
        .success()
        .stdout("200\n");

    dvrindex_cmd()
        .args(["lookup", index.to_str().unwrap(), "1000"])
        .assert()
        .success()
        .stdout("300\n");

    dvrindex_cmd()
        .args(["lookup", index.to_str().unwrap(), "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_cli_append_rejects_regression() {
    let dir = tempdir().unwrap();
    let index = dir.path().join("seg.ts.idx");
    write_index(&index, &[(50, 0)]);

    dvrindex_cmd()
        .args(["append", index.to_str().unwrap(), "40", "188"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("precedes"));
    assert_eq!(fs::metadata(&index).unwrap().len(), 16);
}

#[test]
fn test_cli_dump_json() {
    let dir = tempdir().unwrap();
    let index = dir.path().join("seg.ts.idx");
    write_index(&index, &[(1, 0), (2, 188)]);

    let output = dvrindex_cmd()
        .args(["dump", "--json", index.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json[1]["timestamp"], 2);
    assert_eq!(json[1]["offset"], 188);
}

#[test]
fn test_cli_verify_and_recover() {
    let dir = tempdir().unwrap();
    let index = dir.path().join("seg.ts.idx");
    write_index(&index, &[(1, 0), (2, 188), (3, 376)]);
    let mut raw = fs::read(&index).unwrap();
    raw.extend_from_slice(&[0u8; 6]);
    fs::write(&index, raw).unwrap();

    dvrindex_cmd()
        .args(["verify", index.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Trailing bytes: 6"));

    dvrindex_cmd()
        .args(["recover", index.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Truncated 6 bytes; 3 entries kept"));
    assert_eq!(fs::metadata(&index).unwrap().len(), 48);

    dvrindex_cmd()
        .args(["recover", index.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("intact"));
}

#[test]
fn test_cli_verify_detects_regression() {
    let dir = tempdir().unwrap();
    let index = dir.path().join("bad.idx");
    write_index(&index, &[(10, 0), (5, 188)]);

    dvrindex_cmd()
        .args(["verify", index.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("record 1"));
}

#[test]
fn test_cli_recover_missing_file() {
    let dir = tempdir().unwrap();
    dvrindex_cmd()
        .args(["recover", dir.path().join("nope.idx").to_str().unwrap()])
        .assert()
        .failure();
    assert!(!dir.path().join("nope.idx").exists());
}

#[test]
fn test_cli_segments_and_seek() {
    let dir = tempdir().unwrap();
    let manifest = dir.path().join("recording.json");

    let mut list = SegmentList::new("idx").with_base_dir(dir.path());
    list.append_segment(SegmentPath::new("a.ts").unwrap(), 0)
        .unwrap();
    list.record(0, 0).unwrap();
    list.record(50, 4700).unwrap();
    list.append_segment(SegmentPath::new("b.ts").unwrap(), 100)
        .unwrap();
    list.record(100, 0).unwrap();
    list.record(150, 9400).unwrap();
    list.finish().unwrap();
    list.store(&manifest).unwrap();

    dvrindex_cmd()
        .args(["segments", manifest.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 segments, finished"))
        .stdout(predicate::str::contains("b.ts  [100 - 150]  2"));

    let expected = format!("{}\t9400\n", dir.path().join("b.ts").display());
    dvrindex_cmd()
        .args(["seek", manifest.to_str().unwrap(), "175"])
        .assert()
        .success()
        .stdout(expected);

    let output = dvrindex_cmd()
        .args(["seek", "--json", manifest.to_str().unwrap(), "60"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["offset"], 4700);
    assert_eq!(json["clamped"], false);
}

#[test]
fn test_cli_validate_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("dvrindex.toml");

    fs::write(&config, "[recording]\nindex_extension = \"tidx\"\n").unwrap();
    dvrindex_cmd()
        .args(["validate", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("tidx"));

    fs::write(&config, "[recording]\nindex_extension = \".bad\"\n").unwrap();
    dvrindex_cmd()
        .args(["validate", config.to_str().unwrap()])
        .assert()
        .failure();
}
