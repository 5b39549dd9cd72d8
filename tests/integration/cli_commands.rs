#![allow(missing_docs)]

mod common;

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use common::*;
use serde_json::Value;

fn fixture() -> Vec<u8> {
    let alias = alias_bytes("Macintosh HD", "bg.png");
    let plist = bplist_dict(&[("backgroundImageAlias", PlistObject::Data(alias))]);
    let mut builder = StoreBuilder::new();
    let root = builder.block(leaf(&[
        blob_record(".", b"icvp", &plist),
        long_record(".", b"vSrn", 1),
        bool_record("a.txt", b"ICVO", true),
        ustr_record("a.txt", b"cmmt", "hello"),
    ]));
    let meta = builder.block(tree_meta(root, 0, 4, 1));
    builder.free(5, 0x4000).free(5, 0x4020);
    builder.build(Some(meta))
}

#[test]
fn info_reports_tree_metadata_as_json() {
    let (_dir, path) = write_store(&fixture());
    let output = cargo_bin_cmd!("dsstore")
        .args(["--format", "json", "info"])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["prologue"], 1);
    assert_eq!(json["tree"]["num_records"], 4);
    assert_eq!(json["directory"][0]["name"], "DSDB");
    assert!(json["verification"].is_null());
}

#[test]
fn info_prints_text() {
    let (_dir, path) = write_store(&fixture());
    let output = cargo_bin_cmd!("dsstore")
        .args(["--theme", "plain", "info"])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    assert!(text.contains("DSDB -> block"));
    assert!(text.contains("tree matches its metadata"));
}

#[test]
fn records_filters_by_filename_and_type() {
    let (_dir, path) = write_store(&fixture());
    let output = cargo_bin_cmd!("dsstore")
        .args(["--format", "json", "records", "--filename", "a.txt", "--type", "cmmt"])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    let records = json.as_array().expect("array");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["value"]["type"], "text");
    assert_eq!(records[0]["value"]["value"], "hello");
}

#[test]
fn records_text_lists_every_record() {
    let (_dir, path) = write_store(&fixture());
    let output = cargo_bin_cmd!("dsstore")
        .arg("records")
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    assert_eq!(text.lines().count(), 4);
    assert!(text.contains("a.txt\tICVO\ttrue"));
    assert!(text.contains(".\tvSrn\t1"));
}

#[test]
fn free_reports_coalesced_ranges() {
    let (_dir, path) = write_store(&fixture());
    let output = cargo_bin_cmd!("dsstore")
        .args(["--format", "json", "free"])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["ranges"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["total_free"], 64);
    assert!(json["inconsistency"].is_null());
}

#[test]
fn alias_decodes_background_picture() {
    let (_dir, path) = write_store(&fixture());
    let output = cargo_bin_cmd!("dsstore")
        .args(["--format", "json", "alias"])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["volume_name"], "Macintosh HD");
    assert_eq!(json["file_name"], "bg.png");
}

#[test]
fn config_supplies_default_path_and_format() {
    let (dir, path) = write_store(&fixture());
    let config = dir.path().join("cli.toml");
    fs::write(
        &config,
        format!(
            "default_path = {:?}\nformat = \"json\"\n",
            path.to_string_lossy()
        ),
    )
    .expect("write config");
    let output = cargo_bin_cmd!("dsstore")
        .arg("--config")
        .arg(&config)
        .arg("info")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["tree"]["num_records"], 4);
}

#[test]
fn corrupt_file_exits_with_error() {
    let mut bytes = fixture();
    bytes[ARENA_BASE..ARENA_BASE + 4].copy_from_slice(b"XXXX");
    let (_dir, path) = write_store(&bytes);
    let output = cargo_bin_cmd!("dsstore")
        .arg("info")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(output).expect("utf8");
    assert!(stderr.contains("invalid header"));
}

#[test]
fn missing_file_exits_with_error() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    cargo_bin_cmd!("dsstore")
        .arg("records")
        .arg(dir.path().join("nope"))
        .assert()
        .failure();
}

#[test]
fn malformed_type_filter_is_rejected() {
    let (_dir, path) = write_store(&fixture());
    cargo_bin_cmd!("dsstore")
        .args(["records", "--type", "toolong"])
        .arg(&path)
        .assert()
        .failure();
}

#[test]
fn count_mismatch_warning_goes_to_stderr() {
    let mut builder = StoreBuilder::new();
    let root = builder.block(leaf(&[bool_record("a.txt", b"ICVO", true)]));
    let meta = builder.block(tree_meta(root, 0, 9, 1));
    let (_dir, path) = write_store(&builder.build(Some(meta)));
    let output = cargo_bin_cmd!("dsstore")
        .args(["--theme", "plain", "info"])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .clone();
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(!stdout.contains("warning:"));
    assert!(!stdout.contains("tree matches its metadata"));
    assert!(stderr.contains("warning: b-tree records mismatch"));
}

#[test]
fn free_prints_ranges_as_text() {
    let (_dir, path) = write_store(&fixture());
    let output = cargo_bin_cmd!("dsstore")
        .arg("free")
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    assert!(text.contains("[0x4000, 0x4040) 64 bytes"));
    assert!(text.contains("64 bytes free in 1 ranges"));
    assert!(text.contains("ok: free ranges do not overlap"));
}
