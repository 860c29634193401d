use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn indexer(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_litindex-indexer"))
        .current_dir(dir)
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("spawn indexer")
}

fn stdout(out: &Output) -> String { String::from_utf8_lossy(&out.stdout).into_owned() }

fn write_rows(dir: &Path) {
    let rows = r#"[
        {"docId": "PMC1", "title": "Cardiac imaging", "pub_date": "2020", "modalities": "mic gra"},
        {"docId": "PMC2", "title": "Mouse models", "pub_date": "2020-03-15", "modalities": null},
        {"docId": "PMC3", "title": "Broken row", "pub_date": "bad-date"}
    ]"#;
    fs::write(dir.join("rows.json"), rows).unwrap();
}

#[test]
fn skipped_rows_still_exit_zero() {
    let tmp = TempDir::new().unwrap();
    write_rows(tmp.path());
    let out = indexer(tmp.path(), &["rows.json", "store", "create"]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let report = stdout(&out);
    assert!(report.contains("indexed: 2, skipped: 1"), "{}", report);
    assert!(report.contains("row 3:"), "{}", report);
    assert!(report.contains("store holds 2 documents"), "{}", report);
}

#[test]
fn json_report_is_machine_readable() {
    let tmp = TempDir::new().unwrap();
    write_rows(tmp.path());
    let out = indexer(tmp.path(), &["rows.json", "store", "create", "--json"]);
    assert_eq!(out.status.code(), Some(0));
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json report");
    assert_eq!(report["seen"], 3);
    assert_eq!(report["skipped"], 1);
    assert_eq!(report["committed"], 2);
}

#[test]
fn schema_mismatch_on_append_exits_two() {
    let tmp = TempDir::new().unwrap();
    write_rows(tmp.path());
    assert_eq!(indexer(tmp.path(), &["rows.json", "store", "create"]).status.code(), Some(0));

    let out = indexer(tmp.path(), &["rows.json", "store", "append", "--schema", "cord19"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stdout(&out).contains("store holds unknown documents"), "{}", stdout(&out));

    let out = indexer(tmp.path(), &["rows.json", "store", "append", "--schema", "cord19", "--json"]);
    assert_eq!(out.status.code(), Some(2));
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json report");
    assert!(report["committed"].is_null());
}

#[test]
fn unwritable_store_exits_two() {
    let tmp = TempDir::new().unwrap();
    write_rows(tmp.path());
    fs::write(tmp.path().join("blocker"), b"file").unwrap();
    let out = indexer(tmp.path(), &["rows.json", "blocker/store", "create"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Store error"));
}

#[test]
fn missing_input_exits_one() {
    let tmp = TempDir::new().unwrap();
    let out = indexer(tmp.path(), &["absent.json", "store", "create"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!tmp.path().join("store").exists(), "no store is touched before the input loads");
}

