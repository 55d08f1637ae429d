//! Binary smoke tests for the offline (local-only) surface.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn catalog_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"id":"1","name":"Clean Water Fund","status":"active"}},
            {{"id":"2","name":"Bridge Repair Program","status":"active","isPinned":true}},
            {{"id":"3","name":"Aquifer Protection","status":"active","agency":"Water Authority"}}
        ]"#
    )
    .unwrap();
    file
}

fn nofos() -> Command {
    let mut cmd = Command::cargo_bin("nofos").unwrap();
    cmd.env_remove("NOFOS_ENDPOINT")
        .env_remove("NOFOS_TRANSPORT")
        .env_remove("NOFOS_CATALOG");
    cmd
}

#[test]
fn offline_search_filters_by_substring() {
    let catalog = catalog_file();
    nofos()
        .args(["search", "water", "--catalog"])
        .arg(catalog.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Clean Water Fund"))
        .stdout(predicate::str::contains("Aquifer Protection"))
        .stdout(predicate::str::contains("Bridge Repair Program").not());
}

#[test]
fn offline_search_orders_pinned_first() {
    let catalog = catalog_file();
    let output = nofos()
        .args(["search", "", "--catalog"])
        .arg(catalog.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let pinned = stdout.find("Bridge Repair Program").unwrap();
    let first_unpinned = stdout.find("Aquifer Protection").unwrap();
    assert!(pinned < first_unpinned, "pinned record must lead the list");
}

#[test]
fn json_output_is_a_record_array() {
    let catalog = catalog_file();
    let output = nofos()
        .args(["search", "water", "--json", "--catalog"])
        .arg(catalog.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
}

#[test]
fn missing_catalog_is_a_readable_error() {
    nofos()
        .args(["search", "water", "--catalog", "/nonexistent/catalog.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading catalog"));
}

#[test]
fn completions_generate() {
    nofos()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nofos"));
}
