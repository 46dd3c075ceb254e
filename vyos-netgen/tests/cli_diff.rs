use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

fn netgen() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vyos-netgen"));
    cmd.env("NO_COLOR", "1");
    cmd
}

fn write_def(root: &Path, rel: &str, body: &str) {
    let dir = root.join(rel);
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(dir.join("node.def"), body).expect("write node.def");
}

#[test]
fn diff_shows_paths_unique_to_each_inventory() {
    netgen()
        .arg("diff")
        .arg(fixture("fixtures/site-a.yaml"))
        .arg(fixture("fixtures/site-b.yaml"))
        .arg("--templates")
        .arg(fixture("fixtures/templates"))
        .assert()
        .success()
        .stdout(predicate::str::contains("- nat\n"))
        .stdout(predicate::str::contains("- interfaces/ethernet/eth1\n"))
        .stdout(predicate::str::contains("+ interfaces/ethernet/eth2\n"))
        .stdout(predicate::str::contains("+ firewall/all-ping\n"))
        .stdout(predicate::str::contains("system/host-name").not());
}

#[test]
fn diff_summary_and_ignore() {
    netgen()
        .arg("diff")
        .arg(fixture("fixtures/site-a.yaml"))
        .arg(fixture("fixtures/conflict.yaml"))
        .arg("--templates")
        .arg(fixture("fixtures/templates"))
        .arg("--ignore")
        .arg("service")
        .arg("--ignore")
        .arg("firewall")
        .arg("--ignore")
        .arg("interfaces")
        .arg("--ignore")
        .arg("nat")
        .arg("--summary")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "identical=0 modified=1 only_left=1 only_right=0",
        ));
}

#[test]
fn diff_reports_modified_values_as_json() {
    let output = netgen()
        .arg("diff")
        .arg(fixture("fixtures/site-a.yaml"))
        .arg(fixture("fixtures/conflict.yaml"))
        .arg("--templates")
        .arg(fixture("fixtures/templates"))
        .arg("--format")
        .arg("json")
        .output()
        .expect("run diff");
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let modified = entries
        .as_array()
        .expect("array")
        .iter()
        .find(|entry| entry["path"] == "system/host-name")
        .expect("host-name entry");
    assert_eq!(modified["type"], "Modified");
}

#[test]
fn schema_diff_reports_added_and_removed_nodes() {
    let dir = tempdir().expect("tempdir");
    let left = dir.path().join("left").join("templates");
    let right = dir.path().join("right").join("templates");
    write_def(&left, "system/host-name", "type: txt\n");
    write_def(&left, "system/domain-name", "type: txt\n");
    write_def(&right, "system/host-name", "type: txt\n");
    write_def(&right, "system/time-zone", "type: txt\n");

    netgen()
        .arg("schema-diff")
        .arg(&left)
        .arg(&right)
        .assert()
        .success()
        .stdout(predicate::str::contains("- system/domain-name"))
        .stdout(predicate::str::contains("+ system/time-zone"));

    netgen()
        .arg("schema-diff")
        .arg(&left)
        .arg(&right)
        .arg("--max-depth")
        .arg("0")
        .arg("--summary")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "identical=0 modified=0 only_left=0 only_right=0",
        ));
}

#[test]
fn schema_diff_of_identical_trees_is_empty() {
    netgen()
        .arg("schema-diff")
        .arg(fixture("fixtures/templates"))
        .arg(fixture("fixtures/templates"))
        .arg("--summary")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "identical=0 modified=0 only_left=0 only_right=0",
        ));
}
