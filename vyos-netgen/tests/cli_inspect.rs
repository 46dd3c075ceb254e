use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn inspect_prints_top_level_nodes() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vyos-netgen"));
    cmd.arg("inspect")
        .arg(fixture("fixtures/templates"))
        .arg("--depth")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("templates\n"))
        .stdout(predicate::str::contains("  firewall"))
        .stdout(predicate::str::contains("  system"))
        .stdout(predicate::str::contains("node.tag").not());
}

#[test]
fn inspect_path_shows_constraints() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vyos-netgen"));
    cmd.arg("inspect")
        .arg(fixture("fixtures/templates"))
        .arg("--path")
        .arg("firewall/name/node.tag/rule")
        .arg("--depth")
        .arg("0")
        .arg("--constraints")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("rule <u32> [tag]"))
        .stdout(predicate::str::contains(
            r#"! {"kind":"range","min":1,"max":9999,"reason":"Rule number must be between 1 and 9999"}"#,
        ));
}

#[test]
fn inspect_unknown_path_fails() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vyos-netgen"));
    cmd.arg("inspect")
        .arg(fixture("fixtures/templates"))
        .arg("--path")
        .arg("protocols/bgp")
        .assert()
        .failure()
        .stderr(predicate::str::contains("schema path 'protocols/bgp' not found"));
}

#[test]
fn inspect_missing_directory_fails() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vyos-netgen"));
    cmd.arg("inspect")
        .arg(fixture("fixtures/no-such-templates"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse templates"));
}
