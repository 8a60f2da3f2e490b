// psstrip/tests/cli_integration_tests.rs
//! Command-line integration tests for the `psstrip` binary.
//!
//! Each test builds a small repository in a temporary directory, runs the
//! binary with `assert_cmd` and checks exit status, output streams and the
//! resulting destination tree.

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) -> Result<()> {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap())?;
    fs::write(path, content)?;
    Ok(())
}

/// A repository with one user, one workgroup and a few documents.
fn fixture() -> Result<TempDir> {
    let tmp = tempfile::tempdir()?;
    let repo = tmp.path().join("repo");
    write(
        &repo,
        "data/users/ho/lm/holmes/holmes.xml",
        r#"<user userId="holmes"><name>Sherlock Holmes</name><email>sherlock@bakerstreet.org</email></user>"#,
    )?;
    write(
        &repo,
        "data/config/workgroups.xml",
        r#"<workgroups><workgroup name="Irregulars"/></workgroups>"#,
    )?;
    write(&repo, "settings.xml", "<settings/>")?;
    write(
        &repo,
        "data/2024/01/01/PSA0001/docinfo.xml",
        "<docinfo><author>holmes</author><summary>secret</summary></docinfo>",
    )?;
    write(&repo, "data/2024/01/01/PSA0001/content.txt", "secret")?;
    write(&repo, "data/log/events.txt", "holmes submitted PSA0001\n")?;
    Ok(tmp)
}

/// Runs `psstrip` with logging left at its defaults.
fn psstrip() -> Command {
    let mut cmd = Command::cargo_bin("psstrip").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("PSSTRIP_THROTTLE");
    cmd
}

#[test]
fn test_no_arguments_prints_usage() {
    psstrip()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_help_describes_the_tool() {
    psstrip()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("PatentSafe"))
        .stdout(predicate::str::contains("--repo-version"));
}

#[test]
fn test_version_flag() {
    psstrip()
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_default_run_reports_destination_and_totals() -> Result<()> {
    let tmp = fixture()?;
    let out = tmp.path().join("out");
    psstrip()
        .arg(tmp.path().join("repo"))
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("PatentSafe repository copied to:"))
        .stderr(predicate::str::contains("Stripped"));

    let docinfo = fs::read_to_string(out.join("data/2024/01/01/PSA0001/docinfo.xml"))?;
    assert_eq!(
        docinfo,
        "<docinfo><author>user0</author><summary>~summary stripped by psstrip~</summary></docinfo>"
    );
    assert!(out.join("data/users/us/er/user0/user0.xml").is_file());
    Ok(())
}

#[test]
fn test_existing_destination_is_refused() -> Result<()> {
    let tmp = fixture()?;
    let out = tmp.path().join("out");
    fs::create_dir_all(&out)?;
    psstrip()
        .arg(tmp.path().join("repo"))
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("already exists"));
    Ok(())
}

#[test]
fn test_force_replaces_existing_destination() -> Result<()> {
    let tmp = fixture()?;
    let out = tmp.path().join("out");
    write(&out, "stale.txt", "old run")?;
    psstrip()
        .arg("--force")
        .arg("--no-summary")
        .arg(tmp.path().join("repo"))
        .arg(&out)
        .assert()
        .success();
    assert!(!out.join("stale.txt").exists());
    assert!(out.join("settings.xml").is_file());
    Ok(())
}

#[test]
fn test_quiet_run_is_silent() -> Result<()> {
    let tmp = fixture()?;
    psstrip()
        .arg("-q")
        .arg(tmp.path().join("repo"))
        .arg(tmp.path().join("out"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
    Ok(())
}

#[test]
fn test_verbose_run_lists_files() -> Result<()> {
    let tmp = fixture()?;
    psstrip()
        .arg("-V")
        .arg("--no-summary")
        .arg(tmp.path().join("repo"))
        .arg(tmp.path().join("out"))
        .assert()
        .success()
        .stderr(predicate::str::contains("PatentSafe Stripper"))
        .stderr(predicate::str::contains(" - stripped data/log/events.txt"))
        .stderr(predicate::str::contains(" - replaced data/2024/01/01/PSA0001/content.txt"))
        .stderr(predicate::str::contains(" - copied settings.xml"));
    Ok(())
}

#[test]
fn test_json_totals_on_stdout() -> Result<()> {
    let tmp = fixture()?;
    let output = psstrip()
        .args(["--json", "--no-summary", "-q"])
        .arg(tmp.path().join("repo"))
        .arg(tmp.path().join("out"))
        .output()?;
    assert!(output.status.success());

    let totals: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(totals["users"], 1);
    assert_eq!(totals["workgroups"], 1);
    assert_eq!(totals["copied"], 1);
    assert_eq!(totals["replaced"], 1);
    assert_eq!(totals["stripped"], 3);
    Ok(())
}

#[test]
fn test_bad_custom_rules_fail() -> Result<()> {
    let tmp = fixture()?;
    let rules = tmp.path().join("rules.yaml");
    fs::write(&rules, "copy:\n  - \"(\"\n")?;
    psstrip()
        .arg("--rules")
        .arg(&rules)
        .arg(tmp.path().join("repo"))
        .arg(tmp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid pattern"));
    assert!(!tmp.path().join("out").exists());
    Ok(())
}

#[test]
fn test_missing_source_fails() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    psstrip()
        .arg(tmp.path().join("missing"))
        .arg(tmp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));
    Ok(())
}
