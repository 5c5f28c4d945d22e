use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const COLORS: &str = r#"
!ArenaConfig
arenas:
  0: !Arena
    items:
    - !Item
      name: Wall
      colors: !ProcColor 3
"#;

const BROKEN_REFERENCE: &str = r#"
- !ProcIf
  variable: door.name
  cases: [Door]
  then: [open]
"#;

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn tasks() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let tasks = temp_dir.path().join("tasks");
    write(&tasks.join("colors.yaml"), COLORS);
    write(&tasks.join("easy/more_colors.yml"), COLORS);
    write(&tasks.join("easy/README.md"), "not a template");
    write(&tasks.join("colors_variations/colors_00001.yaml"), COLORS);
    write(&tasks.join(".drafts/hidden.yaml"), COLORS);
    temp_dir
}

#[test]
fn test_cli_sample_bulk_mirrors_directories() {
    let temp_dir = tasks();
    let out = temp_dir.path().join("out");

    let mut cmd = Command::cargo_bin("procgen").unwrap();
    cmd.arg("sample-bulk")
        .arg(temp_dir.path().join("tasks"))
        .arg("2")
        .arg("-o")
        .arg(&out);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Processed 2 template(s), 0 failed"));

    assert!(out.join("colors_variations/colors_00002.yaml").exists());
    assert!(out.join("easy/more_colors_variations/more_colors_00002.yaml").exists());
    assert!(out.join("easy/more_colors_variations/template.yaml").exists());
    assert!(!out.join("hidden_variations").exists());
}

#[test]
fn test_cli_gen_bulk_flatten_and_ignore() {
    let temp_dir = tasks();
    let out = temp_dir.path().join("out");

    let mut cmd = Command::cargo_bin("procgen").unwrap();
    cmd.arg("gen-bulk")
        .arg(temp_dir.path().join("tasks"))
        .arg("--flatten")
        .arg("--no-ignore-hidden")
        .arg("-i")
        .arg("easy")
        .arg("-o")
        .arg(&out);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Processed 2 template(s), 0 failed"));

    assert!(out.join("colors_variations/colors_00003.yaml").exists());
    assert!(!out.join("colors_variations/colors_00004.yaml").exists());
    assert!(out.join("hidden_variations/hidden_00001.yaml").exists());
    assert!(!out.join("more_colors_variations").exists());
}

#[test]
fn test_cli_bulk_continues_after_template_errors() {
    let temp_dir = tasks();
    write(
        &temp_dir.path().join("tasks/broken.yaml"),
        BROKEN_REFERENCE,
    );
    let out = temp_dir.path().join("out");

    let mut cmd = Command::cargo_bin("procgen").unwrap();
    cmd.arg("gen-bulk")
        .arg(temp_dir.path().join("tasks"))
        .arg("-o")
        .arg(&out);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("broken.yaml: IDNotFound"))
        .stderr(predicate::str::contains("1 of 3 template(s) failed"));

    let report = fs::read_to_string(out.join("broken.error.txt")).unwrap();
    assert!(report.starts_with("IDNotFound in"), "{}", report);
    assert!(report.contains("Could not find an Item with id 'door'"));
    assert!(!out.join("broken_variations").exists());
    assert!(out.join("colors_variations/colors_00003.yaml").exists());
}

#[test]
fn test_cli_gen_bulk_skips_large_templates() {
    let temp_dir = tasks();
    let out = temp_dir.path().join("out");

    let mut cmd = Command::cargo_bin("procgen").unwrap();
    cmd.arg("gen-bulk")
        .arg(temp_dir.path().join("tasks"))
        .arg("--max")
        .arg("2")
        .arg("-o")
        .arg(&out);
    cmd.assert().failure();

    let report = fs::read_to_string(out.join("colors.error.txt")).unwrap();
    assert!(report.starts_with("TooManyVariations in"));
    assert!(report.contains("3#ProcColor"));
}

#[test]
fn test_cli_count_bulk_table_and_json() {
    let temp_dir = tasks();

    let mut cmd = Command::cargo_bin("procgen").unwrap();
    cmd.arg("count-bulk").arg(temp_dir.path().join("tasks"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("colors.yaml"))
        .stdout(predicate::str::contains("more_colors.yml"))
        .stdout(predicate::str::contains("3#ProcColor"));

    let mut cmd = Command::cargo_bin("procgen").unwrap();
    cmd.arg("count-bulk")
        .arg(temp_dir.path().join("tasks"))
        .arg("--json");
    let output = cmd.assert().success().get_output().stdout.clone();
    let reports: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(reports.as_array().unwrap().len(), 2);
    assert_eq!(reports[0]["count"], "3");
}

#[test]
fn test_cli_bulk_requires_directory() {
    let temp_dir = tasks();

    let mut cmd = Command::cargo_bin("procgen").unwrap();
    cmd.arg("count-bulk")
        .arg(temp_dir.path().join("tasks/colors.yaml"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("is not a directory"));
}
