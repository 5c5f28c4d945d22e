use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const TEMPLATE: &str = r#"
!ArenaConfig
arenas:
  0: !Arena
    t: 250
    items:
    - !Item
      id: wall
      name: !ProcListLabelled
        - value: Wall
          label: opaque
        - value: WallTransparent
          label: transparent
      colors: !ProcColor 2
    - !Item
      name: GoodGoal
      sizes:
      - !ProcIf
        variable: wall.name
        cases: [Wall, WallTransparent]
        then:
        - !Vector3 {x: 1, y: 1, z: 1}
        - !Vector3 {x: 2, y: 2, z: 2}
"#;

fn write_template(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_cli_count() {
    let temp_dir = TempDir::new().unwrap();
    let template = write_template(&temp_dir, "wall.yaml", TEMPLATE);

    let mut cmd = Command::cargo_bin("procgen").unwrap();
    cmd.arg("count").arg(&template);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Total possible variations: 4"))
        .stdout(predicate::str::contains("2#ProcListLabelled x 2#ProcColor"));
}

#[test]
fn test_cli_gen_writes_every_variation() {
    let temp_dir = TempDir::new().unwrap();
    let template = write_template(&temp_dir, "wall.yaml", TEMPLATE);
    let out = temp_dir.path().join("out");

    let mut cmd = Command::cargo_bin("procgen").unwrap();
    cmd.arg("gen").arg(&template).arg("-o").arg(&out);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Wrote 4 variation(s)"));

    let first = fs::read_to_string(out.join("wall_00001_opaque.yaml")).unwrap();
    assert!(first.starts_with("!ArenaConfig\n"));
    assert!(first.contains("!Vector3 {x: 1, y: 1, z: 1}"));
    assert!(!first.contains("ProcIf"));
    assert!(out.join("wall_00004_transparent.yaml").exists());

    let meta = fs::read_to_string(out.join("meta.csv")).unwrap();
    assert_eq!(meta.lines().count(), 4);
    assert_eq!(meta.lines().next(), Some("wall_00001_opaque.yaml,opaque"));

    let copy = fs::read_to_string(out.join("template.yaml")).unwrap();
    assert!(copy.contains("!ProcListLabelled"));
}

#[test]
fn test_cli_gen_refuses_large_templates() {
    let temp_dir = TempDir::new().unwrap();
    let template = write_template(&temp_dir, "wall.yaml", TEMPLATE);
    let out = temp_dir.path().join("out");

    let mut cmd = Command::cargo_bin("procgen").unwrap();
    cmd.arg("gen")
        .arg(&template)
        .arg("--max")
        .arg("3")
        .arg("-o")
        .arg(&out);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("2#ProcListLabelled x 2#ProcColor"))
        .stderr(predicate::str::contains("Too many variations"));
    assert!(!out.exists());
}

#[test]
fn test_cli_gen_head() {
    let temp_dir = TempDir::new().unwrap();
    let template = write_template(&temp_dir, "wall.yaml", TEMPLATE);
    let out = temp_dir.path().join("out");

    let mut cmd = Command::cargo_bin("procgen").unwrap();
    cmd.arg("gen")
        .arg(&template)
        .arg("--max")
        .arg("3")
        .arg("--head")
        .arg("2")
        .arg("--no-copy-template")
        .arg("-o")
        .arg(&out);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 variation(s)"));
    assert!(!out.join("template.yaml").exists());
}

#[test]
fn test_cli_sample_is_reproducible() {
    let temp_dir = TempDir::new().unwrap();
    let template = write_template(&temp_dir, "wall.yaml", TEMPLATE);

    let mut runs = Vec::new();
    for name in ["first", "second"] {
        let out = temp_dir.path().join(name);
        let mut cmd = Command::cargo_bin("procgen").unwrap();
        cmd.arg("sample")
            .arg(&template)
            .arg("10")
            .arg("--seed")
            .arg("42")
            .arg("-o")
            .arg(&out);
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("Wrote 10 variation(s)"));
        runs.push(fs::read_to_string(out.join("meta.csv")).unwrap());
    }
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[0].lines().count(), 10);
}

#[test]
fn test_cli_reports_parse_errors() {
    let temp_dir = TempDir::new().unwrap();
    let template = write_template(&temp_dir, "broken.yaml", "a: [1, 2\nb: 3\n");

    let mut cmd = Command::cargo_bin("procgen").unwrap();
    cmd.arg("count").arg(&template);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Parse error"))
        .stderr(predicate::str::contains("broken.yaml"));
}

#[test]
fn test_cli_reports_missing_case() {
    let temp_dir = TempDir::new().unwrap();
    let text = TEMPLATE.replace("cases: [Wall, WallTransparent]", "cases: [Wall, Ramp]");
    let template = write_template(&temp_dir, "wall.yaml", &text);

    let mut cmd = Command::cargo_bin("procgen").unwrap();
    cmd.arg("gen")
        .arg(&template)
        .arg("-o")
        .arg(temp_dir.path().join("out"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("MissingCase in"))
        .stderr(predicate::str::contains("wall.name = WallTransparent"));

    // The two variations before the failing one are not kept either.
    assert!(!temp_dir.path().join("out").exists());
    let leftovers = fs::read_dir(temp_dir.path()).unwrap().count();
    assert_eq!(leftovers, 1);
}

#[test]
fn test_cli_rejects_directory_for_single_template() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("procgen").unwrap();
    cmd.arg("sample").arg(temp_dir.path()).arg("5");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("sample-bulk"));
}
