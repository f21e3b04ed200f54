//! CLI smoke tests for scriptbox.
//!
//! Each test runs the binary against its own temporary library, selected via
//! SCRIPTBOX_HOME. None of these require a Python interpreter on the host.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the scriptbox binary, homed in a temp library.
fn scriptbox_cmd(home: &TempDir) -> Command {
  let mut cmd = cargo_bin_cmd!("scriptbox");
  cmd.env("SCRIPTBOX_HOME", home.path());
  cmd
}

/// Write a local Python script for `add` to pick up.
fn write_script(dir: &TempDir, name: &str, source: &str) -> std::path::PathBuf {
  let path = dir.path().join(name);
  std::fs::write(&path, source).unwrap();
  path
}

const HELLO_SCRIPT: &str = r#""""Say hello."""

import json
import requests


def main():
    print(json.dumps({"hello": True}))
"#;

#[test]
fn help_flag_works() {
  let home = TempDir::new().unwrap();
  scriptbox_cmd(&home)
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn list_empty_library() {
  let home = TempDir::new().unwrap();
  scriptbox_cmd(&home)
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("no scripts"));
}

#[test]
fn add_then_list_shows_script() {
  let home = TempDir::new().unwrap();
  let src = TempDir::new().unwrap();
  let path = write_script(&src, "hello world.py", HELLO_SCRIPT);

  scriptbox_cmd(&home)
    .args(["add", path.to_str().unwrap()])
    .assert()
    .success()
    .stdout(predicate::str::contains("added 'hello-world'"));

  scriptbox_cmd(&home)
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("hello-world"))
    .stdout(predicate::str::contains("Say hello."));
}

#[test]
fn add_infers_non_stdlib_dependencies() {
  let home = TempDir::new().unwrap();
  let src = TempDir::new().unwrap();
  let path = write_script(&src, "hello.py", HELLO_SCRIPT);

  scriptbox_cmd(&home)
    .args(["add", path.to_str().unwrap()])
    .assert()
    .success();

  // json is stdlib and must be filtered; requests stays, unpinned.
  let manifest = std::fs::read_to_string(home.path().join("manifests/hello.json")).unwrap();
  assert!(manifest.contains("requests"));
  assert!(!manifest.contains("\"json\""));
}

#[test]
fn add_duplicate_fails() {
  let home = TempDir::new().unwrap();
  let src = TempDir::new().unwrap();
  let path = write_script(&src, "hello.py", HELLO_SCRIPT);

  scriptbox_cmd(&home)
    .args(["add", path.to_str().unwrap()])
    .assert()
    .success();
  scriptbox_cmd(&home)
    .args(["add", path.to_str().unwrap()])
    .assert()
    .failure()
    .stderr(predicate::str::contains("already exists"));
}

#[test]
fn add_rejects_non_python_file() {
  let home = TempDir::new().unwrap();
  let src = TempDir::new().unwrap();
  let path = write_script(&src, "notes.txt", "just text");

  scriptbox_cmd(&home)
    .args(["add", path.to_str().unwrap()])
    .assert()
    .failure()
    .stderr(predicate::str::contains("not a Python script"));
}

#[test]
fn add_with_explicit_deps() {
  let home = TempDir::new().unwrap();
  let src = TempDir::new().unwrap();
  let path = write_script(&src, "pinned.py", "print('hi')\n");

  scriptbox_cmd(&home)
    .args(["add", path.to_str().unwrap(), "-p", "requests=2.31 rich"])
    .assert()
    .success()
    .stdout(predicate::str::contains("2 dependencies"));

  let manifest = std::fs::read_to_string(home.path().join("manifests/pinned.json")).unwrap();
  assert!(manifest.contains("\"2.31\""));
  assert!(manifest.contains("rich"));
}

#[test]
fn run_missing_script_fails() {
  let home = TempDir::new().unwrap();
  scriptbox_cmd(&home)
    .args(["run", "ghost"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("not found"));
}

#[test]
fn remove_nonexistent_warns_but_succeeds() {
  let home = TempDir::new().unwrap();
  scriptbox_cmd(&home)
    .args(["remove", "ghost", "-y"])
    .assert()
    .success()
    .stderr(predicate::str::contains("no manifest"));
}

#[test]
fn remove_rejects_conflicting_flags() {
  let home = TempDir::new().unwrap();
  scriptbox_cmd(&home)
    .args(["remove", "ghost", "--manifest", "--venv", "-y"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("mutually exclusive"));
}

#[test]
fn remove_full_deletes_script_and_manifest() {
  let home = TempDir::new().unwrap();
  let src = TempDir::new().unwrap();
  let path = write_script(&src, "hello.py", HELLO_SCRIPT);

  scriptbox_cmd(&home)
    .args(["add", path.to_str().unwrap()])
    .assert()
    .success();
  scriptbox_cmd(&home)
    .args(["remove", "hello", "-y"])
    .assert()
    .success();

  assert!(!home.path().join("scripts/hello.py").exists());
  assert!(!home.path().join("manifests/hello.json").exists());
}

#[test]
fn clean_empty_library_is_noop() {
  let home = TempDir::new().unwrap();
  scriptbox_cmd(&home)
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("nothing to clean"));
}

#[test]
fn clean_sweeps_orphaned_manifest() {
  let home = TempDir::new().unwrap();
  std::fs::create_dir_all(home.path().join("manifests")).unwrap();
  std::fs::write(
    home.path().join("manifests/ghost.json"),
    r#"{"name": "ghost", "description": "", "dependencies": [], "type": "custom"}"#,
  )
  .unwrap();

  scriptbox_cmd(&home)
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("ghost"));
  assert!(!home.path().join("manifests/ghost.json").exists());
}

#[test]
fn download_without_arguments_fails() {
  let home = TempDir::new().unwrap();
  scriptbox_cmd(&home)
    .arg("download")
    .assert()
    .failure()
    .stderr(predicate::str::contains("nothing to download"));
}

#[test]
fn update_without_arguments_fails() {
  let home = TempDir::new().unwrap();
  scriptbox_cmd(&home)
    .arg("update")
    .assert()
    .failure()
    .stderr(predicate::str::contains("--all"));
}

#[test]
fn update_all_with_empty_library_succeeds() {
  let home = TempDir::new().unwrap();
  // No standard scripts recorded, so no registry traffic happens.
  scriptbox_cmd(&home)
    .env("SCRIPTBOX_REGISTRY", "http://127.0.0.1:9")
    .args(["update", "--all"])
    .assert()
    .success()
    .stdout(predicate::str::contains("0 updated"));
}

#[test]
fn update_custom_script_asks_before_registry_replace() {
  let home = TempDir::new().unwrap();
  let src = TempDir::new().unwrap();
  let path = write_script(&src, "hello.py", HELLO_SCRIPT);

  scriptbox_cmd(&home)
    .args(["add", path.to_str().unwrap()])
    .assert()
    .success();
  // Replacing a custom script needs confirmation, which a pipeline cannot
  // give without --yes.
  scriptbox_cmd(&home)
    .args(["update", "hello"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--yes"));
}

#[test]
fn update_custom_script_with_yes_consults_the_registry() {
  let home = TempDir::new().unwrap();
  let src = TempDir::new().unwrap();
  let path = write_script(&src, "hello.py", HELLO_SCRIPT);

  scriptbox_cmd(&home)
    .args(["add", path.to_str().unwrap()])
    .assert()
    .success();
  scriptbox_cmd(&home)
    .env("SCRIPTBOX_REGISTRY", "http://127.0.0.1:9")
    .args(["update", "hello", "-y"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("not found on the registry"));
}

#[test]
fn update_with_new_source_rewrites_manifest() {
  let home = TempDir::new().unwrap();
  let src = TempDir::new().unwrap();
  let path = write_script(&src, "hello.py", HELLO_SCRIPT);

  scriptbox_cmd(&home)
    .args(["add", path.to_str().unwrap()])
    .assert()
    .success();

  let replacement = write_script(&src, "hello2.py", "import rich\nprint('hi')\n");
  scriptbox_cmd(&home)
    .args(["update", "hello", "-p", replacement.to_str().unwrap()])
    .assert()
    .success()
    .stdout(predicate::str::contains("replaced source"));

  let manifest = std::fs::read_to_string(home.path().join("manifests/hello.json")).unwrap();
  assert!(manifest.contains("rich"));
  assert!(!manifest.contains("requests"));
}
