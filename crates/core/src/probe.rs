//! Environment probing: what is actually installed on disk.
//!
//! All probe results are observations, never faults. A missing interpreter, a
//! package that cannot be queried, or a timed-out query all turn into
//! "absent/unknown" rather than an error: absence of information is a valid,
//! expected result that the reconciliation engine classifies, not a failure
//! it propagates.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, trace};

use scriptbox_platform::{Paths, venv_interpreter};

/// Bound on a single installed-version query.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only inspection of a script's virtual environment.
#[derive(Debug, Clone)]
pub struct EnvProbe {
  venvs_dir: PathBuf,
}

impl EnvProbe {
  pub fn new(paths: &Paths) -> Self {
    Self {
      venvs_dir: paths.venvs_dir(),
    }
  }

  /// Directory of the script's virtual environment.
  pub fn env_path(&self, script: &str) -> PathBuf {
    self.venvs_dir.join(script)
  }

  /// Whether the environment directory exists.
  pub fn exists(&self, script: &str) -> bool {
    self.env_path(script).is_dir()
  }

  /// Path of the environment's interpreter. Derived, not checked.
  pub fn interpreter_path(&self, script: &str) -> PathBuf {
    venv_interpreter(&self.env_path(script))
  }

  /// Version of a package installed in the environment, if determinable.
  ///
  /// Executes the environment's own interpreter to query the installed
  /// package metadata. Returns `None` on any failure: missing interpreter,
  /// package not installed, query timeout.
  pub async fn installed_version(&self, script: &str, package: &str) -> Option<String> {
    let interpreter = self.interpreter_path(script);
    if !interpreter.is_file() {
      trace!(script, package, "no interpreter to probe with");
      return None;
    }

    // The package name travels as an argument, never inside the code string.
    const QUERY: &str =
      "import importlib.metadata, sys; print(importlib.metadata.version(sys.argv[1]))";
    let output = Command::new(&interpreter)
      .args(["-c", QUERY, package])
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .output();

    let output = match tokio::time::timeout(PROBE_TIMEOUT, output).await {
      Ok(Ok(output)) => output,
      Ok(Err(err)) => {
        debug!(script, package, error = %err, "version probe failed to run");
        return None;
      }
      Err(_) => {
        debug!(script, package, "version probe timed out");
        return None;
      }
    };

    if !output.status.success() {
      trace!(script, package, "package not importable");
      return None;
    }

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if version.is_empty() {
      return None;
    }
    debug!(script, package, version = %version, "probed installed version");
    Some(version)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn probe() -> (TempDir, EnvProbe) {
    let temp = TempDir::new().unwrap();
    let paths = Paths::new(temp.path());
    paths.init().unwrap();
    let probe = EnvProbe::new(&paths);
    (temp, probe)
  }

  #[test]
  fn absent_environment_does_not_exist() {
    let (_temp, probe) = probe();
    assert!(!probe.exists("demo"));
  }

  #[test]
  fn env_path_is_named_after_the_script() {
    let (temp, probe) = probe();
    assert_eq!(probe.env_path("demo"), temp.path().join("venvs/demo"));
  }

  #[tokio::test]
  async fn missing_interpreter_reports_unknown() {
    let (temp, probe) = probe();
    // Environment directory exists but holds no interpreter.
    std::fs::create_dir_all(temp.path().join("venvs/demo")).unwrap();
    assert!(probe.exists("demo"));
    assert_eq!(probe.installed_version("demo", "requests").await, None);
  }
}
