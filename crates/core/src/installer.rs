//! Installer gateway: pip invocations against a script's environment.
//!
//! Install and upgrade are the same operation — pip is idempotent and treats
//! a version-changing install as an upgrade. A missing pip executable is the
//! corruption signal the reconciliation engine keys its recreate path on,
//! not a permanent failure, so it gets its own variant.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use scriptbox_platform::{Paths, venv_pip};

use crate::manifest::Dependency;

/// Bound on a single pip invocation.
const PIP_TIMEOUT: Duration = Duration::from_secs(600);

/// Errors from pip invocations.
#[derive(Debug, Error)]
pub enum InstallError {
  /// The pip executable is absent from the environment. Treated by the
  /// engine as environment corruption, not as a package failure.
  #[error("pip executable missing from the environment of '{script}'")]
  PipMissing { script: String },

  /// pip exited non-zero; `diagnostic` is its captured stderr, verbatim.
  #[error("failed to {action} '{package}': {diagnostic}")]
  PackageFailed {
    action: &'static str,
    package: String,
    diagnostic: String,
  },

  /// The pip invocation exceeded its time bound.
  #[error("pip timed out while processing '{package}'")]
  Timeout { package: String },

  #[error("failed to run pip: {0}")]
  Io(#[from] std::io::Error),
}

/// Invokes pip inside a script's virtual environment.
#[derive(Debug, Clone)]
pub struct PipGateway {
  venvs_dir: PathBuf,
}

impl PipGateway {
  pub fn new(paths: &Paths) -> Self {
    Self {
      venvs_dir: paths.venvs_dir(),
    }
  }

  fn pip_path(&self, script: &str) -> Result<PathBuf, InstallError> {
    let pip = venv_pip(&self.venvs_dir.join(script));
    if pip.is_file() {
      Ok(pip)
    } else {
      Err(InstallError::PipMissing {
        script: script.to_string(),
      })
    }
  }

  /// Install (or upgrade to) the declared version of a dependency.
  ///
  /// # Errors
  ///
  /// `PipMissing` when the installer executable is absent, `PackageFailed`
  /// with pip's stderr on a non-zero exit, `Timeout` past the bound.
  pub async fn install(&self, script: &str, dep: &Dependency) -> Result<(), InstallError> {
    let pip = self.pip_path(script)?;
    let requirement = dep.requirement();
    info!(script, requirement = %requirement, "installing");
    self
      .run_pip(&pip, &["install", &requirement], "install", &dep.package)
      .await
  }

  /// Uninstall a package from the environment.
  ///
  /// # Errors
  ///
  /// Same failures as [`PipGateway::install`].
  pub async fn uninstall(&self, script: &str, package: &str) -> Result<(), InstallError> {
    let pip = self.pip_path(script)?;
    info!(script, package, "uninstalling");
    self
      .run_pip(&pip, &["uninstall", "-y", package], "uninstall", package)
      .await
  }

  async fn run_pip(
    &self,
    pip: &PathBuf,
    args: &[&str],
    action: &'static str,
    package: &str,
  ) -> Result<(), InstallError> {
    let output = Command::new(pip)
      .args(args)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .output();

    let output = tokio::time::timeout(PIP_TIMEOUT, output)
      .await
      .map_err(|_| InstallError::Timeout {
        package: package.to_string(),
      })??;

    if !output.status.success() {
      return Err(InstallError::PackageFailed {
        action,
        package: package.to_string(),
        diagnostic: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }
    debug!(package, action, "pip succeeded");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[tokio::test]
  async fn missing_pip_is_the_corruption_signal() {
    let temp = TempDir::new().unwrap();
    let paths = Paths::new(temp.path());
    paths.init().unwrap();
    // Environment directory exists, pip does not.
    std::fs::create_dir_all(temp.path().join("venvs/demo/bin")).unwrap();

    let pip = PipGateway::new(&paths);
    let dep = Dependency::new("requests", "");
    assert!(matches!(
      pip.install("demo", &dep).await,
      Err(InstallError::PipMissing { .. })
    ));
    assert!(matches!(
      pip.uninstall("demo", "requests").await,
      Err(InstallError::PipMissing { .. })
    ));
  }
}
