//! Virtual-environment lifecycle: create, destroy.
//!
//! Environments move between `Absent` and `Ready` only through these two
//! operations; recreation on corruption is destroy followed by a full
//! reconciliation, orchestrated by the engine, never here.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use scriptbox_platform::{Paths, PlatformError, host_interpreter};

/// Bound on `python -m venv`.
const CREATE_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors from environment lifecycle operations.
#[derive(Debug, Error)]
pub enum VenvError {
  /// The environment-creation tool exited non-zero.
  #[error("failed to create virtual environment for '{script}': {diagnostic}")]
  CreateFailed { script: String, diagnostic: String },

  /// Environment creation exceeded its time bound.
  #[error("virtual environment creation for '{script}' timed out")]
  CreateTimeout { script: String },

  /// No environment exists to destroy.
  #[error("no virtual environment found for '{script}'")]
  NotFound { script: String },

  /// The host interpreter needed to create environments is unavailable.
  #[error(transparent)]
  Platform(#[from] PlatformError),

  #[error("virtual environment I/O error: {0}")]
  Io(#[from] std::io::Error),
}

/// Creates and destroys per-script virtual environments.
#[derive(Debug, Clone)]
pub struct VenvManager {
  venvs_dir: PathBuf,
}

impl VenvManager {
  pub fn new(paths: &Paths) -> Self {
    Self {
      venvs_dir: paths.venvs_dir(),
    }
  }

  /// Directory of the script's virtual environment.
  pub fn env_path(&self, script: &str) -> PathBuf {
    self.venvs_dir.join(script)
  }

  /// Create the script's environment if it does not exist yet.
  ///
  /// Idempotent: an existing environment is returned as-is without touching
  /// the filesystem beyond the existence check.
  ///
  /// # Errors
  ///
  /// `VenvError::CreateFailed` if the creation tool exits non-zero,
  /// `CreateTimeout` if it exceeds its bound, `Platform` if no host
  /// interpreter is available.
  pub async fn create(&self, script: &str) -> Result<PathBuf, VenvError> {
    let env = self.env_path(script);
    if env.is_dir() {
      debug!(script, "virtual environment already present");
      return Ok(env);
    }

    let python = host_interpreter()?;
    info!(script, env = %env.display(), "creating virtual environment");

    let output = Command::new(&python)
      .arg("-m")
      .arg("venv")
      .arg(&env)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .output();

    let output = tokio::time::timeout(CREATE_TIMEOUT, output)
      .await
      .map_err(|_| VenvError::CreateTimeout {
        script: script.to_string(),
      })??;

    if !output.status.success() {
      return Err(VenvError::CreateFailed {
        script: script.to_string(),
        diagnostic: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }

    Ok(env)
  }

  /// Destroy the script's environment.
  ///
  /// # Errors
  ///
  /// `VenvError::NotFound` if there is nothing to destroy. Callers
  /// distinguish that from a real failure.
  pub async fn destroy(&self, script: &str) -> Result<(), VenvError> {
    let env = self.env_path(script);
    if !env.is_dir() {
      return Err(VenvError::NotFound {
        script: script.to_string(),
      });
    }
    info!(script, env = %env.display(), "removing virtual environment");
    tokio::fs::remove_dir_all(&env).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn manager() -> (TempDir, VenvManager) {
    let temp = TempDir::new().unwrap();
    let paths = Paths::new(temp.path());
    paths.init().unwrap();
    let venvs = VenvManager::new(&paths);
    (temp, venvs)
  }

  #[tokio::test]
  async fn destroy_missing_is_not_found() {
    let (_temp, venvs) = manager();
    assert!(matches!(
      venvs.destroy("demo").await,
      Err(VenvError::NotFound { .. })
    ));
  }

  #[tokio::test]
  async fn destroy_removes_the_directory() {
    let (temp, venvs) = manager();
    let env = temp.path().join("venvs/demo");
    std::fs::create_dir_all(env.join("bin")).unwrap();
    venvs.destroy("demo").await.unwrap();
    assert!(!env.exists());
  }

  #[tokio::test]
  async fn create_is_a_no_op_when_present() {
    let (temp, venvs) = manager();
    // A pre-existing directory short-circuits before any tool invocation,
    // so this passes even on hosts without Python.
    let env = temp.path().join("venvs/demo");
    std::fs::create_dir_all(&env).unwrap();
    assert_eq!(venvs.create("demo").await.unwrap(), env);
  }
}
