//! Script execution as a child process.
//!
//! Scripts are never loaded in-process: running one means spawning the
//! reconciled interpreter on the source file with inherited stdio and
//! reporting its exit code. Unlike installer calls, no timeout applies —
//! running the user's script for as long as it wants is the whole point.

use std::path::Path;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::reconcile::EnvHandle;

/// Errors from launching a script.
#[derive(Debug, Error)]
pub enum ExecError {
  #[error("failed to launch '{script}': {source}")]
  Spawn {
    script: String,
    #[source]
    source: std::io::Error,
  },
}

/// Run a script under the given environment handle.
///
/// Returns the child's exit code; a termination without a code (signal) is
/// reported as 1.
///
/// # Errors
///
/// `ExecError::Spawn` if the interpreter cannot be started.
pub async fn run_script(handle: &EnvHandle, script_path: &Path, args: &[String]) -> Result<i32, ExecError> {
  debug!(
    interpreter = %handle.interpreter.display(),
    script = %script_path.display(),
    isolated = handle.is_isolated(),
    "launching script"
  );

  let status = Command::new(&handle.interpreter)
    .arg(script_path)
    .args(args)
    .status()
    .await
    .map_err(|source| ExecError::Spawn {
      script: script_path.display().to_string(),
      source,
    })?;

  Ok(status.code().unwrap_or(1))
}
