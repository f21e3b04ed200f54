//! Host Python discovery and virtual-environment executable layout.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::PlatformError;

/// Executable names probed on the host `PATH`, in order of preference.
#[cfg(not(windows))]
const INTERPRETER_NAMES: &[&str] = &["python3", "python"];

/// Executable names probed on the host `PATH`, in order of preference.
#[cfg(windows)]
const INTERPRETER_NAMES: &[&str] = &["python", "python3"];

/// Locate the host Python interpreter.
///
/// Scripts without third-party dependencies run directly on this interpreter,
/// and it is the one used to create virtual environments.
///
/// # Errors
///
/// Returns `PlatformError::PythonNotFound` if none of the candidate names
/// resolve on `PATH`.
pub fn host_interpreter() -> Result<PathBuf, PlatformError> {
  for name in INTERPRETER_NAMES {
    if let Ok(path) = which::which(name) {
      debug!(interpreter = %path.display(), "resolved host interpreter");
      return Ok(path);
    }
  }
  Err(PlatformError::PythonNotFound {
    tried: INTERPRETER_NAMES.join(", "),
  })
}

/// Executable directory of a virtual environment.
pub fn venv_bin_dir(env: &Path) -> PathBuf {
  if cfg!(windows) {
    env.join("Scripts")
  } else {
    env.join("bin")
  }
}

/// Path of the Python interpreter inside a virtual environment.
///
/// The path is derived, not checked: the file may not exist.
pub fn venv_interpreter(env: &Path) -> PathBuf {
  venv_bin_dir(env).join(exe("python"))
}

/// Path of the pip executable inside a virtual environment.
///
/// The path is derived, not checked: the file may not exist.
pub fn venv_pip(env: &Path) -> PathBuf {
  venv_bin_dir(env).join(exe("pip"))
}

fn exe(name: &str) -> String {
  if cfg!(windows) {
    format!("{name}.exe")
  } else {
    name.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  #[cfg(not(windows))]
  fn venv_executables_live_under_bin() {
    let env = Path::new("/venvs/demo");
    assert_eq!(venv_interpreter(env), PathBuf::from("/venvs/demo/bin/python"));
    assert_eq!(venv_pip(env), PathBuf::from("/venvs/demo/bin/pip"));
  }

  #[test]
  #[cfg(windows)]
  fn venv_executables_live_under_scripts() {
    let env = Path::new(r"C:\venvs\demo");
    assert!(venv_interpreter(env).ends_with(r"Scripts\python.exe"));
    assert!(venv_pip(env).ends_with(r"Scripts\pip.exe"));
  }
}
