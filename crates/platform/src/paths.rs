//! On-disk layout of the script library.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::PlatformError;

/// Environment variable overriding the library base directory.
///
/// Used by the test suite to isolate every test in its own temp directory.
pub const HOME_ENV: &str = "SCRIPTBOX_HOME";

/// Directory name of the library when rooted in the user's home.
const DEFAULT_DIR_NAME: &str = ".scriptbox";

/// The filesystem layout of the script library.
///
/// Holds the base directory and derives the scripts, manifests, and venvs
/// directories from it. Constructed once at process start and passed to the
/// store and engine constructors, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Paths {
  base: PathBuf,
}

impl Paths {
  /// Create a layout rooted at an explicit base directory.
  pub fn new(base: impl Into<PathBuf>) -> Self {
    Self { base: base.into() }
  }

  /// Resolve the layout from the environment.
  ///
  /// `SCRIPTBOX_HOME` wins if set; otherwise the library lives in
  /// `~/.scriptbox`.
  ///
  /// # Errors
  ///
  /// Returns `PlatformError::HomeDirUnavailable` if no override is set and
  /// the home directory cannot be determined.
  pub fn from_env() -> Result<Self, PlatformError> {
    if let Ok(base) = std::env::var(HOME_ENV) {
      debug!(base = %base, "using library base from {HOME_ENV}");
      return Ok(Self::new(base));
    }
    let home = dirs::home_dir().ok_or(PlatformError::HomeDirUnavailable)?;
    Ok(Self::new(home.join(DEFAULT_DIR_NAME)))
  }

  /// Base directory of the library.
  pub fn base(&self) -> &Path {
    &self.base
  }

  /// Directory holding the script source files.
  pub fn scripts_dir(&self) -> PathBuf {
    self.base.join("scripts")
  }

  /// Directory holding one manifest JSON record per script.
  pub fn manifests_dir(&self) -> PathBuf {
    self.base.join("manifests")
  }

  /// Directory holding one virtual environment per script.
  pub fn venvs_dir(&self) -> PathBuf {
    self.base.join("venvs")
  }

  /// Create the library directories if they do not exist yet.
  ///
  /// # Errors
  ///
  /// Returns `PlatformError::Init` if a directory cannot be created.
  pub fn init(&self) -> Result<(), PlatformError> {
    for dir in [
      self.base.clone(),
      self.scripts_dir(),
      self.manifests_dir(),
      self.venvs_dir(),
    ] {
      fs::create_dir_all(&dir).map_err(|source| PlatformError::Init {
        path: dir.display().to_string(),
        source,
      })?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn derives_layout_from_base() {
    let paths = Paths::new("/tmp/sb");
    assert_eq!(paths.scripts_dir(), PathBuf::from("/tmp/sb/scripts"));
    assert_eq!(paths.manifests_dir(), PathBuf::from("/tmp/sb/manifests"));
    assert_eq!(paths.venvs_dir(), PathBuf::from("/tmp/sb/venvs"));
  }

  #[test]
  fn init_creates_all_directories() {
    let temp = TempDir::new().unwrap();
    let paths = Paths::new(temp.path().join("lib"));
    paths.init().unwrap();

    assert!(paths.scripts_dir().is_dir());
    assert!(paths.manifests_dir().is_dir());
    assert!(paths.venvs_dir().is_dir());
  }

  #[test]
  fn init_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let paths = Paths::new(temp.path().join("lib"));
    paths.init().unwrap();
    paths.init().unwrap();
  }
}
