//! Error types for scriptbox-platform.

use thiserror::Error;

/// Errors that can occur while resolving the host environment.
#[derive(Debug, Error)]
pub enum PlatformError {
  /// No usable Python interpreter was found on the host `PATH`.
  #[error("no Python interpreter found on PATH (looked for {tried})")]
  PythonNotFound {
    /// Comma-separated list of executable names that were tried.
    tried: String,
  },

  /// The user's home directory could not be determined.
  #[error("unable to determine the user home directory")]
  HomeDirUnavailable,

  /// Failed to create one of the library directories.
  #[error("failed to initialize '{path}': {source}")]
  Init {
    path: String,
    #[source]
    source: std::io::Error,
  },
}
