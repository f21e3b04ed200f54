//! scriptbox-platform: filesystem layout and host interpreter discovery.
//!
//! Everything here is decided once at process start and treated as immutable
//! afterwards: where the script library lives on disk, and which Python
//! interpreter the host provides.

mod error;
mod paths;
mod python;

pub use error::PlatformError;
pub use paths::Paths;
pub use python::{host_interpreter, venv_bin_dir, venv_interpreter, venv_pip};
