//! Implementation of the `scriptbox clean` command.
//!
//! Sweeps manifests and virtual environments whose script is gone.

use anyhow::Result;

use scriptbox_core::clean;
use scriptbox_platform::Paths;

use crate::output;

/// Execute the clean command.
pub fn cmd_clean(paths: &Paths) -> Result<()> {
  let report = clean::clean(paths)?;
  if report.is_empty() {
    output::print_info("nothing to clean");
    return Ok(());
  }

  for name in &report.manifests_removed {
    output::print_success(&format!("removed orphaned manifest '{}'", name));
  }
  for name in &report.venvs_removed {
    output::print_success(&format!("removed orphaned environment '{}'", name));
  }
  output::print_info(&format!(
    "{} manifest(s), {} environment(s) cleaned",
    report.manifests_removed.len(),
    report.venvs_removed.len()
  ));
  Ok(())
}
