//! Implementation of the `scriptbox remove` command.
//!
//! Removes a whole script, or just its manifest, environment, or individual
//! dependencies depending on the flags.

use anyhow::{Context, Result, bail};

use scriptbox_core::{ManifestStore, Reconciler, ScriptStore, StoreError, VenvError};
use scriptbox_core::script::normalize_name;
use scriptbox_platform::Paths;

use crate::output;
use crate::prompts;

/// Execute the remove command.
pub fn cmd_remove(
  paths: &Paths,
  script: &str,
  manifest_only: bool,
  venv_only: bool,
  deps: Option<&str>,
  yes: bool,
) -> Result<()> {
  let name = normalize_name(script);
  let selected = [manifest_only, venv_only, deps.is_some()]
    .iter()
    .filter(|f| **f)
    .count();
  if selected > 1 {
    bail!("--manifest, --venv and --deps are mutually exclusive");
  }

  let scripts = ScriptStore::new(paths);
  let manifests = ManifestStore::new(paths);
  let reconciler = Reconciler::new(paths);

  if let Some(deps) = deps {
    return remove_deps(&name, deps, &manifests, &reconciler, yes);
  }

  let what = if manifest_only {
    "manifest"
  } else if venv_only {
    "virtual environment"
  } else {
    "script, manifest and virtual environment"
  };
  if !prompts::confirm(&format!("Remove the {} of '{}'?", what, name), yes)? {
    output::print_info("aborted");
    return Ok(());
  }

  if manifest_only || !venv_only {
    match manifests.delete(&name) {
      Ok(()) => output::print_success(&format!("removed manifest of '{}'", name)),
      Err(StoreError::NotFound { .. }) => {
        output::print_warning(&format!("'{}' has no manifest", name));
      }
      Err(err) => return Err(err.into()),
    }
  }

  if venv_only || !manifest_only {
    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
    match rt.block_on(reconciler.destroy(&name)) {
      Ok(()) => output::print_success(&format!("removed virtual environment of '{}'", name)),
      Err(VenvError::NotFound { .. }) => {
        output::print_warning(&format!("'{}' has no virtual environment", name));
      }
      Err(err) => return Err(err.into()),
    }
  }

  if !manifest_only && !venv_only {
    match scripts.delete(&name) {
      Ok(()) => output::print_success(&format!("removed script '{}'", name)),
      Err(StoreError::NotFound { .. }) => {
        output::print_warning(&format!("no script file for '{}'", name));
      }
      Err(err) => return Err(err.into()),
    }
  }

  Ok(())
}

/// Uninstall specific packages from the script's environment and drop them
/// from the manifest.
fn remove_deps(
  name: &str,
  deps: &str,
  manifests: &ManifestStore,
  reconciler: &Reconciler,
  yes: bool,
) -> Result<()> {
  let packages: Vec<String> = deps.split_whitespace().map(str::to_string).collect();
  if packages.is_empty() {
    bail!("--deps given but no package names found");
  }

  let mut manifest = manifests.load(name)?;
  let message = format!("Uninstall {} package(s) from '{}'?", packages.len(), name);
  if !prompts::confirm(&message, yes)? {
    output::print_info("aborted");
    return Ok(());
  }

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(reconciler.remove_dependencies(name, &packages))?;

  for package in &report.removed {
    output::print_success(&format!("uninstalled '{}'", package));
  }
  for package in &report.already_absent {
    output::print_warning(&format!("'{}' was not installed", package));
  }

  manifest.dependencies.retain(|d| !packages.contains(&d.package));
  manifests.save(name, &manifest, true)?;
  Ok(())
}
