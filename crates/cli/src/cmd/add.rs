//! Implementation of the `scriptbox add` command.
//!
//! Copies a local Python script into the library and records its manifest.
//! The manifest comes from an explicit JSON file, from the --description and
//! --deps flags, or from static inspection of the source, in that order.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;

use scriptbox_core::{Dependency, Manifest, ManifestStore, ScriptStore};
use scriptbox_core::script::normalize_name;
use scriptbox_platform::Paths;

use crate::output;

/// Execute the add command.
pub fn cmd_add(
  paths: &Paths,
  script_path: &Path,
  manifest_path: Option<&Path>,
  description: Option<String>,
  deps: Option<&str>,
) -> Result<()> {
  if script_path.extension().and_then(|e| e.to_str()) != Some("py") {
    bail!("'{}' is not a Python script (.py)", script_path.display());
  }
  if !script_path.is_file() {
    bail!("script file '{}' does not exist", script_path.display());
  }

  let stem = script_path
    .file_stem()
    .and_then(|s| s.to_str())
    .context("script file has no usable name")?;
  let name = normalize_name(stem);

  let scripts = ScriptStore::new(paths);
  let manifests = ManifestStore::new(paths);
  if scripts.exists(&name) || manifests.exists(&name) {
    bail!("script '{}' already exists; remove it first or pick another name", name);
  }

  let source = fs::read_to_string(script_path)
    .with_context(|| format!("failed to read '{}'", script_path.display()))?;

  let manifest = if let Some(path) = manifest_path {
    let mut manifest = ManifestStore::load_from_path(path)?;
    manifest.name = name.clone();
    manifest
  } else if description.is_some() || deps.is_some() {
    let dependencies = deps.map(parse_deps).transpose()?.unwrap_or_default();
    Manifest::new(name.clone(), description.unwrap_or_default(), dependencies)?
  } else {
    debug!(script = %name, "no manifest given, inspecting source");
    Manifest::from_source(name.clone(), &source)
  };

  scripts.write(&name, &source)?;
  if let Err(err) = manifests.save(&name, &manifest, false) {
    // Keep the store consistent: no manifest, no script.
    let _ = scripts.delete(&name);
    return Err(err.into());
  }

  output::print_success(&format!(
    "added '{}' with {} dependencies",
    name,
    manifest.dependencies.len()
  ));
  Ok(())
}

/// Parse a "pkg=version pkg2" list into dependencies. A bare package name is
/// unpinned.
fn parse_deps(raw: &str) -> Result<Vec<Dependency>> {
  raw
    .split_whitespace()
    .map(|spec| match spec.split_once('=') {
      Some((package, version)) => {
        if package.is_empty() {
          bail!("dependency spec '{}' has an empty package name", spec);
        }
        Ok(Dependency::new(package, version))
      }
      None => Ok(Dependency::new(spec, "")),
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_deps_handles_pinned_and_unpinned() {
    let deps = parse_deps("requests=2.31 rich").unwrap();
    assert_eq!(deps.len(), 2);
    assert_eq!(deps[0], Dependency::new("requests", "2.31"));
    assert_eq!(deps[1], Dependency::new("rich", ""));
  }

  #[test]
  fn parse_deps_rejects_empty_package() {
    assert!(parse_deps("=1.0").is_err());
  }
}
