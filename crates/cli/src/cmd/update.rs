//! Implementation of the `scriptbox update` command.
//!
//! Standard scripts refresh against the registry; custom scripts update from
//! a local replacement file. `--all` walks every standard script.

use std::path::Path;

use anyhow::{Context, Result, bail};

use scriptbox_core::{
  Manifest, ManifestStore, Provenance, RegistryClient, ScriptStore, UpdateOutcome, Updater,
};
use scriptbox_core::script::normalize_name;
use scriptbox_platform::Paths;

use crate::output;
use crate::prompts;

/// Execute the update command.
pub fn cmd_update(
  paths: &Paths,
  script: Option<&str>,
  source_path: Option<&Path>,
  manifest_path: Option<&Path>,
  all: bool,
  yes: bool,
) -> Result<()> {
  if all {
    if script.is_some() || source_path.is_some() || manifest_path.is_some() {
      bail!("--all takes no other arguments");
    }
    return update_all(paths);
  }

  let Some(script) = script else {
    bail!("name a script to update, or pass --all");
  };
  let name = normalize_name(script);

  let scripts = ScriptStore::new(paths);
  let manifests = ManifestStore::new(paths);

  if source_path.is_some() || manifest_path.is_some() {
    return update_local(&name, source_path, manifest_path, &scripts, &manifests);
  }

  let manifest = manifests.load(&name)?;
  if manifest.provenance == Provenance::Custom {
    // A registry update would overwrite the user's own version of the
    // script, so it needs an explicit go-ahead.
    let message = format!("'{}' is a custom script; replace it with the registry version?", name);
    if !prompts::confirm(&message, yes)? {
      output::print_info(&format!(
        "keeping the local version; use --path and/or --manifest to update '{}' from local files",
        name
      ));
      return Ok(());
    }
  }

  let registry = RegistryClient::new();
  let updater = Updater::new(&registry, &scripts, &manifests);
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  match rt.block_on(updater.refresh(&name))? {
    UpdateOutcome::UpToDate => output::print_info(&format!("'{}' is already up to date", name)),
    UpdateOutcome::Updated { old, new } => output::print_success(&format!(
      "updated '{}' ({} {} {})",
      name,
      old.unwrap_or_else(|| "?".to_string()),
      output::symbols::ARROW,
      new.unwrap_or_else(|| "?".to_string()),
    )),
  }
  Ok(())
}

/// Replace a script's source and/or manifest from local files.
fn update_local(
  name: &str,
  source_path: Option<&Path>,
  manifest_path: Option<&Path>,
  scripts: &ScriptStore,
  manifests: &ManifestStore,
) -> Result<()> {
  if !scripts.exists(name) && !manifests.exists(name) {
    bail!("script '{}' not found", name);
  }

  if let Some(path) = source_path {
    let source = std::fs::read_to_string(path)
      .with_context(|| format!("failed to read '{}'", path.display()))?;
    scripts.write(name, &source)?;
    if manifest_path.is_none() {
      // No explicit manifest: re-derive dependencies from the new source but
      // keep the recorded description if there is one.
      let mut manifest = Manifest::from_source(name.to_string(), &source);
      if let Ok(existing) = manifests.load(name) {
        if !existing.description.is_empty() {
          manifest.description = existing.description;
        }
      }
      manifests.save(name, &manifest, true)?;
    }
    output::print_success(&format!("replaced source of '{}'", name));
  }

  if let Some(path) = manifest_path {
    let mut manifest = ManifestStore::load_from_path(path)?;
    manifest.name = name.to_string();
    manifests.save(name, &manifest, true)?;
    output::print_success(&format!("replaced manifest of '{}'", name));
  }

  Ok(())
}

/// Refresh every standard script from the registry.
fn update_all(paths: &Paths) -> Result<()> {
  let scripts = ScriptStore::new(paths);
  let manifests = ManifestStore::new(paths);
  let registry = RegistryClient::new();
  let updater = Updater::new(&registry, &scripts, &manifests);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let summary = rt.block_on(updater.refresh_all());

  for name in &summary.updated {
    output::print_success(&format!("updated '{}'", name));
  }
  for (name, reason) in &summary.skipped {
    output::print_warning(&format!("skipped '{}': {}", name, reason));
  }
  output::print_info(&format!(
    "{} updated, {} up to date, {} skipped",
    summary.updated.len(),
    summary.up_to_date.len(),
    summary.skipped.len()
  ));
  Ok(())
}
