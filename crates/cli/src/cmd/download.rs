//! Implementation of the `scriptbox download` command.
//!
//! Fetches scripts from the remote registry, manifest first so a failed
//! source fetch never leaves a manifest without a script behind.

use anyhow::{Context, Result, bail};
use tracing::warn;

use scriptbox_core::{ManifestStore, RegistryClient, ScriptStore};
use scriptbox_core::script::normalize_name;
use scriptbox_platform::Paths;

use crate::output;
use crate::prompts;

/// Execute the download command.
pub fn cmd_download(paths: &Paths, scripts: &[String], category: Option<&str>, yes: bool) -> Result<()> {
  if scripts.is_empty() && category.is_none() {
    bail!("nothing to download; name one or more scripts or pass --category");
  }
  if !scripts.is_empty() && category.is_some() {
    bail!("pass script names or --category, not both");
  }

  let registry = RegistryClient::new();
  let script_store = ScriptStore::new(paths);
  let manifests = ManifestStore::new(paths);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  rt.block_on(async {
    let names: Vec<String> = if let Some(category) = category {
      let categories = registry
        .fetch_categories()
        .await
        .context("failed to fetch the category index")?;
      let Some(members) = categories.get(category) else {
        bail!(
          "unknown category '{}'; available: {}",
          category,
          categories.keys().cloned().collect::<Vec<_>>().join(", ")
        );
      };
      let message = format!("Download {} script(s) from '{}'?", members.len(), category);
      if !prompts::confirm(&message, yes)? {
        output::print_info("aborted");
        return Ok(());
      }
      members.clone()
    } else {
      scripts.iter().map(|s| normalize_name(s)).collect()
    };

    let mut fetched = 0usize;
    for name in &names {
      if script_store.exists(name) || manifests.exists(name) {
        output::print_warning(&format!("'{}' already exists locally, skipping", name));
        continue;
      }

      let manifest = match registry.fetch_manifest(name).await {
        Ok(manifest) => manifest,
        Err(err) => {
          warn!(script = %name, error = %err, "manifest fetch failed");
          output::print_error(&format!("'{}' not found in the registry", name));
          continue;
        }
      };
      manifests.save(name, &manifest, false)?;

      match registry.fetch_source(name).await {
        Ok(source) => {
          script_store.write(name, &source)?;
          output::print_success(&format!("downloaded '{}'", name));
          fetched += 1;
        }
        Err(err) => {
          // Roll the manifest back so the store stays consistent.
          let _ = manifests.delete(name);
          warn!(script = %name, error = %err, "source fetch failed");
          output::print_error(&format!("source for '{}' is unavailable", name));
        }
      }
    }

    if fetched > 0 {
      output::print_info(&format!("{} script(s) downloaded", fetched));
    }
    Ok(())
  })
}
