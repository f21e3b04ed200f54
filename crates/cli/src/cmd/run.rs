//! Implementation of the `scriptbox run` command.
//!
//! Reconciles the script's environment against its manifest, then executes the
//! script with any trailing arguments. The script's exit code becomes ours.

use anyhow::{Context, Result, bail};
use tracing::debug;

use scriptbox_core::{Manifest, ManifestStore, Reconciler, ScriptStore, StoreError, exec};
use scriptbox_core::script::normalize_name;
use scriptbox_platform::Paths;

use crate::output;

/// Execute the run command.
///
/// Loads the manifest (generating one from the source when none exists yet),
/// converges the environment, and hands off to the interpreter. Does not
/// return on a successful launch with a nonzero script exit: the process
/// exits with the script's code.
pub fn cmd_run(paths: &Paths, script: &str, args: &[String]) -> Result<()> {
  let name = normalize_name(script);
  let scripts = ScriptStore::new(paths);
  let manifests = ManifestStore::new(paths);

  if !scripts.exists(&name) {
    bail!("script '{}' not found; add it with 'scriptbox add' or 'scriptbox download'", name);
  }

  let manifest = match manifests.load(&name) {
    Ok(manifest) => manifest,
    Err(StoreError::NotFound { .. }) => {
      // First run without a manifest record: derive one from the source.
      let source = scripts.read(&name)?;
      let manifest = Manifest::from_source(name.clone(), &source);
      manifests.save(&name, &manifest, false)?;
      output::print_info(&format!(
        "generated manifest for '{}' ({} dependencies)",
        name,
        manifest.dependencies.len()
      ));
      manifest
    }
    Err(err) => return Err(err.into()),
  };

  let reconciler = Reconciler::new(paths);
  let script_path = scripts.path(&name);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let code = rt.block_on(async {
    let handle = reconciler.ensure_ready(&name, &manifest).await?;
    debug!(interpreter = %handle.interpreter.display(), isolated = handle.is_isolated(), "environment ready");
    let code = exec::run_script(&handle, &script_path, args).await?;
    anyhow::Ok(code)
  })?;

  if code != 0 {
    std::process::exit(code);
  }
  Ok(())
}
