//! Upstream-update flow for standard scripts.
//!
//! A standard script carries the upstream version tag it was downloaded at.
//! Refreshing compares that tag with the registry's current one; when they
//! differ, the new source and manifest fully replace the local copies (no
//! merging), and the next run reconciles against the new manifest. An
//! unparseable version on either side is a hard stop — nothing speculative
//! is installed from an already-suspect source.

use thiserror::Error;
use tracing::{info, warn};

use crate::manifest::{ManifestStore, StoreError};
use crate::registry::{RegistryClient, RegistryError};
use crate::script::ScriptStore;
use crate::version::{self, VersionError};

/// Outcome of refreshing one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
  /// Local and upstream versions are equivalent.
  UpToDate,
  /// Source and manifest were replaced with the upstream ones.
  Updated {
    old: Option<String>,
    new: Option<String>,
  },
}

/// Outcome of the refresh-all flow.
#[derive(Debug, Default, Clone)]
pub struct UpdateSummary {
  pub updated: Vec<String>,
  pub up_to_date: Vec<String>,
  /// Scripts skipped with the reason, e.g. missing upstream metadata.
  pub skipped: Vec<(String, String)>,
}

/// Errors from the update flow.
#[derive(Debug, Error)]
pub enum UpdateError {
  /// The registry has no usable manifest or source for the script.
  #[error(transparent)]
  Registry(#[from] RegistryError),

  /// Local persistence failed.
  #[error(transparent)]
  Store(#[from] StoreError),

  /// An upstream or local version tag does not parse. Hard stop.
  #[error(transparent)]
  Version(#[from] VersionError),

  /// The upstream manifest carries no version tag to compare against.
  #[error("upstream manifest for '{script}' has no version tag")]
  MissingUpstreamVersion { script: String },
}

/// Orchestrates registry fetches and local stores for updates.
pub struct Updater<'a> {
  registry: &'a RegistryClient,
  scripts: &'a ScriptStore,
  manifests: &'a ManifestStore,
}

impl<'a> Updater<'a> {
  pub fn new(registry: &'a RegistryClient, scripts: &'a ScriptStore, manifests: &'a ManifestStore) -> Self {
    Self {
      registry,
      scripts,
      manifests,
    }
  }

  /// Refresh one script against the registry.
  ///
  /// A missing local version tag counts as version `0`, forcing a download;
  /// a present-but-unparseable one is a hard stop.
  ///
  /// # Errors
  ///
  /// `UpdateError::Registry` when the script is absent upstream,
  /// `MissingUpstreamVersion` / `Version` when versions cannot be compared,
  /// `Store` when replacing the local copies fails.
  pub async fn refresh(&self, script: &str) -> Result<UpdateOutcome, UpdateError> {
    let remote = self.registry.fetch_manifest(script).await?;
    let remote_version = remote
      .version
      .clone()
      .ok_or_else(|| UpdateError::MissingUpstreamVersion {
        script: script.to_string(),
      })?;
    // Validate the upstream tag up front: hard stop on garbage.
    version::parse(&remote_version)?;

    let local_version = self.manifests.load(script).ok().and_then(|m| m.version);
    let effective_local = local_version.as_deref().unwrap_or("0");
    if local_version.is_none() {
      warn!(script, "no local version tag, treating as outdated");
    }

    if version::equivalent(&remote_version, effective_local)? {
      info!(script, version = %remote_version, "up to date");
      return Ok(UpdateOutcome::UpToDate);
    }

    let source = self.registry.fetch_source(script).await?;
    self.scripts.write(script, &source)?;
    // Full replacement of the manifest, never a merge.
    self.manifests.save(script, &remote, true)?;
    info!(
      script,
      old = %effective_local,
      new = %remote_version,
      "updated from registry"
    );
    Ok(UpdateOutcome::Updated {
      old: local_version,
      new: Some(remote_version),
    })
  }

  /// Refresh every standard script sequentially, collecting per-script
  /// failures instead of aborting the batch.
  pub async fn refresh_all(&self) -> UpdateSummary {
    let mut summary = UpdateSummary::default();
    for script in self.scripts.available() {
      let standard = self
        .manifests
        .load(&script)
        .map(|m| m.is_standard())
        .unwrap_or(false);
      if !standard {
        continue;
      }
      match self.refresh(&script).await {
        Ok(UpdateOutcome::UpToDate) => summary.up_to_date.push(script),
        Ok(UpdateOutcome::Updated { .. }) => summary.updated.push(script),
        Err(err) => {
          warn!(script = %script, error = %err, "skipping script");
          summary.skipped.push((script, err.to_string()));
        }
      }
    }
    summary
  }
}
