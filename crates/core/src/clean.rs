//! Orphan sweep: manifests and environments without a matching script.
//!
//! A manifest record or a virtual environment whose script source is gone is
//! dead weight; `clean` removes both kinds and reports what it deleted. An
//! already-clean library is a success, not a special case.

use std::collections::BTreeSet;
use std::fs;

use tracing::info;

use scriptbox_platform::Paths;

use crate::script::ScriptStore;

/// What a sweep removed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanReport {
  /// Script names whose orphaned manifest was deleted.
  pub manifests_removed: Vec<String>,
  /// Script names whose orphaned environment was deleted.
  pub venvs_removed: Vec<String>,
}

impl CleanReport {
  /// Whether the sweep found nothing to remove.
  pub fn is_empty(&self) -> bool {
    self.manifests_removed.is_empty() && self.venvs_removed.is_empty()
  }
}

/// Remove orphaned manifests and environments.
///
/// # Errors
///
/// Returns an I/O error if a deletion fails; everything removed before the
/// failure stays removed.
pub fn clean(paths: &Paths) -> Result<CleanReport, std::io::Error> {
  let existing: BTreeSet<String> = ScriptStore::new(paths).available().into_iter().collect();
  let mut report = CleanReport::default();

  if let Ok(entries) = fs::read_dir(paths.manifests_dir()) {
    for entry in entries.filter_map(|e| e.ok()) {
      let path = entry.path();
      if !path.extension().is_some_and(|ext| ext == "json") {
        continue;
      }
      let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
        continue;
      };
      if !existing.contains(&name) {
        fs::remove_file(&path)?;
        info!(script = %name, "removed orphaned manifest");
        report.manifests_removed.push(name);
      }
    }
  }

  if let Ok(entries) = fs::read_dir(paths.venvs_dir()) {
    for entry in entries.filter_map(|e| e.ok()) {
      let path = entry.path();
      if !path.is_dir() {
        continue;
      }
      let name = entry.file_name().to_string_lossy().into_owned();
      if !existing.contains(&name) {
        fs::remove_dir_all(&path)?;
        info!(script = %name, "removed orphaned environment");
        report.venvs_removed.push(name);
      }
    }
  }

  report.manifests_removed.sort();
  report.venvs_removed.sort();
  Ok(report)
}
