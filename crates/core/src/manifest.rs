//! Script manifests and their persistence.
//!
//! A manifest is the declared, authoritative dependency specification of a
//! script: description, `{package, version}` pairs, provenance (standard
//! scripts are tracked against the remote registry, custom ones are
//! user-authored), and, for standard scripts, the upstream version tag.
//!
//! Manifests are persisted as one JSON record per script, keyed by script
//! name, and can always be regenerated from the script source if lost.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use scriptbox_platform::Paths;

use crate::script;

/// A single declared dependency.
///
/// An empty version means "unpinned": any installed version satisfies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
  pub package: String,
  #[serde(default)]
  pub version: String,
}

impl Dependency {
  /// Convenience constructor used throughout the crate and its tests.
  pub fn new(package: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      package: package.into(),
      version: version.into(),
    }
  }

  /// Whether the dependency pins a specific version.
  pub fn is_pinned(&self) -> bool {
    !self.version.is_empty()
  }

  /// The pip requirement specifier for this dependency.
  pub fn requirement(&self) -> String {
    if self.is_pinned() {
      format!("{}=={}", self.package, self.version)
    } else {
      self.package.clone()
    }
  }
}

/// Where a manifest comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
  /// Tracked against the remote registry; eligible for upstream updates.
  Standard,
  /// Authored by the user; never touched by the update-all flow.
  #[default]
  Custom,
}

/// The declared dependency specification of a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub dependencies: Vec<Dependency>,
  /// Provenance tag; serialized as `type` in the JSON record.
  #[serde(rename = "type", default)]
  pub provenance: Provenance,
  /// Upstream version tag (float-comparable string). Standard scripts only.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
}

impl Manifest {
  /// Build a custom manifest from explicit parts, validating the dependency
  /// list.
  ///
  /// # Errors
  ///
  /// Returns `StoreError::Invalid` on an empty package name or a duplicate
  /// package.
  pub fn new(
    name: impl Into<String>,
    description: impl Into<String>,
    dependencies: Vec<Dependency>,
  ) -> Result<Self, StoreError> {
    let manifest = Self {
      name: name.into(),
      description: description.into(),
      dependencies,
      provenance: Provenance::Custom,
      version: None,
      category: None,
    };
    manifest.validate()?;
    Ok(manifest)
  }

  /// Build a manifest by statically inspecting a script source: description
  /// from the docstring, dependencies (unpinned) from the import statements.
  pub fn from_source(name: impl Into<String>, source: &str) -> Self {
    let dependencies = script::extract_declared_imports(source)
      .into_iter()
      .map(|package| Dependency::new(package, ""))
      .collect();
    Self {
      name: name.into(),
      description: script::extract_description(source),
      dependencies,
      provenance: Provenance::Custom,
      version: None,
      category: None,
    }
  }

  /// Check the manifest invariants: well-formed package names, no
  /// duplicates.
  ///
  /// # Errors
  ///
  /// Returns `StoreError::Invalid` describing the first violation found.
  pub fn validate(&self) -> Result<(), StoreError> {
    let mut seen = BTreeSet::new();
    for dep in &self.dependencies {
      if dep.package.trim().is_empty() {
        return Err(StoreError::Invalid {
          reason: "dependency with an empty package name".to_string(),
        });
      }
      // Names end up in subprocess arguments and file paths, so only the
      // characters a distribution name can legally contain are accepted.
      if !dep
        .package
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
      {
        return Err(StoreError::Invalid {
          reason: format!("package name '{}' contains unsupported characters", dep.package),
        });
      }
      if !seen.insert(dep.package.as_str()) {
        return Err(StoreError::Invalid {
          reason: format!("duplicate dependency '{}'", dep.package),
        });
      }
    }
    Ok(())
  }

  /// Whether this manifest is tracked against the remote registry.
  pub fn is_standard(&self) -> bool {
    self.provenance == Provenance::Standard
  }
}

/// Errors from manifest persistence.
#[derive(Debug, Error)]
pub enum StoreError {
  /// No manifest record exists for the script.
  #[error("no manifest found for '{script}'")]
  NotFound { script: String },

  /// A manifest record already exists and overwrite was not requested.
  #[error("a manifest for '{script}' already exists")]
  AlreadyExists { script: String },

  /// The manifest violates a structural invariant.
  #[error("invalid manifest: {reason}")]
  Invalid { reason: String },

  #[error("manifest I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("malformed manifest record: {0}")]
  Json(#[from] serde_json::Error),
}

/// Persistence of manifest records: one JSON file per script.
#[derive(Debug, Clone)]
pub struct ManifestStore {
  dir: PathBuf,
}

impl ManifestStore {
  pub fn new(paths: &Paths) -> Self {
    Self {
      dir: paths.manifests_dir(),
    }
  }

  /// Path of the manifest record for a script.
  pub fn path(&self, script: &str) -> PathBuf {
    self.dir.join(format!("{script}.json"))
  }

  /// Whether a manifest record exists for a script.
  pub fn exists(&self, script: &str) -> bool {
    self.path(script).is_file()
  }

  /// Load the manifest of a script.
  ///
  /// # Errors
  ///
  /// `StoreError::NotFound` if no record exists; `Json` if the record is
  /// malformed.
  pub fn load(&self, script: &str) -> Result<Manifest, StoreError> {
    let path = self.path(script);
    if !path.is_file() {
      return Err(StoreError::NotFound {
        script: script.to_string(),
      });
    }
    let raw = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&raw)?)
  }

  /// Load a manifest record from an arbitrary path (used by `add -m`).
  ///
  /// # Errors
  ///
  /// `StoreError::NotFound` if the file does not exist.
  pub fn load_from_path(path: &std::path::Path) -> Result<Manifest, StoreError> {
    if !path.is_file() {
      return Err(StoreError::NotFound {
        script: path.display().to_string(),
      });
    }
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
  }

  /// Persist the manifest of a script.
  ///
  /// # Errors
  ///
  /// `StoreError::AlreadyExists` if a record is present and `overwrite` is
  /// false; `Invalid` if the manifest fails validation.
  pub fn save(&self, script: &str, manifest: &Manifest, overwrite: bool) -> Result<(), StoreError> {
    manifest.validate()?;
    let path = self.path(script);
    if path.exists() && !overwrite {
      return Err(StoreError::AlreadyExists {
        script: script.to_string(),
      });
    }
    fs::create_dir_all(&self.dir)?;
    let raw = serde_json::to_string_pretty(manifest)?;
    fs::write(&path, raw)?;
    debug!(script, path = %path.display(), "manifest saved");
    Ok(())
  }

  /// Delete the manifest record of a script.
  ///
  /// # Errors
  ///
  /// `StoreError::NotFound` if no record exists. Callers distinguish
  /// "nothing to delete" from a real failure.
  pub fn delete(&self, script: &str) -> Result<(), StoreError> {
    let path = self.path(script);
    if !path.is_file() {
      return Err(StoreError::NotFound {
        script: script.to_string(),
      });
    }
    fs::remove_file(&path)?;
    debug!(script, "manifest deleted");
    Ok(())
  }

  /// Names of all scripts that have a manifest record.
  pub fn available(&self) -> Vec<String> {
    let Ok(entries) = fs::read_dir(&self.dir) else {
      return Vec::new();
    };
    let mut names: Vec<String> = entries
      .filter_map(|e| e.ok())
      .filter_map(|e| {
        let path = e.path();
        if path.extension().is_some_and(|ext| ext == "json") {
          path.file_stem().map(|s| s.to_string_lossy().into_owned())
        } else {
          None
        }
      })
      .collect();
    names.sort();
    names
  }
}
