//! Environment reconciliation: converge a script's virtual environment to
//! its manifest.
//!
//! `ensure_ready` is the single entry point the run/update/remove commands
//! go through:
//!
//! 1. An empty dependency list short-circuits to the host interpreter — no
//!    environment is ever materialized for it.
//! 2. Otherwise the environment is created (idempotent), every declared
//!    dependency is probed and classified (missing / outdated / satisfied),
//!    and the resulting plan is applied one package at a time.
//! 3. A missing interpreter or installer in an environment believed to exist
//!    is corruption: the environment is destroyed and the whole
//!    reconciliation retried exactly once. A second corruption is fatal.
//!
//! Partial environments are an accepted terminal state: a hard install
//! failure aborts the reconciliation without rolling back packages already
//! applied, since a partially-satisfied environment is strictly more useful
//! than none.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, warn};

use scriptbox_platform::{Paths, PlatformError, host_interpreter};

use crate::installer::{InstallError, PipGateway};
use crate::manifest::{Dependency, Manifest};
use crate::probe::EnvProbe;
use crate::venv::{VenvError, VenvManager};
use crate::version;

/// A ready execution environment for a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvHandle {
  /// Interpreter to invoke the script with.
  pub interpreter: PathBuf,
  /// The environment directory, or `None` when running on the host
  /// interpreter (manifest with no dependencies).
  pub venv: Option<PathBuf>,
}

impl EnvHandle {
  /// Whether the script runs in an isolated environment.
  pub fn is_isolated(&self) -> bool {
    self.venv.is_some()
  }
}

/// The corrective actions for one (manifest, environment) pair.
///
/// Ephemeral: recomputed on every reconciliation, never persisted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
  /// Declared but absent from the environment.
  pub to_install: Vec<Dependency>,
  /// Present at a version that does not satisfy the pin.
  pub to_upgrade: Vec<Dependency>,
  /// Number of dependencies already satisfied.
  pub satisfied: usize,
}

impl ReconcilePlan {
  /// Whether the environment already converges to the manifest.
  pub fn is_noop(&self) -> bool {
    self.to_install.is_empty() && self.to_upgrade.is_empty()
  }

  /// Number of installer invocations this plan requires.
  pub fn work_count(&self) -> usize {
    self.to_install.len() + self.to_upgrade.len()
  }
}

/// Outcome of a dependency-removal call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RemovalReport {
  /// Packages that were uninstalled.
  pub removed: Vec<String>,
  /// Packages that were already absent ("nothing to do", not an error).
  pub already_absent: Vec<String>,
}

/// Errors from reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
  /// Environment creation failed.
  #[error(transparent)]
  Create(#[from] VenvError),

  /// A package install failed hard. `installed` counts the packages applied
  /// before the failure, so callers can report partial success distinctly.
  #[error("reconciliation of '{script}' aborted after {installed} package(s) applied: {source}")]
  Install {
    script: String,
    installed: usize,
    #[source]
    source: InstallError,
  },

  /// The environment was still unusable after the single recreate-and-retry
  /// allowed per reconciliation.
  #[error("virtual environment for '{script}' is unusable even after recreation")]
  Corrupted { script: String },

  /// No host interpreter for the no-dependency fast path.
  #[error(transparent)]
  Host(#[from] PlatformError),
}

/// Internal outcome of a single convergence pass.
enum PassError {
  /// Interpreter or installer missing from an environment that exists.
  Corruption,
  /// Anything that a recreate cannot fix.
  Hard(ReconcileError),
}

/// Orchestrates probe, lifecycle, and installer to converge environments.
#[derive(Debug, Clone)]
pub struct Reconciler {
  probe: EnvProbe,
  venvs: VenvManager,
  pip: PipGateway,
}

impl Reconciler {
  pub fn new(paths: &Paths) -> Self {
    Self {
      probe: EnvProbe::new(paths),
      venvs: VenvManager::new(paths),
      pip: PipGateway::new(paths),
    }
  }

  /// Converge the script's environment to its manifest and hand back the
  /// interpreter to run it with.
  ///
  /// # Errors
  ///
  /// `ReconcileError::Install` on a hard package failure (already-applied
  /// packages are kept), `Corrupted` when the environment is still broken
  /// after the one recreate this call is allowed, `Create`/`Host` when the
  /// environment or host interpreter cannot be provided at all.
  pub async fn ensure_ready(&self, script: &str, manifest: &Manifest) -> Result<EnvHandle, ReconcileError> {
    if manifest.dependencies.is_empty() {
      // Fast path: no third-party dependencies, run on the host interpreter.
      // Must not touch the venvs directory at all.
      let interpreter = host_interpreter()?;
      debug!(script, "no dependencies declared, using host interpreter");
      return Ok(EnvHandle {
        interpreter,
        venv: None,
      });
    }

    match self.converge(script, &manifest.dependencies).await {
      Ok(handle) => Ok(handle),
      Err(PassError::Hard(err)) => Err(err),
      Err(PassError::Corruption) => {
        warn!(script, "virtual environment damaged, recreating");
        match self.venvs.destroy(script).await {
          Ok(()) | Err(VenvError::NotFound { .. }) => {}
          Err(err) => return Err(err.into()),
        }
        // Bounded retry: one recreate per call, never more.
        match self.converge(script, &manifest.dependencies).await {
          Ok(handle) => Ok(handle),
          Err(PassError::Hard(err)) => Err(err),
          Err(PassError::Corruption) => Err(ReconcileError::Corrupted {
            script: script.to_string(),
          }),
        }
      }
    }
  }

  /// Destroy and rebuild the environment from the complete manifest.
  ///
  /// Corruption-recovery path only: it discards every installed package.
  ///
  /// # Errors
  ///
  /// Same failures as [`Reconciler::ensure_ready`].
  pub async fn recreate(&self, script: &str, manifest: &Manifest) -> Result<EnvHandle, ReconcileError> {
    match self.venvs.destroy(script).await {
      Ok(()) | Err(VenvError::NotFound { .. }) => {}
      Err(err) => return Err(err.into()),
    }
    self.ensure_ready(script, manifest).await
  }

  /// Destroy the script's environment.
  ///
  /// # Errors
  ///
  /// `VenvError::NotFound` when there is nothing to destroy.
  pub async fn destroy(&self, script: &str) -> Result<(), VenvError> {
    self.venvs.destroy(script).await
  }

  /// Uninstall specific packages from the script's environment.
  ///
  /// Packages that are not installed are reported as already absent and the
  /// call continues; the first uninstall failure aborts the remainder.
  ///
  /// # Errors
  ///
  /// Propagates the first `InstallError` from the installer gateway.
  pub async fn remove_dependencies(
    &self,
    script: &str,
    packages: &[String],
  ) -> Result<RemovalReport, InstallError> {
    let mut report = RemovalReport::default();
    for package in packages {
      if self.probe.installed_version(script, package).await.is_none() {
        info!(script, package = %package, "not installed, nothing to remove");
        report.already_absent.push(package.clone());
        continue;
      }
      self.pip.uninstall(script, package).await?;
      report.removed.push(package.clone());
    }
    Ok(report)
  }

  /// Probe every declared dependency and classify the corrective work.
  pub async fn compute_plan(&self, script: &str, dependencies: &[Dependency]) -> ReconcilePlan {
    let mut observed = Vec::with_capacity(dependencies.len());
    for dep in dependencies {
      observed.push(self.probe.installed_version(script, &dep.package).await);
    }
    classify(dependencies, &observed)
  }

  /// One convergence pass: create if needed, plan, apply.
  async fn converge(&self, script: &str, dependencies: &[Dependency]) -> Result<EnvHandle, PassError> {
    let env = self
      .venvs
      .create(script)
      .await
      .map_err(|e| PassError::Hard(e.into()))?;

    // An environment that exists but lost its interpreter is corrupt.
    let interpreter = self.probe.interpreter_path(script);
    if !interpreter.is_file() {
      return Err(PassError::Corruption);
    }

    let plan = self.compute_plan(script, dependencies).await;
    if plan.is_noop() {
      debug!(script, satisfied = plan.satisfied, "environment already converged");
      return Ok(EnvHandle {
        interpreter,
        venv: Some(env),
      });
    }

    info!(
      script,
      install = plan.to_install.len(),
      upgrade = plan.to_upgrade.len(),
      satisfied = plan.satisfied,
      "converging environment"
    );

    let mut installed = 0usize;
    for dep in plan.to_install.iter().chain(plan.to_upgrade.iter()) {
      match self.pip.install(script, dep).await {
        Ok(()) => installed += 1,
        Err(InstallError::PipMissing { .. }) => return Err(PassError::Corruption),
        Err(source) => {
          return Err(PassError::Hard(ReconcileError::Install {
            script: script.to_string(),
            installed,
            source,
          }));
        }
      }
    }

    Ok(EnvHandle {
      interpreter,
      venv: Some(env),
    })
  }
}

/// Classify declared dependencies against observed versions.
///
/// `observed` is positionally aligned with `dependencies`; `None` means the
/// package is absent or unprobeable. An unparseable version pair counts as
/// not satisfied, forcing an upgrade attempt that surfaces the bad input.
fn classify(dependencies: &[Dependency], observed: &[Option<String>]) -> ReconcilePlan {
  let mut plan = ReconcilePlan::default();
  for (dep, installed) in dependencies.iter().zip(observed) {
    match installed {
      None => plan.to_install.push(dep.clone()),
      Some(installed) => {
        if !dep.is_pinned() {
          plan.satisfied += 1;
          continue;
        }
        match version::equivalent(&dep.version, installed) {
          Ok(true) => plan.satisfied += 1,
          Ok(false) => plan.to_upgrade.push(dep.clone()),
          Err(err) => {
            warn!(package = %dep.package, error = %err, "unparseable version, forcing upgrade");
            plan.to_upgrade.push(dep.clone());
          }
        }
      }
    }
  }
  plan
}
