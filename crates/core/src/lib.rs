//! scriptbox-core: library management and environment reconciliation.
//!
//! This crate provides the pieces behind every scriptbox command:
//! - `Manifest` / `ManifestStore`: the declared dependency specification of a
//!   script and its persistence
//! - `ScriptStore`: script source files plus static metadata extraction
//! - `Reconciler`: converges a script's virtual environment to its manifest
//! - `RegistryClient` / `Updater`: the remote script registry and the
//!   upstream-update flow
//! - `clean` / `exec`: orphan sweeping and script execution

pub mod clean;
pub mod exec;
pub mod installer;
pub mod manifest;
pub mod probe;
pub mod reconcile;
pub mod registry;
pub mod script;
mod stdlib;
pub mod update;
pub mod venv;
pub mod version;

pub use manifest::{Dependency, Manifest, ManifestStore, Provenance, StoreError};
pub use probe::EnvProbe;
pub use reconcile::{EnvHandle, ReconcileError, ReconcilePlan, Reconciler, RemovalReport};
pub use registry::{RegistryClient, RegistryError};
pub use script::ScriptStore;
pub use update::{UpdateError, UpdateOutcome, UpdateSummary, Updater};
pub use venv::{VenvError, VenvManager};
