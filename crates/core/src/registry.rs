//! Remote script registry client.
//!
//! The registry is a flat file layout served over HTTP: one manifest JSON
//! and one script source per script, plus a category index. At this boundary
//! every failure — transport error, non-success status, malformed payload —
//! folds into a single "not found" outcome; callers never distinguish
//! further.

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::manifest::Manifest;

/// Default registry location.
pub const DEFAULT_REGISTRY: &str = "https://raw.githubusercontent.com/scriptbox-hub/scriptbox-hub/main";

/// Environment variable overriding the registry base URL.
pub const REGISTRY_ENV: &str = "SCRIPTBOX_REGISTRY";

/// Bound on a single registry request.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// The single failure mode of the registry boundary.
#[derive(Debug, Error)]
pub enum RegistryError {
  #[error("not found on the registry: {url}")]
  NotFound { url: String },
}

/// HTTP client for the remote script registry.
#[derive(Debug, Clone)]
pub struct RegistryClient {
  base: String,
  http: reqwest::Client,
}

impl Default for RegistryClient {
  fn default() -> Self {
    Self::new()
  }
}

impl RegistryClient {
  /// Client against the default registry, or `SCRIPTBOX_REGISTRY` if set.
  pub fn new() -> Self {
    let base = std::env::var(REGISTRY_ENV).unwrap_or_else(|_| DEFAULT_REGISTRY.to_string());
    Self::with_base(base)
  }

  /// Client against an explicit base URL.
  pub fn with_base(base: impl Into<String>) -> Self {
    Self {
      base: base.into().trim_end_matches('/').to_string(),
      http: reqwest::Client::new(),
    }
  }

  /// Fetch the manifest of a script.
  ///
  /// # Errors
  ///
  /// `RegistryError::NotFound` for every failure, including a manifest that
  /// does not parse.
  pub async fn fetch_manifest(&self, script: &str) -> Result<Manifest, RegistryError> {
    let url = format!("{}/manifests/{script}.json", self.base);
    let raw = self.fetch(&url).await?;
    serde_json::from_str(&raw).map_err(|_| RegistryError::NotFound { url })
  }

  /// Fetch the source of a script.
  ///
  /// # Errors
  ///
  /// `RegistryError::NotFound` for every failure.
  pub async fn fetch_source(&self, script: &str) -> Result<String, RegistryError> {
    let url = format!("{}/scripts/{script}.py", self.base);
    self.fetch(&url).await
  }

  /// Fetch the category index: category name to script names.
  ///
  /// # Errors
  ///
  /// `RegistryError::NotFound` for every failure.
  pub async fn fetch_categories(&self) -> Result<BTreeMap<String, Vec<String>>, RegistryError> {
    let url = format!("{}/categories.json", self.base);
    let raw = self.fetch(&url).await?;
    serde_json::from_str(&raw).map_err(|_| RegistryError::NotFound { url })
  }

  async fn fetch(&self, url: &str) -> Result<String, RegistryError> {
    debug!(url, "fetching from registry");
    let not_found = || RegistryError::NotFound { url: url.to_string() };
    let response = self
      .http
      .get(url)
      .timeout(FETCH_TIMEOUT)
      .send()
      .await
      .map_err(|_| not_found())?;
    if !response.status().is_success() {
      return Err(not_found());
    }
    response.text().await.map_err(|_| not_found())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn fetches_and_parses_a_manifest() {
    let mut server = mockito::Server::new_async().await;
    let body = r#"{"name":"weather","description":"d","dependencies":[{"package":"requests","version":""}],"type":"standard","version":"1.2"}"#;
    let mock = server
      .mock("GET", "/manifests/weather.json")
      .with_status(200)
      .with_body(body)
      .create_async()
      .await;

    let client = RegistryClient::with_base(server.url());
    let manifest = client.fetch_manifest("weather").await.unwrap();
    assert_eq!(manifest.name, "weather");
    assert!(manifest.is_standard());
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn http_errors_fold_into_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/scripts/ghost.py")
      .with_status(404)
      .create_async()
      .await;

    let client = RegistryClient::with_base(server.url());
    assert!(matches!(
      client.fetch_source("ghost").await,
      Err(RegistryError::NotFound { .. })
    ));
  }

  #[tokio::test]
  async fn malformed_payloads_fold_into_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/categories.json")
      .with_status(200)
      .with_body("not json")
      .create_async()
      .await;

    let client = RegistryClient::with_base(server.url());
    assert!(matches!(
      client.fetch_categories().await,
      Err(RegistryError::NotFound { .. })
    ));
  }

  #[test]
  fn trailing_slash_is_normalized() {
    let client = RegistryClient::with_base("http://example.test/base/");
    assert_eq!(client.base, "http://example.test/base");
  }
}
