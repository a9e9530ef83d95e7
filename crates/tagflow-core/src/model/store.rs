//! Model artifact stores.
//!
//! A store serves the three artifacts of a named model (descriptor, topology,
//! weights) as whole byte payloads. Over HTTP a non-2xx status is a load
//! failure, matching the contract that every fetch must fully succeed before
//! the next begins.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::ModelLoadError;

/// Byte-fetch interface for model artifacts.
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Fetch a single artifact by file name (e.g. `mobilenet-ssd.json`).
    async fn fetch(&self, file: &str) -> Result<Vec<u8>, ModelLoadError>;
}

/// Fetches artifacts from `<base>/<file>` over HTTP.
pub struct HttpModelStore {
    client: reqwest::Client,
    base: String,
}

impl HttpModelStore {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base,
        }
    }

    fn artifact_url(&self, file: &str) -> String {
        format!("{}/{}", self.base, file)
    }
}

#[async_trait]
impl ModelStore for HttpModelStore {
    async fn fetch(&self, file: &str) -> Result<Vec<u8>, ModelLoadError> {
        let url = self.artifact_url(file);
        tracing::debug!("Fetching model artifact {}", url);

        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| ModelLoadError::Fetch {
                    artifact: file.to_string(),
                    message: e.to_string(),
                })?;

        if !response.status().is_success() {
            return Err(ModelLoadError::Fetch {
                artifact: file.to_string(),
                message: format!("HTTP status {}", response.status()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| ModelLoadError::Fetch {
            artifact: file.to_string(),
            message: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}

/// Reads artifacts from a local directory.
pub struct FsModelStore {
    dir: PathBuf,
}

impl FsModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ModelStore for FsModelStore {
    async fn fetch(&self, file: &str) -> Result<Vec<u8>, ModelLoadError> {
        let path = self.dir.join(file);
        tokio::fs::read(&path)
            .await
            .map_err(|e| ModelLoadError::Fetch {
                artifact: file.to_string(),
                message: format!("{}: {e}", path.display()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_url_joins_base_and_file() {
        let store = HttpModelStore::new("https://models.example.com/tagflow");
        assert_eq!(
            store.artifact_url("mobilenet-ssd.json"),
            "https://models.example.com/tagflow/mobilenet-ssd.json"
        );
    }

    #[test]
    fn test_artifact_url_trims_trailing_slash() {
        let store = HttpModelStore::new("https://models.example.com/tagflow/");
        assert_eq!(
            store.artifact_url("m.pb"),
            "https://models.example.com/tagflow/m.pb"
        );
    }

    #[tokio::test]
    async fn test_fs_store_reads_artifact() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("m.json"), b"{}").unwrap();

        let store = FsModelStore::new(dir.path());
        let bytes = store.fetch("m.json").await.unwrap();
        assert_eq!(bytes, b"{}");
    }

    #[tokio::test]
    async fn test_fs_store_missing_artifact_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsModelStore::new(dir.path());

        let err = store.fetch("missing.pb").await.unwrap_err();
        match err {
            ModelLoadError::Fetch { artifact, .. } => assert_eq!(artifact, "missing.pb"),
            other => panic!("expected Fetch error, got {other}"),
        }
    }
}
