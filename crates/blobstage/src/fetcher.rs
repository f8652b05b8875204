// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Remote object access
//!
//! The reader only needs two capabilities from remote storage: the size of
//! an object and a full download into a local sink. [`ObjectStoreFetcher`]
//! provides both over any `object_store` backend; tests substitute their
//! own implementations.

use crate::error::Error;
use crate::location::{ObjectLocation, normalize};
use crate::Result;
use async_trait::async_trait;
use diagnostics::*;
use futures::StreamExt;
use object_store::ObjectStore;
use object_store::aws::{AmazonS3Builder, AmazonS3ConfigKey};
use object_store::azure::{AzureConfigKey, MicrosoftAzureBuilder};
use object_store::local::LocalFileSystem;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait RemoteObjectFetcher: Send + Sync {
    /// Size of the object in bytes, without downloading it.
    async fn size(&self, location: &ObjectLocation) -> Result<u64>;

    /// Stream the whole object into `sink`, returning the bytes written.
    /// Fails with `Error::Cancelled` once `cancel` fires.
    async fn download_into(
        &self,
        location: &ObjectLocation,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        cancel: &CancellationToken,
    ) -> Result<u64>;
}

/// Fetcher over a store rooted at one container.
#[derive(Debug, Clone)]
pub struct ObjectStoreFetcher {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreFetcher {
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RemoteObjectFetcher for ObjectStoreFetcher {
    async fn size(&self, location: &ObjectLocation) -> Result<u64> {
        let meta = self
            .store
            .head(&location.object_path())
            .await
            .map_err(|e| Error::from_object_store(e, location))?;
        Ok(meta.size)
    }

    async fn download_into(
        &self,
        location: &ObjectLocation,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let path = location.object_path();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::cancelled(location)),
            result = self.store.get(&path) => {
                result.map_err(|e| Error::from_object_store(e, location))?
            }
        };

        let mut stream = result.into_stream();
        let mut written = 0_u64;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::cancelled(location)),
                next = stream.next() => next,
            };
            match next {
                Some(Ok(chunk)) => {
                    sink.write_all(&chunk).await?;
                    written += chunk.len() as u64;
                }
                Some(Err(e)) => return Err(Error::from_object_store(e, location)),
                None => break,
            }
        }
        sink.flush().await?;
        Ok(written)
    }
}

/// Build a store rooted at `container` for the given connection.
///
/// - `s3://...` builds an S3 store; `container` is the bucket
/// - `az://...`, `azure://...` or an Azure storage connection string
///   (`AccountName=...;AccountKey=...`) builds an Azure store for the
///   container
/// - anything else (`file:///dir` or a bare directory) is a local
///   directory, with the container as a subdirectory
///
/// `options` are passed to the cloud builders as config keys (region,
/// endpoint, credentials); unknown keys are logged and ignored.
pub fn build_object_store(
    connection: &str,
    container: &str,
    options: &BTreeMap<String, String>,
) -> Result<Arc<dyn ObjectStore>> {
    let container = normalize(container);
    if container.is_empty() {
        return Err(Error::Configuration("container is required".to_string()));
    }

    if connection.starts_with("s3://") || connection.starts_with("s3a://") {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(&container);
        for (key, value) in options {
            match AmazonS3ConfigKey::from_str(&key.to_ascii_lowercase()) {
                Ok(config_key) => builder = builder.with_config(config_key, value),
                Err(_) => debug!("Ignoring unknown S3 config key: {key}", key),
            }
        }
        let store = builder
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build S3 store: {e}")))?;
        return Ok(Arc::new(store));
    }

    let azure_settings = parse_azure_connection_string(connection);
    if connection.starts_with("az://")
        || connection.starts_with("azure://")
        || !azure_settings.is_empty()
    {
        let mut builder = MicrosoftAzureBuilder::from_env().with_container_name(&container);
        for (key, value) in &azure_settings {
            builder = match key.as_str() {
                "AccountName" => builder.with_account(value),
                "AccountKey" => builder.with_access_key(value),
                "BlobEndpoint" => builder.with_endpoint(value.clone()),
                "UseDevelopmentStorage" => builder.with_use_emulator(value == "true"),
                _ => builder,
            };
        }
        for (key, value) in options {
            match AzureConfigKey::from_str(&key.to_ascii_lowercase()) {
                Ok(config_key) => builder = builder.with_config(config_key, value),
                Err(_) => debug!("Ignoring unknown Azure config key: {key}", key),
            }
        }
        let store = builder
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build Azure store: {e}")))?;
        return Ok(Arc::new(store));
    }

    let root = connection.strip_prefix("file://").unwrap_or(connection);
    let root = std::path::Path::new(root).join(&container);
    let store = LocalFileSystem::new_with_prefix(&root).map_err(|e| {
        Error::Configuration(format!(
            "Failed to build local store at {}: {e}",
            root.display()
        ))
    })?;
    Ok(Arc::new(store))
}

/// Split an Azure storage connection string into its `key=value` settings.
/// Returns an empty map for anything that is not one.
#[must_use]
pub fn parse_azure_connection_string(connection: &str) -> BTreeMap<String, String> {
    let settings: BTreeMap<String, String> = connection
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect();

    let recognized = ["AccountName", "AccountKey", "BlobEndpoint", "UseDevelopmentStorage"];
    if settings.keys().any(|k| recognized.contains(&k.as_str())) {
        settings
    } else {
        BTreeMap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::PutPayload;
    use object_store::memory::InMemory;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    async fn store_with(path: &str, data: &'static [u8]) -> std::result::Result<Arc<dyn ObjectStore>, object_store::Error> {
        let store = InMemory::new();
        let _ = store
            .put(&object_store::path::Path::from(path), PutPayload::from_static(data))
            .await?;
        Ok(Arc::new(store))
    }

    #[tokio::test]
    async fn test_size_and_download() -> TestResult {
        let fetcher = ObjectStoreFetcher::new(store_with("dir/data.bin", b"0123456789").await?);
        let location = ObjectLocation::new("container", "/dir/data.bin");

        assert_eq!(fetcher.size(&location).await?, 10);

        let mut sink: Vec<u8> = Vec::new();
        let written = fetcher
            .download_into(&location, &mut sink, &CancellationToken::new())
            .await?;
        assert_eq!(written, 10);
        assert_eq!(sink, b"0123456789");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() -> TestResult {
        let fetcher = ObjectStoreFetcher::new(store_with("present", b"x").await?);
        let location = ObjectLocation::new("container", "absent");

        let err = fetcher.size(&location).await.err().ok_or("expected error")?;
        assert!(err.is_not_found());

        let mut sink: Vec<u8> = Vec::new();
        let err = fetcher
            .download_into(&location, &mut sink, &CancellationToken::new())
            .await
            .err()
            .ok_or("expected error")?;
        assert!(err.is_not_found());
        Ok(())
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_download() -> TestResult {
        let fetcher = ObjectStoreFetcher::new(store_with("data", b"abc").await?);
        let location = ObjectLocation::new("container", "data");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut sink: Vec<u8> = Vec::new();
        let err = fetcher
            .download_into(&location, &mut sink, &cancel)
            .await
            .err()
            .ok_or("expected error")?;
        assert!(err.is_cancelled());
        assert!(sink.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_azure_connection_string() {
        let settings = parse_azure_connection_string(
            "DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=a2V5;EndpointSuffix=core.windows.net",
        );
        assert_eq!(settings.get("AccountName").map(String::as_str), Some("acct"));
        assert_eq!(settings.get("AccountKey").map(String::as_str), Some("a2V5"));

        assert!(parse_azure_connection_string("file:///tmp/data").is_empty());
        assert!(parse_azure_connection_string("s3://bucket").is_empty());
    }

    #[test]
    fn test_local_store_requires_container() {
        let result = build_object_store("file:///tmp", "//", &BTreeMap::new());
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[tokio::test]
    async fn test_local_store_is_rooted_at_container() -> TestResult {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir_all(dir.path().join("items"))?;
        std::fs::write(dir.path().join("items").join("a.parquet"), b"PAR1")?;

        let connection = format!("file://{}", dir.path().display());
        let store = build_object_store(&connection, "/items/", &BTreeMap::new())?;
        let fetcher = ObjectStoreFetcher::new(store);
        let size = fetcher.size(&ObjectLocation::new("items", "a.parquet")).await?;
        assert_eq!(size, 4);
        Ok(())
    }
}
