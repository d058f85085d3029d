//! Remote archive access
//!
//! The pipeline only needs three things from the publisher: the list of
//! archive names, the size of one archive, and the archive bytes on disk.
//! `RemoteSource` captures exactly that so the driver can run against the
//! HTTP directory listing in production and against fakes in tests.

pub mod http;
pub mod listing;

pub use http::HttpRemote;
pub use listing::parse_listing;

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

/// An archive published in the remote directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteArtifact {
    /// Base file name, e.g. `Empresas0.zip`
    pub name: String,
    pub url: String,
}

impl RemoteArtifact {
    /// Derive the artifact URL from the listing base URL
    pub fn new(base_url: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        let url = if base_url.ends_with('/') {
            format!("{}{}", base_url, name)
        } else {
            format!("{}/{}", base_url, name)
        };
        Self { name, url }
    }
}

/// Capability to discover, size and fetch remote archives
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Archives in the remote directory, deduplicated and sorted by name
    async fn list_archives(&self) -> Result<Vec<RemoteArtifact>>;

    /// Size of the remote archive; `Ok(None)` when the server does not say
    async fn probe_size(&self, artifact: &RemoteArtifact) -> Result<Option<u64>>;

    /// Fetch the archive to `dest`, replacing whatever is there.
    /// Returns the number of bytes written.
    async fn download(&self, artifact: &RemoteArtifact, dest: &Path) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_url_join() {
        let a = RemoteArtifact::new("https://example.test/dados/2025-11/", "Empresas0.zip");
        assert_eq!(a.url, "https://example.test/dados/2025-11/Empresas0.zip");

        let b = RemoteArtifact::new("https://example.test/dados/2025-11", "Empresas0.zip");
        assert_eq!(b.url, "https://example.test/dados/2025-11/Empresas0.zip");
        assert_eq!(b.name, "Empresas0.zip");
    }
}
