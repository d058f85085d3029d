//! HTTP implementation of [`RemoteSource`] over the publisher's directory index

use super::{parse_listing, RemoteArtifact, RemoteSource};
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{HeaderMap, CONTENT_LENGTH};
use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("cnpj-ingest/", env!("CARGO_PKG_VERSION"));

/// Fetches listings and archives over HTTP(S)
pub struct HttpRemote {
    /// Downloads; transport default timeouts
    client: Client,
    /// Listing and HEAD requests; short fixed timeout
    probe_client: Client,
    base_url: String,
    show_progress: bool,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, probe_timeout: Duration) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        let probe_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(probe_timeout)
            .build()?;

        Ok(Self {
            client,
            probe_client,
            base_url: base_url.into(),
            show_progress: false,
        })
    }

    /// Draw a byte progress bar while downloading
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn download_bar(&self, total: Option<u64>, name: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total.unwrap_or(0));
        let style = ProgressStyle::default_bar()
            .template("{msg} [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb.set_message(format!("Downloading {}", name));
        pb
    }

    async fn stream_to_file(&self, artifact: &RemoteArtifact, part: &Path) -> Result<u64> {
        let response = self.client.get(&artifact.url).send().await?;

        if !response.status().is_success() {
            return Err(IngestError::RemoteStatus {
                url: artifact.url.clone(),
                status: response.status().as_u16(),
            });
        }

        let pb = self.download_bar(response.content_length(), &artifact.name);
        let mut file = std::fs::File::create(part)?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)?;
            written += chunk.len() as u64;
            pb.set_position(written);
        }

        file.flush()?;
        file.sync_all()?;
        pb.finish_and_clear();

        Ok(written)
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn list_archives(&self) -> Result<Vec<RemoteArtifact>> {
        debug!(url = %self.base_url, "Fetching directory listing");

        let response = self.probe_client.get(&self.base_url).send().await?;

        if !response.status().is_success() {
            return Err(IngestError::RemoteStatus {
                url: self.base_url.clone(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let artifacts = parse_listing(&body)?
            .into_iter()
            .map(|name| RemoteArtifact::new(&self.base_url, name))
            .collect();

        Ok(artifacts)
    }

    async fn probe_size(&self, artifact: &RemoteArtifact) -> Result<Option<u64>> {
        let response = self.probe_client.head(&artifact.url).send().await?;

        if !response.status().is_success() {
            return Err(IngestError::RemoteStatus {
                url: artifact.url.clone(),
                status: response.status().as_u16(),
            });
        }

        let size = declared_size(response.headers());

        if size.is_none() {
            warn!(url = %artifact.url, "No usable Content-Length in probe response");
        }

        Ok(size)
    }

    async fn download(&self, artifact: &RemoteArtifact, dest: &Path) -> Result<u64> {
        let part = part_path(dest);
        if part.exists() {
            std::fs::remove_file(&part)?;
        }

        info!(url = %artifact.url, dest = %dest.display(), "Downloading archive");

        match self.stream_to_file(artifact, &part).await {
            Ok(written) => {
                std::fs::rename(&part, dest)?;
                Ok(written)
            },
            Err(err) => {
                if let Err(cleanup) = std::fs::remove_file(&part) {
                    debug!(path = %part.display(), error = %cleanup, "No partial download to remove");
                }
                Err(err)
            },
        }
    }
}

/// Size from the `Content-Length` header; `None` when absent or unparsable
///
/// Read from the headers because the body of a HEAD response is always empty.
pub fn declared_size(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}

/// Temporary path a download is streamed to before it replaces `dest`
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}
