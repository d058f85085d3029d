//! Shared fixtures for the ingestion integration tests
//!
//! - `zip_bytes` builds archives in memory
//! - `FakeRemote` serves those archives without a network
//! - `RecordingProgress` captures loader progress

#![allow(dead_code)]

use async_trait::async_trait;
use cnpj_ingest::error::{IngestError, Result};
use cnpj_ingest::progress::{ProgressObserver, ProgressUpdate};
use cnpj_ingest::remote::{RemoteArtifact, RemoteSource};
use std::collections::{BTreeMap, HashSet};
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Mutex;
use zip::write::SimpleFileOptions;

pub const BASE_URL: &str = "https://cnpj.example.test/dados/2025-11/";

/// Three company records, Latin-1 encoded
pub const COMPANY_ROWS: &[u8] = b"\"41273594\";\"PADARIA S\xc3O JO\xc3O LTDA\";\"2062\";\"49\";\"10.000,00\";\"01\";\"\"\n\
\"41273595\";\"MERCADO BOA VISTA LTDA\";\"2062\";\"49\";\"5000,50\";\"03\";\"\"\n\
\"41273596\";\"JOSE DA SILVA\";\"2135\";\"50\";\"0,00\";\"01\";\"\"\n";

pub const COUNTRY_ROWS: &[u8] = b"\"105\";\"BRASIL\"\n\"249\";\"ESTADOS UNIDOS\"\n";

/// Build a zip archive in memory
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("Failed to start zip entry");
        writer.write_all(contents).expect("Failed to write zip entry");
    }
    writer.finish().expect("Failed to finish zip").into_inner()
}

/// In-memory publisher
#[derive(Default)]
pub struct FakeRemote {
    archives: BTreeMap<String, Vec<u8>>,
    unreachable: bool,
    failing_downloads: HashSet<String>,
    failing_probes: bool,
    unknown_sizes: bool,
    downloads: Mutex<Vec<String>>,
    probes: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listing requests fail as if the host were down
    pub fn unreachable() -> Self {
        Self { unreachable: true, ..Self::default() }
    }

    pub fn with_archive(mut self, name: &str, bytes: Vec<u8>) -> Self {
        self.archives.insert(name.to_string(), bytes);
        self
    }

    pub fn with_failing_download(mut self, name: &str) -> Self {
        self.failing_downloads.insert(name.to_string());
        self
    }

    pub fn with_failing_probes(mut self) -> Self {
        self.failing_probes = true;
        self
    }

    /// HEAD requests succeed without a usable size
    pub fn with_unknown_sizes(mut self) -> Self {
        self.unknown_sizes = true;
        self
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().expect("lock").clone()
    }

    pub fn probes(&self) -> Vec<String> {
        self.probes.lock().expect("lock").clone()
    }

    fn status(&self, artifact: &RemoteArtifact, status: u16) -> IngestError {
        IngestError::RemoteStatus { url: artifact.url.clone(), status }
    }
}

#[async_trait]
impl RemoteSource for FakeRemote {
    async fn list_archives(&self) -> Result<Vec<RemoteArtifact>> {
        if self.unreachable {
            return Err(IngestError::RemoteStatus { url: BASE_URL.to_string(), status: 503 });
        }

        Ok(self.archives.keys().map(|name| RemoteArtifact::new(BASE_URL, name.as_str())).collect())
    }

    async fn probe_size(&self, artifact: &RemoteArtifact) -> Result<Option<u64>> {
        self.probes.lock().expect("lock").push(artifact.name.clone());

        if self.failing_probes {
            return Err(self.status(artifact, 504));
        }

        if self.unknown_sizes {
            return Ok(None);
        }

        Ok(self.archives.get(&artifact.name).map(|bytes| bytes.len() as u64))
    }

    async fn download(&self, artifact: &RemoteArtifact, dest: &Path) -> Result<u64> {
        self.downloads.lock().expect("lock").push(artifact.name.clone());

        if self.failing_downloads.contains(&artifact.name) {
            return Err(self.status(artifact, 500));
        }

        let bytes = self
            .archives
            .get(&artifact.name)
            .ok_or_else(|| self.status(artifact, 404))?;
        std::fs::write(dest, bytes)?;
        Ok(bytes.len() as u64)
    }
}

/// Records every progress callback
#[derive(Default)]
pub struct RecordingProgress {
    pub events: Mutex<Vec<(String, u64, u64)>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<(String, u64, u64)> {
        self.events.lock().expect("lock").clone()
    }
}

impl ProgressObserver for RecordingProgress {
    fn on_progress(&self, update: &ProgressUpdate<'_>) {
        self.events
            .lock()
            .expect("lock")
            .push((update.label.to_string(), update.processed, update.total));
    }
}
