//! Download missing or changed archives, then extract everything present

use super::change::check_for_changes;
use super::extract::extract_archive;
use crate::error::{FailureStage, IngestError, ItemFailure, Result};
use crate::remote::{RemoteArtifact, RemoteSource};
use cnpj_common::text::format_bytes;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// What staging did, per archive
#[derive(Debug, Default)]
pub struct StageReport {
    /// Archives fetched in this run
    pub downloaded: Vec<String>,
    /// Archives whose local copy matched the remote size
    pub reused: Vec<String>,
    /// Files written to the extraction directory, in extraction order
    pub extracted: Vec<PathBuf>,
    pub failures: Vec<ItemFailure>,
}

/// Stages remote archives into the output and extraction directories
pub struct ArchiveStager<'a> {
    remote: &'a dyn RemoteSource,
    output_dir: PathBuf,
    extract_dir: PathBuf,
}

impl<'a> ArchiveStager<'a> {
    pub fn new(
        remote: &'a dyn RemoteSource,
        output_dir: impl Into<PathBuf>,
        extract_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            remote,
            output_dir: output_dir.into(),
            extract_dir: extract_dir.into(),
        }
    }

    /// Create both working directories if absent
    pub fn prepare_dirs(&self) -> Result<()> {
        for dir in [&self.output_dir, &self.extract_dir] {
            std::fs::create_dir_all(dir)
                .map_err(|source| IngestError::CreateDir { path: dir.clone(), source })?;
        }
        Ok(())
    }

    pub fn archive_path(&self, artifact: &RemoteArtifact) -> PathBuf {
        self.output_dir.join(&artifact.name)
    }

    /// Download what changed, then extract every listed archive found locally
    ///
    /// Failures are isolated per archive and collected in the report.
    pub async fn stage(&self, artifacts: &[RemoteArtifact]) -> StageReport {
        let mut report = StageReport::default();

        for artifact in artifacts {
            self.fetch_one(artifact, &mut report).await;
        }

        info!(
            downloaded = report.downloaded.len(),
            reused = report.reused.len(),
            "Downloads finished"
        );

        for artifact in artifacts {
            self.extract_one(artifact, &mut report);
        }

        info!(files = report.extracted.len(), "Extraction finished");

        report
    }

    async fn fetch_one(&self, artifact: &RemoteArtifact, report: &mut StageReport) {
        let path = self.archive_path(artifact);

        let check = match check_for_changes(self.remote, artifact, &path).await {
            Ok(check) => check,
            Err(err) => {
                error!(archive = %artifact.name, error = %err, "Change check failed");
                report.failures.push(ItemFailure::new(FailureStage::Download, &artifact.name, &err));
                return;
            },
        };

        if let Some(ref err) = check.probe_error {
            report.failures.push(ItemFailure::new(FailureStage::Probe, &artifact.name, err));
        }

        if !check.decision.must_fetch() {
            info!(archive = %artifact.name, "Archive unchanged, skipping download");
            report.reused.push(artifact.name.clone());
            return;
        }

        match self.remote.download(artifact, &path).await {
            Ok(bytes) => {
                info!(archive = %artifact.name, size = %format_bytes(bytes), "Downloaded archive");
                report.downloaded.push(artifact.name.clone());
            },
            Err(err) => {
                error!(archive = %artifact.name, error = %err, "Download failed");
                report.failures.push(ItemFailure::new(FailureStage::Download, &artifact.name, &err));
            },
        }
    }

    fn extract_one(&self, artifact: &RemoteArtifact, report: &mut StageReport) {
        let path = self.archive_path(artifact);

        if !path.is_file() {
            let err = IngestError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("archive not present locally: {}", path.display()),
            ));
            warn!(archive = %artifact.name, "Nothing to extract");
            report.failures.push(ItemFailure::new(FailureStage::Extract, &artifact.name, &err));
            return;
        }

        info!(archive = %artifact.name, "Extracting archive");

        match extract_archive(&path, &self.extract_dir) {
            Ok(files) => report.extracted.extend(files),
            Err(err) => {
                error!(archive = %artifact.name, error = %err, "Extraction failed");
                report.failures.push(ItemFailure::new(FailureStage::Extract, &artifact.name, &err));
            },
        }
    }
}
