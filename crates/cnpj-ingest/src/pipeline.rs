//! Pipeline driver
//!
//! Runs one full refresh, strictly in sequence:
//!
//! ```text
//! Init -> ListRemote -> Stage -> Classify -> Load (per category) -> BuildIndexes -> Done
//! ```
//!
//! Listing, directory creation and `DROP TABLE` failures end the run. Any
//! other failure is scoped to one archive, file or index and recorded in the
//! [`RunReport`].

use crate::classify::{list_extracted, ClassifiedFiles};
use crate::config::IngestConfig;
use crate::error::{FailureStage, IngestError, ItemFailure, Result};
use crate::loader::load_file;
use crate::progress::ProgressObserver;
use crate::remote::RemoteSource;
use crate::schema::DatasetCategory;
use crate::sink::TableSink;
use crate::stage::ArchiveStager;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Pipeline stages, logged at every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Init,
    ListRemote,
    Stage,
    Classify,
    Load,
    BuildIndexes,
    Done,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Init => "init",
            PipelineStage::ListRemote => "list_remote",
            PipelineStage::Stage => "stage",
            PipelineStage::Classify => "classify",
            PipelineStage::Load => "load",
            PipelineStage::BuildIndexes => "build_indexes",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// What the driver needs to know about the environment
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Listing location, used in error messages
    pub base_url: String,
    pub output_dir: PathBuf,
    pub extract_dir: PathBuf,
    pub chunk_size: Option<usize>,
}

impl From<&IngestConfig> for PipelineConfig {
    fn from(config: &IngestConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            output_dir: config.output_dir.clone(),
            extract_dir: config.extract_dir.clone(),
            chunk_size: config.chunk_size,
        }
    }
}

/// Load outcome for one destination table
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub category: DatasetCategory,
    pub table: &'static str,
    /// Files classified into this table
    pub files: usize,
    /// Files loaded without error
    pub files_loaded: usize,
    /// Rows appended during this run
    pub rows: u64,
    pub batches: u64,
}

/// Summary of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Archives in the remote listing
    pub artifacts: usize,
    pub downloaded: Vec<String>,
    pub reused: Vec<String>,
    pub extracted: usize,
    /// Files in the extraction directory matching no category
    pub ignored_files: usize,
    pub tables: Vec<TableReport>,
    pub indexes_built: Vec<&'static str>,
    pub failures: Vec<ItemFailure>,
}

impl RunReport {
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.rows).sum()
    }

    pub fn table(&self, category: DatasetCategory) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.category == category)
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Sequential driver over a remote source and a table sink
pub struct Pipeline<'a> {
    config: PipelineConfig,
    remote: &'a dyn RemoteSource,
    sink: &'a mut dyn TableSink,
    progress: &'a dyn ProgressObserver,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: PipelineConfig,
        remote: &'a dyn RemoteSource,
        sink: &'a mut dyn TableSink,
        progress: &'a dyn ProgressObserver,
    ) -> Self {
        Self { config, remote, sink, progress }
    }

    fn enter(&self, stage: PipelineStage) {
        info!(stage = %stage, "Pipeline stage");
    }

    /// Run a full refresh
    pub async fn run(mut self) -> Result<RunReport> {
        let started_at = Utc::now();
        self.enter(PipelineStage::Init);

        self.enter(PipelineStage::ListRemote);
        let artifacts = self.remote.list_archives().await?;
        if artifacts.is_empty() {
            return Err(IngestError::EmptyListing(self.config.base_url.clone()));
        }
        info!(count = artifacts.len(), "Found remote archives");

        self.enter(PipelineStage::Stage);
        let stager =
            ArchiveStager::new(self.remote, &self.config.output_dir, &self.config.extract_dir);
        stager.prepare_dirs()?;
        let staged = stager.stage(&artifacts).await;
        let mut failures = staged.failures;

        self.enter(PipelineStage::Classify);
        let classified = ClassifiedFiles::from_paths(list_extracted(&self.config.extract_dir)?);
        info!(
            classified = classified.classified_count(),
            ignored = classified.ignored_count(),
            "Classified extracted files"
        );

        self.enter(PipelineStage::Load);
        let mut tables = Vec::with_capacity(DatasetCategory::ALL.len());
        for category in DatasetCategory::ALL {
            let report = self.load_category(category, &classified, &mut failures).await?;
            tables.push(report);
        }

        self.enter(PipelineStage::BuildIndexes);
        let indexes_built = self.build_indexes(&mut failures).await;

        self.enter(PipelineStage::Done);

        Ok(RunReport {
            started_at,
            finished_at: Utc::now(),
            artifacts: artifacts.len(),
            downloaded: staged.downloaded,
            reused: staged.reused,
            extracted: staged.extracted.len(),
            ignored_files: classified.ignored_count(),
            tables,
            indexes_built,
            failures,
        })
    }

    async fn load_category(
        &mut self,
        category: DatasetCategory,
        classified: &ClassifiedFiles,
        failures: &mut Vec<ItemFailure>,
    ) -> Result<TableReport> {
        let schema = category.schema();
        let files = classified.files(category);

        // Recreated every run, even with no files to load
        self.sink.drop_table(schema).await?;

        let mut report = TableReport {
            category,
            table: schema.table,
            files: files.len(),
            files_loaded: 0,
            rows: 0,
            batches: 0,
        };

        if files.is_empty() {
            warn!(table = schema.table, "No files classified for table");
            return Ok(report);
        }

        for path in files {
            match load_file(path, schema, self.config.chunk_size, &mut *self.sink, self.progress).await {
                Ok(stats) => {
                    report.files_loaded += 1;
                    report.rows += stats.rows;
                    report.batches += stats.batches;
                },
                Err(err) => {
                    error!(file = %path.display(), table = schema.table, error = %err, "Load failed");
                    failures.push(ItemFailure::new(
                        FailureStage::Load,
                        path.display().to_string(),
                        &err,
                    ));
                },
            }
        }

        info!(table = schema.table, rows = report.rows, "Table loaded");
        Ok(report)
    }

    async fn build_indexes(&mut self, failures: &mut Vec<ItemFailure>) -> Vec<&'static str> {
        let mut built = Vec::new();

        for category in DatasetCategory::ALL {
            let schema = category.schema();
            let Some(index) = schema.index else {
                continue;
            };

            match self.sink.create_index(schema).await {
                Ok(_) => {
                    info!(index = index.name, table = schema.table, "Index ready");
                    built.push(index.name);
                },
                Err(err) => {
                    error!(index = index.name, error = %err, "Index creation failed");
                    failures.push(ItemFailure::new(FailureStage::Index, index.name, &err));
                },
            }
        }

        built
    }
}
