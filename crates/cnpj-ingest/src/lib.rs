//! CNPJ Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Bulk loader for the Brazilian federal company registry (CNPJ) open data.
//!
//! A run lists the monthly archive directory, downloads the archives whose
//! size changed, extracts them, classifies the extracted files into ten
//! dataset categories and reloads one PostgreSQL table per category.
//!
//! # Modules
//!
//! - **remote**: directory listing, size probes and downloads
//! - **stage**: change detection, download and extraction
//! - **classify**: file name to dataset category
//! - **schema**: destination table descriptors
//! - **loader**: chunked, ordered loading of one file
//! - **sink**: PostgreSQL and in-memory table sinks
//! - **pipeline**: the sequential driver and its run report
//!
//! # Example
//!
//! ```no_run
//! use cnpj_ingest::config::IngestConfig;
//! use cnpj_ingest::pipeline::{Pipeline, PipelineConfig};
//! use cnpj_ingest::progress::LogProgress;
//! use cnpj_ingest::remote::HttpRemote;
//! use cnpj_ingest::sink::PgTableSink;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let remote = HttpRemote::new(&config.base_url, config.probe_timeout())?;
//!     let mut sink = PgTableSink::connect(config.database.connect_options()).await?;
//!
//!     let report = Pipeline::new(PipelineConfig::from(&config), &remote, &mut sink, &LogProgress)
//!         .run()
//!         .await?;
//!     println!("{} rows loaded", report.total_rows());
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod progress;
pub mod remote;
pub mod schema;
pub mod sink;
pub mod stage;

pub use error::{IngestError, Result};
pub use pipeline::{Pipeline, PipelineConfig, RunReport};
pub use schema::DatasetCategory;
