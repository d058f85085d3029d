//! CNPJ Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities for the CNPJ loader workspace.
//!
//! # Overview
//!
//! - **Logging**: tracing subscriber setup driven by `LogConfig`
//! - **Text**: legacy single-byte decoding and human-readable counters
//!
//! # Example
//!
//! ```no_run
//! use cnpj_common::logging::{init_logging, LogConfig};
//! use cnpj_common::text::format_count;
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!(rows = %format_count(1_234_567), "Loaded");
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod text;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel, LogOutput};
