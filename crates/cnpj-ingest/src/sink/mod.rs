//! Destination table sinks
//!
//! A sink owns the destination tables. The loader only ever appends whole
//! batches; DDL (drop, implicit create, index) goes through the same handle
//! but is never interleaved with an append.

pub mod memory;
pub mod postgres;

pub use memory::MemorySink;
pub use postgres::PgTableSink;

use crate::error::Result;
use crate::schema::{Row, TableSchema};
use async_trait::async_trait;

/// Capability to recreate, fill and index destination tables
#[async_trait]
pub trait TableSink: Send {
    /// `DROP TABLE IF EXISTS`
    async fn drop_table(&mut self, schema: &TableSchema) -> Result<()>;

    /// Append one batch in order, creating the table on first use.
    /// Returns the number of rows written.
    async fn append(&mut self, schema: &TableSchema, rows: &[Row]) -> Result<u64>;

    /// `CREATE INDEX IF NOT EXISTS`; returns `false` when the table has no index
    async fn create_index(&mut self, schema: &TableSchema) -> Result<bool>;

    /// Current number of rows in the table
    async fn row_count(&mut self, schema: &TableSchema) -> Result<u64>;
}
