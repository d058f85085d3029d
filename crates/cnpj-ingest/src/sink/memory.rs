//! In-memory sink
//!
//! Backs `--dry-run`, where files are parsed and counted but nothing is
//! written, and the test-suite, where the appended rows are inspected.

use super::TableSink;
use crate::error::{IngestError, Result};
use crate::schema::{Row, TableSchema};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default, Clone)]
pub struct MemoryTable {
    pub row_count: u64,
    /// Size of every appended batch, in append order
    pub batches: Vec<usize>,
    /// Appended rows; empty for a counting sink
    pub rows: Vec<Row>,
}

/// Keeps destination tables in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: BTreeMap<&'static str, MemoryTable>,
    indexes: BTreeSet<&'static str>,
    keep_rows: bool,
    drops: usize,
}

impl MemorySink {
    /// Sink that keeps every appended row
    pub fn new() -> Self {
        Self { keep_rows: true, ..Self::default() }
    }

    /// Sink that only counts rows and batches
    pub fn counting() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&MemoryTable> {
        self.tables.get(name)
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.contains(name)
    }

    /// Number of `drop_table` calls so far
    pub fn drop_count(&self) -> usize {
        self.drops
    }
}

#[async_trait]
impl TableSink for MemorySink {
    async fn drop_table(&mut self, schema: &TableSchema) -> Result<()> {
        self.drops += 1;
        self.tables.remove(schema.table);
        if let Some(index) = schema.index {
            self.indexes.remove(index.name);
        }
        Ok(())
    }

    async fn append(&mut self, schema: &TableSchema, rows: &[Row]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let table = self.tables.entry(schema.table).or_default();
        table.row_count += rows.len() as u64;
        table.batches.push(rows.len());
        if self.keep_rows {
            table.rows.extend_from_slice(rows);
        }

        Ok(rows.len() as u64)
    }

    async fn create_index(&mut self, schema: &TableSchema) -> Result<bool> {
        let Some(index) = schema.index else {
            return Ok(false);
        };

        if !self.tables.contains_key(schema.table) {
            return Err(IngestError::MissingTable(schema.table.to_string()));
        }

        self.indexes.insert(index.name);
        Ok(true)
    }

    async fn row_count(&mut self, schema: &TableSchema) -> Result<u64> {
        self.tables
            .get(schema.table)
            .map(|t| t.row_count)
            .ok_or_else(|| IngestError::MissingTable(schema.table.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::schema::{DatasetCategory, Value};

    fn country(code: i32, name: &str) -> Row {
        vec![Value::Integer(Some(code)), Value::Text(Some(name.to_string()))]
    }

    #[tokio::test]
    async fn test_append_creates_table_and_counts() {
        let schema = DatasetCategory::Country.schema();
        let mut sink = MemorySink::new();

        assert!(sink.row_count(schema).await.is_err());

        sink.append(schema, &[country(105, "BRASIL"), country(249, "ESTADOS UNIDOS")])
            .await
            .unwrap();
        sink.append(schema, &[country(160, "JAPAO")]).await.unwrap();

        assert_eq!(sink.row_count(schema).await.unwrap(), 3);
        let table = sink.table("pais").unwrap();
        assert_eq!(table.batches, vec![2, 1]);
        assert_eq!(table.rows[2], country(160, "JAPAO"));
    }

    #[tokio::test]
    async fn test_drop_discards_rows_and_index() {
        let schema = DatasetCategory::Company.schema();
        let mut sink = MemorySink::new();
        let row = vec![
            Value::Text(Some("1".into())),
            Value::Text(None),
            Value::Integer(None),
            Value::Integer(None),
            Value::Decimal(0.0),
            Value::Integer(None),
            Value::Text(None),
        ];

        sink.append(schema, &[row]).await.unwrap();
        assert!(sink.create_index(schema).await.unwrap());
        assert!(sink.has_index("empresa_cnpj"));

        sink.drop_table(schema).await.unwrap();
        assert!(sink.table("empresa").is_none());
        assert!(!sink.has_index("empresa_cnpj"));
        assert!(sink.create_index(schema).await.is_err());
        assert_eq!(sink.drop_count(), 1);
    }

    #[tokio::test]
    async fn test_counting_sink_keeps_no_rows() {
        let schema = DatasetCategory::Country.schema();
        let mut sink = MemorySink::counting();

        sink.append(schema, &[country(105, "BRASIL")]).await.unwrap();

        let table = sink.table("pais").unwrap();
        assert_eq!(table.row_count, 1);
        assert!(table.rows.is_empty());
        assert!(!sink.create_index(schema).await.unwrap());
    }
}
