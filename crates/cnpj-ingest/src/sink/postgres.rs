//! PostgreSQL sink
//!
//! Batches are written as multi-row `INSERT`s inside one transaction per
//! batch. A statement carries at most [`MAX_BIND_PARAMS`] parameters, so wide
//! tables are split into more statements than narrow ones.

use super::TableSink;
use crate::error::Result;
use crate::schema::{Row, TableSchema, Value};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};

/// PostgreSQL limit on bind parameters per statement
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Rows per `INSERT` for a table with `columns` columns
pub fn rows_per_statement(columns: usize) -> usize {
    (MAX_BIND_PARAMS / columns.max(1)).max(1)
}

/// Writes destination tables into PostgreSQL
pub struct PgTableSink {
    pool: PgPool,
    /// Tables created by this sink since they were last dropped
    created: HashSet<&'static str>,
}

impl PgTableSink {
    /// Connect with a two-connection pool: one for DDL, one for inserts
    pub async fn connect(options: PgConnectOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool, created: HashSet::new() }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn ensure_table(&mut self, schema: &TableSchema) -> Result<()> {
        if self.created.contains(schema.table) {
            return Ok(());
        }

        sqlx::query(&schema.create_table_sql()).execute(&self.pool).await?;
        debug!(table = schema.table, "Created table");
        self.created.insert(schema.table);
        Ok(())
    }
}

#[async_trait]
impl TableSink for PgTableSink {
    async fn drop_table(&mut self, schema: &TableSchema) -> Result<()> {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", schema.table))
            .execute(&self.pool)
            .await?;
        self.created.remove(schema.table);
        info!(table = schema.table, "Dropped table");
        Ok(())
    }

    async fn append(&mut self, schema: &TableSchema, rows: &[Row]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        self.ensure_table(schema).await?;

        let columns = schema.column_names().collect::<Vec<_>>().join(", ");
        let mut tx = self.pool.begin().await?;

        for statement_rows in rows.chunks(rows_per_statement(schema.columns.len())) {
            let mut query_builder: QueryBuilder<Postgres> =
                QueryBuilder::new(format!("INSERT INTO {} ({}) ", schema.table, columns));

            query_builder.push_values(statement_rows, |mut b, row| {
                for value in row {
                    match value {
                        Value::Text(v) => b.push_bind(v.as_deref()),
                        Value::Integer(v) => b.push_bind(*v),
                        Value::Decimal(v) => b.push_bind(*v),
                    };
                }
            });

            query_builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        Ok(rows.len() as u64)
    }

    async fn create_index(&mut self, schema: &TableSchema) -> Result<bool> {
        let Some(sql) = schema.create_index_sql() else {
            return Ok(false);
        };

        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(true)
    }

    async fn row_count(&mut self, schema: &TableSchema) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", schema.table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
