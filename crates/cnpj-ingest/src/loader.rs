//! Chunked table loader
//!
//! Streams one extracted file into its destination table. Records are read
//! `;`-delimited without a header, decoded from Latin-1 and appended in file
//! order, one batch per chunk (or one batch for the whole file on reference
//! tables).

use crate::error::{IngestError, Result};
use crate::progress::{ProgressObserver, ProgressUpdate};
use crate::schema::{ChunkPolicy, Row, TableSchema};
use crate::sink::TableSink;
use cnpj_common::text::decode_latin1;
use csv::{ByteRecord, Reader, ReaderBuilder};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Outcome of a successful file load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows: u64,
    pub batches: u64,
}

fn open_reader(path: &Path) -> Result<Reader<File>> {
    Ok(ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_path(path)?)
}

/// Count the records in a file with a full pass
pub fn count_records(path: &Path) -> Result<u64> {
    let mut reader = open_reader(path)?;
    let mut record = ByteRecord::new();
    let mut count = 0u64;

    while reader.read_byte_record(&mut record)? {
        count += 1;
    }

    Ok(count)
}

/// Load one file into the table described by `schema`
///
/// A failing record aborts the file; batches appended before it stay in the
/// table.
pub async fn load_file(
    path: &Path,
    schema: &TableSchema,
    chunk_size_override: Option<usize>,
    sink: &mut dyn TableSink,
    progress: &dyn ProgressObserver,
) -> Result<LoadStats> {
    let total = count_records(path)?;
    let chunk = match schema.chunk_policy(chunk_size_override) {
        ChunkPolicy::Rows(n) => n,
        ChunkPolicy::Whole => usize::MAX,
    };

    info!(file = %path.display(), table = schema.table, records = total, "Loading file");
    progress.on_start(schema.table, total);

    let result = append_chunks(path, schema, chunk, total, sink, progress).await;
    progress.on_finish(schema.table);

    let stats = result?;
    info!(
        file = %path.display(),
        table = schema.table,
        rows = stats.rows,
        batches = stats.batches,
        "Loaded file"
    );
    Ok(stats)
}

async fn append_chunks(
    path: &Path,
    schema: &TableSchema,
    chunk: usize,
    total: u64,
    sink: &mut dyn TableSink,
    progress: &dyn ProgressObserver,
) -> Result<LoadStats> {
    let mut reader = open_reader(path)?;
    let mut record = ByteRecord::new();
    let mut batch: Vec<Row> = Vec::with_capacity(chunk.min(total as usize));
    let mut stats = LoadStats::default();
    let mut record_no = 0u64;

    loop {
        let more = reader
            .read_byte_record(&mut record)
            .map_err(|e| IngestError::Record { record: record_no + 1, message: e.to_string() })?;

        if more {
            record_no += 1;
            let row = schema
                .parse_record(record.iter().map(decode_latin1))
                .map_err(|e| e.at_record(record_no))?;
            batch.push(row);
        }

        if batch.len() >= chunk || (!more && !batch.is_empty()) {
            stats.rows += sink.append(schema, &batch).await?;
            stats.batches += 1;
            batch.clear();

            debug!(table = schema.table, processed = stats.rows, "Appended batch");
            progress.on_progress(&ProgressUpdate {
                label: schema.table,
                processed: stats.rows,
                total,
            });
        }

        if !more {
            break;
        }
    }

    Ok(stats)
}
