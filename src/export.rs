// src/export.rs

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
    sync::Arc,
};
use tracing::info;

use crate::table::{BarrierRow, BARRIER_HEADER};

/// All-Utf8, nullable schema matching `BARRIER_HEADER`.
pub fn barrier_schema() -> Schema {
    Schema::new(
        BARRIER_HEADER
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    )
}

/// Write the barrier view to a Snappy-compressed Parquet file at `path`.
/// Returns the number of rows written.
pub fn write_barrier_parquet(rows: &[BarrierRow], path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let schema = Arc::new(barrier_schema());

    let columns: Vec<ArrayRef> = (0..BARRIER_HEADER.len())
        .map(|i| {
            Arc::new(rows.iter().map(|r| r.cells()[i]).collect::<StringArray>()) as ArrayRef
        })
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building barrier batch")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let tmp = path.with_extension("parquet.tmp");
    let file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), schema, Some(props))
        .context("creating Arrow writer for barrier export")?;
    writer.write(&batch).context("writing barrier batch")?;
    writer.close().context("closing barrier writer")?;
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;

    info!(path = %path.display(), rows = rows.len(), "exported barrier view");
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    #[test]
    fn writes_readable_parquet() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("out").join("barriers.parquet");
        let rows = vec![
            BarrierRow {
                date: Some("03-14-2024".into()),
                zipcode: Some("92880".into()),
                barrier_list: Some("Housing;Food".into()),
                ..Default::default()
            },
            BarrierRow {
                date: Some("03-15-2024".into()),
                ..Default::default()
            },
        ];

        assert_eq!(write_barrier_parquet(&rows, &path).unwrap(), 2);
        assert!(!path.with_extension("parquet.tmp").exists());

        let file = File::open(&path).unwrap();
        let mut reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let batch = reader.next().unwrap().unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), BARRIER_HEADER.len());

        let zip = batch
            .column(4)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(zip.value(0), "92880");
        assert!(zip.is_null(1));
    }

    #[test]
    fn empty_view_still_writes_schema() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("empty.parquet");
        assert_eq!(write_barrier_parquet(&[], &path).unwrap(), 0);
        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(&path).unwrap()).unwrap();
        assert_eq!(builder.schema().fields().len(), BARRIER_HEADER.len());
    }
}
