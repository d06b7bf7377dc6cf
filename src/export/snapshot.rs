use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{fs::File, path::Path, sync::Arc};
use tracing::info;

use crate::process::LongTable;

pub fn long_schema() -> Schema {
    Schema::new(vec![
        Field::new("entity", DataType::Utf8, false),
        Field::new("year", DataType::Int32, false),
        Field::new("value", DataType::Float64, false),
    ])
}

/// Write a long table as a single Snappy-compressed Parquet row group.
pub fn write_long_parquet(table: &LongTable, path: &Path) -> Result<()> {
    let schema = Arc::new(long_schema());

    let entities: ArrayRef = Arc::new(StringArray::from_iter_values(
        table.records.iter().map(|r| r.entity.as_str()),
    ));
    let years: ArrayRef = Arc::new(Int32Array::from_iter_values(
        table.records.iter().map(|r| r.year),
    ));
    let values: ArrayRef = Arc::new(Float64Array::from_iter_values(
        table.records.iter().map(|r| r.value),
    ));

    let batch = RecordBatch::try_new(schema.clone(), vec![entities, years, values])
        .with_context(|| format!("building record batch for {}", table.key))?;
    let file =
        File::create(path).with_context(|| format!("creating parquet file {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))
        .context("creating Arrow writer")?;
    writer.write(&batch).context("writing long table batch")?;
    writer.close().context("closing parquet writer")?;

    info!(rows = table.len(), "parquet snapshot written: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{EntityKind, LongRecord};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    #[test]
    fn test_parquet_snapshot_preserves_rows() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("地区生产总值分省.parquet");
        let table = LongTable {
            key: "地区生产总值分省".into(),
            entity_kind: EntityKind::Province,
            records: vec![
                LongRecord { entity: "广东".into(), year: 2021, value: 124369.7 },
                LongRecord { entity: "江苏".into(), year: 2021, value: 116364.2 },
                LongRecord { entity: "广东".into(), year: 2022, value: 129118.6 },
            ],
        };
        write_long_parquet(&table, &path)?;

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?.build()?;
        let batches: Vec<RecordBatch> = reader.collect::<std::result::Result<_, _>>()?;
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 3);

        let batch = &batches[0];
        assert_eq!(batch.schema().field(1).name(), "year");
        let years = batch
            .column(1)
            .as_any()
            .downcast_ref::<Int32Array>()
            .expect("year column");
        assert_eq!(years.values().to_vec(), vec![2021, 2021, 2022]);
        Ok(())
    }
}
