use crate::db::schema::{table_info, table_names, ColumnInfo};
use crate::db::WeatherStore;
use crate::error::Result;
use crate::utils::constants::DEFAULT_ROW_GROUP_SIZE;
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{BrotliLevel, Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use rusqlite::types::Value;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Re-exports the store's tables as compressed Parquet files partitioned
/// by catalog.
///
/// Each partition directory `catalog=<catalog>` receives one file per
/// location-bearing table, filtered to that partition's location ids;
/// tables without a location reference land once at the export root.
pub struct PartitionedExporter {
    compression: Compression,
    row_group_size: usize,
}

#[derive(Debug)]
pub struct ExportSummary {
    pub partitions: usize,
    pub files_written: usize,
}

impl PartitionedExporter {
    pub fn new() -> Self {
        Self {
            compression: Compression::BROTLI(BrotliLevel::default()),
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            "snappy" => Compression::SNAPPY,
            "gzip" => Compression::GZIP(GzipLevel::default()),
            "brotli" => Compression::BROTLI(BrotliLevel::default()),
            "lz4" => Compression::LZ4,
            "zstd" => Compression::ZSTD(ZstdLevel::default()),
            "none" => Compression::UNCOMPRESSED,
            _ => {
                return Err(crate::error::ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    pub fn export(&self, store: &WeatherStore, output_dir: &Path) -> Result<ExportSummary> {
        std::fs::create_dir_all(output_dir)?;

        let catalogs = store.catalogs()?;
        let tables = table_names(store.connection())?;
        let mut files_written = 0;

        for catalog in &catalogs {
            let partition_dir = output_dir.join(format!("catalog={}", catalog));
            std::fs::create_dir_all(&partition_dir)?;

            let location_ids = store.location_ids_for_catalog(catalog)?;

            for table in &tables {
                let dest = partition_dir.join(format!("{}.parquet", table));

                if table == "locations_metadata" {
                    let rows = store.fetch_rows(table, Some(("id", &location_ids)))?;
                    self.write_table(store, table, &rows, &dest)?;
                    files_written += 1;
                } else if store.has_location_reference(table)? {
                    let rows = store.fetch_rows(table, Some(("location_id", &location_ids)))?;
                    self.write_table(store, table, &rows, &dest)?;
                    files_written += 1;
                } else {
                    // Location-free tables are written once, at the root
                    let root_dest = output_dir.join(format!("{}.parquet", table));
                    if !root_dest.exists() {
                        let rows = store.fetch_rows(table, None)?;
                        self.write_table(store, table, &rows, &root_dest)?;
                        files_written += 1;
                    }
                }
            }
        }

        Ok(ExportSummary {
            partitions: catalogs.len(),
            files_written,
        })
    }

    fn write_table(
        &self,
        store: &WeatherStore,
        table: &str,
        rows: &[Vec<Value>],
        dest: &Path,
    ) -> Result<()> {
        let columns = table_info(store.connection(), table)?;
        let schema = build_schema(&columns);

        let file = File::create(dest)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();
        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        if !rows.is_empty() {
            let batch = rows_to_batch(&columns, rows, schema)?;
            writer.write(&batch)?;
        }
        writer.close()?;

        Ok(())
    }
}

impl Default for PartitionedExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportSummary {
    pub fn summary(&self) -> String {
        format!(
            "Export complete: {} partitions, {} Parquet files",
            self.partitions, self.files_written
        )
    }
}

fn build_schema(columns: &[ColumnInfo]) -> Arc<Schema> {
    let fields: Vec<Field> = columns
        .iter()
        .map(|col| {
            let data_type = if col.is_integer() {
                DataType::Int64
            } else if col.is_real() {
                DataType::Float64
            } else {
                DataType::Utf8
            };
            Field::new(col.name.as_str(), data_type, !col.primary_key)
        })
        .collect();
    Arc::new(Schema::new(fields))
}

fn rows_to_batch(
    columns: &[ColumnInfo],
    rows: &[Vec<Value>],
    schema: Arc<Schema>,
) -> Result<RecordBatch> {
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());

    for (idx, col) in columns.iter().enumerate() {
        let array: ArrayRef = if col.is_integer() {
            let values: Vec<Option<i64>> = rows
                .iter()
                .map(|row| match &row[idx] {
                    Value::Integer(v) => Some(*v),
                    Value::Real(v) => Some(*v as i64),
                    _ => None,
                })
                .collect();
            Arc::new(Int64Array::from(values))
        } else if col.is_real() {
            let values: Vec<Option<f64>> = rows
                .iter()
                .map(|row| match &row[idx] {
                    Value::Real(v) => Some(*v),
                    Value::Integer(v) => Some(*v as f64),
                    _ => None,
                })
                .collect();
            Arc::new(Float64Array::from(values))
        } else {
            let values: Vec<Option<String>> = rows
                .iter()
                .map(|row| match &row[idx] {
                    Value::Text(s) => Some(s.clone()),
                    Value::Integer(v) => Some(v.to_string()),
                    Value::Real(v) => Some(v.to_string()),
                    _ => None,
                })
                .collect();
            Arc::new(StringArray::from(values))
        };
        arrays.push(array);
    }

    Ok(RecordBatch::try_new(schema, arrays)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::design_day::HumidityType;
    use crate::models::{DesignDayBlock, HourlyRecord, Location};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::TempDir;

    fn location(catalog: &str) -> Location {
        Location {
            station_name: format!("{} Station", catalog),
            state_province: "ON".to_string(),
            country: "CAN".to_string(),
            latitude: 45.0,
            longitude: -75.0,
            elevation: 100.0,
            timezone: -5.0,
            source_type: catalog.to_string(),
            wmo_station_id: "716280".to_string(),
            comment_1: String::new(),
            comment_2: String::new(),
            epw_file: format!("Test_{}.epw", catalog),
            catalog: catalog.to_string(),
        }
    }

    fn populated_store() -> Result<WeatherStore> {
        let mut store = WeatherStore::open_in_memory()?;
        for catalog in ["TMY", "CWEC"] {
            let id = store.insert_location(&location(catalog))?;
            let records: Vec<HourlyRecord> = (1..=24)
                .map(|i| HourlyRecord {
                    hour_index: i,
                    year: Some(1995),
                    month: Some(1),
                    day: Some(1),
                    hour: Some(i as i64),
                    minute: Some(0),
                    dry_bulb: Some(-4.5),
                    ..Default::default()
                })
                .collect();
            store.insert_hourly(id, &records)?;
            store.insert_design_days(
                id,
                &[DesignDayBlock::new(
                    "Heating 99.6%",
                    1,
                    1,
                    -24.0,
                    0.001,
                    HumidityType::HumidityRatio,
                )],
            )?;
        }
        Ok(store)
    }

    fn parquet_row_count(path: &Path) -> Result<usize> {
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        let mut rows = 0;
        for batch in reader {
            rows += batch?.num_rows();
        }
        Ok(rows)
    }

    #[test]
    fn test_export_partitions_by_catalog() -> Result<()> {
        let store = populated_store()?;
        let out = TempDir::new()?;

        let summary = PartitionedExporter::new().export(&store, out.path())?;
        assert_eq!(summary.partitions, 2);

        for catalog in ["TMY", "CWEC"] {
            let partition = out.path().join(format!("catalog={}", catalog));
            assert!(partition.join("locations_metadata.parquet").exists());
            assert!(partition.join("hourly_data.parquet").exists());
            assert!(partition.join("design_days.parquet").exists());

            assert_eq!(
                parquet_row_count(&partition.join("locations_metadata.parquet"))?,
                1
            );
            assert_eq!(parquet_row_count(&partition.join("hourly_data.parquet"))?, 24);
        }
        Ok(())
    }

    #[test]
    fn test_empty_tables_still_export() -> Result<()> {
        let store = populated_store()?;
        let out = TempDir::new()?;

        PartitionedExporter::new().export(&store, out.path())?;

        // No ground temperature metadata was loaded, but the file exists
        let path = out
            .path()
            .join("catalog=TMY")
            .join("ground_temperatures_data.parquet");
        assert!(path.exists());
        assert_eq!(parquet_row_count(&path)?, 0);
        Ok(())
    }

    #[test]
    fn test_compression_options() -> Result<()> {
        for compression in ["snappy", "gzip", "brotli", "lz4", "zstd", "none"] {
            let store = populated_store()?;
            let out = TempDir::new()?;
            let exporter = PartitionedExporter::new().with_compression(compression)?;
            assert!(
                exporter.export(&store, out.path()).is_ok(),
                "failed with compression: {}",
                compression
            );
        }
        Ok(())
    }

    #[test]
    fn test_unknown_compression_is_rejected() {
        assert!(PartitionedExporter::new().with_compression("lzma").is_err());
    }
}
