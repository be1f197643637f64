use crate::archive::ArchiveIngestor;
use crate::cli::args::{Cli, Commands};
use crate::convert::{run_conversion, ConvertOptions};
use crate::db::schema::{schema_snapshot, table_names};
use crate::db::WeatherStore;
use crate::error::Result;
use crate::writers::PartitionedExporter;

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ingest {
            source_dir,
            db_path,
            workers,
        } => {
            let ingestor = ArchiveIngestor::from_directories(&source_dir, workers)?;
            println!(
                "Found {} archives in {} source directories",
                ingestor.archive_count(),
                source_dir.len()
            );
            if workers == 0 {
                println!("Processing sequentially");
            } else {
                println!("Processing with up to {} workers", workers);
            }

            let (summary, outcomes) = ingestor.ingest_all(&db_path).await?;

            for outcome in outcomes.iter().filter(|o| !o.succeeded()) {
                println!(
                    "  failed: {} (stage: {})",
                    outcome.archive.display(),
                    outcome.stage
                );
            }
            println!(
                "Processed {}/{} archives in {:.2} seconds",
                summary.succeeded,
                summary.total,
                summary.elapsed.as_secs_f64()
            );
        }

        Commands::Export {
            db_path,
            output_dir,
            compression,
        } => {
            println!("Exporting {} to {}", db_path.display(), output_dir.display());

            let store = WeatherStore::open(&db_path)?;
            let exporter = PartitionedExporter::new().with_compression(&compression)?;
            let summary = exporter.export(&store, &output_dir)?;

            println!("{}", summary.summary());
        }

        Commands::Schema { db_path, output } => {
            let store = WeatherStore::open(&db_path)?;
            let snapshot = schema_snapshot(store.connection())?;

            let output = output.unwrap_or_else(|| {
                db_path
                    .parent()
                    .unwrap_or_else(|| std::path::Path::new("."))
                    .join("database_schema.json")
            });
            let json = serde_json::to_string_pretty(&snapshot)?;
            std::fs::write(&output, json)?;

            println!("Schema for {} tables written to {}", snapshot.len(), output.display());
        }

        Commands::Convert {
            wy3,
            output,
            epw_header,
            stat,
            ddy,
            first_record,
            record_count,
        } => {
            println!("Converting {} ({} records)", wy3.display(), record_count);

            let mut options = ConvertOptions::new(wy3, output, first_record);
            options.epw_header = epw_header;
            options.stat_file = stat;
            options.ddy_file = ddy;
            options.record_count = record_count;

            let report = run_conversion(&options)?;
            println!(
                "Wrote {} records to {}",
                report.records_written,
                report.epw_path.display()
            );
            println!("Bundled output in {}", report.zip_path.display());
        }

        Commands::Info { db_path } => {
            let store = WeatherStore::open(&db_path)?;
            println!("Store: {}", db_path.display());
            for table in table_names(store.connection())? {
                println!("  {}: {} rows", table, store.row_count(&table)?);
            }
        }
    }

    Ok(())
}
