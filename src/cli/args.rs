use clap::{Parser, Subcommand};
use std::path::PathBuf;

fn default_workers() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

#[derive(Parser)]
#[command(name = "epw-processor")]
#[command(about = "EPW weather archive loader and exporter")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load zipped EPW archives into the weather store
    Ingest {
        #[arg(
            short,
            long,
            required = true,
            num_args = 1..,
            help = "Directories containing EPW zip archives"
        )]
        source_dir: Vec<PathBuf>,

        #[arg(short, long, help = "Destination SQLite store")]
        db_path: PathBuf,

        #[arg(
            short,
            long,
            default_value_t = default_workers(),
            help = "Worker count; 0 processes archives fully sequentially"
        )]
        workers: usize,
    },

    /// Export the store to catalog-partitioned Parquet files
    Export {
        #[arg(short, long, help = "Source SQLite store")]
        db_path: PathBuf,

        #[arg(short, long, help = "Output directory for Parquet partitions")]
        output_dir: PathBuf,

        #[arg(short, long, default_value = "brotli")]
        compression: String,
    },

    /// Write a JSON snapshot of the store schema
    Schema {
        #[arg(short, long, help = "Source SQLite store")]
        db_path: PathBuf,

        #[arg(
            short,
            long,
            help = "Output JSON file [default: database_schema.json beside the store]"
        )]
        output: Option<PathBuf>,
    },

    /// Convert a CWEEDS wy3 file to EPW format
    Convert {
        #[arg(long, help = "Input wy3 weather file")]
        wy3: PathBuf,

        #[arg(short, long, help = "Base path for output .epw/.stat/.ddy/.zip files")]
        output: PathBuf,

        #[arg(long, help = "Template EPW supplying the 8 header lines")]
        epw_header: Option<PathBuf>,

        #[arg(long, help = "Companion .stat file to copy and bundle")]
        stat: Option<PathBuf>,

        #[arg(long, help = "Companion .ddy file to copy and bundle")]
        ddy: Option<PathBuf>,

        #[arg(
            long,
            default_value = "1",
            help = "1-based line number of the first wy3 record"
        )]
        first_record: usize,

        #[arg(long, default_value = "8760", help = "Number of records to convert")]
        record_count: usize,
    },

    /// Show row counts for every table in the store
    Info {
        #[arg(short, long, help = "Source SQLite store")]
        db_path: PathBuf,
    },
}
