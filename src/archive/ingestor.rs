use crate::archive::EpwExtractor;
use crate::db::WeatherStore;
use crate::error::{ProcessingError, Result};
use crate::processors::DesignDayDeriver;
use crate::readers::{EpwFileReader, HeaderReader, HourlyReader};
use crate::utils::progress::ProgressReporter;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Progress of one archive through its load pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Extracting,
    HeaderParsed,
    MetadataParsed,
    HourlyLoaded,
    DesignDaysLoaded,
    Done,
}

impl std::fmt::Display for IngestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            IngestStage::Extracting => "extracting",
            IngestStage::HeaderParsed => "header parsed",
            IngestStage::MetadataParsed => "metadata parsed",
            IngestStage::HourlyLoaded => "hourly loaded",
            IngestStage::DesignDaysLoaded => "design days loaded",
            IngestStage::Done => "done",
        };
        write!(f, "{}", label)
    }
}

/// Per-archive result value. Outcomes are aggregated by the coordinator
/// after the pool drains; tasks share no mutable counters.
#[derive(Debug)]
pub struct IngestOutcome {
    pub archive: PathBuf,
    pub stage: IngestStage,
    pub hourly_rows: usize,
    pub error: Option<ProcessingError>,
}

impl IngestOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug)]
pub struct IngestSummary {
    pub total: usize,
    pub succeeded: usize,
    pub elapsed: Duration,
}

/// Drives many zip archives through extraction, parsing, derivation and
/// load into one shared store.
///
/// Archives are dispatched to a bounded worker pool, but the store guard
/// is held for each archive's full extraction-through-commit window, so
/// archives serialize against each other; the pool overlaps archive I/O
/// only. A failing archive is recorded and the batch continues.
pub struct ArchiveIngestor {
    archives: Vec<PathBuf>,
    max_workers: usize,
}

impl ArchiveIngestor {
    /// Scan one or more source directories for zip archives. A missing
    /// directory is skipped with a warning; finding no archives at all
    /// is an error.
    pub fn from_directories(source_dirs: &[PathBuf], max_workers: usize) -> Result<Self> {
        let mut archives = Vec::new();

        for dir in source_dirs {
            if !dir.is_dir() {
                warn!("source directory does not exist: {}", dir.display());
                continue;
            }
            for entry in std::fs::read_dir(dir)? {
                let path = entry?.path();
                let is_zip = path.is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .map(|ext| ext.eq_ignore_ascii_case("zip"))
                        .unwrap_or(false);
                if is_zip {
                    archives.push(path);
                }
            }
        }

        if archives.is_empty() {
            return Err(ProcessingError::InvalidFormat(format!(
                "no zip archives found in {} source directories",
                source_dirs.len()
            )));
        }

        // Stable processing order regardless of directory enumeration
        archives.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        Ok(Self {
            archives,
            max_workers,
        })
    }

    pub fn archive_count(&self) -> usize {
        self.archives.len()
    }

    /// Process every archive into the store at `db_path`.
    ///
    /// `max_workers == 0` runs the batch fully sequentially on the
    /// caller's task; otherwise archives are spawned into a `JoinSet`
    /// gated by a semaphore of `max_workers` permits.
    pub async fn ingest_all(
        self,
        db_path: &Path,
    ) -> Result<(IngestSummary, Vec<IngestOutcome>)> {
        let total = self.archives.len();
        let store = Arc::new(Mutex::new(WeatherStore::open(db_path)?));
        let progress = ProgressReporter::new(total as u64, "Ingesting archives...", false);
        let started = Instant::now();

        let mut outcomes = Vec::with_capacity(total);

        if self.max_workers == 0 {
            for path in self.archives {
                let outcome = process_archive(&path, &store);
                report_outcome(&progress, &outcome, outcomes.len() + 1, total);
                outcomes.push(outcome);
            }
        } else {
            let semaphore = Arc::new(Semaphore::new(self.max_workers));
            let mut join_set = JoinSet::new();

            for path in self.archives {
                let store = Arc::clone(&store);
                let semaphore = Arc::clone(&semaphore);
                join_set.spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    process_archive(&path, &store)
                });
            }

            while let Some(joined) = join_set.join_next().await {
                let outcome = joined?;
                report_outcome(&progress, &outcome, outcomes.len() + 1, total);
                outcomes.push(outcome);
            }
        }

        let succeeded = outcomes.iter().filter(|o| o.succeeded()).count();
        let summary = IngestSummary {
            total,
            succeeded,
            elapsed: started.elapsed(),
        };
        progress.finish_with_message(&format!(
            "Processed {}/{} archives in {:.2}s",
            succeeded,
            total,
            summary.elapsed.as_secs_f64()
        ));

        Ok((summary, outcomes))
    }
}

fn report_outcome(
    progress: &ProgressReporter,
    outcome: &IngestOutcome,
    completed: usize,
    total: usize,
) {
    progress.increment(1);
    let name = outcome
        .archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| outcome.archive.display().to_string());
    match &outcome.error {
        None => progress.println(&format!(
            "Completed {}/{}: {} ({} hourly rows)",
            completed, total, name, outcome.hourly_rows
        )),
        Some(e) => progress.println(&format!(
            "Failed {}/{}: {} at stage '{}': {}",
            completed, total, name, outcome.stage, e
        )),
    }
}

/// Run one archive end-to-end. All failures are caught here and folded
/// into the outcome; nothing escapes to abort the batch.
fn process_archive(zip_path: &Path, store: &Arc<Mutex<WeatherStore>>) -> IngestOutcome {
    let mut stage = IngestStage::Extracting;
    let mut hourly_rows = 0usize;

    let result = (|| -> Result<()> {
        // One guard across the whole extraction-through-commit window:
        // archives are fully serialized with respect to each other.
        let mut store = store
            .lock()
            .map_err(|_| ProcessingError::Config("store mutex poisoned".to_string()))?;

        let extractor = EpwExtractor::new()?;
        let (epw_path, epw_name) = extractor.extract_epw(zip_path)?;
        let lines = EpwFileReader::new().read_lines(&epw_path)?;

        let header_reader = HeaderReader::new();
        let (location, data_start) = header_reader.parse_header(&lines, &epw_name)?;
        stage = IngestStage::HeaderParsed;
        debug!("parsed header for {} ({})", location.station_name, location.catalog);

        let location_id = store.insert_location(&location)?;
        let blocks = header_reader.parse_metadata(&lines);
        store.insert_metadata_blocks(location_id, &blocks)?;
        stage = IngestStage::MetadataParsed;

        let data_lines = &lines[data_start.min(lines.len())..];
        let hourly = HourlyReader::new().decode_lines(data_lines);
        hourly_rows = hourly.len();
        store.insert_hourly(location_id, &hourly)?;
        stage = IngestStage::HourlyLoaded;

        let design_days = DesignDayDeriver::new().derive(&hourly)?;
        store.insert_design_days(location_id, &design_days)?;
        stage = IngestStage::DesignDaysLoaded;

        stage = IngestStage::Done;
        Ok(())
    })();

    if let Err(ref e) = result {
        error!(
            "archive {} failed at stage '{}': {}",
            zip_path.display(),
            stage,
            e
        );
    }

    IngestOutcome {
        archive: zip_path.to_path_buf(),
        stage,
        hourly_rows,
        error: result.err(),
    }
}
