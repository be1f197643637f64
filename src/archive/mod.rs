pub mod extractor;
pub mod ingestor;

pub use extractor::EpwExtractor;
pub use ingestor::{ArchiveIngestor, IngestOutcome, IngestStage, IngestSummary};
