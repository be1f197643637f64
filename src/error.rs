use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Field decode error: {value:?} is not a valid {kind} value")]
    FieldDecode { value: String, kind: &'static str },

    #[error("Catalog tag not found in filename: {0}")]
    CatalogNotFound(String),

    #[error("No EPW file found in archive: {0}")]
    NoEpwMember(String),

    #[error("Unrecognized {quantity} quality flag: {flag:?}")]
    QualityFlag { quantity: &'static str, flag: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
