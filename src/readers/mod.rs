pub mod epw_file;
pub mod fields;
pub mod header;
pub mod hourly;

pub use epw_file::EpwFileReader;
pub use fields::{decode_epw_field, extract_columns, ColumnSpan, FieldKind, FieldValue};
pub use header::HeaderReader;
pub use hourly::HourlyReader;
