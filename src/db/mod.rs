pub mod schema;
pub mod store;

pub use schema::{schema_snapshot, ColumnInfo};
pub use store::WeatherStore;
