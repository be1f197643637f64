pub mod design_day;
pub mod hourly;
pub mod location;
pub mod metadata;

pub use design_day::{DesignDayBlock, HumidityType};
pub use hourly::{HourlyRecord, FIELD_NAMES, INTEGER_COLUMNS};
pub use location::Location;
pub use metadata::MetadataBlock;
