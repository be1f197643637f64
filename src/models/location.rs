use serde::{Deserialize, Serialize};
use validator::Validate;

/// Station descriptor parsed from the first EPW header line, plus the
/// source filename and its catalog classification.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Location {
    #[validate(length(min = 1))]
    pub station_name: String,

    pub state_province: String,

    pub country: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    pub elevation: f64,

    pub timezone: f64,

    pub source_type: String,

    pub wmo_station_id: String,

    pub comment_1: String,

    pub comment_2: String,

    pub epw_file: String,

    pub catalog: String,
}
