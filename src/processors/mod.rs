pub mod design_days;

pub use design_days::{DailySummary, DesignDayDeriver};
