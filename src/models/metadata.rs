use serde::{Deserialize, Serialize};

/// A month/day pair as written in EPW header date tokens ("M/D", the day
/// optionally space-padded after the slash).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDay {
    pub month: i64,
    pub day: i64,
}

/// One optional annotation parsed from the EPW header. Each variant maps
/// to its own store table; blocks carry no cross-references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MetadataBlock {
    /// Everything after the DESIGN CONDITIONS prefix, kept verbatim.
    DesignConditions { raw_data: String },

    TypicalPeriod {
        period_name: String,
        period_type: String,
        start: MonthDay,
        end: MonthDay,
    },

    GroundTemperature {
        depth: f64,
        soil_conductivity: f64,
        soil_density: f64,
        soil_specific_heat: f64,
        monthly: [f64; 12],
    },

    HolidaysDst {
        uses_holidays: String,
        dst_start_day: i64,
        dst_end_day: i64,
        dst_indicator: i64,
    },

    DataPeriods {
        num_periods: i64,
        intervals_per_hour: i64,
        period_type: String,
        period_name: String,
        start: MonthDay,
        end: MonthDay,
    },
}

impl MetadataBlock {
    pub fn kind(&self) -> &'static str {
        match self {
            MetadataBlock::DesignConditions { .. } => "design_conditions",
            MetadataBlock::TypicalPeriod { .. } => "typical_period",
            MetadataBlock::GroundTemperature { .. } => "ground_temperature",
            MetadataBlock::HolidaysDst { .. } => "holidays_dst",
            MetadataBlock::DataPeriods { .. } => "data_periods",
        }
    }
}
