use serde::{Deserialize, Serialize};

/// Column names of the EPW hourly record, in line order.
pub const FIELD_NAMES: [&str; 35] = [
    "Year",
    "Month",
    "Day",
    "Hour",
    "Minute",
    "DataFlags",
    "DryBulb",
    "DewPoint",
    "RH",
    "Pressure",
    "ExtraHorizontalRadiation",
    "ExtraDirNormalRadiation",
    "HorizontalIRSkyRadiation",
    "GlobalHorizontalRadiation",
    "DirectNormalRadiation",
    "DiffuseHorizontalRadiation",
    "GlobalHorizontalIlluminance",
    "DirectNormalIlluminance",
    "DiffuseHorizontalIlluminance",
    "ZenithLuminance",
    "WindDirection",
    "WindSpeed",
    "TotalSkyCover",
    "OpaqueSkyCover",
    "Visibility",
    "CeilingHeight",
    "PresentWeatherObservation",
    "PresentWeatherCodes",
    "PrecipitableWater",
    "AerosolOpticalDepth",
    "SnowDepth",
    "DaysSinceLastSnowfall",
    "Albedo",
    "LiquidPrecipitationDepth",
    "LiquidPrecipitationQuantity",
];

/// Column indices coerced to integers; the rest are decimals.
/// Index 5 (DataFlags) is the flag-string column.
pub const INTEGER_COLUMNS: [usize; 11] = [0, 1, 2, 3, 4, 20, 22, 23, 26, 27, 31];

/// One decoded EPW hourly observation. `None` is the explicit missing
/// marker produced by the sentinel set; a blank field decodes to 0, not
/// `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlyRecord {
    /// 1-based running line counter, independent of the embedded hour field.
    pub hour_index: u32,
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub day: Option<i64>,
    pub hour: Option<i64>,
    pub minute: Option<i64>,
    pub data_flags: String,
    pub dry_bulb: Option<f64>,
    pub dew_point: Option<f64>,
    pub rh: Option<f64>,
    pub pressure: Option<f64>,
    pub extra_horizontal_radiation: Option<f64>,
    pub extra_dir_normal_radiation: Option<f64>,
    pub horizontal_ir_sky_radiation: Option<f64>,
    pub global_horizontal_radiation: Option<f64>,
    pub direct_normal_radiation: Option<f64>,
    pub diffuse_horizontal_radiation: Option<f64>,
    pub global_horizontal_illuminance: Option<f64>,
    pub direct_normal_illuminance: Option<f64>,
    pub diffuse_horizontal_illuminance: Option<f64>,
    pub zenith_luminance: Option<f64>,
    pub wind_direction: Option<i64>,
    pub wind_speed: Option<f64>,
    pub total_sky_cover: Option<i64>,
    pub opaque_sky_cover: Option<i64>,
    pub visibility: Option<f64>,
    pub ceiling_height: Option<f64>,
    pub present_weather_observation: Option<i64>,
    pub present_weather_codes: Option<i64>,
    pub precipitable_water: Option<f64>,
    pub aerosol_optical_depth: Option<f64>,
    pub snow_depth: Option<f64>,
    pub days_since_last_snowfall: Option<i64>,
    pub albedo: Option<f64>,
    pub liquid_precipitation_depth: Option<f64>,
    pub liquid_precipitation_quantity: Option<f64>,
}

impl HourlyRecord {
    /// Calendar date of the observation, when the timestamp fields allow one.
    pub fn date(&self) -> Option<chrono::NaiveDate> {
        let (y, m, d) = (self.year?, self.month?, self.day?);
        chrono::NaiveDate::from_ymd_opt(y as i32, m as u32, d as u32)
    }
}
