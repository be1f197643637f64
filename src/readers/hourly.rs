use crate::models::hourly::{HourlyRecord, FIELD_NAMES, INTEGER_COLUMNS};
use crate::readers::fields::{decode_epw_field, FieldKind, FieldValue};
use rayon::prelude::*;

/// Decodes the hourly-data section of an EPW file, one record per line.
///
/// Decoding is total: a line always yields a record, with unparseable
/// non-sentinel tokens degrading to the missing marker. `hour_index` is
/// the 1-based running line counter, assigned here and independent of
/// the embedded hour field.
pub struct HourlyReader;

impl HourlyReader {
    pub fn new() -> Self {
        Self
    }

    pub fn decode_lines(&self, lines: &[String]) -> Vec<HourlyRecord> {
        lines
            .par_iter()
            .enumerate()
            .map(|(i, line)| decode_line(line, (i + 1) as u32))
            .collect()
    }
}

impl Default for HourlyReader {
    fn default() -> Self {
        Self::new()
    }
}

fn kind_for_column(index: usize) -> FieldKind {
    if index == 5 {
        FieldKind::Flag
    } else if INTEGER_COLUMNS.contains(&index) {
        FieldKind::Integer
    } else {
        FieldKind::Decimal
    }
}

fn decode_line(line: &str, hour_index: u32) -> HourlyRecord {
    let mut values = vec![FieldValue::Missing; FIELD_NAMES.len()];

    for (i, part) in line.trim().split(',').enumerate() {
        if i >= FIELD_NAMES.len() {
            break;
        }
        // A token that neither parses nor matches a sentinel stays Missing
        values[i] = decode_epw_field(part, kind_for_column(i)).unwrap_or(FieldValue::Missing);
    }

    let int = |i: usize| values[i].as_i64();
    let float = |i: usize| values[i].as_f64();
    let flags = match &values[5] {
        FieldValue::Text(text) => text.clone(),
        _ => String::new(),
    };

    HourlyRecord {
        hour_index,
        year: int(0),
        month: int(1),
        day: int(2),
        hour: int(3),
        minute: int(4),
        data_flags: flags,
        dry_bulb: float(6),
        dew_point: float(7),
        rh: float(8),
        pressure: float(9),
        extra_horizontal_radiation: float(10),
        extra_dir_normal_radiation: float(11),
        horizontal_ir_sky_radiation: float(12),
        global_horizontal_radiation: float(13),
        direct_normal_radiation: float(14),
        diffuse_horizontal_radiation: float(15),
        global_horizontal_illuminance: float(16),
        direct_normal_illuminance: float(17),
        diffuse_horizontal_illuminance: float(18),
        zenith_luminance: float(19),
        wind_direction: int(20),
        wind_speed: float(21),
        total_sky_cover: int(22),
        opaque_sky_cover: int(23),
        visibility: float(24),
        ceiling_height: float(25),
        present_weather_observation: int(26),
        present_weather_codes: int(27),
        precipitable_water: float(28),
        aerosol_optical_depth: float(29),
        snow_depth: float(30),
        days_since_last_snowfall: int(31),
        albedo: float(32),
        liquid_precipitation_depth: float(33),
        liquid_precipitation_quantity: float(34),
    }
}
