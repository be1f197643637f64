use crate::convert::psychro::relative_humidity;
use crate::error::{ProcessingError, Result};
use crate::readers::fields::{extract_columns, extract_flag, ColumnSpan};
use std::io::{BufRead, Write};

/// Published 1-based column layout of the CWEEDS wy3 record. Each span
/// covers the value columns; spans with a flag cover one or two trailing
/// flag columns.
mod layout {
    use crate::readers::fields::ColumnSpan;

    pub const YEAR: ColumnSpan = ColumnSpan::new(9, 12);
    pub const MONTH: ColumnSpan = ColumnSpan::new(13, 14);
    pub const DAY: ColumnSpan = ColumnSpan::new(15, 16);
    pub const HOUR: ColumnSpan = ColumnSpan::new(17, 18);
    /// Extraterrestrial irradiance (kJ/m2)
    pub const EXT_RAD: ColumnSpan = ColumnSpan::new(19, 22);
    /// Global horizontal irradiance (kJ/m2)
    pub const GLOBAL_HOR_RAD: ColumnSpan = ColumnSpan::with_flag(23, 26, 28);
    /// Direct normal irradiance (kJ/m2)
    pub const DIR_NOR_RAD: ColumnSpan = ColumnSpan::with_flag(29, 32, 34);
    /// Diffuse horizontal irradiance (kJ/m2)
    pub const DIFF_HOR_RAD: ColumnSpan = ColumnSpan::with_flag(35, 38, 40);
    /// Global horizontal illuminance (100 lux)
    pub const GLOBAL_HOR_ILL: ColumnSpan = ColumnSpan::with_flag(41, 44, 45);
    /// Direct normal illuminance (100 lux)
    pub const DIR_NOR_ILL: ColumnSpan = ColumnSpan::with_flag(46, 49, 50);
    /// Diffuse horizontal illuminance (100 lux)
    pub const DIFF_HOR_ILL: ColumnSpan = ColumnSpan::with_flag(51, 54, 55);
    /// Zenith illuminance (100 lux)
    pub const ZENITH_ILL: ColumnSpan = ColumnSpan::with_flag(56, 59, 60);
    /// Ceiling height (10 m)
    pub const CLG_HEIGHT: ColumnSpan = ColumnSpan::with_flag(64, 67, 68);
    /// Visibility (100 m)
    pub const VISIBILITY: ColumnSpan = ColumnSpan::with_flag(74, 77, 78);
    /// Atmospheric pressure (10 Pa)
    pub const PRESSURE: ColumnSpan = ColumnSpan::with_flag(88, 92, 93);
    /// Dry-bulb temperature (0.1 degC)
    pub const TDB: ColumnSpan = ColumnSpan::with_flag(94, 97, 98);
    /// Dew-point temperature (0.1 degC)
    pub const TDP: ColumnSpan = ColumnSpan::with_flag(99, 102, 103);
    /// Wind direction (degrees)
    pub const WIND_DIR: ColumnSpan = ColumnSpan::with_flag(104, 106, 107);
    /// Wind speed (0.1 m/s)
    pub const WIND_SPEED: ColumnSpan = ColumnSpan::with_flag(108, 111, 112);
    /// Total sky cover (tenths)
    pub const TOTAL_SKY_COVER: ColumnSpan = ColumnSpan::with_flag(113, 114, 115);
    /// Opaque sky cover (tenths)
    pub const OPAQUE_SKY_COVER: ColumnSpan = ColumnSpan::with_flag(116, 117, 118);
}

/// Unit conversion factors from wy3 storage units to EPW units.
mod factor {
    pub const TEMPERATURE: f64 = 0.1;
    pub const RADIATION: f64 = 1.0 / 3.6;
    pub const PRESSURE: i64 = 10;
    pub const ILLUMINANCE: f64 = 100.0;
    pub const HEIGHT: f64 = 10.0;
    pub const SPEED: f64 = 0.1;
    pub const VISIBILITY: f64 = 0.1;
}

/// Transcodes a fixed-column CWEEDS (wy3) record stream into EPW hourly
/// lines, one output line per input record.
///
/// The column layout is assumed exact; a quality flag outside a
/// quantity's recognized set indicates a layout mismatch and aborts the
/// whole conversion.
pub struct Wy3Converter {
    first_record: usize,
    record_count: usize,
}

impl Wy3Converter {
    /// `first_record` is the 1-based line number of the first record to
    /// convert; `record_count` bounds the output.
    pub fn new(first_record: usize, record_count: usize) -> Self {
        Self {
            first_record,
            record_count,
        }
    }

    /// Stream `record_count` records from `input` to `output`. Returns
    /// the number of records written.
    pub fn convert<R: BufRead, W: Write>(&self, input: R, output: &mut W) -> Result<usize> {
        let mut written = 0;

        for (index, line) in input.lines().enumerate() {
            let line = line?;
            if index + 1 < self.first_record {
                continue;
            }
            if written >= self.record_count {
                break;
            }
            writeln!(output, "{}", convert_record(&line)?)?;
            written += 1;
        }

        Ok(written)
    }
}

/// Transcode one wy3 record into one 35-field EPW hourly line.
pub fn convert_record(line: &str) -> Result<String> {
    let year = extract_columns(line, &layout::YEAR)?;
    let month = strip_leading_zero(extract_columns(line, &layout::MONTH)?);
    let day = strip_leading_zero(extract_columns(line, &layout::DAY)?);
    let hour = strip_leading_zero(extract_columns(line, &layout::HOUR)?);
    let minute = "0";

    let tdb_raw = parse_int("tdb", extract_columns(line, &layout::TDB)?)?;
    let tdb_c = round1(tdb_raw as f64 * factor::TEMPERATURE);
    let tdb_epw = format!("{:.1}", tdb_c);
    let tdb_ds = measured_flag("tdb", flag_of(line, &layout::TDB)?, &[" ", "E"])?;

    let tdp_raw = parse_int("tdp", extract_columns(line, &layout::TDP)?)?;
    let tdp_c = round1(tdp_raw as f64 * factor::TEMPERATURE);
    let tdp_epw = format!("{:.1}", tdp_c);
    let tdp_ds = measured_flag("tdp", flag_of(line, &layout::TDP)?, &[" ", "E"])?;

    // RH is not stored in wy3; derive it from the two temperatures
    let rh_epw = relative_humidity(tdb_c, tdp_c).to_string();
    let rh_ds = "?9";

    let p_raw = parse_int("pressure", extract_columns(line, &layout::PRESSURE)?)?;
    let p_epw = (p_raw * factor::PRESSURE).to_string();
    let p_ds = measured_flag("pressure", flag_of(line, &layout::PRESSURE)?, &[" ", "E"])?;

    let ext_rad = parse_float("ext_rad", extract_columns(line, &layout::EXT_RAD)?)?;
    let ext_rad_epw = format_whole(ext_rad * factor::RADIATION);
    let ext_rad_ds = "E0"; // calculated in the source data

    // Not present in the wy3 record
    let ext_dir_rad_epw = "9999";
    let ext_dir_rad_ds = "?9";
    let ext_inf_rad_epw = "9999";
    let ext_inf_rad_ds = "?9";

    let (global_hor_rad_epw, global_hor_rad_ds) = radiation_channel(
        line,
        &layout::GLOBAL_HOR_RAD,
        "global_hor_rad",
        &["M ", "S ", "N ", "I ", "9 "],
    )?;
    let (dir_nor_rad_epw, dir_nor_rad_ds) = radiation_channel(
        line,
        &layout::DIR_NOR_RAD,
        "dir_nor_rad",
        &["S ", "Q ", "N ", "9 "],
    )?;
    let (diff_hor_rad_epw, diff_hor_rad_ds) = radiation_channel(
        line,
        &layout::DIFF_HOR_RAD,
        "diff_hor_rad",
        &["S ", "M ", "N ", "I ", "9 "],
    )?;

    let (global_hor_ill_epw, global_hor_ill_ds) =
        illuminance_channel(line, &layout::GLOBAL_HOR_ILL, "global_hor_ill", "999999")?;
    let (dir_nor_ill_epw, dir_nor_ill_ds) =
        illuminance_channel(line, &layout::DIR_NOR_ILL, "dir_nor_ill", "999999")?;
    let (diff_hor_ill_epw, diff_hor_ill_ds) =
        illuminance_channel(line, &layout::DIFF_HOR_ILL, "diff_hor_ill", "999999")?;
    let (zenith_ill_epw, zenith_ill_ds) =
        illuminance_channel(line, &layout::ZENITH_ILL, "zenith_ill", "9999")?;

    let wind_dir_raw = extract_columns(line, &layout::WIND_DIR)?;
    let wind_dir_epw = if wind_dir_raw == "999" {
        "999".to_string()
    } else {
        parse_int("wind_dir", wind_dir_raw)?.to_string()
    };
    let wind_dir_ds = measured_flag("wind_dir", flag_of(line, &layout::WIND_DIR)?, &[" ", "E", "9"])?;

    let wind_speed_raw = extract_columns(line, &layout::WIND_SPEED)?;
    let wind_speed_epw = if wind_speed_raw == "9999" {
        "999".to_string()
    } else {
        format!(
            "{:.1}",
            round1(parse_int("wind_speed", wind_speed_raw)? as f64 * factor::SPEED)
        )
    };
    let wind_speed_ds = measured_flag(
        "wind_speed",
        flag_of(line, &layout::WIND_SPEED)?,
        &[" ", "E", "9"],
    )?;

    // Sky covers pass through in tenths, untouched
    let total_sky_cover_epw = extract_columns(line, &layout::TOTAL_SKY_COVER)?;
    let total_sky_cover_ds = simple_flag(
        "total_sky_cover",
        flag_of(line, &layout::TOTAL_SKY_COVER)?,
        &[" ", "9"],
        "?9",
    )?;
    let opaque_sky_cover_epw = extract_columns(line, &layout::OPAQUE_SKY_COVER)?;
    let opaque_sky_cover_ds = simple_flag(
        "opaque_sky_cover",
        flag_of(line, &layout::OPAQUE_SKY_COVER)?,
        &[" ", "9"],
        "?9",
    )?;

    let visibility_raw = extract_columns(line, &layout::VISIBILITY)?;
    let visibility_epw = if visibility_raw == "9999" {
        "9999".to_string()
    } else {
        format!(
            "{:.1}",
            round1(parse_int("visibility", visibility_raw)? as f64 * factor::VISIBILITY)
        )
    };
    let visibility_ds = simple_flag(
        "visibility",
        flag_of(line, &layout::VISIBILITY)?,
        &[" ", "E", "9"],
        "?9",
    )?;

    let clg_height_raw = extract_columns(line, &layout::CLG_HEIGHT)?;
    let clg_height_epw = if clg_height_raw == "9999" {
        "99999".to_string()
    } else {
        format!(
            "{:.1}",
            parse_float("clg_height", clg_height_raw)? * factor::HEIGHT
        )
    };
    let clg_height_ds = simple_flag(
        "clg_height",
        flag_of(line, &layout::CLG_HEIGHT)?,
        &[" ", "E", "9"],
        "?9",
    )?;

    // Fixed EPW missing literals for quantities the wy3 record lacks
    let present_wth_obs_epw = "9";
    let present_wth_obs_ds = "?9";
    let present_wth_codes_epw = "0";
    let present_wth_codes_ds = "?9";
    let precipitable_water_epw = "999";
    let precipitable_water_ds = "?9";
    let aerosol_optical_depth_epw = ".999";
    let aerosol_optical_depth_ds = "?9";
    let snow_depth_epw = "999";
    let snow_depth_ds = "?9";
    let days_since_last_snowfall_epw = "99";
    let days_since_last_snowfall_ds = "?9";
    let albedo_epw = "0";
    let albedo_ds = "?9";
    let liquid_precip_depth_epw = "999";
    let liquid_precip_depth_ds = "?9";
    let liquid_precip_quantity_epw = "99";
    let liquid_precip_quantity_ds = "?9";

    // One 2-character code per measured field, concatenated in field order
    let data_source = [
        tdb_ds,
        tdp_ds,
        rh_ds,
        p_ds,
        ext_rad_ds,
        ext_dir_rad_ds,
        ext_inf_rad_ds,
        global_hor_rad_ds,
        dir_nor_rad_ds,
        diff_hor_rad_ds,
        global_hor_ill_ds,
        dir_nor_ill_ds,
        diff_hor_ill_ds,
        zenith_ill_ds,
        wind_dir_ds,
        wind_speed_ds,
        total_sky_cover_ds,
        opaque_sky_cover_ds,
        visibility_ds,
        clg_height_ds,
        present_wth_obs_ds,
        present_wth_codes_ds,
        precipitable_water_ds,
        aerosol_optical_depth_ds,
        snow_depth_ds,
        days_since_last_snowfall_ds,
        albedo_ds,
        liquid_precip_depth_ds,
        liquid_precip_quantity_ds,
    ]
    .concat();

    let fields: [&str; 35] = [
        year,
        &month,
        &day,
        &hour,
        minute,
        &data_source,
        &tdb_epw,
        &tdp_epw,
        &rh_epw,
        &p_epw,
        &ext_rad_epw,
        ext_dir_rad_epw,
        ext_inf_rad_epw,
        &global_hor_rad_epw,
        &dir_nor_rad_epw,
        &diff_hor_rad_epw,
        &global_hor_ill_epw,
        &dir_nor_ill_epw,
        &diff_hor_ill_epw,
        &zenith_ill_epw,
        &wind_dir_epw,
        &wind_speed_epw,
        total_sky_cover_epw,
        opaque_sky_cover_epw,
        &visibility_epw,
        &clg_height_epw,
        present_wth_obs_epw,
        present_wth_codes_epw,
        precipitable_water_epw,
        aerosol_optical_depth_epw,
        snow_depth_epw,
        days_since_last_snowfall_epw,
        albedo_epw,
        liquid_precip_depth_epw,
        liquid_precip_quantity_epw,
    ];

    Ok(fields.join(","))
}

fn flag_of<'a>(line: &'a str, span: &ColumnSpan) -> Result<&'a str> {
    extract_flag(line, span)?.ok_or_else(|| {
        ProcessingError::InvalidFormat("layout span has no flag columns".to_string())
    })
}

/// Radiation channels: value sentinel "9999", flag maps to `?0`.
fn radiation_channel(
    line: &str,
    span: &ColumnSpan,
    quantity: &'static str,
    accepted: &[&str],
) -> Result<(String, &'static str)> {
    let raw = extract_columns(line, span)?;
    let value = if raw == "9999" {
        "9999".to_string()
    } else {
        format_whole(parse_float(quantity, raw)? * factor::RADIATION)
    };
    let ds = simple_flag(quantity, flag_of(line, span)?, accepted, "?0")?;
    Ok((value, ds))
}

/// Illuminance channels: value sentinel "9999", missing literal depends
/// on the channel, flags `Q`/`9` map to `?0`.
fn illuminance_channel(
    line: &str,
    span: &ColumnSpan,
    quantity: &'static str,
    missing_literal: &str,
) -> Result<(String, &'static str)> {
    let raw = extract_columns(line, span)?;
    let value = if raw == "9999" {
        missing_literal.to_string()
    } else {
        format_whole(parse_float(quantity, raw)? * factor::ILLUMINANCE)
    };
    let accepted: &[&str] = if quantity == "zenith_ill" {
        &["9"]
    } else {
        &["Q", "9"]
    };
    let ds = simple_flag(quantity, flag_of(line, span)?, accepted, "?0")?;
    Ok((value, ds))
}

/// Blank/estimated map to `?9`, the trace flag `T` to `B9`; anything
/// else means the layout is wrong and stops the run.
fn measured_flag(
    quantity: &'static str,
    flag: &str,
    accepted: &[&str],
) -> Result<&'static str> {
    if accepted.contains(&flag) {
        Ok("?9")
    } else if flag == "T" {
        Ok("B9")
    } else {
        Err(ProcessingError::QualityFlag {
            quantity,
            flag: flag.to_string(),
        })
    }
}

fn simple_flag(
    quantity: &'static str,
    flag: &str,
    accepted: &[&str],
    mapped: &'static str,
) -> Result<&'static str> {
    if accepted.contains(&flag) {
        Ok(mapped)
    } else {
        Err(ProcessingError::QualityFlag {
            quantity,
            flag: flag.to_string(),
        })
    }
}

fn parse_int(quantity: &'static str, raw: &str) -> Result<i64> {
    raw.trim().parse().map_err(|_| {
        tracing::debug!("{} field unparseable: {:?}", quantity, raw);
        ProcessingError::FieldDecode {
            value: raw.to_string(),
            kind: "integer",
        }
    })
}

fn parse_float(quantity: &'static str, raw: &str) -> Result<f64> {
    raw.trim().parse().map_err(|_| {
        tracing::debug!("{} field unparseable: {:?}", quantity, raw);
        ProcessingError::FieldDecode {
            value: raw.to_string(),
            kind: "decimal",
        }
    })
}

/// "07" -> "7", "12" -> "12": the EPW timestamp fields are unpadded.
fn strip_leading_zero(raw: &str) -> String {
    match raw.strip_prefix('0') {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => raw.to_string(),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn format_whole(value: f64) -> String {
    (value.round() as i64).to_string()
}
