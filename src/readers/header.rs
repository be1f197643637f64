use crate::error::{ProcessingError, Result};
use crate::models::metadata::{MetadataBlock, MonthDay};
use crate::models::Location;
use crate::utils::constants::{
    DEFAULT_DATA_START, HEADER_SCAN_LINES, PREFIX_DATA_PERIODS, PREFIX_DESIGN_CONDITIONS,
    PREFIX_GROUND_TEMPERATURES, PREFIX_HOLIDAYS_DST, PREFIX_TYPICAL_PERIODS,
};
use crate::utils::filename::extract_catalog;
use tracing::warn;

/// Fields per group in a GROUND TEMPERATURES block: depth, three soil
/// properties, twelve monthly means.
const GROUND_TEMP_GROUP: usize = 16;

type BlockHandler = fn(&str) -> Vec<MetadataBlock>;

/// Ordered (prefix, handler) dispatch for header metadata lines. First
/// match per line wins.
const METADATA_HANDLERS: [(&str, BlockHandler); 5] = [
    (PREFIX_DESIGN_CONDITIONS, parse_design_conditions),
    (PREFIX_TYPICAL_PERIODS, parse_typical_periods),
    (PREFIX_GROUND_TEMPERATURES, parse_ground_temperatures),
    (PREFIX_HOLIDAYS_DST, parse_holidays_dst),
    (PREFIX_DATA_PERIODS, parse_data_periods),
];

/// Parses the EPW station descriptor and the variable-structure metadata
/// blocks out of the first ~20 header lines.
pub struct HeaderReader;

impl HeaderReader {
    pub fn new() -> Self {
        Self
    }

    /// Parse the station descriptor (line 1) into a [`Location`] and
    /// locate the first hourly-data line.
    ///
    /// The descriptor must carry its 10 comma fields; blank numeric
    /// fields default to 0.0. The hourly section starts immediately
    /// after the DATA PERIODS line, or at the fixed fallback offset when
    /// that marker is absent.
    pub fn parse_header(&self, lines: &[String], epw_filename: &str) -> Result<(Location, usize)> {
        let descriptor = lines
            .first()
            .ok_or_else(|| ProcessingError::InvalidFormat("empty EPW file".to_string()))?;
        let fields: Vec<&str> = descriptor.split(',').collect();
        if fields.len() < 10 {
            return Err(ProcessingError::InvalidFormat(format!(
                "EPW descriptor has {} fields, expected 10",
                fields.len()
            )));
        }

        let data_start = lines
            .iter()
            .position(|line| line.trim().starts_with(PREFIX_DATA_PERIODS))
            .map(|idx| idx + 1)
            .unwrap_or(DEFAULT_DATA_START);

        let location = Location {
            station_name: fields[1].trim().to_string(),
            state_province: fields[2].trim().to_string(),
            country: fields[3].trim().to_string(),
            latitude: numeric_or_zero(fields[6])?,
            longitude: numeric_or_zero(fields[7])?,
            elevation: numeric_or_zero(fields[9])?,
            timezone: numeric_or_zero(fields[8])?,
            source_type: fields[4].trim().to_string(),
            wmo_station_id: fields[5].trim().to_string(),
            comment_1: comment_payload(lines.get(5)),
            comment_2: comment_payload(lines.get(6)),
            epw_file: epw_filename.to_string(),
            catalog: extract_catalog(epw_filename)?,
        };

        Ok((location, data_start))
    }

    /// Parse all recognized metadata blocks from the header lines.
    ///
    /// Malformed sub-blocks are dropped with a warning; nothing here
    /// fails the file.
    pub fn parse_metadata(&self, lines: &[String]) -> Vec<MetadataBlock> {
        let mut blocks = Vec::new();

        for line in lines.iter().take(HEADER_SCAN_LINES) {
            let trimmed = line.trim();
            for (prefix, handler) in METADATA_HANDLERS {
                if trimmed.starts_with(prefix) {
                    blocks.extend(handler(trimmed));
                    break;
                }
            }
        }

        blocks
    }
}

impl Default for HeaderReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Blank descriptor numerics default to 0.0; anything else must parse.
fn numeric_or_zero(field: &str) -> Result<f64> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed.parse().map_err(|_| ProcessingError::FieldDecode {
        value: trimmed.to_string(),
        kind: "decimal",
    })
}

/// COMMENTS lines keep everything after the first comma; a line without
/// one is kept whole.
fn comment_payload(line: Option<&String>) -> String {
    match line {
        Some(line) => {
            let trimmed = line.trim();
            trimmed
                .split_once(',')
                .map(|(_, rest)| rest)
                .unwrap_or(trimmed)
                .to_string()
        }
        None => String::new(),
    }
}

/// "M/D" with the day optionally space-padded after the slash.
fn parse_month_day(token: &str) -> Result<MonthDay> {
    let (month, day) = token
        .trim()
        .split_once('/')
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("bad date token {:?}", token)))?;
    let month = month.trim().parse().map_err(|_| ProcessingError::FieldDecode {
        value: month.to_string(),
        kind: "integer",
    })?;
    let day = day.trim().parse().map_err(|_| ProcessingError::FieldDecode {
        value: day.to_string(),
        kind: "integer",
    })?;
    Ok(MonthDay { month, day })
}

fn parse_design_conditions(line: &str) -> Vec<MetadataBlock> {
    let payload = line
        .split_once(',')
        .map(|(_, rest)| rest)
        .unwrap_or("")
        .to_string();
    vec![MetadataBlock::DesignConditions { raw_data: payload }]
}

fn parse_typical_periods(line: &str) -> Vec<MetadataBlock> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 3 {
        return Vec::new();
    }
    let num_periods: usize = match parts[1].trim().parse() {
        Ok(n) => n,
        Err(_) => {
            warn!("unparseable TYPICAL/EXTREME PERIODS count: {:?}", parts[1]);
            return Vec::new();
        }
    };

    let mut blocks = Vec::new();
    // Groups of 4: name, type, start "M/D", end "M/D"
    for i in 0..num_periods {
        let idx = 2 + i * 4;
        if idx + 3 >= parts.len() {
            break;
        }
        let period_name = parts[idx].trim().to_string();
        let period_type = parts[idx + 1].trim().to_string();
        match (parse_month_day(parts[idx + 2]), parse_month_day(parts[idx + 3])) {
            (Ok(start), Ok(end)) => blocks.push(MetadataBlock::TypicalPeriod {
                period_name,
                period_type,
                start,
                end,
            }),
            _ => {
                warn!(
                    "skipping typical period {:?} with dates {:?} - {:?}",
                    period_name,
                    parts[idx + 2],
                    parts[idx + 3]
                );
            }
        }
    }
    blocks
}

fn parse_ground_temperatures(line: &str) -> Vec<MetadataBlock> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 3 {
        return Vec::new();
    }
    let num_depths: usize = match parts[1].trim().parse() {
        Ok(n) => n,
        Err(_) => {
            warn!("unparseable GROUND TEMPERATURES count: {:?}", parts[1]);
            return Vec::new();
        }
    };

    let mut blocks = Vec::new();
    for i in 0..num_depths {
        let base = 2 + i * GROUND_TEMP_GROUP;
        if base + GROUND_TEMP_GROUP > parts.len() {
            // A truncated group ends the line; earlier complete groups stand.
            warn!("truncated ground temperature group at depth index {}", i);
            break;
        }
        match parse_ground_temp_group(&parts[base..base + GROUND_TEMP_GROUP]) {
            Ok(block) => blocks.push(block),
            Err(e) => warn!("skipping ground temperature group {}: {}", i, e),
        }
    }
    blocks
}

fn parse_ground_temp_group(group: &[&str]) -> Result<MetadataBlock> {
    let depth: f64 = group[0]
        .trim()
        .parse()
        .map_err(|_| ProcessingError::FieldDecode {
            value: group[0].to_string(),
            kind: "decimal",
        })?;
    let soil_conductivity = numeric_or_zero(group[1])?;
    let soil_density = numeric_or_zero(group[2])?;
    let soil_specific_heat = numeric_or_zero(group[3])?;

    let mut monthly = [0.0f64; 12];
    for (slot, field) in monthly.iter_mut().zip(&group[4..16]) {
        *slot = numeric_or_zero(field)?;
    }

    Ok(MetadataBlock::GroundTemperature {
        depth,
        soil_conductivity,
        soil_density,
        soil_specific_heat,
        monthly,
    })
}

fn parse_holidays_dst(line: &str) -> Vec<MetadataBlock> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 5 {
        return Vec::new();
    }

    let int_or_zero = |field: &str| -> Option<i64> {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            Some(0)
        } else {
            trimmed.parse().ok()
        }
    };

    match (
        int_or_zero(parts[2]),
        int_or_zero(parts[3]),
        int_or_zero(parts[4]),
    ) {
        (Some(dst_start_day), Some(dst_end_day), Some(dst_indicator)) => {
            vec![MetadataBlock::HolidaysDst {
                uses_holidays: parts[1].to_string(),
                dst_start_day,
                dst_end_day,
                dst_indicator,
            }]
        }
        _ => {
            warn!("skipping malformed HOLIDAYS/DAYLIGHT SAVINGS line: {:?}", line);
            Vec::new()
        }
    }
}

fn parse_data_periods(line: &str) -> Vec<MetadataBlock> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 6 {
        warn!("not enough parts in DATA PERIODS line: {}", parts.len());
        return Vec::new();
    }

    let parsed = (|| -> Result<MetadataBlock> {
        let num_periods = parts[1].trim().parse().map_err(|_| {
            ProcessingError::FieldDecode {
                value: parts[1].to_string(),
                kind: "integer",
            }
        })?;
        let intervals_per_hour = parts[2].trim().parse().map_err(|_| {
            ProcessingError::FieldDecode {
                value: parts[2].to_string(),
                kind: "integer",
            }
        })?;
        let end_token = parts.get(6).ok_or_else(|| {
            ProcessingError::InvalidFormat("DATA PERIODS line lacks an end date".to_string())
        })?;
        Ok(MetadataBlock::DataPeriods {
            num_periods,
            intervals_per_hour,
            period_type: parts[3].trim().to_string(),
            period_name: parts[4].trim().to_string(),
            start: parse_month_day(parts[5])?,
            end: parse_month_day(end_token)?,
        })
    })();

    match parsed {
        Ok(block) => vec![block],
        Err(e) => {
            warn!(
                "skipping DATA PERIODS block: {} (line: {:?}, {} parts)",
                e,
                line,
                parts.len()
            );
            Vec::new()
        }
    }
}
