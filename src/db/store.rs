use crate::db::schema::{self, create_schema};
use crate::error::{ProcessingError, Result};
use crate::models::metadata::MetadataBlock;
use crate::models::{DesignDayBlock, HourlyRecord, Location};
use rusqlite::types::Value;
use rusqlite::{params, Connection};
use std::path::Path;

/// The shared relational store: one SQLite database holding locations,
/// hourly series, design days and header metadata.
///
/// Writers serialize access externally (the ingestor holds one mutex
/// across each archive's whole load window); this type itself assumes a
/// single caller at a time.
pub struct WeatherStore {
    conn: Connection,
}

impl WeatherStore {
    /// Open (creating if needed) the store at `path` and ensure the
    /// schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// An in-memory store, for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // Throughput pragmas; durability stays a tuning concern.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "cache_size", -32000)?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn insert_location(&self, location: &Location) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO locations_metadata
             (station_name, state_province, country, latitude, longitude, elevation,
              timezone, source_type, wmo_station_id, comment_1, comment_2, epw_file, catalog)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                location.station_name,
                location.state_province,
                location.country,
                location.latitude,
                location.longitude,
                location.elevation,
                location.timezone,
                location.source_type,
                location.wmo_station_id,
                location.comment_1,
                location.comment_2,
                location.epw_file,
                location.catalog,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_metadata_blocks(
        &self,
        location_id: i64,
        blocks: &[MetadataBlock],
    ) -> Result<()> {
        for block in blocks {
            match block {
                MetadataBlock::DesignConditions { raw_data } => {
                    self.conn.execute(
                        "INSERT INTO design_conditions_data (location_id, raw_data) VALUES (?1, ?2)",
                        params![location_id, raw_data],
                    )?;
                }
                MetadataBlock::TypicalPeriod {
                    period_name,
                    period_type,
                    start,
                    end,
                } => {
                    self.conn.execute(
                        "INSERT INTO typical_periods_data
                         (location_id, period_type, period_name,
                          period_start_month, period_start_day, period_end_month, period_end_day)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        params![
                            location_id,
                            period_type,
                            period_name,
                            start.month,
                            start.day,
                            end.month,
                            end.day
                        ],
                    )?;
                }
                MetadataBlock::GroundTemperature {
                    depth,
                    soil_conductivity,
                    soil_density,
                    soil_specific_heat,
                    monthly,
                } => {
                    self.conn.execute(
                        "INSERT INTO ground_temperatures_data
                         (location_id, depth, soil_conductivity, soil_density, soil_specific_heat,
                          january, february, march, april, may, june, july, august,
                          september, october, november, december)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                        params![
                            location_id,
                            depth,
                            soil_conductivity,
                            soil_density,
                            soil_specific_heat,
                            monthly[0],
                            monthly[1],
                            monthly[2],
                            monthly[3],
                            monthly[4],
                            monthly[5],
                            monthly[6],
                            monthly[7],
                            monthly[8],
                            monthly[9],
                            monthly[10],
                            monthly[11],
                        ],
                    )?;
                }
                MetadataBlock::HolidaysDst {
                    uses_holidays,
                    dst_start_day,
                    dst_end_day,
                    dst_indicator,
                } => {
                    self.conn.execute(
                        "INSERT INTO holidays_dst_data
                         (location_id, uses_holidays, dst_start_day, dst_end_day, dst_indicator)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![
                            location_id,
                            uses_holidays,
                            dst_start_day,
                            dst_end_day,
                            dst_indicator
                        ],
                    )?;
                }
                MetadataBlock::DataPeriods {
                    num_periods,
                    intervals_per_hour,
                    period_type,
                    period_name,
                    start,
                    end,
                } => {
                    self.conn.execute(
                        "INSERT INTO data_periods
                         (location_id, num_periods, intervals_per_hour, period_type, period_name,
                          period_start_month, period_start_day, period_end_month, period_end_day)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                        params![
                            location_id,
                            num_periods,
                            intervals_per_hour,
                            period_type,
                            period_name,
                            start.month,
                            start.day,
                            end.month,
                            end.day
                        ],
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Bulk-insert one location's hourly series inside a single
    /// transaction.
    pub fn insert_hourly(&mut self, location_id: i64, records: &[HourlyRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO hourly_data
                 (location_id, hour_index, Year, Month, Day, Hour, Minute, DataFlags,
                  DryBulb, DewPoint, RH, Pressure,
                  ExtraHorizontalRadiation, ExtraDirNormalRadiation, HorizontalIRSkyRadiation,
                  GlobalHorizontalRadiation, DirectNormalRadiation, DiffuseHorizontalRadiation,
                  GlobalHorizontalIlluminance, DirectNormalIlluminance, DiffuseHorizontalIlluminance,
                  ZenithLuminance, WindDirection, WindSpeed, TotalSkyCover, OpaqueSkyCover,
                  Visibility, CeilingHeight, PresentWeatherObservation, PresentWeatherCodes,
                  PrecipitableWater, AerosolOpticalDepth, SnowDepth, DaysSinceLastSnowfall,
                  Albedo, LiquidPrecipitationDepth, LiquidPrecipitationQuantity)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                         ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30,
                         ?31, ?32, ?33, ?34, ?35, ?36, ?37)",
            )?;
            for record in records {
                stmt.execute(params![
                    location_id,
                    record.hour_index,
                    record.year,
                    record.month,
                    record.day,
                    record.hour,
                    record.minute,
                    record.data_flags,
                    record.dry_bulb,
                    record.dew_point,
                    record.rh,
                    record.pressure,
                    record.extra_horizontal_radiation,
                    record.extra_dir_normal_radiation,
                    record.horizontal_ir_sky_radiation,
                    record.global_horizontal_radiation,
                    record.direct_normal_radiation,
                    record.diffuse_horizontal_radiation,
                    record.global_horizontal_illuminance,
                    record.direct_normal_illuminance,
                    record.diffuse_horizontal_illuminance,
                    record.zenith_luminance,
                    record.wind_direction,
                    record.wind_speed,
                    record.total_sky_cover,
                    record.opaque_sky_cover,
                    record.visibility,
                    record.ceiling_height,
                    record.present_weather_observation,
                    record.present_weather_codes,
                    record.precipitable_water,
                    record.aerosol_optical_depth,
                    record.snow_depth,
                    record.days_since_last_snowfall,
                    record.albedo,
                    record.liquid_precipitation_depth,
                    record.liquid_precipitation_quantity,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn insert_design_days(&self, location_id: i64, blocks: &[DesignDayBlock]) -> Result<()> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO design_days
             (location_id, name, month, day, max_dry_bulb,
              humidity_value, humidity_type, wind_speed, wind_direction)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for block in blocks {
            stmt.execute(params![
                location_id,
                block.name,
                block.month,
                block.day,
                block.dry_bulb,
                block.humidity_value,
                block.humidity_type.as_str(),
                block.wind_speed,
                block.wind_direction,
            ])?;
        }
        Ok(())
    }

    /// Distinct catalog values, the export partition keys.
    pub fn catalogs(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT catalog FROM locations_metadata ORDER BY catalog")?;
        let catalogs = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(catalogs)
    }

    pub fn location_ids_for_catalog(&self, catalog: &str) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM locations_metadata WHERE catalog = ?1 ORDER BY id")?;
        let ids = stmt
            .query_map([catalog], |row| row.get::<_, i64>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    pub fn row_count(&self, table: &str) -> Result<i64> {
        self.assert_known_table(table)?;
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }

    /// Index-accelerated lookup: hourly observations for one location on
    /// one calendar date.
    pub fn hourly_count_for_date(
        &self,
        location_id: i64,
        year: i64,
        month: i64,
        day: i64,
    ) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM hourly_data
             WHERE location_id = ?1 AND Year = ?2 AND Month = ?3 AND Day = ?4",
            params![location_id, year, month, day],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Whether a table carries a location reference (and thus partitions
    /// on export).
    pub fn has_location_reference(&self, table: &str) -> Result<bool> {
        Ok(schema::table_info(&self.conn, table)?
            .iter()
            .any(|col| col.name == "location_id"))
    }

    /// Fetch full rows of `table`, optionally filtered to `ids` of
    /// `key_column`. Values come back dynamically typed for the columnar
    /// writer to map.
    pub fn fetch_rows(
        &self,
        table: &str,
        filter: Option<(&str, &[i64])>,
    ) -> Result<Vec<Vec<Value>>> {
        self.assert_known_table(table)?;
        let sql = match filter {
            Some((_, ids)) if ids.is_empty() => return Ok(Vec::new()),
            Some((key_column, ids)) => {
                let id_list = ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                format!("SELECT * FROM {} WHERE {} IN ({})", table, key_column, id_list)
            }
            None => format!("SELECT * FROM {}", table),
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let column_count = stmt.column_count();
        let rows = stmt
            .query_map([], |row| {
                (0..column_count)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<std::result::Result<Vec<_>, _>>()
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Guards the interpolated-identifier queries against arbitrary
    /// table names.
    fn assert_known_table(&self, table: &str) -> Result<()> {
        if schema::table_names(&self.conn)?.iter().any(|n| n == table) {
            Ok(())
        } else {
            Err(ProcessingError::Config(format!(
                "unknown table: {}",
                table
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::design_day::HumidityType;
    use crate::models::metadata::MonthDay;

    fn location(catalog: &str) -> Location {
        Location {
            station_name: "Test Station".to_string(),
            state_province: "ON".to_string(),
            country: "CAN".to_string(),
            latitude: 45.0,
            longitude: -75.0,
            elevation: 100.0,
            timezone: -5.0,
            source_type: catalog.to_string(),
            wmo_station_id: "716280".to_string(),
            comment_1: String::new(),
            comment_2: String::new(),
            epw_file: format!("Test_{}.epw", catalog),
            catalog: catalog.to_string(),
        }
    }

    #[test]
    fn test_location_roundtrip() -> Result<()> {
        let store = WeatherStore::open_in_memory()?;
        let id = store.insert_location(&location("TMY"))?;
        assert!(id > 0);

        assert_eq!(store.catalogs()?, vec!["TMY".to_string()]);
        assert_eq!(store.location_ids_for_catalog("TMY")?, vec![id]);
        assert_eq!(store.row_count("locations_metadata")?, 1);
        Ok(())
    }

    #[test]
    fn test_hourly_bulk_insert_and_date_lookup() -> Result<()> {
        let mut store = WeatherStore::open_in_memory()?;
        let id = store.insert_location(&location("TMY"))?;

        let records: Vec<HourlyRecord> = (1..=48)
            .map(|i| HourlyRecord {
                hour_index: i,
                year: Some(1995),
                month: Some(1),
                day: Some(if i <= 24 { 1 } else { 2 }),
                hour: Some(((i - 1) % 24 + 1) as i64),
                minute: Some(0),
                dry_bulb: Some(-5.0),
                ..Default::default()
            })
            .collect();
        store.insert_hourly(id, &records)?;

        assert_eq!(store.row_count("hourly_data")?, 48);
        assert_eq!(store.hourly_count_for_date(id, 1995, 1, 1)?, 24);
        assert_eq!(store.hourly_count_for_date(id, 1995, 1, 3)?, 0);
        Ok(())
    }

    #[test]
    fn test_missing_values_store_as_null() -> Result<()> {
        let mut store = WeatherStore::open_in_memory()?;
        let id = store.insert_location(&location("TMY"))?;

        let record = HourlyRecord {
            hour_index: 1,
            year: Some(1995),
            dry_bulb: None,
            rh: Some(0.0),
            ..Default::default()
        };
        store.insert_hourly(id, &[record])?;

        let rows = store.fetch_rows("hourly_data", None)?;
        let columns = schema::table_info(store.connection(), "hourly_data")?;
        let dry_bulb_idx = columns.iter().position(|c| c.name == "DryBulb").unwrap();
        let rh_idx = columns.iter().position(|c| c.name == "RH").unwrap();
        assert_eq!(rows[0][dry_bulb_idx], Value::Null);
        assert_eq!(rows[0][rh_idx], Value::Real(0.0));
        Ok(())
    }

    #[test]
    fn test_metadata_and_design_day_inserts() -> Result<()> {
        let store = WeatherStore::open_in_memory()?;
        let id = store.insert_location(&location("CWEC"))?;

        store.insert_metadata_blocks(
            id,
            &[
                MetadataBlock::DesignConditions {
                    raw_data: "1,source".to_string(),
                },
                MetadataBlock::TypicalPeriod {
                    period_name: "Summer".to_string(),
                    period_type: "Extreme".to_string(),
                    start: MonthDay { month: 7, day: 13 },
                    end: MonthDay { month: 7, day: 19 },
                },
            ],
        )?;
        store.insert_design_days(
            id,
            &[DesignDayBlock::new(
                "Heating 99.6%",
                1,
                21,
                -24.0,
                0.001,
                HumidityType::HumidityRatio,
            )],
        )?;

        assert_eq!(store.row_count("design_conditions_data")?, 1);
        assert_eq!(store.row_count("typical_periods_data")?, 1);
        assert_eq!(store.row_count("design_days")?, 1);
        Ok(())
    }

    #[test]
    fn test_fetch_rows_with_empty_filter_is_empty() -> Result<()> {
        let store = WeatherStore::open_in_memory()?;
        let rows = store.fetch_rows("design_days", Some(("location_id", &[])))?;
        assert!(rows.is_empty());
        Ok(())
    }

    #[test]
    fn test_unknown_table_is_rejected() {
        let store = WeatherStore::open_in_memory().unwrap();
        assert!(store.row_count("no_such_table; DROP TABLE x").is_err());
    }
}
