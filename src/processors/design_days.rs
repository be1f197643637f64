use crate::error::{ProcessingError, Result};
use crate::models::design_day::{DesignDayBlock, HumidityType};
use crate::models::HourlyRecord;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Per-date aggregate of the hourly series.
#[derive(Debug, Clone, Copy)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub min_temp: f64,
    pub max_temp: f64,
    pub mean_temp: f64,
    pub mean_rh: f64,
}

/// Derives the seven named design-day summaries from one location's
/// decoded hourly series.
///
/// Percentile selection is nearest-rank with a truncated index,
/// reproducing the reference outputs exactly; it is not an interpolated
/// percentile.
pub struct DesignDayDeriver;

impl DesignDayDeriver {
    pub fn new() -> Self {
        Self
    }

    pub fn derive(&self, records: &[HourlyRecord]) -> Result<Vec<DesignDayBlock>> {
        let daily = self.summarize_by_date(records);
        if daily.is_empty() {
            return Err(ProcessingError::MissingData(
                "hourly series has no dated dry-bulb observations".to_string(),
            ));
        }

        let mut blocks = Vec::with_capacity(7);

        let heating_996 = percentile_day(&daily, |d| d.min_temp, 0.4, true);
        blocks.push(DesignDayBlock::new(
            "Heating 99.6%",
            heating_996.date.month(),
            heating_996.date.day(),
            heating_996.min_temp,
            0.001,
            HumidityType::HumidityRatio,
        ));

        let heating_99 = percentile_day(&daily, |d| d.min_temp, 1.0, true);
        blocks.push(DesignDayBlock::new(
            "Heating 99%",
            heating_99.date.month(),
            heating_99.date.day(),
            heating_99.min_temp,
            0.001,
            HumidityType::HumidityRatio,
        ));

        let cooling_04 = percentile_day(&daily, |d| d.max_temp, 99.6, false);
        blocks.push(DesignDayBlock::new(
            "Cooling 0.4%",
            cooling_04.date.month(),
            cooling_04.date.day(),
            cooling_04.max_temp,
            21.0,
            HumidityType::WetBulb,
        ));

        let cooling_1 = percentile_day(&daily, |d| d.max_temp, 99.0, false);
        blocks.push(DesignDayBlock::new(
            "Cooling 1%",
            cooling_1.date.month(),
            cooling_1.date.day(),
            cooling_1.max_temp,
            21.0,
            HumidityType::WetBulb,
        ));

        // Worst combined heat and humidity: maximize max_temp * mean_rh/100
        let humid = daily
            .iter()
            .max_by(|a, b| {
                let ka = a.max_temp * (a.mean_rh / 100.0);
                let kb = b.max_temp * (b.mean_rh / 100.0);
                ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
            })
            .ok_or_else(|| {
                ProcessingError::MissingData("empty daily series".to_string())
            })?;
        blocks.push(DesignDayBlock::new(
            "Cooling Humid",
            humid.date.month(),
            humid.date.day(),
            humid.max_temp,
            24.0,
            HumidityType::WetBulb,
        ));

        let jan = first_day_in_month(&daily, 1)
            .ok_or_else(|| ProcessingError::MissingData("no January data for clear winter day".to_string()))?;
        blocks.push(DesignDayBlock::new(
            "Clear Winter",
            jan.date.month(),
            jan.date.day(),
            jan.max_temp,
            0.001,
            HumidityType::HumidityRatio,
        ));

        let jul = first_day_in_month(&daily, 7)
            .ok_or_else(|| ProcessingError::MissingData("no July data for clear summer day".to_string()))?;
        blocks.push(DesignDayBlock::new(
            "Clear Summer",
            jul.date.month(),
            jul.date.day(),
            jul.max_temp,
            21.0,
            HumidityType::WetBulb,
        ));

        Ok(blocks)
    }

    /// Group the series by calendar date. Records without a full
    /// timestamp or a dry-bulb value do not contribute.
    pub fn summarize_by_date(&self, records: &[HourlyRecord]) -> Vec<DailySummary> {
        struct Accum {
            min: f64,
            max: f64,
            sum: f64,
            count: usize,
            rh_sum: f64,
            rh_count: usize,
        }

        let mut by_date: BTreeMap<NaiveDate, Accum> = BTreeMap::new();

        for record in records {
            let (date, temp) = match (record.date(), record.dry_bulb) {
                (Some(date), Some(temp)) => (date, temp),
                _ => continue,
            };
            let acc = by_date.entry(date).or_insert(Accum {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
                sum: 0.0,
                count: 0,
                rh_sum: 0.0,
                rh_count: 0,
            });
            acc.min = acc.min.min(temp);
            acc.max = acc.max.max(temp);
            acc.sum += temp;
            acc.count += 1;
            if let Some(rh) = record.rh {
                acc.rh_sum += rh;
                acc.rh_count += 1;
            }
        }

        by_date
            .into_iter()
            .map(|(date, acc)| DailySummary {
                date,
                min_temp: acc.min,
                max_temp: acc.max,
                mean_temp: acc.sum / acc.count as f64,
                mean_rh: if acc.rh_count > 0 {
                    acc.rh_sum / acc.rh_count as f64
                } else {
                    0.0
                },
            })
            .collect()
    }
}

impl Default for DesignDayDeriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Nearest-rank pick: sort by `(metric, date)` in the requested
/// direction and take index `floor(N * pct / 100)`. The index is
/// truncated, never rounded.
fn percentile_day<F>(daily: &[DailySummary], metric: F, pct: f64, ascending: bool) -> DailySummary
where
    F: Fn(&DailySummary) -> f64,
{
    let mut sorted: Vec<&DailySummary> = daily.iter().collect();
    sorted.sort_by(|a, b| {
        let ordering = metric(a)
            .partial_cmp(&metric(b))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.date.cmp(&b.date));
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });

    let idx = (sorted.len() as f64 * (pct / 100.0)) as usize;
    *sorted[idx.min(sorted.len() - 1)]
}

fn first_day_in_month(daily: &[DailySummary], month: u32) -> Option<DailySummary> {
    daily.iter().find(|d| d.date.month() == month).copied()
}
