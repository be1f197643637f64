use serde::{Deserialize, Serialize};

/// Tag for the humidity value attached to a design day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HumidityType {
    HumidityRatio,
    WetBulb,
}

impl HumidityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HumidityType::HumidityRatio => "HumidityRatio",
            HumidityType::WetBulb => "WetBulb",
        }
    }
}

impl std::fmt::Display for HumidityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One of the seven named summary days derived from a location's hourly
/// series. Recomputed whenever the series is reprocessed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignDayBlock {
    pub name: String,
    pub month: u32,
    pub day: u32,
    pub dry_bulb: f64,
    pub humidity_value: f64,
    pub humidity_type: HumidityType,
    pub wind_speed: f64,
    pub wind_direction: f64,
}

impl DesignDayBlock {
    pub fn new(
        name: &str,
        month: u32,
        day: u32,
        dry_bulb: f64,
        humidity_value: f64,
        humidity_type: HumidityType,
    ) -> Self {
        // Nominal wind conditions shared by every block
        Self {
            name: name.to_string(),
            month,
            day,
            dry_bulb,
            humidity_value,
            humidity_type,
            wind_speed: 2.5,
            wind_direction: 270.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humidity_type_labels() {
        assert_eq!(HumidityType::HumidityRatio.as_str(), "HumidityRatio");
        assert_eq!(HumidityType::WetBulb.to_string(), "WetBulb");
    }

    #[test]
    fn test_nominal_wind() {
        let block = DesignDayBlock::new("Heating 99.6%", 1, 15, -24.1, 0.001, HumidityType::HumidityRatio);
        assert_eq!(block.wind_speed, 2.5);
        assert_eq!(block.wind_direction, 270.0);
    }
}
