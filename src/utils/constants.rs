/// Textual sentinels that mark a missing value in EPW numeric fields
pub const EPW_MISSING_SENTINELS: [&str; 9] = [
    "*", "**", "***", "****", "*****", "******", "?", "??", "undefined",
];

/// Catalog tags recognized in EPW filenames
pub const CATALOG_TAGS: [&str; 3] = ["TMY", "TRY", "CWEC"];

/// Header line prefixes for the EPW metadata blocks
pub const PREFIX_DESIGN_CONDITIONS: &str = "DESIGN CONDITIONS,";
pub const PREFIX_TYPICAL_PERIODS: &str = "TYPICAL/EXTREME PERIODS,";
pub const PREFIX_GROUND_TEMPERATURES: &str = "GROUND TEMPERATURES,";
pub const PREFIX_HOLIDAYS_DST: &str = "HOLIDAYS/DAYLIGHT SAVINGS,";
pub const PREFIX_DATA_PERIODS: &str = "DATA PERIODS,";

/// Header scan depth: metadata blocks appear within the first 20 lines
pub const HEADER_SCAN_LINES: usize = 20;

/// Fallback index of the first hourly line when no DATA PERIODS marker exists
pub const DEFAULT_DATA_START: usize = 8;

/// Number of header lines copied from a template EPW during wy3 conversion
pub const EPW_HEADER_LINES: usize = 8;

/// Processing defaults
pub const DEFAULT_HOURLY_ROWS: usize = 8760;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
