use crate::error::{ProcessingError, Result};
use crate::utils::constants::CATALOG_TAGS;

/// Extract the catalog classification from an EPW filename.
///
/// The tag must start with TMY, TRY or CWEC and run to the end of the file
/// stem (e.g. `CAN_ON_Ottawa_CWEC2020.epw` -> `CWEC2020`). A filename
/// without a recognized tag is a hard failure, not a soft default.
pub fn extract_catalog(epw_filename: &str) -> Result<String> {
    let stem = epw_filename
        .strip_suffix(".epw")
        .ok_or_else(|| ProcessingError::CatalogNotFound(epw_filename.to_string()))?;

    let earliest = CATALOG_TAGS
        .iter()
        .filter_map(|tag| stem.find(tag))
        .min()
        .ok_or_else(|| ProcessingError::CatalogNotFound(epw_filename.to_string()))?;

    Ok(stem[earliest..].to_string())
}

/// True when a zip member name carries an EPW extension, case-insensitively.
pub fn has_epw_extension(name: &str) -> bool {
    name.to_lowercase().ends_with(".epw")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_catalog_plain_tag() {
        assert_eq!(extract_catalog("CAN_PQ_Montreal_TMY.epw").unwrap(), "TMY");
    }

    #[test]
    fn test_extract_catalog_tag_with_suffix() {
        assert_eq!(
            extract_catalog("CAN_ON_Ottawa.Intl.AP.716280_CWEC2020.epw").unwrap(),
            "CWEC2020"
        );
        assert_eq!(extract_catalog("DEU_Berlin_TRY2015.epw").unwrap(), "TRY2015");
    }

    #[test]
    fn test_extract_catalog_missing_tag_is_error() {
        let err = extract_catalog("CAN_ON_Ottawa.epw").unwrap_err();
        assert!(matches!(
            err,
            crate::error::ProcessingError::CatalogNotFound(_)
        ));
    }

    #[test]
    fn test_extract_catalog_requires_epw_suffix() {
        assert!(extract_catalog("CAN_PQ_Montreal_TMY.zip").is_err());
    }

    #[test]
    fn test_has_epw_extension() {
        assert!(has_epw_extension("weather.EPW"));
        assert!(has_epw_extension("nested/dir/weather.epw"));
        assert!(!has_epw_extension("weather.stat"));
    }
}
