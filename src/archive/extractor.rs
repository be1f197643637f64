use crate::error::{ProcessingError, Result};
use crate::utils::filename::has_epw_extension;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipArchive;

/// Extracts the EPW member of one zip archive into a private temporary
/// directory.
///
/// The directory lives as long as the extractor and is reclaimed when it
/// drops, on success and failure alike.
pub struct EpwExtractor {
    temp_dir: TempDir,
}

impl EpwExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    pub fn temp_dir_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Extract the first member carrying an EPW extension
    /// (case-insensitive). An archive without one is a per-archive
    /// failure the batch recovers from.
    pub fn extract_epw(&self, zip_path: &Path) -> Result<(PathBuf, String)> {
        let file = File::open(zip_path)?;
        let mut archive = ZipArchive::new(file)?;

        let member_name = archive
            .file_names()
            .find(|name| has_epw_extension(name))
            .map(str::to_string)
            .ok_or_else(|| ProcessingError::NoEpwMember(zip_path.display().to_string()))?;

        let mut member = archive.by_name(&member_name)?;
        let dest_path = self.temp_dir.path().join(&member_name);
        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let dest_file = File::create(&dest_path)?;
        let mut writer = BufWriter::new(dest_file);
        std::io::copy(&mut member, &mut writer)?;
        writer.flush()?;

        Ok((dest_path, member_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;
    use zip::{write::FileOptions, CompressionMethod, ZipWriter};

    fn zip_with_members(members: &[(&str, &str)]) -> Result<NamedTempFile> {
        let file = NamedTempFile::new()?;
        {
            let mut zip = ZipWriter::new(&file);
            for (name, contents) in members {
                zip.start_file(
                    *name,
                    FileOptions::default().compression_method(CompressionMethod::Stored),
                )?;
                zip.write_all(contents.as_bytes())?;
            }
            zip.finish()?;
        }
        Ok(file)
    }

    #[test]
    fn test_extracts_first_epw_member() -> Result<()> {
        let archive = zip_with_members(&[
            ("readme.txt", "notes"),
            ("CAN_ON_Ottawa_CWEC.epw", "LOCATION,Ottawa"),
        ])?;
        let extractor = EpwExtractor::new()?;

        let (path, name) = extractor.extract_epw(archive.path())?;
        assert_eq!(name, "CAN_ON_Ottawa_CWEC.epw");
        assert_eq!(std::fs::read_to_string(path)?, "LOCATION,Ottawa");
        Ok(())
    }

    #[test]
    fn test_extension_match_is_case_insensitive() -> Result<()> {
        let archive = zip_with_members(&[("WEATHER_TMY.EPW", "LOCATION,X")])?;
        let extractor = EpwExtractor::new()?;

        let (_, name) = extractor.extract_epw(archive.path())?;
        assert_eq!(name, "WEATHER_TMY.EPW");
        Ok(())
    }

    #[test]
    fn test_archive_without_epw_member_fails() -> Result<()> {
        let archive = zip_with_members(&[("readme.txt", "notes"), ("data.stat", "stats")])?;
        let extractor = EpwExtractor::new()?;

        let err = extractor.extract_epw(archive.path()).unwrap_err();
        assert!(matches!(err, ProcessingError::NoEpwMember(_)));
        Ok(())
    }

    #[test]
    fn test_temp_dir_is_reclaimed_on_drop() -> Result<()> {
        let extractor = EpwExtractor::new()?;
        let dir = extractor.temp_dir_path().to_path_buf();
        assert!(dir.exists());
        drop(extractor);
        assert!(!dir.exists());
        Ok(())
    }
}
