use crate::error::Result;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Reads an extracted EPW text file into lines.
///
/// EPW files in the wild are not reliably UTF-8: Canadian station names
/// carry Latin-1 accents, so the bytes go through a Windows-1252 decode
/// rather than a UTF-8 assumption.
pub struct EpwFileReader {
    use_mmap: bool,
}

impl EpwFileReader {
    pub fn new() -> Self {
        Self { use_mmap: false }
    }

    /// Memory-map the file instead of streaming it; useful for the
    /// occasional multi-year EPW that runs to tens of megabytes.
    pub fn with_mmap(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    pub fn read_lines(&self, path: &Path) -> Result<Vec<String>> {
        let bytes = if self.use_mmap {
            let file = File::open(path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            mmap.to_vec()
        } else {
            let file = File::open(path)?;
            let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf)?;
            buf
        };

        let (text, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
        Ok(text.lines().map(|line| line.to_string()).collect())
    }
}

impl Default for EpwFileReader {
    fn default() -> Self {
        Self::new()
    }
}
