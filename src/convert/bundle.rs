use crate::convert::Wy3Converter;
use crate::error::{ProcessingError, Result};
use crate::utils::constants::{DEFAULT_HOURLY_ROWS, EPW_HEADER_LINES};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::{write::FileOptions, ZipWriter};

/// Inputs for one wy3 -> EPW conversion run.
pub struct ConvertOptions {
    pub wy3_path: PathBuf,
    /// Template EPW whose first 8 header lines are copied into the output.
    pub epw_header: Option<PathBuf>,
    /// Companion files copied alongside the output, when supplied.
    pub stat_file: Option<PathBuf>,
    pub ddy_file: Option<PathBuf>,
    /// Output base path; `.epw`, `.stat`, `.ddy` and `.zip` extensions
    /// are derived from it.
    pub output_base: PathBuf,
    /// 1-based line number of the first wy3 record.
    pub first_record: usize,
    pub record_count: usize,
}

impl ConvertOptions {
    pub fn new(wy3_path: PathBuf, output_base: PathBuf, first_record: usize) -> Self {
        Self {
            wy3_path,
            epw_header: None,
            stat_file: None,
            ddy_file: None,
            output_base,
            first_record,
            record_count: DEFAULT_HOURLY_ROWS,
        }
    }
}

#[derive(Debug)]
pub struct ConvertReport {
    pub records_written: usize,
    pub epw_path: PathBuf,
    pub zip_path: PathBuf,
    pub companions: Vec<PathBuf>,
}

/// Convert a wy3 file to EPW, copy any companion files, and assemble the
/// results into an output zip. No partial output survives a failed
/// conversion: the transcoder's flag errors propagate before the zip is
/// assembled.
pub fn run_conversion(options: &ConvertOptions) -> Result<ConvertReport> {
    let epw_path = options.output_base.with_extension("epw");
    let zip_path = options.output_base.with_extension("zip");

    let mut writer = BufWriter::new(File::create(&epw_path)?);

    if let Some(header_path) = &options.epw_header {
        copy_header_lines(header_path, &mut writer)?;
    }

    let input = BufReader::new(File::open(&options.wy3_path)?);
    let converter = Wy3Converter::new(options.first_record, options.record_count);
    let records_written = converter.convert(input, &mut writer)?;
    writer.flush()?;

    let mut companions = Vec::new();
    if let Some(stat) = &options.stat_file {
        let dest = options.output_base.with_extension("stat");
        std::fs::copy(stat, &dest)?;
        companions.push(dest);
    }
    if let Some(ddy) = &options.ddy_file {
        let dest = options.output_base.with_extension("ddy");
        std::fs::copy(ddy, &dest)?;
        companions.push(dest);
    }

    let mut bundle_members = vec![epw_path.clone()];
    bundle_members.extend(companions.iter().cloned());
    write_bundle(&zip_path, &bundle_members)?;

    Ok(ConvertReport {
        records_written,
        epw_path,
        zip_path,
        companions,
    })
}

/// Copy exactly the first 8 lines of the template EPW.
fn copy_header_lines<W: Write>(header_path: &Path, writer: &mut W) -> Result<()> {
    let reader = BufReader::new(File::open(header_path)?);
    for line in reader.lines().take(EPW_HEADER_LINES) {
        writeln!(writer, "{}", line?)?;
    }
    Ok(())
}

fn write_bundle(zip_path: &Path, members: &[PathBuf]) -> Result<()> {
    let file = File::create(zip_path)?;
    let mut zip = ZipWriter::new(file);

    for member in members {
        let name = member
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ProcessingError::InvalidFormat(format!(
                    "unrepresentable bundle member name: {}",
                    member.display()
                ))
            })?;
        zip.start_file(name, FileOptions::default())?;
        let contents = std::fs::read(member)?;
        zip.write_all(&contents)?;
    }

    zip.finish()?;
    Ok(())
}
