//! Stream-info command implementation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use podcont_io::ImageStreamReader;

use crate::utils::{format_size, validate_file_exists};

/// Alignment of the buffers records are read into.
const STREAM_ALIGNMENT: usize = 64;

#[derive(Debug, Default, PartialEq)]
struct StreamStats {
    records: u64,
    total_bytes: u64,
    min_record: Option<usize>,
    max_record: Option<usize>,
}

impl StreamStats {
    fn add(&mut self, size: usize) {
        self.records += 1;
        self.total_bytes += size as u64;
        self.min_record = Some(self.min_record.map_or(size, |m| m.min(size)));
        self.max_record = Some(self.max_record.map_or(size, |m| m.max(size)));
    }
}

pub fn run(verbose: u8, file: PathBuf) -> Result<()> {
    let stats = scan(&file, verbose)?;
    println!("Stream: {}", file.display());
    println!("  records:     {}", stats.records);
    println!("  image bytes: {}", format_size(stats.total_bytes));
    if let (Some(min), Some(max)) = (stats.min_record, stats.max_record) {
        println!("  record size: {min}..={max} bytes");
    }
    println!("  checksums:   ok");
    Ok(())
}

fn scan(file: &Path, verbose: u8) -> Result<StreamStats> {
    validate_file_exists(file)?;
    let reader = ImageStreamReader::open(file, STREAM_ALIGNMENT)
        .with_context(|| format!("Failed to open image stream {}", file.display()))?;
    let mut stats = StreamStats::default();
    for image in reader {
        let image = image.with_context(|| {
            format!(
                "Stream {} is damaged after {} records",
                file.display(),
                stats.records
            )
        })?;
        if verbose > 0 {
            println!("  record {:>6}: {} bytes", stats.records, image.len());
        }
        stats.add(image.len());
    }
    log::debug!("scanned {} records in {}", stats.records, file.display());
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use podcont_io::ImageStreamWriter;

    use super::*;

    #[test]
    fn test_scan_counts_records() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("s.podc");
        let mut writer = ImageStreamWriter::create(&path).unwrap();
        writer.append(&[1u8; 10]).unwrap();
        writer.append(&[2u8; 30]).unwrap();
        writer.append(&[3u8; 20]).unwrap();
        writer.seal_and_sync().unwrap();

        let stats = scan(&path, 0).unwrap();
        assert_eq!(
            stats,
            StreamStats {
                records: 3,
                total_bytes: 60,
                min_record: Some(10),
                max_record: Some(30),
            }
        );
    }

    #[test]
    fn test_scan_reports_damage() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("s.podc");
        let mut writer = ImageStreamWriter::create(&path).unwrap();
        writer.append(&[7u8; 16]).unwrap();
        writer.seal_and_sync().unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        bytes.pop();
        std::fs::write(&path, bytes).unwrap();
        let err = scan(&path, 0).unwrap_err();
        assert!(err.to_string().contains("after 0 records"));
    }
}
