//! Inspect command implementation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use podcont::ImageLayout;
use serde::Serialize;

use crate::{
    commands::TrackContainer,
    track::TrackParCov,
    utils::{format_size, validate_file_exists},
};

#[derive(Serialize)]
struct InspectSummary {
    file: String,
    size_in_bytes: usize,
    header: HeaderInfo,
    layout: LayoutInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    elements: Vec<TrackParCov>,
}

#[derive(Serialize)]
struct HeaderInfo {
    user_info: u32,
    expand_policy: i32,
    n_objects: i32,
    booked_bytes: i32,
}

#[derive(Serialize)]
struct LayoutInfo {
    header_size: usize,
    data_offset: usize,
    element_size: usize,
    capacity: usize,
}

pub fn run(show: usize, json: bool, file: PathBuf) -> Result<()> {
    let summary = summarize(&file, show)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn summarize(file: &Path, show: usize) -> Result<InspectSummary> {
    validate_file_exists(file)?;
    let container: TrackContainer = podcont_io::load_container(file, None)
        .with_context(|| format!("Failed to load container image {}", file.display()))?;
    let header = container
        .header()
        .context("Loaded container has no header")?;

    type Layout = ImageLayout<TrackParCov, u32>;
    Ok(InspectSummary {
        file: file.display().to_string(),
        size_in_bytes: container.size_in_bytes(),
        header: HeaderInfo {
            user_info: *header.user_info(),
            expand_policy: header.expand_policy(),
            n_objects: header.n_objects(),
            booked_bytes: header.booked_bytes(),
        },
        layout: LayoutInfo {
            header_size: Layout::HEADER_SIZE,
            data_offset: Layout::DATA_OFFSET,
            element_size: Layout::ELEMENT_SIZE,
            capacity: container.capacity(),
        },
        elements: container.iter().take(show).copied().collect(),
    })
}

fn print_summary(summary: &InspectSummary) {
    println!("Image: {}", summary.file);
    println!(
        "  size:          {} ({} bytes)",
        format_size(summary.size_in_bytes as u64),
        summary.size_in_bytes
    );
    println!("  user info:     {:#x}", summary.header.user_info);
    println!("  expand policy: {}", summary.header.expand_policy);
    println!(
        "  elements:      {} of {}",
        summary.header.n_objects, summary.layout.capacity
    );
    println!(
        "  layout:        header {} B, data at {}, element {} B",
        summary.layout.header_size, summary.layout.data_offset, summary.layout.element_size
    );
    for (i, track) in summary.elements.iter().enumerate() {
        println!(
            "  [{i}] x={:.3} alpha={:.3} y={:.4} z={:.4} snp={:.4}",
            track.x, track.alpha, track.par[0], track.par[1], track.par[2]
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::track::{SEED_COV, SEED_PAR};

    use super::*;

    #[test]
    fn test_summarize_image() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("tracks.bin");
        let mut tracks = TrackContainer::with_capacity(5).unwrap();
        tracks.set_user_info(42).unwrap();
        for i in 0..3 {
            tracks
                .push_back(TrackParCov::new(i as f32, 0.0, SEED_PAR, SEED_COV))
                .unwrap();
        }
        podcont_io::save_container(&path, &tracks).unwrap();

        let summary = summarize(&path, 2).unwrap();
        assert_eq!(summary.header.user_info, 42);
        assert_eq!(summary.header.n_objects, 3);
        assert_eq!(summary.header.booked_bytes as usize, tracks.size_in_bytes());
        assert_eq!(summary.layout.capacity, 5);
        assert_eq!(summary.elements.len(), 2);
        assert_eq!(summary.elements[1].x, 1.0);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["header"]["n_objects"], 3);
    }

    #[test]
    fn test_summarize_rejects_garbage() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("garbage.bin");
        std::fs::write(&path, [0xffu8; 64]).unwrap();
        assert!(summarize(&path, 0).is_err());
    }
}
