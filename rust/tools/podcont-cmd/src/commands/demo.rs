//! Demo command implementation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use podcont_io::{
    ImageStreamWriter, load_container, read_from_bin_file, save_container, write_to_bin_file,
};

use crate::{
    commands::TrackContainer,
    track::{SEED_COV, SEED_PAR, TrackParCov},
    utils::format_size,
};

/// Data identifier stored in the container header.
const USER_INFO: u32 = 0xdead_beaf;

/// Magnetic field, kG.
const FIELD: f32 = 5.0;

pub fn run(count: usize, events: usize, dir: PathBuf) -> Result<()> {
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut tracks = fill_tracks(count)?;
    log::info!(
        "filled {} tracks, capacity {}, image {}",
        tracks.len(),
        tracks.capacity(),
        format_size(tracks.size_in_bytes() as u64)
    );

    let adopted = roundtrip_by_ownership(&tracks, &dir.join("containerTest0.bin"))?;
    let copied = roundtrip_by_copy(tracks.clone(), &dir.join("containerTest1.bin"))?;
    for (name, restored) in [("ownership", &adopted), ("copy", &copied)] {
        anyhow::ensure!(
            restored.as_bytes() == tracks.as_bytes(),
            "{name} round trip changed the image"
        );
        println!(
            "{name:>9}: {} tracks, user info {:#x}, capacity {}",
            restored.len(),
            restored.user_info().copied().unwrap_or_default(),
            restored.capacity()
        );
    }

    let stream_path = dir.join("containerStream.podc");
    let stuck = write_event_stream(&mut tracks, events, &stream_path)?;
    println!(
        "   stream: {events} events in {} ({stuck} stalled propagations)",
        stream_path.display()
    );
    Ok(())
}

fn fill_tracks(count: usize) -> Result<TrackContainer> {
    let mut tracks = TrackContainer::new();
    tracks.set_user_info(USER_INFO)?;
    for i in 0..count {
        let mut track = TrackParCov::new(0.0, 0.0, SEED_PAR, SEED_COV);
        track.propagate_to((1 + (i * 10) % 100) as f32, FIELD);
        tracks.push_back(track)?;

        tracks.emplace_back(|track| {
            *track = TrackParCov::new(0.0, 1.0, SEED_PAR, SEED_COV);
            track.propagate_to((5 + (i * 10) % 100) as f32, FIELD);
        })?;
    }
    Ok(tracks)
}

/// Saves the image and adopts the file contents without a further copy.
fn roundtrip_by_ownership(tracks: &TrackContainer, path: &Path) -> Result<TrackContainer> {
    save_container(path, tracks)?;
    let restored = load_container(path, Some(tracks.size_in_bytes()))
        .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(restored)
}

/// Releases the image out of `tracks`, saves it and restores a copy of the
/// file contents.
fn roundtrip_by_copy(mut tracks: TrackContainer, path: &Path) -> Result<TrackContainer> {
    let image = tracks
        .release()
        .context("Container has no image to release")?;
    write_to_bin_file(path, &image)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    drop(image);

    let bytes = read_from_bin_file(path, 1)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let restored = TrackContainer::copy_from_bytes(&bytes, None)?;
    Ok(restored)
}

/// Writes one snapshot per event, moving every track slightly outwards between
/// snapshots. Returns the number of propagations that could not be applied.
fn write_event_stream(tracks: &mut TrackContainer, events: usize, path: &Path) -> Result<usize> {
    let mut writer = ImageStreamWriter::create(path)?;
    let mut stuck = 0;
    for event in 0..events {
        for (j, track) in tracks.as_mut_slice().iter_mut().enumerate().rev() {
            let step = ((event * 10 + j) % 20) as f32;
            if !track.propagate_to(track.x + step, FIELD) {
                stuck += 1;
            }
        }
        writer.append_container(tracks)?;
    }
    log::debug!("wrote {} stream records", writer.records_written());
    writer.seal_and_sync()?;
    Ok(stuck)
}
