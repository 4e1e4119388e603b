use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use bytemuck::Pod;
use podcont::{Container, ImageLayout};
use podcont_bytes::AlignedBytes;
use podcont_common::{Error, Result};

/// Writes `bytes` to `path`, replacing any existing file, and syncs it to disk.
pub fn write_to_bin_file<P: AsRef<Path>>(path: P, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()
}

/// Reads the whole file at `path` into a new buffer aligned to `alignment`, which
/// must be a power of two.
pub fn read_from_bin_file<P: AsRef<Path>>(
    path: P,
    alignment: usize,
) -> std::io::Result<AlignedBytes> {
    if !alignment.is_power_of_two() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("alignment {alignment} is not a power of two"),
        ));
    }
    let mut file = File::open(path)?;
    let len = usize::try_from(file.metadata()?.len())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let mut buf = AlignedBytes::try_zeroed(len, alignment)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::OutOfMemory, e))?;
    file.read_exact(&mut buf)?;
    Ok(buf)
}

/// Writes the image of `container` to `path`.
pub fn save_container<T: Pod, H: Pod, P: AsRef<Path>>(
    path: P,
    container: &Container<T, H>,
) -> Result<()> {
    let path = path.as_ref();
    if container.is_detached() {
        return Err(Error::invalid_operation("save of a detached container"));
    }
    write_to_bin_file(path, container.as_bytes())
        .map_err(|e| Error::io(path.display().to_string(), e))?;
    log::debug!(
        "saved {} elements ({} bytes) to {}",
        container.len(),
        container.size_in_bytes(),
        path.display()
    );
    Ok(())
}

/// Reads an image file written by [`save_container`] and adopts it without a further
/// copy. `expected_len`, when given, is checked against the size recorded in the image.
pub fn load_container<T: Pod, H: Pod, P: AsRef<Path>>(
    path: P,
    expected_len: Option<usize>,
) -> Result<Container<T, H>> {
    let path = path.as_ref();
    let bytes = read_from_bin_file(path, ImageLayout::<T, H>::BUFFER_ALIGNMENT)
        .map_err(|e| Error::io(path.display().to_string(), e))?;
    Container::from_bytes(bytes, expected_len)
}
