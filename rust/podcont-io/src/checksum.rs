use podcont_common::{ErrorKind, Result};

/// Computes a checksum for a given buffer using the xxHash algorithm, folded to
/// 32 bits.
pub fn compute(buf: &[u8]) -> u32 {
    let h = xxhash_rust::xxh3::xxh3_64(buf);
    (h as u32) ^ ((h >> 32) as u32)
}

/// Validates a buffer by comparing its computed checksum with the provided one.
///
/// `name` identifies the element in the returned error.
pub fn validate_buffer(buf: &[u8], checksum: u32, name: &str) -> Result<()> {
    if compute(buf) == checksum {
        Ok(())
    } else {
        Err(ErrorKind::ChecksumMismatch {
            element: name.to_string(),
        }
        .into())
    }
}
