//! Moving container images to and from external media:
//! - `file`: a whole image per file, read back into an aligned buffer ready for
//!   zero-copy adoption.
//! - `stream`: an append-only file of checksummed images, one per event.
//! - `checksum`: the record checksum shared by the above.

pub mod checksum;
pub mod file;
pub mod stream;

pub use file::{load_container, read_from_bin_file, save_container, write_to_bin_file};
pub use stream::{ImageStreamReader, ImageStreamWriter};
