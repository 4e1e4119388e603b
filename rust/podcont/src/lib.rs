//! A self-describing container of plain-data objects backed by one contiguous
//! byte allocation.
//!
//! The whole collection, a small header followed by the element array, lives in a
//! single image that can be moved, persisted or sent elsewhere as an opaque byte
//! range and adopted back without per-element decoding:
//!
//! ```
//! use podcont::Container;
//!
//! let mut tracks = Container::<[f32; 4], u32>::new();
//! tracks.set_user_info(7).unwrap();
//! tracks.push_back([1.0, 2.0, 3.0, 4.0]).unwrap();
//!
//! let image = tracks.release().unwrap();
//! let len = image.len();
//! let restored = Container::<[f32; 4], u32>::from_bytes(image, Some(len)).unwrap();
//! assert_eq!(restored.user_info(), Some(&7));
//! assert_eq!(restored[0], [1.0, 2.0, 3.0, 4.0]);
//! ```

pub mod builder;
pub mod container;
pub mod layout;
pub mod policy;

pub use builder::ContainerBuilder;
pub use container::Container;
pub use layout::{Header, ImageLayout, SizeType};
pub use policy::ExpandPolicy;

pub use podcont_bytes::AlignedBytes;
pub use podcont_common::{Error, ErrorKind, Result};

#[cfg(test)]
mod tests;
