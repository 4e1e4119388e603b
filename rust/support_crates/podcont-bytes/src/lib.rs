//! Owned byte allocations with a caller-chosen alignment, used as the single
//! backing store (and ownership token) of podcont containers.

pub mod align;
pub mod aligned;

pub use aligned::AlignedBytes;
