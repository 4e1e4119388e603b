//! Command implementations for podcont-cmd

use podcont::Container;

use crate::track::TrackParCov;

pub mod demo;
pub mod inspect;
pub mod stream_info;

/// Track container tagged with a 32-bit data identifier.
pub type TrackContainer = Container<TrackParCov, u32>;
