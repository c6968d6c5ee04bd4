//! # Feature Track
//!
//! A bounded-memory pipeline that tracks sparse image features across consecutive
//! frames of an image stream and collects the statistics needed to compare
//! detector and descriptor strategies.
//!
//! Every frame goes through the same states:
//!
//! ```text
//! Loaded -> Detected -> Filtered -> Described -> Matched
//!                                             \-> SkippedMatch (no previous frame)
//! ```
//!
//! * Detection, description and matching are delegated to providers behind the
//!   [`Detector`], [`Describer`] and [`Matcher`] traits. A [`ProviderFactory`]
//!   builds them for a [`Strategy`].
//! * Filtering restricts keypoints to a region of interest ([`RoiFilter`]).
//! * Frames live in a [`FrameBuffer`] that evicts the oldest frame when full, so
//!   memory stays bounded for streams of any length.
//! * [`MatchPolicy`] decides the distance norm and selection strategy from the
//!   descriptor strategy alone.
//! * [`RunStatistics`] accumulates per-frame measurements, which are printed with
//!   [`write_reports`].
//!
//! [`run`] processes one strategy over a frame range and [`evaluate`] runs a whole
//! plan, usually [`evaluation_plan`].

mod buffer;
mod error;
mod frame;
mod matcher;
mod pipeline;
mod policy;
pub mod provider;
mod report;
mod roi;
mod settings;
mod stats;
mod strategy;

pub use buffer::*;
pub use error::*;
pub use frame::*;
pub use matcher::*;
pub use pipeline::*;
pub use policy::*;
pub use provider::*;
pub use report::*;
pub use roi::*;
pub use settings::*;
pub use stats::*;
pub use strategy::*;
pub use track_core;
