//! Concrete providers for `feature-track`.
//!
//! This crate contains the detectors and describers that run on real images, the
//! [`ImageSequence`] frame source and the [`OverlayObserver`] used by the
//! `kptrack` binary.

pub mod describers;
pub mod detectors;
mod overlay;
mod providers;
mod source;

pub use overlay::*;
pub use providers::*;
pub use source::*;
