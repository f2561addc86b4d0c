//! High-level facade crate for the `roadcurve-*` workspace.
//!
//! This crate provides:
//! - stable re-exports of the geometry and search crates,
//! - a frame-stream driver with sampling cadence and diagnostics sinks,
//! - (feature-gated) image-directory frame sources and PNG diagnostics.
//!
//! ## Quickstart
//!
//! ```no_run
//! use roadcurve::frames::ImageSequenceSource;
//! use roadcurve::stream::{run_stream, FrameCadence};
//! use roadcurve::search::CurvatureConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CurvatureConfig::load_json("camera.json")?;
//! let search = config.build_search()?;
//! let mut frames = ImageSequenceSource::open("frames/")?;
//!
//! let outcome = run_stream(&mut frames, FrameCadence::default(), &search, None)?;
//! for frame in &outcome.frames {
//!     println!("frame {}: {}", frame.frame_index, frame.candidate);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `roadcurve::core`: camera geometry, homographies, frames and rectified images.
//! - `roadcurve::search`: candidate set, rectification, shift, profile, scoring and search.
//! - `roadcurve::stream`: frame sources, cadence, diagnostics sinks and the stream driver.
//! - `roadcurve::frames` (feature `image`): image-directory source and PNG dumps.

pub use roadcurve_core as core;
pub use roadcurve_search as search;

pub use roadcurve_core::{CameraGeometry, Frame, FrameView, RectifiedImage};
pub use roadcurve_search::{
    CurvatureConfig, CurvatureEstimate, CurvatureSearch, FrameEstimate, RadiusCandidate,
    RunReport, SearchParams,
};

pub mod stream;

#[cfg(feature = "image")]
pub mod frames;
