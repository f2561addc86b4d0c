//! Core types and utilities for monocular road curvature estimation.
//!
//! This crate is intentionally small and purely geometric. It knows about
//! camera geometry, homographies and pixel containers, but nothing about
//! curvature candidates or scoring.

mod geometry;
mod homography;
mod image;
mod logger;
mod warp;

pub use geometry::{CameraGeometry, GeometryError};
pub use homography::{homography_from_4pt, Homography};
pub use image::{sample_bilinear_rgb, Frame, FrameView, RectifiedImage, Rgb};
pub use warp::{warp_perspective_rgb, WarpError};

#[cfg(feature = "tracing")]
pub use logger::{init_tracing, DEFAULT_TRACING_FILTER};

pub use logger::init_with_level;
