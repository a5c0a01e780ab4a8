#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// error types for the warping module.
pub mod error;

/// 2d points and 2x2 matrices.
pub mod geometry;

/// moving least squares affine deformation.
pub mod deformation;

/// regular grids over the image plane.
pub mod grid;

/// utilities for interpolation.
pub mod interpolation;

/// module containing parallization utilities.
pub mod parallel;

/// resampling of a source image through a deformed grid.
pub mod resample;

/// landmark-driven image warper.
pub mod warper;

/// alignment of an avatar face onto a target face.
pub mod overlay;

pub use crate::deformation::AffineDeformation;
pub use crate::error::WarpError;
pub use crate::geometry::{Mat2, Point};
pub use crate::grid::{DeformedGrid, Grid};
pub use crate::interpolation::{Sample, SamplingMode};
pub use crate::overlay::{
    warp_overlay, BoundingBox, FaceDetection, Overlay, OverlayConfig, OverlayLayout,
};
pub use crate::parallel::ExecutionStrategy;
pub use crate::warper::{WarpConfig, Warper};
