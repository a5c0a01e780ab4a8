//! Pixel sampling for the resampling step.
//!
//! The warper computes a real valued source coordinate for every destination
//! pixel. This module turns that coordinate into a pixel value.
//!
//! # Sampling Modes
//!
//! - **Nearest**: copies the pixel at `(floor(x), floor(y))`, the default.
//! - **Bilinear**: blends the four neighbouring pixels.
//!
//! Coordinates outside the image produce [`Sample::Fill`] instead of a pixel.

mod bilinear;
mod interpolate;
mod nearest;

pub use interpolate::{sample_pixel, Sample, SamplingMode};
