//! Alignment of an avatar face onto a target face.
//!
//! The avatar image is scaled so its face box matches the size of the target
//! face box, and placed on a transparent canvas with some padding around it so
//! the warp has room to move pixels outwards. Both landmark sets are then
//! expressed in the canvas frame and the canvas is warped.

use facewarp_image::{Image, ImageError, ImageSize};

use crate::error::WarpError;
use crate::geometry::Point;
use crate::parallel::{self, ExecutionStrategy};
use crate::warper::{WarpConfig, Warper};

/// Axis aligned box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width of the box.
    pub width: f64,
    /// Height of the box.
    pub height: f64,
}

impl BoundingBox {
    /// The top-left corner.
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn validate(&self) -> Result<(), WarpError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !(valid(self.width) && valid(self.height)) {
            return Err(WarpError::InvalidBoundingBox(self.width, self.height));
        }
        Ok(())
    }
}

/// A face found by a landmark detector.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaceDetection {
    /// Ordered landmarks in image coordinates.
    pub points: Vec<Point>,
    /// Box around the face.
    pub bbox: BoundingBox,
    /// Detector confidence.
    pub score: f64,
}

/// Parameters of the overlay layout.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OverlayConfig {
    /// Padding on each side of the scaled avatar, as a fraction of the avatar size.
    pub padding: f64,
    /// Detections with a lower score are rejected.
    pub min_score: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            padding: 0.5,
            min_score: 0.1,
        }
    }
}

/// Placement of the scaled avatar image on the overlay canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
    /// Horizontal scale from avatar to canvas.
    pub x_scale: f64,
    /// Vertical scale from avatar to canvas.
    pub y_scale: f64,
    /// Left padding of the canvas in pixels.
    pub x_pad: f64,
    /// Top padding of the canvas in pixels.
    pub y_pad: f64,
    /// Size of the canvas.
    pub size: ImageSize,
    /// Size of the avatar image.
    pub avatar_size: ImageSize,
}

impl OverlayLayout {
    /// Compute the canvas layout that brings the avatar face to the target face size.
    ///
    /// Negative padding is treated as zero.
    ///
    /// # Errors
    ///
    /// * A detection score is below `config.min_score`.
    /// * A face box has a non positive size.
    /// * The avatar or the resulting canvas is empty.
    pub fn new(
        avatar: &FaceDetection,
        target: &FaceDetection,
        avatar_size: ImageSize,
        config: &OverlayConfig,
    ) -> Result<Self, WarpError> {
        for detection in [avatar, target] {
            if detection.score.is_nan() || detection.score < config.min_score {
                log::warn!(
                    "rejecting face detection with score {} (min {})",
                    detection.score,
                    config.min_score
                );
                return Err(WarpError::LowConfidence(detection.score, config.min_score));
            }
            detection.bbox.validate()?;
        }

        if avatar_size.is_empty() {
            return Err(ImageError::EmptyImage(avatar_size.width, avatar_size.height).into());
        }

        let padding = config.padding.max(0.0);
        let (width, height) = (avatar_size.width as f64, avatar_size.height as f64);

        let x_scale = target.bbox.width / avatar.bbox.width;
        let y_scale = target.bbox.height / avatar.bbox.height;
        let x_pad = width * padding;
        let y_pad = height * padding;

        let size = ImageSize {
            width: (width * x_scale + 2.0 * x_pad).floor() as usize,
            height: (height * y_scale + 2.0 * y_pad).floor() as usize,
        };
        if size.is_empty() {
            return Err(ImageError::EmptyImage(size.width, size.height).into());
        }

        Ok(Self {
            x_scale,
            y_scale,
            x_pad,
            y_pad,
            size,
            avatar_size,
        })
    }

    /// Map a point of the avatar image onto the canvas.
    pub fn to_canvas(&self, p: Point) -> Point {
        Point::new(p.x * self.x_scale + self.x_pad, p.y * self.y_scale + self.y_pad)
    }

    /// The avatar landmarks in canvas coordinates.
    pub fn source_points(&self, avatar: &FaceDetection) -> Vec<Point> {
        avatar.points.iter().map(|p| self.to_canvas(*p)).collect()
    }

    /// The target landmarks in canvas coordinates.
    ///
    /// The target face is moved so its box sits where the scaled avatar box is.
    pub fn target_points(&self, avatar: &FaceDetection, target: &FaceDetection) -> Vec<Point> {
        let anchor = self.to_canvas(avatar.bbox.origin());
        target
            .points
            .iter()
            .map(|p| *p - target.bbox.origin() + anchor)
            .collect()
    }

    /// Draw the scaled avatar on a transparent canvas.
    ///
    /// Uses nearest neighbor scaling, sampling the avatar at pixel centers.
    ///
    /// # Errors
    ///
    /// The avatar image does not have the size the layout was computed for.
    pub fn compose(
        &self,
        avatar_image: &Image<u8, 4>,
        strategy: ExecutionStrategy,
    ) -> Result<Image<u8, 4>, WarpError> {
        if avatar_image.size() != self.avatar_size {
            return Err(ImageError::InvalidImageSize(
                avatar_image.width(),
                avatar_image.height(),
                self.avatar_size.width,
                self.avatar_size.height,
            )
            .into());
        }

        let mut canvas = Image::<u8, 4>::from_size_val(self.size, 0)?;
        let (src_width, src_height) = (self.avatar_size.width as f64, self.avatar_size.height as f64);

        parallel::par_iter_bands(strategy, canvas.as_slice_mut(), self.size.width * 4, |y, row| {
            let v = (y as f64 + 0.5 - self.y_pad) / self.y_scale;
            if !(0.0..src_height).contains(&v) {
                return;
            }
            for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                let u = (x as f64 + 0.5 - self.x_pad) / self.x_scale;
                if !(0.0..src_width).contains(&u) {
                    continue;
                }
                if let Ok(src) = avatar_image.get_pixel(u as usize, v as usize) {
                    pixel.copy_from_slice(src);
                }
            }
        })?;

        Ok(canvas)
    }
}

/// An avatar warped onto a target face.
#[derive(Debug, Clone)]
pub struct Overlay {
    /// The warped canvas.
    pub image: Image<u8, 4>,
    /// Placement of the avatar on the canvas.
    pub layout: OverlayLayout,
}

/// Warp an avatar image so that its face takes the shape of a target face.
///
/// # Arguments
///
/// * `avatar_image` - The image containing the avatar face.
/// * `avatar` - The detection of the avatar face, in `avatar_image` coordinates.
/// * `target` - The detection of the target face, in its own image coordinates.
/// * `overlay_config` - The canvas layout parameters.
/// * `warp_config` - The warp parameters.
///
/// # Errors
///
/// Any error of [`OverlayLayout::new`] or [`Warper::warp`].
pub fn warp_overlay(
    avatar_image: &Image<u8, 4>,
    avatar: &FaceDetection,
    target: &FaceDetection,
    overlay_config: &OverlayConfig,
    warp_config: WarpConfig,
) -> Result<Overlay, WarpError> {
    let layout = OverlayLayout::new(avatar, target, avatar_image.size(), overlay_config)?;
    log::debug!(
        "overlay canvas {} with scale ({}, {})",
        layout.size,
        layout.x_scale,
        layout.y_scale
    );

    let canvas = layout.compose(avatar_image, warp_config.strategy)?;
    let warper = Warper::new(layout.size, warp_config)?;

    let from = layout.source_points(avatar);
    let to = layout.target_points(avatar, target);
    let image = warper.warp(&canvas, &from, &to)?;

    Ok(Overlay { image, layout })
}
