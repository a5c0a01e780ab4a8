use facewarp_image::{Image, ImageDtype};

use super::bilinear::bilinear_interpolation;
use super::nearest::nearest_neighbor_interpolation;

/// Source coordinates closer than this to an integer are snapped to it.
const SNAP_TOLERANCE: f64 = 1e-6;

/// Sampling mode used to read the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SamplingMode {
    /// Nearest neighbor, taking the pixel the coordinate falls in.
    #[default]
    Nearest,
    /// Bilinear blend of the four neighbouring pixels.
    Bilinear,
}

/// Outcome of sampling the source image at a real valued coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample<T, const C: usize> {
    /// The coordinate is inside the image, with the sampled value.
    Pixel([T; C]),
    /// The coordinate is outside the image and must be filled.
    Fill,
}

impl<T: Copy, const C: usize> Sample<T, C> {
    /// Resolve the sample to a pixel value, using `fill` for [`Sample::Fill`].
    #[inline]
    pub fn unwrap_or(self, fill: [T; C]) -> [T; C] {
        match self {
            Sample::Pixel(pixel) => pixel,
            Sample::Fill => fill,
        }
    }
}

#[inline]
fn snap(x: f64) -> f64 {
    let r = x.round();
    if (x - r).abs() <= SNAP_TOLERANCE {
        r
    } else {
        x
    }
}

/// Kernel for sampling a pixel value
///
/// # Arguments
///
/// * `image` - The input image container with shape (height, width, C).
/// * `u` - The x coordinate of the pixel to sample.
/// * `v` - The y coordinate of the pixel to sample.
/// * `mode` - The sampling mode to use.
///
/// # Returns
///
/// The sampled pixel, or [`Sample::Fill`] when `(u, v)` lies outside
/// `[0, width) x [0, height)`.
///
/// # Example
///
/// ```
/// use facewarp_image::Image;
/// use facewarp_imgwarp::interpolation::{sample_pixel, Sample, SamplingMode};
///
/// let image = Image::<u8, 1>::new([2, 1].into(), vec![10, 20]).unwrap();
///
/// assert_eq!(sample_pixel(&image, 1.7, 0.2, SamplingMode::Nearest), Sample::Pixel([20]));
/// assert_eq!(sample_pixel(&image, 2.0, 0.0, SamplingMode::Nearest), Sample::Fill);
/// ```
pub fn sample_pixel<T: ImageDtype, const C: usize>(
    image: &Image<T, C>,
    u: f64,
    v: f64,
    mode: SamplingMode,
) -> Sample<T, C> {
    let (u, v) = (snap(u), snap(v));

    // hard boundary, no clamping or mirroring
    let inside = u >= 0.0 && u < image.cols() as f64 && v >= 0.0 && v < image.rows() as f64;
    if !inside {
        return Sample::Fill;
    }

    match mode {
        SamplingMode::Nearest => Sample::Pixel(nearest_neighbor_interpolation(image, u, v)),
        SamplingMode::Bilinear => Sample::Pixel(bilinear_interpolation(image, u, v)),
    }
}

#[cfg(test)]
mod tests {
    use facewarp_image::{Image, ImageError};

    use super::{sample_pixel, Sample, SamplingMode};

    #[test]
    fn sample_snaps_round_off() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::new([3, 1].into(), vec![1, 2, 3])?;
        assert_eq!(
            sample_pixel(&image, 0.999_999_9, 0.0, SamplingMode::Nearest),
            Sample::Pixel([2])
        );
        assert_eq!(
            sample_pixel(&image, -1e-9, 0.0, SamplingMode::Nearest),
            Sample::Pixel([1])
        );
        assert_eq!(
            sample_pixel(&image, 2.999_999_9, 0.0, SamplingMode::Nearest),
            Sample::Fill
        );
        Ok(())
    }

    #[test]
    fn sample_outside_is_fill() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::new([2, 2].into(), vec![1, 2, 3, 4])?;
        for (u, v) in [(-0.5, 0.0), (0.0, -0.5), (2.0, 0.0), (0.0, 2.5), (f64::NAN, 0.0)] {
            assert_eq!(sample_pixel(&image, u, v, SamplingMode::Bilinear), Sample::Fill);
        }
        assert_eq!(Sample::<u8, 1>::Fill.unwrap_or([9]), [9]);
        Ok(())
    }
}
