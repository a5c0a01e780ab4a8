use facewarp_image::{Image, ImageDtype};

/// Kernel for nearest neighbor interpolation
///
/// Takes the pixel whose area contains `(u, v)`, i.e. `(floor(u), floor(v))`.
/// The coordinate must be inside the image.
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
///
/// # Returns
///
/// The interpolated pixel values.
pub(crate) fn nearest_neighbor_interpolation<T: ImageDtype, const C: usize>(
    image: &Image<T, C>,
    u: f64,
    v: f64,
) -> [T; C] {
    let (rows, cols) = (image.rows(), image.cols());

    let iu = (u.floor() as usize).min(cols - 1);
    let iv = (v.floor() as usize).min(rows - 1);

    let base = (iv * cols + iu) * C;

    let mut pixel = [T::default(); C];
    pixel.copy_from_slice(&image.as_slice()[base..base + C]);

    pixel
}
