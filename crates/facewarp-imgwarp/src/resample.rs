use facewarp_image::{Image, ImageDtype, ImageError};

use crate::error::WarpError;
use crate::geometry::Point;
use crate::grid::{DeformedGrid, Grid, PixelRect};
use crate::interpolation::{sample_pixel, SamplingMode};
use crate::parallel::{self, ExecutionStrategy};

/// Visit every destination pixel of a cell together with its source coordinate.
///
/// The destination footprint is the undeformed, axis-aligned cell `rect`. The
/// source coordinate of pixel `(i, j)` is the bilinear blend of the deformed
/// `corners` (`[top-left, top-right, bottom-right, bottom-left]`) at the
/// pixel's fractional position inside the cell. Empty cells visit nothing.
pub(crate) fn for_each_cell_pixel<F>(rect: PixelRect, corners: &[Point; 4], mut f: F)
where
    F: FnMut(usize, usize, Point),
{
    if rect.is_empty() {
        return;
    }

    let [tl, tr, br, bl] = *corners;
    let width = (rect.x1 - rect.x0) as f64;
    let height = (rect.y1 - rect.y0) as f64;

    for j in rect.y0..rect.y1 {
        let yl = (j - rect.y0) as f64 / height;
        let yr = 1.0 - yl;
        for i in rect.x0..rect.x1 {
            let xl = (i - rect.x0) as f64 / width;
            let xr = 1.0 - xl;
            let top = tl * xr + tr * xl;
            let bottom = bl * xr + br * xl;
            f(i, j, top * yr + bottom * yl);
        }
    }
}

/// Resample a source image through a deformed grid.
///
/// Every destination pixel belongs to exactly one cell of `grid`. Its value
/// is read from the source image at the matching position inside the same
/// cell of `deformed`, or set to `fill` when that position falls outside the
/// source image.
///
/// # Arguments
///
/// * `src` - The source image, with the size the grid was built for.
/// * `grid` - The undeformed grid, defining the destination cells.
/// * `deformed` - The grid with its vertices mapped to source coordinates.
/// * `fill` - The value of destination pixels sampled outside the source.
/// * `mode` - How to sample the source image.
/// * `strategy` - How to distribute the cells over threads.
///
/// # Returns
///
/// A newly allocated image with the size of `src`.
///
/// # Errors
///
/// * The source size does not match the grid.
/// * The deformed grid has a different cell layout than the grid.
pub fn remap_grid<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    grid: &Grid,
    deformed: &DeformedGrid,
    fill: [T; C],
    mode: SamplingMode,
    strategy: ExecutionStrategy,
) -> Result<Image<T, C>, WarpError> {
    let size = grid.image_size();
    if src.size() != size {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            size.width,
            size.height,
        )
        .into());
    }

    if (deformed.cols(), deformed.rows()) != (grid.cols(), grid.rows()) {
        return Err(WarpError::GridLayoutMismatch(
            deformed.cols(),
            deformed.rows(),
            grid.cols(),
            grid.rows(),
        ));
    }

    let mut dst = Image::<T, C>::from_size_val(size, T::default())?;

    let cols = grid.cols();
    let row_stride = size.width * C;
    let band_rows = grid.grid_size();

    // one band per row of cells, bands never overlap
    parallel::par_iter_bands(
        strategy,
        dst.as_slice_mut(),
        row_stride * band_rows,
        |band_idx, band| {
            let band_y0 = band_idx * band_rows;
            for cell_idx in band_idx * cols..(band_idx + 1) * cols {
                let (Some(rect), Some(corners)) = (grid.cell_rect(cell_idx), deformed.cell(cell_idx))
                else {
                    continue;
                };
                for_each_cell_pixel(rect, &corners, |i, j, p| {
                    let base = (j - band_y0) * row_stride + i * C;
                    let pixel = sample_pixel(src, p.x, p.y, mode).unwrap_or(fill);
                    band[base..base + C].copy_from_slice(&pixel);
                });
            }
        },
    )?;

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use facewarp_image::Image;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::{for_each_cell_pixel, remap_grid};
    use crate::deformation::AffineDeformation;
    use crate::error::WarpError;
    use crate::geometry::Point;
    use crate::grid::{Grid, PixelRect};
    use crate::interpolation::SamplingMode;
    use crate::parallel::ExecutionStrategy;

    fn random_image(width: usize, height: usize, seed: u64) -> Result<Image<u8, 4>, WarpError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = (0..width * height * 4).map(|_| rng.random::<u8>()).collect();
        Ok(Image::new([width, height].into(), data)?)
    }

    fn bulge(width: usize, height: usize) -> Result<AffineDeformation, WarpError> {
        let (w, h) = (width as f64, height as f64);
        let from = vec![
            Point::new(0.2 * w, 0.3 * h),
            Point::new(0.8 * w, 0.3 * h),
            Point::new(0.5 * w, 0.5 * h),
            Point::new(0.3 * w, 0.8 * h),
            Point::new(0.7 * w, 0.8 * h),
        ];
        let to = vec![
            Point::new(0.15 * w, 0.25 * h),
            Point::new(0.85 * w, 0.28 * h),
            Point::new(0.52 * w, 0.47 * h),
            Point::new(0.25 * w, 0.9 * h),
            Point::new(0.75 * w, 0.85 * h),
        ];
        AffineDeformation::new(from, to, 1.0)
    }

    #[test]
    fn cell_pixels_interpolate_corners() {
        let rect = PixelRect {
            x0: 0,
            x1: 2,
            y0: 0,
            y1: 2,
        };
        let corners = [
            Point::new(10.0, 10.0),
            Point::new(14.0, 10.0),
            Point::new(14.0, 18.0),
            Point::new(10.0, 18.0),
        ];
        let mut visited = vec![];
        for_each_cell_pixel(rect, &corners, |i, j, p| visited.push((i, j, p)));
        assert_eq!(
            visited,
            vec![
                (0, 0, Point::new(10.0, 10.0)),
                (1, 0, Point::new(12.0, 10.0)),
                (0, 1, Point::new(10.0, 14.0)),
                (1, 1, Point::new(12.0, 14.0)),
            ]
        );
    }

    #[test]
    fn empty_cells_are_skipped() {
        let rect = PixelRect {
            x0: 3,
            x1: 3,
            y0: 0,
            y1: 5,
        };
        let mut count = 0;
        for_each_cell_pixel(rect, &[Point::default(); 4], |_, _, _| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn every_pixel_is_written_once() -> Result<(), WarpError> {
        let (width, height) = (67, 45);
        let grid = Grid::new([width, height].into(), 20)?;
        let deformed = grid.deform(&bulge(width, height)?, ExecutionStrategy::Serial)?;

        let mut hits = vec![0u32; width * height];
        for idx in 0..grid.num_cells() {
            let (Some(rect), Some(corners)) = (grid.cell_rect(idx), deformed.cell(idx)) else {
                continue;
            };
            for_each_cell_pixel(rect, &corners, |i, j, _| hits[j * width + i] += 1);
        }
        assert!(hits.iter().all(|&h| h == 1));
        Ok(())
    }

    #[test]
    fn strategies_are_bit_identical() -> Result<(), WarpError> {
        let (width, height) = (83, 61);
        let src = random_image(width, height, 7)?;
        let grid = Grid::new(src.size(), 16)?;
        let deformed = grid.deform(&bulge(width, height)?, ExecutionStrategy::ParallelCells)?;

        let fill = [1, 2, 3, 4];
        let serial = remap_grid(
            &src,
            &grid,
            &deformed,
            fill,
            SamplingMode::Nearest,
            ExecutionStrategy::Serial,
        )?;
        for strategy in [ExecutionStrategy::ParallelCells, ExecutionStrategy::Fixed(3)] {
            let out = remap_grid(&src, &grid, &deformed, fill, SamplingMode::Nearest, strategy)?;
            assert_eq!(out, serial);
        }
        Ok(())
    }

    #[test]
    fn output_is_source_pixels_or_fill() -> Result<(), WarpError> {
        let (width, height) = (40, 30);
        let src = random_image(width, height, 11)?;
        let grid = Grid::new(src.size(), 8)?;
        let deformation = AffineDeformation::new(
            vec![Point::new(10.0, 10.0), Point::new(30.0, 10.0), Point::new(20.0, 25.0)],
            vec![Point::new(4.0, 12.0), Point::new(36.0, 6.0), Point::new(22.0, 29.0)],
            1.0,
        )?;
        let deformed = grid.deform(&deformation, ExecutionStrategy::Serial)?;

        let fill = [7, 7, 7, 7];
        let out = remap_grid(
            &src,
            &grid,
            &deformed,
            fill,
            SamplingMode::Nearest,
            ExecutionStrategy::ParallelCells,
        )?;

        let source_pixels = src.as_slice().chunks_exact(4).collect::<Vec<_>>();
        for pixel in out.as_slice().chunks_exact(4) {
            assert!(pixel == fill || source_pixels.contains(&pixel));
        }
        Ok(())
    }

    #[test]
    fn size_mismatch_is_rejected() -> Result<(), WarpError> {
        let src = random_image(10, 10, 3)?;
        let grid = Grid::new([12, 10].into(), 5)?;
        let deformation =
            AffineDeformation::new(vec![Point::new(0.0, 0.0)], vec![Point::new(0.0, 0.0)], 1.0)?;
        let deformed = grid.deform(&deformation, ExecutionStrategy::Serial)?;
        let res = remap_grid(
            &src,
            &grid,
            &deformed,
            [0; 4],
            SamplingMode::Nearest,
            ExecutionStrategy::Serial,
        );
        assert!(matches!(res, Err(WarpError::ImageError(_))));
        Ok(())
    }

    #[test]
    fn transposed_grid_is_rejected() -> Result<(), WarpError> {
        let src = random_image(40, 20, 5)?;
        let grid = Grid::new(src.size(), 10)?;
        let transposed = Grid::new([20, 40].into(), 10)?;
        assert_eq!(grid.num_cells(), transposed.num_cells());

        let deformation =
            AffineDeformation::new(vec![Point::new(0.0, 0.0)], vec![Point::new(1.0, 0.0)], 1.0)?;
        let deformed = transposed.deform(&deformation, ExecutionStrategy::Serial)?;

        let res = remap_grid(
            &src,
            &grid,
            &deformed,
            [0; 4],
            SamplingMode::Nearest,
            ExecutionStrategy::Serial,
        );
        assert_eq!(res, Err(WarpError::GridLayoutMismatch(2, 4, 4, 2)));
        Ok(())
    }
}
