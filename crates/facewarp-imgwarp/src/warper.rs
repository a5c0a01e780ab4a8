use facewarp_image::{Image, ImageSize};

use crate::deformation::{AffineDeformation, DEFAULT_SINGULAR_EPSILON};
use crate::error::WarpError;
use crate::geometry::Point;
use crate::grid::{DeformedGrid, Grid, DEFAULT_GRID_SIZE};
use crate::interpolation::SamplingMode;
use crate::parallel::ExecutionStrategy;
use crate::resample::remap_grid;

/// Parameters of the [`Warper`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WarpConfig {
    /// Side of a grid cell in pixels.
    pub grid_size: usize,
    /// Falloff exponent of the control point weights.
    pub alpha: f64,
    /// RGBA value of pixels that map outside the source image.
    pub fill_color: [u8; 4],
    /// How the source image is sampled.
    pub sampling: SamplingMode,
    /// Tolerance used to classify the control points as coincident or collinear.
    pub singular_epsilon: f64,
    /// How the work is distributed over threads.
    pub strategy: ExecutionStrategy,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            alpha: 1.0,
            fill_color: [0, 0, 0, 0],
            sampling: SamplingMode::Nearest,
            singular_epsilon: DEFAULT_SINGULAR_EPSILON,
            strategy: ExecutionStrategy::ParallelCells,
        }
    }
}

impl WarpConfig {
    /// Set the side of a grid cell in pixels.
    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Set the falloff exponent.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the fill color.
    pub fn with_fill_color(mut self, fill_color: [u8; 4]) -> Self {
        self.fill_color = fill_color;
        self
    }

    /// Set the sampling mode.
    pub fn with_sampling(mut self, sampling: SamplingMode) -> Self {
        self.sampling = sampling;
        self
    }

    /// Set the tolerance used to classify the control points.
    pub fn with_singular_epsilon(mut self, singular_epsilon: f64) -> Self {
        self.singular_epsilon = singular_epsilon;
        self
    }

    /// Set the execution strategy.
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Warps RGBA images of a fixed size so that control points move to new positions.
///
/// The grid over the image is built once in [`Warper::new`]; every call to
/// [`Warper::warp`] deforms it with the given landmarks and resamples the source.
///
/// The warp is computed backwards: each destination pixel looks up where it
/// comes from in the source, so the output has no holes.
///
/// # Example
///
/// ```
/// use facewarp_image::Image;
/// use facewarp_imgwarp::{Point, WarpConfig, Warper};
///
/// let src = Image::<u8, 4>::from_size_pixel([100, 100].into(), [255, 0, 0, 255]).unwrap();
/// let warper = Warper::new(src.size(), WarpConfig::default()).unwrap();
///
/// let out = warper
///     .warp(&src, &[Point::new(50.0, 50.0)], &[Point::new(60.0, 45.0)])
///     .unwrap();
///
/// assert_eq!(out.get_pixel(50, 50).unwrap(), &[255, 0, 0, 255]);
/// assert_eq!(out.get_pixel(5, 50).unwrap(), &[0, 0, 0, 0]);
/// ```
#[derive(Debug, Clone)]
pub struct Warper {
    grid: Grid,
    config: WarpConfig,
}

impl Warper {
    /// Create a warper for images of the given size.
    ///
    /// # Errors
    ///
    /// * The image size is empty or the grid size is zero.
    /// * The falloff exponent is not finite and positive.
    /// * The singular tolerance is negative or not finite.
    pub fn new(size: ImageSize, config: WarpConfig) -> Result<Self, WarpError> {
        if !(config.alpha.is_finite() && config.alpha > 0.0) {
            return Err(WarpError::InvalidAlpha(config.alpha));
        }

        let epsilon = config.singular_epsilon;
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(WarpError::InvalidEpsilon(epsilon));
        }

        let grid = Grid::new(size, config.grid_size)?;

        log::debug!(
            "warper for {} with {}x{} cells of {} px",
            size,
            grid.cols(),
            grid.rows(),
            config.grid_size
        );

        Ok(Self { grid, config })
    }

    /// The undeformed grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The warper parameters.
    pub fn config(&self) -> &WarpConfig {
        &self.config
    }

    /// The image size this warper was built for.
    pub fn size(&self) -> ImageSize {
        self.grid.image_size()
    }

    /// The deformation mapping destination positions back to the source.
    ///
    /// The control point sets are swapped: points at `to` are pulled from `from`.
    pub fn inverse_deformation(
        &self,
        from: &[Point],
        to: &[Point],
    ) -> Result<AffineDeformation, WarpError> {
        AffineDeformation::new(to.to_vec(), from.to_vec(), self.config.alpha)?
            .with_epsilon(self.config.singular_epsilon)
    }

    /// Deform the grid for the given landmarks.
    ///
    /// Each vertex of the returned grid holds the source position sampled at
    /// the matching vertex of [`Warper::grid`].
    pub fn deform_grid(&self, from: &[Point], to: &[Point]) -> Result<DeformedGrid, WarpError> {
        let deformation = self.inverse_deformation(from, to)?;
        self.grid.deform(&deformation, self.config.strategy)
    }

    /// Warp an image so that the points `from` move onto the points `to`.
    ///
    /// # Arguments
    ///
    /// * `src` - The source image, with the size given to [`Warper::new`].
    /// * `from` - The landmarks in the source image.
    /// * `to` - Where the landmarks must be in the output image.
    ///
    /// # Returns
    ///
    /// A new image of the same size, every pixel either copied from the source
    /// or set to the fill color.
    ///
    /// # Errors
    ///
    /// * The point sets are empty or have different lengths.
    /// * The landmarks are degenerate and the scatter matrix is singular.
    /// * The image size does not match the warper.
    pub fn warp(
        &self,
        src: &Image<u8, 4>,
        from: &[Point],
        to: &[Point],
    ) -> Result<Image<u8, 4>, WarpError> {
        let now = std::time::Instant::now();
        let deformed = self.deform_grid(from, to)?;
        log::debug!(
            "deformed {} grid vertices in {:?}",
            deformed.vertices().len(),
            now.elapsed()
        );

        let now = std::time::Instant::now();
        let dst = remap_grid(
            src,
            &self.grid,
            &deformed,
            self.config.fill_color,
            self.config.sampling,
            self.config.strategy,
        )?;
        log::debug!("resampled {} in {:?}", dst.size(), now.elapsed());

        Ok(dst)
    }
}
