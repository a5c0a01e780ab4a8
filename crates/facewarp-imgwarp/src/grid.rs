use facewarp_image::{ImageError, ImageSize};

use crate::deformation::AffineDeformation;
use crate::error::WarpError;
use crate::geometry::Point;
use crate::parallel::{self, ExecutionStrategy};

/// Default side of a grid cell in pixels.
pub const DEFAULT_GRID_SIZE: usize = 20;

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)` covered by a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    /// First column.
    pub x0: usize,
    /// One past the last column.
    pub x1: usize,
    /// First row.
    pub y0: usize,
    /// One past the last row.
    pub y1: usize,
}

impl PixelRect {
    /// Whether the rectangle contains no pixels.
    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }
}

/// A regular tiling of the image rectangle into square cells.
///
/// The grid is stored as a lattice of `(cols + 1) x (rows + 1)` vertices, with
/// coordinates clipped to the image rectangle so the trailing cells on the
/// right and bottom edges may be smaller than `grid_size`. Cells are indexed
/// row-major and their corners are returned as `[top-left, top-right,
/// bottom-right, bottom-left]`.
///
/// # Example
///
/// ```
/// use facewarp_imgwarp::Grid;
///
/// let grid = Grid::new([45, 30].into(), 20).unwrap();
/// assert_eq!(grid.cols(), 3);
/// assert_eq!(grid.rows(), 2);
/// assert_eq!(grid.num_cells(), 6);
/// ```
#[derive(Debug, Clone)]
pub struct Grid {
    image_size: ImageSize,
    grid_size: usize,
    cols: usize,
    rows: usize,
    vertices: Vec<Point>,
}

impl Grid {
    /// Create the grid covering an image of the given size.
    ///
    /// # Errors
    ///
    /// * `grid_size` is zero.
    /// * The image size is empty.
    pub fn new(image_size: ImageSize, grid_size: usize) -> Result<Self, WarpError> {
        if grid_size == 0 {
            return Err(WarpError::InvalidGridSize(grid_size));
        }

        if image_size.is_empty() {
            return Err(ImageError::EmptyImage(image_size.width, image_size.height).into());
        }

        let cols = image_size.width.div_ceil(grid_size);
        let rows = image_size.height.div_ceil(grid_size);

        let mut vertices = Vec::with_capacity((cols + 1) * (rows + 1));
        for r in 0..=rows {
            let y = (r * grid_size).min(image_size.height);
            for c in 0..=cols {
                let x = (c * grid_size).min(image_size.width);
                vertices.push(Point::new(x as f64, y as f64));
            }
        }

        Ok(Self {
            image_size,
            grid_size,
            cols,
            rows,
            vertices,
        })
    }

    /// The size of the image covered by the grid.
    pub fn image_size(&self) -> ImageSize {
        self.image_size
    }

    /// The side of a full cell in pixels.
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Number of cells along the x axis.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of cells along the y axis.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Total number of cells.
    pub fn num_cells(&self) -> usize {
        self.cols * self.rows
    }

    /// The lattice vertices, row-major.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Corners of a cell as `[top-left, top-right, bottom-right, bottom-left]`.
    pub fn cell(&self, index: usize) -> Option<[Point; 4]> {
        lattice_cell(&self.vertices, self.cols, self.rows, index)
    }

    /// Iterate over the corners of all cells, row-major.
    pub fn cells(&self) -> impl Iterator<Item = [Point; 4]> + '_ {
        (0..self.num_cells()).filter_map(|i| self.cell(i))
    }

    /// Pixels covered by a cell in the undeformed image.
    pub fn cell_rect(&self, index: usize) -> Option<PixelRect> {
        if index >= self.num_cells() {
            return None;
        }
        let (r, c) = (index / self.cols, index % self.cols);
        Some(PixelRect {
            x0: c * self.grid_size,
            x1: ((c + 1) * self.grid_size).min(self.image_size.width),
            y0: r * self.grid_size,
            y1: ((r + 1) * self.grid_size).min(self.image_size.height),
        })
    }

    /// Run every vertex of the grid through a deformation.
    ///
    /// # Arguments
    ///
    /// * `deformation` - The deformation to apply to the vertices.
    /// * `strategy` - How to distribute the vertices over threads.
    ///
    /// # Errors
    ///
    /// The first error raised by the deformation aborts the whole operation.
    pub fn deform(
        &self,
        deformation: &AffineDeformation,
        strategy: ExecutionStrategy,
    ) -> Result<DeformedGrid, WarpError> {
        let vertices = parallel::try_map(strategy, &self.vertices, |p| deformation.map_point(*p))?;

        Ok(DeformedGrid {
            cols: self.cols,
            rows: self.rows,
            vertices,
        })
    }
}

/// A [`Grid`] with every vertex moved by a deformation.
///
/// It has the same cells in the same order and with the same corner order as
/// the grid it was created from.
#[derive(Debug, Clone)]
pub struct DeformedGrid {
    cols: usize,
    rows: usize,
    vertices: Vec<Point>,
}

impl DeformedGrid {
    /// Number of cells along the x axis.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of cells along the y axis.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Total number of cells.
    pub fn num_cells(&self) -> usize {
        self.cols * self.rows
    }

    /// The deformed lattice vertices, row-major.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Corners of a deformed cell as `[top-left, top-right, bottom-right, bottom-left]`.
    pub fn cell(&self, index: usize) -> Option<[Point; 4]> {
        lattice_cell(&self.vertices, self.cols, self.rows, index)
    }

    /// Iterate over the corners of all deformed cells, row-major.
    pub fn cells(&self) -> impl Iterator<Item = [Point; 4]> + '_ {
        (0..self.num_cells()).filter_map(|i| self.cell(i))
    }
}

fn lattice_cell(vertices: &[Point], cols: usize, rows: usize, index: usize) -> Option<[Point; 4]> {
    if index >= cols * rows {
        return None;
    }
    let stride = cols + 1;
    let (r, c) = (index / cols, index % cols);
    let top = r * stride + c;
    let bottom = top + stride;
    Some([
        vertices[top],
        vertices[top + 1],
        vertices[bottom + 1],
        vertices[bottom],
    ])
}
