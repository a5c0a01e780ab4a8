use facewarp_image::ImageError;

use crate::parallel::ParallelError;

/// Errors that can occur while deforming points or warping images.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum WarpError {
    /// Error related to the image container.
    #[error(transparent)]
    ImageError(#[from] ImageError),

    /// Error related to the parallel execution.
    #[error(transparent)]
    ParallelError(#[from] ParallelError),

    /// The source and destination control point sets have different lengths.
    #[error("Control point sets must have the same length, got {0} and {1}")]
    PointCountMismatch(usize, usize),

    /// No control points were given.
    #[error("At least one control point pair is required")]
    EmptyControlPoints,

    /// A control point has a NaN or infinite coordinate.
    #[error("Control point ({0}, {1}) is not finite")]
    NonFinitePoint(f64, f64),

    /// The falloff exponent is not a finite positive number.
    #[error("Falloff exponent must be finite and > 0, got {0}")]
    InvalidAlpha(f64),

    /// The singular matrix tolerance is negative or not finite.
    #[error("Singular tolerance must be finite and >= 0, got {0}")]
    InvalidEpsilon(f64),

    /// The grid cell size is zero.
    #[error("Grid size must be > 0, got {0}")]
    InvalidGridSize(usize),

    /// A deformed grid does not have the cell layout of the grid it is paired with.
    #[error("Deformed grid has {0}x{1} cells, expected {2}x{3}")]
    GridLayoutMismatch(usize, usize, usize, usize),

    /// The weights of a weighted average sum up to zero.
    #[error("Weights of a weighted average must not sum to zero")]
    ZeroWeightSum,

    /// A 2x2 matrix could not be inverted.
    #[error("Matrix is singular (determinant {0})")]
    SingularMatrix(f64),

    /// The weighted scatter matrix of the control points has no usable inverse.
    #[error("Scatter matrix of the control points is singular at query point ({0}, {1})")]
    SingularScatter(f64, f64),

    /// A face detection has a bounding box that cannot be used for scaling.
    #[error("Invalid bounding box with size ({0}x{1})")]
    InvalidBoundingBox(f64, f64),

    /// A face detection is below the configured confidence.
    #[error("Detection score {0} is below the minimum score {1}")]
    LowConfidence(f64, f64),
}
