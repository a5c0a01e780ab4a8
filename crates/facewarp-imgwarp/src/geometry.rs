use std::ops;

use crate::error::WarpError;

/// A point (or vector) in the 2d image plane.
///
/// # Examples
///
/// ```
/// use facewarp_imgwarp::Point;
///
/// let p = Point::new(3.0, 4.0) - Point::new(1.0, 1.0);
/// assert_eq!(p, Point::new(2.0, 3.0));
/// assert_eq!(p.dot(Point::new(1.0, 1.0)), 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// The x coordinate (columns).
    pub x: f64,
    /// The y coordinate (rows).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Squared euclidean length.
    #[inline]
    pub fn norm_squared(self) -> f64 {
        self.dot(self)
    }

    /// Whether both coordinates are finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Returns the rank one matrix `w * [x; y] * [x, y]`.
    #[inline]
    pub fn outer_scaled(self, w: f64) -> Mat2 {
        Mat2::new(
            self.x * self.x * w,
            self.x * self.y * w,
            self.y * self.x * w,
            self.y * self.y * w,
        )
    }

    /// Weighted average of a set of points, `sum(p_i * w_i) / sum(w_i)`.
    ///
    /// # Errors
    ///
    /// * The number of points and weights differ.
    /// * The weights sum up to zero.
    pub fn weighted_average(points: &[Point], weights: &[f64]) -> Result<Point, WarpError> {
        if points.len() != weights.len() {
            return Err(WarpError::PointCountMismatch(points.len(), weights.len()));
        }

        let (mut sx, mut sy, mut sw) = (0.0, 0.0, 0.0);
        for (p, &w) in points.iter().zip(weights) {
            sx += p.x * w;
            sy += p.y * w;
            sw += w;
        }

        if sw == 0.0 {
            return Err(WarpError::ZeroWeightSum);
        }

        Ok(Point::new(sx / sw, sy / sw))
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Point::new(x, y)
    }
}

impl ops::Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl ops::AddAssign for Point {
    #[inline]
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl ops::Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl ops::Mul<f64> for Point {
    type Output = Point;

    #[inline]
    fn mul(self, s: f64) -> Point {
        Point::new(self.x * s, self.y * s)
    }
}

/// Row vector times matrix, `[x, y] * M`.
impl ops::Mul<Mat2> for Point {
    type Output = Point;

    #[inline]
    fn mul(self, m: Mat2) -> Point {
        Point::new(
            self.x * m.m11 + self.y * m.m21,
            self.x * m.m12 + self.y * m.m22,
        )
    }
}

/// A 2x2 matrix stored row by row.
///
/// | m11 m12 |
/// | m21 m22 |
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Mat2 {
    /// Row 1, column 1.
    pub m11: f64,
    /// Row 1, column 2.
    pub m12: f64,
    /// Row 2, column 1.
    pub m21: f64,
    /// Row 2, column 2.
    pub m22: f64,
}

impl Mat2 {
    /// Zero matrix.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Identity matrix.
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 1.0);

    /// Create a new matrix from its entries in row order.
    pub const fn new(m11: f64, m12: f64, m21: f64, m22: f64) -> Self {
        Self { m11, m12, m21, m22 }
    }

    /// Get the adjugate of the matrix.
    #[inline]
    pub fn adjugate(self) -> Self {
        Self::new(self.m22, -self.m12, -self.m21, self.m11)
    }

    /// Get the determinant of the matrix.
    #[inline]
    pub fn determinant(self) -> f64 {
        self.m11 * self.m22 - self.m12 * self.m21
    }

    /// Sum of the diagonal entries.
    #[inline]
    pub fn trace(self) -> f64 {
        self.m11 + self.m22
    }

    /// Multiply every entry by a scalar.
    #[inline]
    pub fn scale(self, s: f64) -> Self {
        Self::new(self.m11 * s, self.m12 * s, self.m21 * s, self.m22 * s)
    }

    /// Get the inverse of the matrix as `adjugate / determinant`.
    ///
    /// # Arguments
    ///
    /// * `epsilon` - Determinants with an absolute value at or below this are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`WarpError::SingularMatrix`] when the matrix is not invertible.
    ///
    /// # Example
    ///
    /// ```
    /// use facewarp_imgwarp::Mat2;
    ///
    /// let m = Mat2::new(2.0, 0.0, 0.0, 4.0);
    /// assert_eq!(m.inverse(0.0).unwrap(), Mat2::new(0.5, 0.0, 0.0, 0.25));
    /// assert!(Mat2::new(1.0, 2.0, 2.0, 4.0).inverse(0.0).is_err());
    /// ```
    pub fn inverse(self, epsilon: f64) -> Result<Self, WarpError> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() <= epsilon {
            return Err(WarpError::SingularMatrix(det));
        }
        Ok(self.adjugate().scale(1.0 / det))
    }
}

impl ops::Add for Mat2 {
    type Output = Mat2;

    #[inline]
    fn add(self, rhs: Mat2) -> Mat2 {
        Mat2::new(
            self.m11 + rhs.m11,
            self.m12 + rhs.m12,
            self.m21 + rhs.m21,
            self.m22 + rhs.m22,
        )
    }
}

impl ops::AddAssign for Mat2 {
    #[inline]
    fn add_assign(&mut self, rhs: Mat2) {
        *self = *self + rhs;
    }
}

impl ops::Sub for Mat2 {
    type Output = Mat2;

    #[inline]
    fn sub(self, rhs: Mat2) -> Mat2 {
        self + rhs.scale(-1.0)
    }
}
