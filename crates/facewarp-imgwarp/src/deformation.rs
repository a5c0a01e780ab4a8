//! Affine deformation by moving least squares.
//!
//! Every query point `v` gets its own affine transform, fitted to the control
//! point pairs with weights `w_i = |p_i - v|^(-2 * alpha)`:
//!
//! ```text
//! p* = sum(w_i p_i) / sum(w_i)            q* = sum(w_i q_i) / sum(w_i)
//! B  = sum(w_i (p_i - p*)^T (p_i - p*))
//! A_i = (v - p*) B^-1 (p_i - p*)^T w_i
//! f(v) = q* + sum(A_i (q_i - q*))
//! ```
//!
//! There is no global transform: control points close to `v` dominate its
//! local fit, so distant parts of the image can move independently.
//!
//! With positive weights the rank of `B` is the rank of the control points
//! themselves, so it is decided once when the deformation is built: points
//! that all coincide cannot be solved, points on a line are solved along the
//! line, anything else uses the full inverse.

use crate::error::WarpError;
use crate::geometry::{Mat2, Point};

/// Default tolerance used to classify the control points as coincident or collinear.
///
/// Both tests are relative: the spread of the points is compared with the
/// magnitude of their coordinates, and the determinant of their scatter
/// matrix with its squared trace.
pub const DEFAULT_SINGULAR_EPSILON: f64 = 1e-10;

/// Shape of the source control points.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Layout {
    /// All points coincide.
    Coincident,
    /// All points lie on a line with the given unit direction.
    Collinear(Point),
    /// The points span the plane.
    General,
}

/// Moving least squares affine deformation over a set of control point pairs.
///
/// The deformation holds no scratch state, so a single instance can be shared
/// across threads and queried concurrently.
///
/// # Example
///
/// ```
/// use facewarp_imgwarp::{AffineDeformation, Point};
///
/// let from = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(0.0, 10.0)];
/// let to = from.iter().map(|p| *p + Point::new(5.0, -2.0)).collect();
///
/// let deformation = AffineDeformation::new(from, to, 1.0).unwrap();
/// let moved = deformation.map_point(Point::new(3.0, 4.0)).unwrap();
///
/// assert!((moved.x - 8.0).abs() < 1e-9);
/// assert!((moved.y - 2.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct AffineDeformation {
    from: Vec<Point>,
    to: Vec<Point>,
    alpha: f64,
    epsilon: f64,
    layout: Layout,
}

/// Inverse of a unit trace scatter matrix restricted to the span of the control points.
///
/// For a full rank scatter matrix `null_projector` is zero. For collinear
/// control points it projects onto the direction orthogonal to their line.
struct ScatterInverse {
    inverse: Mat2,
    null_projector: Mat2,
}

impl ScatterInverse {
    fn along(scatter: Mat2, axis: Point) -> Option<Self> {
        let variance = axis.dot(axis * scatter);
        if !variance.is_finite() || variance <= 0.0 {
            return None;
        }
        let projector = axis.outer_scaled(1.0);
        Some(Self {
            inverse: projector.scale(1.0 / variance),
            null_projector: Mat2::IDENTITY - projector,
        })
    }
}

/// Unit eigenvector of the largest eigenvalue of a symmetric matrix.
fn principal_axis(m: Mat2) -> Point {
    let half_gap = 0.5 * (m.m11 - m.m22);
    let lambda = 0.5 * m.trace() + (half_gap * half_gap + m.m12 * m.m12).sqrt();
    let a = Point::new(lambda - m.m22, m.m12);
    let b = Point::new(m.m12, lambda - m.m11);
    let axis = if a.norm_squared() >= b.norm_squared() { a } else { b };
    axis * (1.0 / axis.norm_squared().sqrt())
}

fn classify(points: &[Point], epsilon: f64) -> Layout {
    if points.len() < 2 {
        return Layout::General;
    }

    let n = points.len() as f64;
    let centroid = points.iter().fold(Point::default(), |acc, p| acc + *p) * (1.0 / n);

    let mut scatter = Mat2::ZERO;
    for p in points {
        scatter += (*p - centroid).outer_scaled(1.0);
    }

    let magnitude = points
        .iter()
        .map(|p| p.x.abs().max(p.y.abs()))
        .fold(0.0, f64::max);

    let trace = scatter.trace();
    if trace / n <= epsilon * magnitude * magnitude {
        Layout::Coincident
    } else if scatter.determinant() <= epsilon * trace * trace {
        Layout::Collinear(principal_axis(scatter))
    } else {
        Layout::General
    }
}

impl AffineDeformation {
    /// Create a new deformation moving `from[i]` onto `to[i]`.
    ///
    /// # Arguments
    ///
    /// * `from` - The control points before the deformation.
    /// * `to` - The control points after the deformation.
    /// * `alpha` - The falloff exponent of the control point weights.
    ///
    /// # Errors
    ///
    /// * The point sets have different lengths or are empty.
    /// * A control point is not finite.
    /// * `alpha` is not finite and positive.
    pub fn new(from: Vec<Point>, to: Vec<Point>, alpha: f64) -> Result<Self, WarpError> {
        if from.len() != to.len() {
            return Err(WarpError::PointCountMismatch(from.len(), to.len()));
        }

        if from.is_empty() {
            return Err(WarpError::EmptyControlPoints);
        }

        if let Some(p) = from.iter().chain(to.iter()).find(|p| !p.is_finite()) {
            return Err(WarpError::NonFinitePoint(p.x, p.y));
        }

        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(WarpError::InvalidAlpha(alpha));
        }

        let layout = classify(&from, DEFAULT_SINGULAR_EPSILON);

        Ok(Self {
            from,
            to,
            alpha,
            epsilon: DEFAULT_SINGULAR_EPSILON,
            layout,
        })
    }

    /// Set the tolerance used to classify the control points.
    ///
    /// # Errors
    ///
    /// `epsilon` is negative or not finite.
    pub fn with_epsilon(mut self, epsilon: f64) -> Result<Self, WarpError> {
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(WarpError::InvalidEpsilon(epsilon));
        }
        self.epsilon = epsilon;
        self.layout = classify(&self.from, epsilon);
        Ok(self)
    }

    /// Number of control point pairs.
    pub fn num_points(&self) -> usize {
        self.from.len()
    }

    /// The control points before the deformation.
    pub fn from_points(&self) -> &[Point] {
        &self.from
    }

    /// The control points after the deformation.
    pub fn to_points(&self) -> &[Point] {
        &self.to
    }

    /// The falloff exponent.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// The tolerance used to classify the control points.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Whether the source control points all coincide, leaving nothing to fit.
    pub fn is_degenerate(&self) -> bool {
        self.from.len() > 1 && self.layout == Layout::Coincident
    }

    /// Map a point through the deformation.
    ///
    /// A query point that coincides with a control point maps exactly onto its
    /// pair. A single control pair is a pure translation.
    ///
    /// # Errors
    ///
    /// Returns [`WarpError::SingularScatter`] when all the control points
    /// coincide, or when the fit at `v` is not finite.
    pub fn map_point(&self, v: Point) -> Result<Point, WarpError> {
        if self.from.len() == 1 {
            return Ok(v + (self.to[0] - self.from[0]));
        }

        let mut dist_sq = Vec::with_capacity(self.from.len());
        for (i, p) in self.from.iter().enumerate() {
            let d = (*p - v).norm_squared();
            if d == 0.0 {
                return Ok(self.to[i]);
            }
            dist_sq.push(d);
        }

        if self.layout == Layout::Coincident {
            return Err(WarpError::SingularScatter(v.x, v.y));
        }

        // the fit is invariant to a global scale of the weights, normalizing by
        // the closest point keeps the weight sum >= 1
        let min_dist_sq = dist_sq.iter().copied().fold(f64::INFINITY, f64::min);
        let weights = dist_sq
            .iter()
            .map(|d| (d / min_dist_sq).powf(-self.alpha))
            .collect::<Vec<_>>();

        let p_avg = Point::weighted_average(&self.from, &weights)?;
        let q_avg = Point::weighted_average(&self.to, &weights)?;

        let p_rel = self.from.iter().map(|p| *p - p_avg).collect::<Vec<_>>();

        let mut scatter = Mat2::ZERO;
        for (p, &w) in p_rel.iter().zip(&weights) {
            scatter += p.outer_scaled(w);
        }

        let trace = scatter.trace();
        if !trace.is_finite() {
            return Err(WarpError::SingularScatter(v.x, v.y));
        }

        let offset = v - p_avg;

        // every weight but the closest underflowed, only its translation is left
        if trace <= 0.0 {
            return Ok(q_avg + offset);
        }

        let solve = self
            .invert_scatter(scatter.scale(1.0 / trace))
            .ok_or(WarpError::SingularScatter(v.x, v.y))?;

        let offset_inv = offset * solve.inverse;

        let mut r = q_avg + offset * solve.null_projector;
        for ((p, q), &w) in p_rel.iter().zip(&self.to).zip(&weights) {
            let a = offset_inv.dot(*p) * (w / trace);
            r += (*q - q_avg) * a;
        }

        if !r.is_finite() {
            return Err(WarpError::SingularScatter(v.x, v.y));
        }

        Ok(r)
    }

    /// Map a batch of points through the deformation.
    pub fn map_points(&self, points: &[Point]) -> Result<Vec<Point>, WarpError> {
        points.iter().map(|p| self.map_point(*p)).collect()
    }

    /// Invert a scatter matrix normalized to unit trace.
    fn invert_scatter(&self, scatter: Mat2) -> Option<ScatterInverse> {
        match self.layout {
            Layout::Coincident => None,
            Layout::Collinear(axis) => ScatterInverse::along(scatter, axis),
            Layout::General => match scatter.inverse(f64::EPSILON) {
                Ok(inverse) => Some(ScatterInverse {
                    inverse,
                    null_projector: Mat2::ZERO,
                }),
                // the weights off the dominant line are below precision
                Err(_) => ScatterInverse::along(scatter, principal_axis(scatter)),
            },
        }
    }
}
