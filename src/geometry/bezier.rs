use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, LENGTH_EPS};

use super::{bernstein, bernstein_derivative};

/// A rational Bézier curve of degree 1 to 3.
///
/// Used as the exact representation carried by curve records: degree-1
/// curves are lines, degree-2 curves represent exact conic arcs. The
/// edge-normal probe projects piecewise-linear midpoints back onto this
/// when it is present and non-linear.
#[derive(Debug, Clone)]
pub struct RationalBezier {
    ctrl: Vec<Point3>,
    weight: Vec<f64>,
}

impl RationalBezier {
    /// Creates a curve from control points and weights.
    ///
    /// # Errors
    ///
    /// Returns an error if the degree is outside `[1, 3]`, the weight
    /// count does not match, or any weight is non-finite or non-positive.
    pub fn new(ctrl: Vec<Point3>, weight: Vec<f64>) -> Result<Self> {
        let degree = ctrl.len().wrapping_sub(1);
        if !(1..=3).contains(&degree) {
            return Err(GeometryError::DegreeOutOfRange { degree, max: 3 }.into());
        }
        if weight.len() != ctrl.len() {
            return Err(GeometryError::ControlNetShape {
                rows: ctrl.len(),
                cols: weight.len(),
                expected_rows: ctrl.len(),
                expected_cols: ctrl.len(),
            }
            .into());
        }
        if weight.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(GeometryError::InvalidWeight.into());
        }
        Ok(Self { ctrl, weight })
    }

    /// Creates the degree-1 curve from `a` to `b`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoints coincide.
    pub fn line(a: Point3, b: Point3) -> Result<Self> {
        if (b - a).norm() < LENGTH_EPS {
            return Err(GeometryError::Degenerate("zero-length line".into()).into());
        }
        Self::new(vec![a, b], vec![1.0, 1.0])
    }

    /// Returns the polynomial degree.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.ctrl.len() - 1
    }

    /// Evaluates the curve point at `t`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        let degree = self.degree();
        let b = bernstein(degree, t);
        let mut num = Vector3::zeros();
        let mut den = 0.0;
        for i in 0..=degree {
            let w = b[i] * self.weight[i];
            num += self.ctrl[i].coords * w;
            den += w;
        }
        Point3::from(num / den)
    }

    /// Computes the curve tangent `dP/dt` at `t`.
    #[must_use]
    pub fn tangent_at(&self, t: f64) -> Vector3 {
        let degree = self.degree();
        let b = bernstein(degree, t);
        let d = bernstein_derivative(degree, t);
        let mut num = Vector3::zeros();
        let mut den = 0.0;
        let mut num_t = Vector3::zeros();
        let mut den_t = 0.0;
        for i in 0..=degree {
            num += self.ctrl[i].coords * (b[i] * self.weight[i]);
            den += b[i] * self.weight[i];
            num_t += self.ctrl[i].coords * (d[i] * self.weight[i]);
            den_t += d[i] * self.weight[i];
        }
        (num_t * den - num * den_t) / (den * den)
    }

    /// Finds the curve parameter closest to a 3D query point.
    ///
    /// Newton iteration from the best of a coarse sample of the curve.
    /// Returns `(t, converged)`.
    #[must_use]
    pub fn closest_point_to(&self, p: Point3) -> (f64, bool) {
        let n = 8;
        let mut t = 0.0;
        let mut best = f64::INFINITY;
        for i in 0..=n {
            let ti = f64::from(i) / f64::from(n);
            let d = (self.point_at(ti) - p).norm_squared();
            if d < best {
                best = d;
                t = ti;
            }
        }

        for _ in 0..30 {
            let c = self.point_at(t);
            let tan = self.tangent_at(t);
            let denom = tan.dot(&tan);
            if denom < 1e-18 {
                return (t, false);
            }
            let step = tan.dot(&(c - p)) / denom;
            t -= step;
            if step.abs() * tan.norm() < LENGTH_EPS * 1e-3 {
                return (t, true);
            }
        }
        let c = self.point_at(t);
        let tan = self.tangent_at(t);
        (t, tan.dot(&(c - p)).abs() < LENGTH_EPS * tan.norm().max(1.0))
    }

    /// Reverses the parametrization (swaps start and finish).
    pub fn reverse(&mut self) {
        self.ctrl.reverse();
        self.weight.reverse();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn line_interpolates_endpoints() {
        let c = RationalBezier::line(p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(c.point_at(0.0), p(0.0, 0.0, 0.0));
        assert_relative_eq!(c.point_at(0.5), p(1.0, 0.0, 0.0));
        assert_relative_eq!(c.point_at(1.0), p(2.0, 0.0, 0.0));
    }

    #[test]
    fn quarter_circle_stays_on_radius() {
        // Exact quarter circle of radius 1 as a rational quadratic.
        let w = std::f64::consts::FRAC_1_SQRT_2;
        let c = RationalBezier::new(
            vec![p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)],
            vec![1.0, w, 1.0],
        )
        .unwrap();
        for &t in &[0.0, 0.2, 0.5, 0.77, 1.0] {
            let r = c.point_at(t).coords.norm();
            assert_relative_eq!(r, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn closest_point_on_line() {
        let c = RationalBezier::line(p(0.0, 0.0, 0.0), p(10.0, 0.0, 0.0)).unwrap();
        let (t, converged) = c.closest_point_to(p(3.0, 4.0, 0.0));
        assert!(converged);
        assert_relative_eq!(t, 0.3, epsilon = 1e-9);
    }

    #[test]
    fn reverse_swaps_endpoints() {
        let mut c = RationalBezier::line(p(0.0, 0.0, 0.0), p(1.0, 2.0, 3.0)).unwrap();
        c.reverse();
        assert_relative_eq!(c.point_at(0.0), p(1.0, 2.0, 3.0));
    }
}
