use crate::error::{GeometryError, Result};
use crate::math::{Point2, Point3, Vector3, LENGTH_EPS};

use super::{bernstein, bernstein_derivative};

/// Maximum supported polynomial degree per parameter direction.
pub const MAX_DEGREE: usize = 3;

/// A rational tensor-product Bézier patch.
///
/// The control net has `(degree_u + 1) × (degree_v + 1)` points with one
/// positive weight each, stored row-major by the U index. Degree-(1,1)
/// patches with a parallelogram net represent planes exactly; degree-2
/// directions represent exact circular arcs.
///
/// Parameters are nominally in `[0, 1] × [0, 1]` but evaluation and
/// projection accept parameters outside the unit square; the valid
/// region of a face is described by its trim loops, not by the domain.
#[derive(Debug, Clone)]
pub struct RationalSurface {
    degree_u: usize,
    degree_v: usize,
    ctrl: Vec<Point3>,
    weight: Vec<f64>,
}

impl RationalSurface {
    /// Creates a patch from its degrees, control net, and weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a degree is outside `[1, 3]`, the control net
    /// does not match `(degree_u + 1) × (degree_v + 1)`, or any weight is
    /// non-finite or non-positive.
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        ctrl: Vec<Point3>,
        weight: Vec<f64>,
    ) -> Result<Self> {
        if degree_u == 0 || degree_u > MAX_DEGREE {
            return Err(GeometryError::DegreeOutOfRange {
                degree: degree_u,
                max: MAX_DEGREE,
            }
            .into());
        }
        if degree_v == 0 || degree_v > MAX_DEGREE {
            return Err(GeometryError::DegreeOutOfRange {
                degree: degree_v,
                max: MAX_DEGREE,
            }
            .into());
        }
        let expected = (degree_u + 1) * (degree_v + 1);
        if ctrl.len() != expected || weight.len() != expected {
            return Err(GeometryError::ControlNetShape {
                rows: ctrl.len(),
                cols: weight.len(),
                expected_rows: degree_u + 1,
                expected_cols: degree_v + 1,
            }
            .into());
        }
        if weight.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(GeometryError::InvalidWeight.into());
        }
        Ok(Self {
            degree_u,
            degree_v,
            ctrl,
            weight,
        })
    }

    /// Creates the degree-(1,1) patch spanning a parallelogram:
    /// `P(u, v) = origin + u * u_span + v * v_span`.
    ///
    /// # Errors
    ///
    /// Returns an error if either span is zero-length or the spans are
    /// parallel.
    pub fn plane(origin: Point3, u_span: Vector3, v_span: Vector3) -> Result<Self> {
        if u_span.norm() < LENGTH_EPS || v_span.norm() < LENGTH_EPS {
            return Err(GeometryError::ZeroVector.into());
        }
        if u_span.cross(&v_span).norm() < LENGTH_EPS * LENGTH_EPS {
            return Err(GeometryError::Degenerate("plane spans are parallel".into()).into());
        }
        let ctrl = vec![
            origin,
            origin + v_span,
            origin + u_span,
            origin + u_span + v_span,
        ];
        Self::new(1, 1, ctrl, vec![1.0; 4])
    }

    /// Returns the polynomial degree in the U direction.
    #[must_use]
    pub fn degree_u(&self) -> usize {
        self.degree_u
    }

    /// Returns the polynomial degree in the V direction.
    #[must_use]
    pub fn degree_v(&self) -> usize {
        self.degree_v
    }

    fn at(&self, i: usize, j: usize) -> (Point3, f64) {
        let idx = i * (self.degree_v + 1) + j;
        (self.ctrl[idx], self.weight[idx])
    }

    /// Evaluates the surface point at `(u, v)`.
    #[must_use]
    pub fn point_at(&self, u: f64, v: f64) -> Point3 {
        let bu = bernstein(self.degree_u, u);
        let bv = bernstein(self.degree_v, v);

        let mut num = Vector3::zeros();
        let mut den = 0.0;
        for i in 0..=self.degree_u {
            for j in 0..=self.degree_v {
                let (p, w) = self.at(i, j);
                let b = bu[i] * bv[j] * w;
                num += p.coords * b;
                den += b;
            }
        }
        Point3::from(num / den)
    }

    /// Evaluates the surface point at a parameter pair.
    #[must_use]
    pub fn point_at_uv(&self, uv: Point2) -> Point3 {
        self.point_at(uv.x, uv.y)
    }

    /// Computes the partial derivatives `(∂P/∂u, ∂P/∂v)` at `(u, v)`.
    #[must_use]
    pub fn tangents_at(&self, u: f64, v: f64) -> (Vector3, Vector3) {
        let bu = bernstein(self.degree_u, u);
        let bv = bernstein(self.degree_v, v);
        let du = bernstein_derivative(self.degree_u, u);
        let dv = bernstein_derivative(self.degree_v, v);

        let mut num = Vector3::zeros();
        let mut den = 0.0;
        let mut num_u = Vector3::zeros();
        let mut den_u = 0.0;
        let mut num_v = Vector3::zeros();
        let mut den_v = 0.0;
        for i in 0..=self.degree_u {
            for j in 0..=self.degree_v {
                let (p, w) = self.at(i, j);
                num += p.coords * (bu[i] * bv[j] * w);
                den += bu[i] * bv[j] * w;
                num_u += p.coords * (du[i] * bv[j] * w);
                den_u += du[i] * bv[j] * w;
                num_v += p.coords * (bu[i] * dv[j] * w);
                den_v += bu[i] * dv[j] * w;
            }
        }
        // Quotient rule for the rational map num/den.
        let tu = (num_u * den - num * den_u) / (den * den);
        let tv = (num_v * den - num * den_v) / (den * den);
        (tu, tv)
    }

    /// Computes the unit surface normal at `(u, v)`.
    #[must_use]
    pub fn normal_at(&self, u: f64, v: f64) -> Vector3 {
        let (tu, tv) = self.tangents_at(u, v);
        let n = tu.cross(&tv);
        let len = n.norm();
        if len < LENGTH_EPS * LENGTH_EPS {
            Vector3::zeros()
        } else {
            n / len
        }
    }

    /// Finds the surface parameters closest to a 3D query point.
    ///
    /// Runs Gauss–Newton from `hint`, or from the best cell of a coarse
    /// parameter grid when no hint is given. Returns `(uv, converged)`;
    /// when `converged` is false the parameters are the best estimate
    /// found. Parameters are not clamped to the unit square.
    #[must_use]
    pub fn closest_point_to(&self, p: Point3, hint: Option<Point2>) -> (Point2, bool) {
        let mut uv = hint.unwrap_or_else(|| self.grid_seed(p));

        for _ in 0..50 {
            let s = self.point_at(uv.x, uv.y);
            let (tu, tv) = self.tangents_at(uv.x, uv.y);
            let d = s - p;

            let f1 = tu.dot(&d);
            let f2 = tv.dot(&d);

            let a11 = tu.dot(&tu);
            let a12 = tu.dot(&tv);
            let a22 = tv.dot(&tv);
            let det = a11 * a22 - a12 * a12;
            if det.abs() < 1e-18 {
                return (uv, false);
            }
            let du = (f1 * a22 - f2 * a12) / det;
            let dv = (f2 * a11 - f1 * a12) / det;
            uv.x -= du;
            uv.y -= dv;

            if du.abs() * tu.norm() < LENGTH_EPS * 1e-3 && dv.abs() * tv.norm() < LENGTH_EPS * 1e-3
            {
                return (uv, true);
            }
        }
        // Accept slow convergence if the tangential residual is small.
        let s = self.point_at(uv.x, uv.y);
        let (tu, tv) = self.tangents_at(uv.x, uv.y);
        let d = s - p;
        let ok = tu.dot(&d).abs() < LENGTH_EPS * tu.norm().max(1.0)
            && tv.dot(&d).abs() < LENGTH_EPS * tv.norm().max(1.0);
        (uv, ok)
    }

    fn grid_seed(&self, p: Point3) -> Point2 {
        let mut best = Point2::new(0.5, 0.5);
        let mut best_d = f64::INFINITY;
        let n = 4;
        for i in 0..=n {
            for j in 0..=n {
                let u = f64::from(i) / f64::from(n);
                let v = f64::from(j) / f64::from(n);
                let d = (self.point_at(u, v) - p).norm_squared();
                if d < best_d {
                    best_d = d;
                    best = Point2::new(u, v);
                }
            }
        }
        best
    }

    /// Refines `(u, v)` so that the point `P(u, v)` lies simultaneously
    /// on this surface and on `other_a` and `other_b`.
    ///
    /// Newton iteration on the signed distances to the local tangent
    /// planes of the other two surfaces. The iteration matrix goes
    /// singular when either other surface coincides with this one, so
    /// callers must not pass the surface itself (the splitter's
    /// drop-guard upholds this).
    pub fn point_on_surfaces(
        &self,
        other_a: &RationalSurface,
        other_b: &RationalSurface,
        u: &mut f64,
        v: &mut f64,
    ) {
        let mut hint_a = None;
        let mut hint_b = None;
        for _ in 0..30 {
            let p = self.point_at(*u, *v);
            let (ua, conv_a) = other_a.closest_point_to(p, hint_a);
            let (ub, conv_b) = other_b.closest_point_to(p, hint_b);
            if !conv_a || !conv_b {
                return;
            }
            hint_a = Some(ua);
            hint_b = Some(ub);

            let na = other_a.normal_at(ua.x, ua.y);
            let nb = other_b.normal_at(ub.x, ub.y);
            let da = na.dot(&(p - other_a.point_at_uv(ua)));
            let db = nb.dot(&(p - other_b.point_at_uv(ub)));
            if da.abs() < LENGTH_EPS * 1e-3 && db.abs() < LENGTH_EPS * 1e-3 {
                return;
            }

            let (tu, tv) = self.tangents_at(*u, *v);
            let a11 = na.dot(&tu);
            let a12 = na.dot(&tv);
            let a21 = nb.dot(&tu);
            let a22 = nb.dot(&tv);
            let det = a11 * a22 - a12 * a21;
            if det.abs() < 1e-18 {
                return;
            }
            *u -= (da * a22 - db * a12) / det;
            *v -= (db * a11 - da * a21) / det;
        }
    }

    /// Returns the plane `(origin, unit normal)` when this patch is an
    /// affine plane: degree (1, 1), uniform weights, parallelogram net.
    ///
    /// Exact line and plane-pair intersections are only available for
    /// such patches; everything else goes through Newton iteration.
    #[must_use]
    pub fn as_plane(&self) -> Option<(Point3, Vector3)> {
        if self.degree_u != 1 || self.degree_v != 1 {
            return None;
        }
        let w0 = self.weight[0];
        if self.weight.iter().any(|w| (w - w0).abs() > 1e-12) {
            return None;
        }
        let (c00, _) = self.at(0, 0);
        let (c01, _) = self.at(0, 1);
        let (c10, _) = self.at(1, 0);
        let (c11, _) = self.at(1, 1);
        // Parallelogram test: the two diagonals share a midpoint.
        if ((c11 - c10) - (c01 - c00)).norm() > LENGTH_EPS {
            return None;
        }
        let n = (c10 - c00).cross(&(c01 - c00));
        let len = n.norm();
        if len < LENGTH_EPS * LENGTH_EPS {
            return None;
        }
        Some((c00, n / len))
    }

    /// Finds the point closest to `p` that lies on both this surface and
    /// `other`, by Newton iteration against the two local tangent planes.
    ///
    /// Used to refine piecewise-linear midpoints onto the true
    /// intersection curve of the two faces a curve trims.
    #[must_use]
    pub fn closest_point_on_both(&self, other: &RationalSurface, p: Point3) -> Point3 {
        let mut q = p;
        let mut hint_s = None;
        let mut hint_o = None;
        for _ in 0..20 {
            let (us, conv_s) = self.closest_point_to(q, hint_s);
            let (uo, conv_o) = other.closest_point_to(q, hint_o);
            if !conv_s || !conv_o {
                return q;
            }
            hint_s = Some(us);
            hint_o = Some(uo);

            let ns = self.normal_at(us.x, us.y);
            let no = other.normal_at(uo.x, uo.y);
            let ds = ns.dot(&(q - self.point_at_uv(us)));
            let do_ = no.dot(&(q - other.point_at_uv(uo)));
            if ds.abs() < LENGTH_EPS * 1e-3 && do_.abs() < LENGTH_EPS * 1e-3 {
                return q;
            }

            // Minimal correction x = α ns + β no with ns·x = -ds, no·x = -do.
            let c = ns.dot(&no);
            let det = 1.0 - c * c;
            if det.abs() < 1e-12 {
                // Tangent surfaces; project onto this one and stop.
                return self.point_at_uv(us);
            }
            let alpha = (-ds + c * do_) / det;
            let beta = (-do_ + c * ds) / det;
            q += ns * alpha + no * beta;
        }
        q
    }

    /// Reverses the U parametrization, flipping the surface normal.
    ///
    /// Geometry is unchanged; `point_at(u, v)` afterwards equals
    /// `point_at(1 - u, v)` before. Trim records store xyz endpoints, so
    /// they stay valid across a reversal.
    pub fn reverse(&mut self) {
        let nu = self.degree_u + 1;
        let nv = self.degree_v + 1;
        for i in 0..nu / 2 {
            for j in 0..nv {
                let a = i * nv + j;
                let b = (nu - 1 - i) * nv + j;
                self.ctrl.swap(a, b);
                self.weight.swap(a, b);
            }
        }
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

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    fn unit_xy_plane() -> RationalSurface {
        RationalSurface::plane(p(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0), v(0.0, 1.0, 0.0)).unwrap()
    }

    #[test]
    fn plane_evaluates_affinely() {
        let srf = unit_xy_plane();
        assert_relative_eq!(srf.point_at(0.0, 0.0), p(0.0, 0.0, 0.0));
        assert_relative_eq!(srf.point_at(1.0, 0.0), p(1.0, 0.0, 0.0));
        assert_relative_eq!(srf.point_at(0.25, 0.75), p(0.25, 0.75, 0.0));
        // Outside the unit square too.
        assert_relative_eq!(srf.point_at(-1.0, 2.0), p(-1.0, 2.0, 0.0));
    }

    #[test]
    fn plane_normal_is_cross_of_spans() {
        let srf = unit_xy_plane();
        assert_relative_eq!(srf.normal_at(0.3, 0.9), v(0.0, 0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn tangents_match_spans_for_plane() {
        let srf =
            RationalSurface::plane(p(1.0, 2.0, 3.0), v(2.0, 0.0, 0.0), v(0.0, 0.0, 5.0)).unwrap();
        let (tu, tv) = srf.tangents_at(0.5, 0.5);
        assert_relative_eq!(tu, v(2.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(tv, v(0.0, 0.0, 5.0), epsilon = 1e-12);
    }

    #[test]
    fn closest_point_projects_onto_plane() {
        let srf = unit_xy_plane();
        let (uv, converged) = srf.closest_point_to(p(0.3, 0.6, 5.0), None);
        assert!(converged);
        assert_relative_eq!(uv.x, 0.3, epsilon = 1e-9);
        assert_relative_eq!(uv.y, 0.6, epsilon = 1e-9);
    }

    #[test]
    fn closest_point_outside_domain_converges() {
        let srf = unit_xy_plane();
        let (uv, converged) = srf.closest_point_to(p(3.0, -2.0, 1.0), None);
        assert!(converged);
        assert_relative_eq!(uv.x, 3.0, epsilon = 1e-9);
        assert_relative_eq!(uv.y, -2.0, epsilon = 1e-9);
    }

    #[test]
    fn closest_point_on_quadratic_patch() {
        // A parabolic cylinder z = 4 u (1 - u): degree (2, 1).
        let ctrl = vec![
            p(0.0, 0.0, 0.0),
            p(0.0, 1.0, 0.0),
            p(0.5, 0.0, 2.0),
            p(0.5, 1.0, 2.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
        ];
        let srf = RationalSurface::new(2, 1, ctrl, vec![1.0; 6]).unwrap();
        let apex = srf.point_at(0.5, 0.5);
        assert_relative_eq!(apex.z, 1.0, epsilon = 1e-12);

        let (uv, converged) = srf.closest_point_to(p(0.5, 0.5, 3.0), None);
        assert!(converged);
        assert_relative_eq!(uv.x, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn point_on_surfaces_lands_on_triple_intersection() {
        // Three mutually perpendicular planes meeting at (1, 1, 0).
        let f = unit_xy_plane();
        let a =
            RationalSurface::plane(p(1.0, 0.0, -1.0), v(0.0, 1.0, 0.0), v(0.0, 0.0, 2.0)).unwrap();
        let b =
            RationalSurface::plane(p(0.0, 1.0, -1.0), v(1.0, 0.0, 0.0), v(0.0, 0.0, 2.0)).unwrap();

        let mut u = 0.6;
        let mut v_ = 0.7;
        f.point_on_surfaces(&a, &b, &mut u, &mut v_);
        let refined = f.point_at(u, v_);
        assert_relative_eq!(refined, p(1.0, 1.0, 0.0), epsilon = 1e-7);
    }

    #[test]
    fn reverse_flips_normal_and_mirrors_u() {
        let mut srf = unit_xy_plane();
        let before = srf.point_at(0.25, 0.4);
        srf.reverse();
        assert_relative_eq!(srf.point_at(0.75, 0.4), before, epsilon = 1e-12);
        assert_relative_eq!(srf.normal_at(0.5, 0.5), v(0.0, 0.0, -1.0), epsilon = 1e-12);
    }

    #[test]
    fn plane_detection() {
        let srf = unit_xy_plane();
        let (origin, normal) = srf.as_plane().expect("planar patch");
        assert_relative_eq!(origin, p(0.0, 0.0, 0.0));
        assert_relative_eq!(normal, v(0.0, 0.0, 1.0), epsilon = 1e-12);

        // A non-parallelogram bilinear patch is not a plane.
        let ctrl = vec![
            p(0.0, 0.0, 0.0),
            p(0.0, 1.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 1.0),
        ];
        let warped = RationalSurface::new(1, 1, ctrl, vec![1.0; 4]).unwrap();
        assert!(warped.as_plane().is_none());
    }

    #[test]
    fn closest_point_on_both_lands_on_intersection_line() {
        let f = unit_xy_plane();
        let g =
            RationalSurface::plane(p(0.3, 0.0, -1.0), v(0.0, 1.0, 0.0), v(0.0, 0.0, 2.0)).unwrap();
        let q = f.closest_point_on_both(&g, p(0.8, 0.4, 0.6));
        assert_relative_eq!(q.x, 0.3, epsilon = 1e-7);
        assert_relative_eq!(q.z, 0.0, epsilon = 1e-7);
    }

    #[test]
    fn rejects_bad_construction() {
        assert!(RationalSurface::new(0, 1, vec![], vec![]).is_err());
        assert!(RationalSurface::new(1, 1, vec![p(0.0, 0.0, 0.0); 3], vec![1.0; 3]).is_err());
        assert!(
            RationalSurface::new(1, 1, vec![p(0.0, 0.0, 0.0); 4], vec![1.0, 1.0, -1.0, 1.0])
                .is_err()
        );
        assert!(RationalSurface::plane(
            p(0.0, 0.0, 0.0),
            v(1.0, 0.0, 0.0),
            v(2.0, 0.0, 0.0)
        )
        .is_err());
    }
}
