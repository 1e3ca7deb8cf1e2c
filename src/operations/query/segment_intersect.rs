use crate::geometry::RationalSurface;
use crate::math::{Point2, Point3, Vector3, LENGTH_EPS};
use crate::operations::boolean::bsp::BspClass;
use crate::operations::boolean::ShellScratch;
use crate::topology::{FaceId, Shell};

/// One intersection of a query line with a shell face.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SurfaceHit {
    /// The intersection point in xyz.
    pub point: Point3,
    /// The face that was hit.
    pub face: FaceId,
    /// Surface parameters of the hit on that face.
    pub uv: Point2,
    /// Line parameter of the hit (`origin + t * dir`).
    pub t: f64,
    /// True when the line only grazes the surface at the hit.
    pub tangent: bool,
}

/// Options for [`all_points_intersecting`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct IntersectOptions {
    /// Restrict hits to the segment `a..b` instead of the whole line.
    pub as_segment: bool,
    /// Drop hits that land outside the face's trim region.
    pub trimmed: bool,
    /// Keep hits where the line is tangent to the surface.
    pub include_tangent: bool,
}

/// Intersects the line (or segment) `a..b` against every face of a
/// shell.
pub(crate) fn all_points_intersecting(
    shell: &Shell,
    bsps: &ShellScratch,
    a: Point3,
    b: Point3,
    opts: IntersectOptions,
) -> Vec<SurfaceHit> {
    let dir = b - a;
    let dir_len = dir.norm();
    if dir_len < LENGTH_EPS {
        return Vec::new();
    }
    let t_eps = LENGTH_EPS / dir_len;

    let mut hits = Vec::new();
    for (face_id, face) in shell.faces() {
        for (t, uv, tangent) in line_surface_hits(&face.surface, a, dir) {
            if opts.as_segment && !(-t_eps..=1.0 + t_eps).contains(&t) {
                continue;
            }
            if tangent && !opts.include_tangent {
                continue;
            }
            if opts.trimmed {
                let class = bsps.bsp(face_id).map_or(BspClass::Outside, |bsp| {
                    bsp.classify_point(uv, uv + nalgebra::Vector2::new(1.0, 0.0), &face.surface)
                });
                if class == BspClass::Outside {
                    continue;
                }
            }
            hits.push(SurfaceHit {
                point: face.surface.point_at_uv(uv),
                face: face_id,
                uv,
                t,
                tangent,
            });
        }
    }
    hits
}

/// Computes the intersections of the line `origin + t * dir` with one
/// surface, as `(t, uv, tangent)` triples.
///
/// Planar patches are solved exactly; a line lying in the plane yields
/// no point hits. Curved patches run Newton from a coarse seed grid and
/// deduplicate converged roots.
pub(crate) fn line_surface_hits(
    srf: &RationalSurface,
    origin: Point3,
    dir: Vector3,
) -> Vec<(f64, Point2, bool)> {
    if let Some((p0, n)) = srf.as_plane() {
        let denom = n.dot(&dir);
        if denom.abs() < LENGTH_EPS * dir.norm() / 1e3 {
            return Vec::new();
        }
        let t = n.dot(&(p0 - origin)) / denom;
        let hit = origin + dir * t;
        let (uv, converged) = srf.closest_point_to(hit, None);
        if !converged {
            return Vec::new();
        }
        let tangent = denom.abs() < 1e-4 * dir.norm();
        return vec![(t, uv, tangent)];
    }

    // Curved patch: Newton on F(u, v, t) = S(u, v) - (origin + t*dir).
    let mut hits: Vec<(f64, Point2, bool)> = Vec::new();
    let n = 3;
    for i in 0..=n {
        for j in 0..=n {
            let mut u = f64::from(i) / f64::from(n);
            let mut v = f64::from(j) / f64::from(n);
            let mut t = 0.5;
            let mut converged = false;
            for _ in 0..30 {
                let s = srf.point_at(u, v);
                let r = s - (origin + dir * t);
                if r.norm() < LENGTH_EPS * 1e-2 {
                    converged = true;
                    break;
                }
                let (su, sv) = srf.tangents_at(u, v);
                let jac = nalgebra::Matrix3::from_columns(&[su, sv, -dir]);
                let Some(step) = jac.lu().solve(&r) else {
                    break;
                };
                u -= step.x;
                v -= step.y;
                t -= step.z;
                if !u.is_finite() || !v.is_finite() || !t.is_finite() {
                    break;
                }
            }
            if !converged {
                continue;
            }
            if hits.iter().any(|&(ht, _, _)| (ht - t).abs() * dir.norm() < LENGTH_EPS) {
                continue;
            }
            let normal = srf.normal_at(u, v);
            let tangent = normal.dot(&dir).abs() < 1e-4 * dir.norm();
            hits.push((t, Point2::new(u, v), tangent));
        }
    }
    hits.sort_by(|x, y| x.0.partial_cmp(&y.0).unwrap_or(std::cmp::Ordering::Equal));
    hits
}
