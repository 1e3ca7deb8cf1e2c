use crate::geometry::RationalBezier;
use crate::math::{Point2, Point3, Vector2, Vector3, LENGTH_EPS};
use crate::topology::{Curve, CurvePoint, CurveSource, Face, FaceId, Shell};

use super::bsp::{BspClass, UvBsp};
use super::face_edges::ShellScratch;

/// Generates the intersection curves of every face of `a` against every
/// face of `b` and appends them to `into`.
///
/// Exact generation is provided for plane pairs; parallel and
/// coincident pairs contribute nothing (coincidence is resolved by the
/// classifier, not by curves). Curved pairs are the seam where a host
/// surface-surface intersector would plug in.
pub(crate) fn make_intersection_curves(
    a: &Shell,
    a_bsps: &ShellScratch,
    b: &Shell,
    b_bsps: &ShellScratch,
    into: &mut Shell,
) {
    for (fa_id, fa) in a.faces() {
        for (fb_id, fb) in b.faces() {
            intersect_face_pair((a, fa_id, fa, a_bsps), (b, fb_id, fb, b_bsps), into);
        }
    }
}

type FaceCtx<'s> = (&'s Shell, FaceId, &'s Face, &'s ShellScratch);

fn intersect_face_pair(side_a: FaceCtx, side_b: FaceCtx, into: &mut Shell) {
    let (shell_a, fa_id, fa, a_bsps) = side_a;
    let (shell_b, fb_id, fb, b_bsps) = side_b;

    let (Some((pa, na)), Some((pb, nb))) = (fa.surface.as_plane(), fb.surface.as_plane()) else {
        return;
    };

    let dir = na.cross(&nb);
    let dir_len = dir.norm();
    if dir_len < LENGTH_EPS {
        // Parallel or coincident planes: no intersection curve.
        return;
    }
    let dir = dir / dir_len;

    // A point on the intersection line: p = pa + s*na + t*nb with both
    // plane equations satisfied.
    let d2 = nb.dot(&(pb - pa));
    let dot_nn = na.dot(&nb);
    let denom = 1.0 - dot_nn * dot_nn;
    let origin = pa + na * (-dot_nn * d2 / denom) + nb * (d2 / denom);

    let Some(bsp_a) = a_bsps.bsp(fa_id) else {
        return;
    };
    let Some(bsp_b) = b_bsps.bsp(fb_id) else {
        return;
    };
    let intervals_a = clip_line_to_face(shell_a, fa, bsp_a, origin, dir);
    let intervals_b = clip_line_to_face(shell_b, fb, bsp_b, origin, dir);

    for &(a0, a1) in &intervals_a {
        for &(b0, b1) in &intervals_b {
            let lo = a0.max(b0);
            let hi = a1.min(b1);
            if hi - lo < LENGTH_EPS {
                continue;
            }
            let start = origin + dir * lo;
            let finish = origin + dir * hi;
            let Ok(exact) = RationalBezier::line(start, finish) else {
                continue;
            };
            into.add_curve(Curve {
                pts: vec![CurvePoint::new(start, true), CurvePoint::new(finish, true)],
                exact: Some(exact),
                surf_a: fa_id,
                surf_b: fb_id,
                source: CurveSource::Intersection,
            });
        }
    }
}

/// Clips the line `origin + t * dir` against a face's trim region,
/// returning the `t` intervals that lie on the face.
///
/// Crossing parameters are gathered against the trim loops in uv, then
/// each candidate interval is kept if its midpoint is not outside the
/// region. Midpoints on the boundary survive, which is what lets a
/// tangent contact emit its zero-width artifact for later culling.
fn clip_line_to_face(
    shell: &Shell,
    face: &Face,
    bsp: &UvBsp,
    origin: Point3,
    dir: Vector3,
) -> Vec<(f64, f64)> {
    // The line in uv; affine for planar faces.
    let (uv_o, _) = face.surface.closest_point_to(origin, None);
    let (uv_1, _) = face.surface.closest_point_to(origin + dir, Some(uv_o));
    let uv_d = uv_1 - uv_o;
    if uv_d.norm() < f64::MIN_POSITIVE.sqrt() {
        return Vec::new();
    }

    let mut crossings: Vec<f64> = Vec::new();
    for trim in &face.trims {
        let Ok(curve) = shell.curve(trim.curve) else {
            continue;
        };
        let mut prev: Option<Point2> = None;
        for cp in &curve.pts {
            let (uv, _) = face.surface.closest_point_to(cp.point, prev);
            if let Some(p) = prev {
                if let Some(t) = segment_line_crossing(p, uv, uv_o, uv_d) {
                    crossings.push(t);
                }
            }
            prev = Some(uv);
        }
    }
    crossings.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));

    let mut intervals = Vec::new();
    for w in crossings.windows(2) {
        let (lo, hi) = (w[0], w[1]);
        if hi - lo < LENGTH_EPS {
            continue;
        }
        let mid = uv_o + uv_d * ((lo + hi) * 0.5);
        let class = bsp.classify_point(mid, mid + uv_d, &face.surface);
        if class != BspClass::Outside {
            intervals.push((lo, hi));
        }
    }
    intervals
}

/// Crossing parameter of the uv segment `p..q` with the line
/// `o + t * d`, or `None` when they do not cross.
fn segment_line_crossing(p: Point2, q: Point2, o: Point2, d: Vector2) -> Option<f64> {
    let e = q - p;
    // Solve o + t*d = p + s*e.
    let det = d.x * (-e.y) + d.y * e.x;
    if det.abs() < 1e-15 {
        return None;
    }
    let r = p - o;
    let t = (r.x * (-e.y) + r.y * e.x) / det;
    let s = (d.x * r.y - d.y * r.x) / det;
    // Half-open so a crossing at a shared loop vertex counts once.
    if (0.0..1.0).contains(&s) {
        Some(t)
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::make_block;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn curves_between(a: &Shell, b: &Shell) -> Shell {
        let a_bsps = ShellScratch::build(a, None, None);
        let b_bsps = ShellScratch::build(b, None, None);
        let mut into = Shell::new();
        make_intersection_curves(a, &a_bsps, b, &b_bsps, &mut into);
        into
    }

    #[test]
    fn disjoint_blocks_have_no_intersection_curves() {
        let a = make_block(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        let b = make_block(p(3.0, 3.0, 3.0), p(4.0, 4.0, 4.0)).unwrap();
        assert_eq!(curves_between(&a, &b).curve_count(), 0);
    }

    #[test]
    fn overlapping_blocks_produce_boundary_segments() {
        let a = make_block(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        let b = make_block(p(0.5, 0.5, 0.5), p(1.5, 1.5, 1.5)).unwrap();
        let into = curves_between(&a, &b);
        assert!(into.curve_count() > 0);

        for (_, c) in into.curves() {
            assert_eq!(c.source, CurveSource::Intersection);
            assert_eq!(c.pts.len(), 2);
            let len = (c.pts[1].point - c.pts[0].point).norm();
            assert!(len > LENGTH_EPS);
            // Every curve lies in the overlap slab's boundary.
            for cp in &c.pts {
                for i in 0..3 {
                    assert!(cp.point[i] > 0.5 - 1e-6 && cp.point[i] < 1.0 + 1e-6);
                }
            }
        }
    }

    #[test]
    fn slab_overlap_intersections_are_clipped_to_both_faces() {
        // B shifted along x only; its x = 0.5 face cuts A's four side
        // faces in segments of length 1.
        let a = make_block(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        let b = make_block(p(0.5, 0.0, 0.0), p(1.5, 1.0, 1.0)).unwrap();
        let into = curves_between(&a, &b);

        let at_half: Vec<_> = into
            .curves()
            .filter(|(_, c)| {
                c.pts
                    .iter()
                    .all(|cp| (cp.point.x - 0.5).abs() < 1e-7)
            })
            .collect();
        assert!(!at_half.is_empty());
        for (_, c) in at_half {
            let len = (c.pts[1].point - c.pts[0].point).norm();
            assert_relative_eq!(len, 1.0, epsilon = 1e-6);
        }
    }
}
