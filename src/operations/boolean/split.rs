use std::collections::HashMap;

use crate::math::{Point3, Tolerances, VERY_POSITIVE};
use crate::operations::query::segment_intersect::{all_points_intersecting, IntersectOptions};
use crate::topology::{Curve, CurveId, CurvePoint, CurveSource, Shell};

use super::edge_list::points_equal;
use super::face_edges::ShellScratch;
use super::bsp::BspClass;

/// Splits one curve wherever a piecewise-linear segment crosses a face
/// of an against-shell, refining every split point to lie on all three
/// relevant surfaces.
///
/// Intersections with the curve's own trimmed faces are dropped: the
/// segment certainly meets those at its endpoints, and refining against
/// them would make the three-surface system singular.
///
/// # Panics
///
/// Panics if the curve has no points.
pub(crate) fn make_copy_split_against(
    curve: &Curve,
    own: &Shell,
    against: &[(&Shell, &ShellScratch)],
    tol: &Tolerances,
) -> Curve {
    assert!(!curve.pts.is_empty(), "cannot split an empty curve");

    let srf_a = own.face(curve.surf_a).map(|f| &f.surface).ok();
    let srf_b = own.face(curve.surf_b).map(|f| &f.surface).ok();

    let mut ret = curve.clone();
    ret.pts = Vec::with_capacity(curve.pts.len());
    ret.pts.push(curve.pts[0]);
    let mut prev = curve.pts[0];

    for next in &curve.pts[1..] {
        let mut splits: Vec<Point3> = Vec::new();

        for &(agnst, bsps) in against {
            let hits = all_points_intersecting(
                agnst,
                bsps,
                prev.point,
                next.point,
                IntersectOptions {
                    as_segment: true,
                    trimmed: false,
                    include_tangent: true,
                },
            );
            for hit in hits {
                if std::ptr::eq(agnst, own)
                    && (hit.face == curve.surf_a || hit.face == curve.surf_b)
                {
                    // Expected endpoint intersections with the curve's
                    // own surfaces; they would be culled later anyway,
                    // and the refinement matrix is singular for them.
                    continue;
                }

                let Ok(face) = agnst.face(hit.face) else {
                    continue;
                };

                // Split only if the intersection lies within the face's
                // trim region, or within chord tolerance of it; slop for
                // coarse piecewise-linear trims does not hurt, splitting
                // unnecessarily is harmless.
                let class = bsps.bsp(hit.face).map_or(BspClass::Outside, |bsp| {
                    bsp.classify_point(
                        hit.uv,
                        hit.uv + nalgebra::Vector2::new(1.0, 0.0),
                        &face.surface,
                    )
                });
                if class == BspClass::Outside {
                    let d = bsps.bsp(hit.face).map_or(VERY_POSITIVE, |bsp| {
                        bsp.min_distance_to_edge(hit.uv, &face.surface)
                    });
                    if d > tol.chord {
                        continue;
                    }
                }

                // Keeping the intersection; refine it onto all three
                // surfaces.
                let refined = match (srf_a, srf_b) {
                    (Some(sa), Some(sb)) => {
                        let mut u = hit.uv.x;
                        let mut v = hit.uv.y;
                        face.surface.point_on_surfaces(sa, sb, &mut u, &mut v);
                        face.surface.point_at(u, v)
                    }
                    _ => hit.point,
                };
                splits.push(refined);
            }
        }

        // Sort along the segment after refining; refinement can swap
        // the order of nearby intersections.
        let dir = next.point - prev.point;
        let den = dir.norm_squared();
        splits.sort_by(|x, y| {
            let tx = (x - prev.point).dot(&dir) / den;
            let ty = (y - prev.point).dot(&dir) / den;
            tx.partial_cmp(&ty).unwrap_or(std::cmp::Ordering::Equal)
        });

        // On-edge intersections produce the same split point from both
        // adjacent faces; do not emit zero-length segments.
        let mut last_emitted = Point3::new(VERY_POSITIVE, 0.0, 0.0);
        for s in splits {
            if !points_equal(s, last_emitted) {
                ret.pts.push(CurvePoint::new(s, true));
            }
            last_emitted = s;
        }

        ret.pts.push(*next);
        prev = *next;
    }
    ret
}

/// Copies every curve of `shell` into `into`, split against `agnst`,
/// and returns the old-to-new handle redirection map consumed by the
/// trimming pass.
pub(crate) fn copy_curves_split_against(
    shell: &Shell,
    source: CurveSource,
    agnst: &Shell,
    agnst_bsps: &ShellScratch,
    into: &mut Shell,
    tol: &Tolerances,
) -> HashMap<CurveId, CurveId> {
    let mut map = HashMap::new();
    for (cid, curve) in shell.curves() {
        let mut split = make_copy_split_against(curve, shell, &[(agnst, agnst_bsps)], tol);
        split.source = source;
        let new_id = into.add_curve(split);
        map.insert(cid, new_id);
    }
    map
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

    #[test]
    fn curve_is_split_where_it_enters_the_other_shell() {
        let a = make_block(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        let b = make_block(p(0.5, -0.5, -0.5), p(1.5, 1.5, 1.5)).unwrap();
        let b_bsps = ShellScratch::build(&b, None, None);

        // A's bottom-front edge runs x in [0, 1] at y = 0, z = 0 and
        // crosses B's x = 0.5 face.
        let (_, edge_curve) = a
            .curves()
            .find(|(_, c)| {
                let s = c.pts.first().unwrap().point;
                let f = c.pts.last().unwrap().point;
                s.y.abs() < 1e-9
                    && s.z.abs() < 1e-9
                    && f.y.abs() < 1e-9
                    && f.z.abs() < 1e-9
                    && (f.x - s.x).abs() > 0.5
            })
            .expect("bottom-front edge");

        let split = make_copy_split_against(
            edge_curve,
            &a,
            &[(&b, &b_bsps)],
            &Tolerances::default(),
        );
        assert_eq!(split.pts.len(), 3, "one split point expected");
        assert_relative_eq!(split.pts[1].point.x, 0.5, epsilon = 1e-7);
        assert!(split.pts[1].vertex);
    }

    #[test]
    fn disjoint_shells_do_not_split() {
        let a = make_block(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        let b = make_block(p(5.0, 5.0, 5.0), p(6.0, 6.0, 6.0)).unwrap();
        let b_bsps = ShellScratch::build(&b, None, None);

        for (_, curve) in a.curves() {
            let split =
                make_copy_split_against(curve, &a, &[(&b, &b_bsps)], &Tolerances::default());
            assert_eq!(split.pts.len(), curve.pts.len());
        }
    }

    #[test]
    fn off_face_plane_crossings_are_not_split() {
        let a = make_block(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        // B's faces' infinite planes cross A's edges, but the trim
        // regions are far away.
        let b = make_block(p(0.4, 5.0, 5.0), p(0.6, 6.0, 6.0)).unwrap();
        let b_bsps = ShellScratch::build(&b, None, None);

        for (_, curve) in a.curves() {
            let split =
                make_copy_split_against(curve, &a, &[(&b, &b_bsps)], &Tolerances::default());
            assert_eq!(
                split.pts.len(),
                curve.pts.len(),
                "no split should survive the trim-region filter"
            );
        }
    }

    #[test]
    #[should_panic(expected = "cannot split an empty curve")]
    fn empty_curve_panics() {
        let a = make_block(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        let empty = Curve {
            pts: vec![],
            exact: None,
            surf_a: crate::topology::FaceId::default(),
            surf_b: crate::topology::FaceId::default(),
            source: CurveSource::A,
        };
        let bsps = ShellScratch::build(&a, None, None);
        let _ = make_copy_split_against(&empty, &a, &[(&a, &bsps)], &Tolerances::default());
    }
}
