use std::collections::HashMap;

use crate::error::{OperationError, Result};
use crate::geometry::{RationalBezier, RationalSurface};
use crate::math::{Point3, Vector3, LENGTH_EPS};
use crate::topology::{Curve, CurveId, CurvePoint, CurveSource, Face, Shell, TrimBy};

/// Builds a closed axis-aligned block shell between two corners.
///
/// Six degree-(1,1) faces with outward normals, twelve shared edge
/// curves (each trimming its two adjacent faces), and trim records
/// running counter-clockwise in every face's uv.
///
/// # Errors
///
/// Returns an error if the block is degenerate along any axis.
pub fn make_block(min: Point3, max: Point3) -> Result<Shell> {
    for i in 0..3 {
        if max[i] - min[i] < LENGTH_EPS {
            return Err(OperationError::InvalidInput(format!(
                "block is degenerate along axis {i}"
            ))
            .into());
        }
    }

    let d = max - min;
    let mut shell = Shell::new();

    // Each face: origin, u span, v span, with u x v pointing outward.
    let specs = [
        // x = min
        (min, Vector3::new(0.0, 0.0, d.z), Vector3::new(0.0, d.y, 0.0)),
        // x = max
        (
            Point3::new(max.x, min.y, min.z),
            Vector3::new(0.0, d.y, 0.0),
            Vector3::new(0.0, 0.0, d.z),
        ),
        // y = min
        (min, Vector3::new(d.x, 0.0, 0.0), Vector3::new(0.0, 0.0, d.z)),
        // y = max
        (
            Point3::new(min.x, max.y, min.z),
            Vector3::new(0.0, 0.0, d.z),
            Vector3::new(d.x, 0.0, 0.0),
        ),
        // z = min
        (min, Vector3::new(0.0, d.y, 0.0), Vector3::new(d.x, 0.0, 0.0)),
        // z = max
        (
            Point3::new(min.x, min.y, max.z),
            Vector3::new(d.x, 0.0, 0.0),
            Vector3::new(0.0, d.y, 0.0),
        ),
    ];

    let mut face_ids = Vec::with_capacity(6);
    let mut corners = Vec::with_capacity(6);
    for (origin, u_span, v_span) in specs {
        let surface = RationalSurface::plane(origin, u_span, v_span)?;
        // uv corners counter-clockwise around the outward normal.
        corners.push([
            origin,
            origin + u_span,
            origin + u_span + v_span,
            origin + v_span,
        ]);
        face_ids.push(shell.add_face(Face::new(surface)));
    }

    // Shared edge curves, keyed by their quantized canonical endpoints.
    let mut edge_curves: HashMap<(PointKey, PointKey), CurveId> = HashMap::new();
    let mut trims: Vec<Vec<TrimBy>> = vec![Vec::with_capacity(4); 6];

    for (face_idx, face_id) in face_ids.iter().enumerate() {
        for side in 0..4 {
            let ca = corners[face_idx][side];
            let cb = corners[face_idx][(side + 1) % 4];
            let (lo, hi, backwards) = canonical(ca, cb);
            let key = (PointKey::of(lo), PointKey::of(hi));

            let curve_id = match edge_curves.get(&key) {
                Some(&cid) => {
                    // Second adjacent face of this edge.
                    shell.curve_mut(cid)?.surf_b = *face_id;
                    cid
                }
                None => {
                    let cid = shell.add_curve(Curve {
                        pts: vec![CurvePoint::new(lo, true), CurvePoint::new(hi, true)],
                        exact: Some(RationalBezier::line(lo, hi)?),
                        surf_a: *face_id,
                        surf_b: *face_id,
                        source: CurveSource::A,
                    });
                    edge_curves.insert(key, cid);
                    cid
                }
            };

            trims[face_idx].push(TrimBy {
                curve: curve_id,
                start: ca,
                finish: cb,
                backwards,
            });
        }
    }

    for (face_idx, face_id) in face_ids.iter().enumerate() {
        shell.face_mut(*face_id)?.trims = std::mem::take(&mut trims[face_idx]);
    }
    Ok(shell)
}

/// Canonical direction of a block edge: lexicographically smaller
/// endpoint first. `backwards` is set when the boundary traverses the
/// curve against its stored direction.
fn canonical(a: Point3, b: Point3) -> (Point3, Point3, bool) {
    let ka = PointKey::of(a);
    let kb = PointKey::of(b);
    if ka <= kb {
        (a, b, false)
    } else {
        (b, a, true)
    }
}

/// Grid-quantized point key; block corners computed from different face
/// origins can differ in the last ulp.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct PointKey([i64; 3]);

impl PointKey {
    fn of(p: Point3) -> Self {
        let q = |v: f64| (v / (LENGTH_EPS * 0.5)).round() as i64;
        Self([q(p.x), q(p.y), q(p.z)])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::boolean::edge_list::points_equal;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn block_has_six_faces_and_twelve_curves() {
        let shell = make_block(p(0.0, 0.0, 0.0), p(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(shell.face_count(), 6);
        assert_eq!(shell.curve_count(), 12);
    }

    #[test]
    fn every_curve_trims_two_distinct_faces() {
        let shell = make_block(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        for (_, curve) in shell.curves() {
            assert_ne!(curve.surf_a, curve.surf_b);
            assert!(shell.face(curve.surf_a).is_ok());
            assert!(shell.face(curve.surf_b).is_ok());
        }
    }

    #[test]
    fn face_normals_point_outward() {
        let shell = make_block(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0)).unwrap();
        let center = p(1.0, 1.0, 1.0);
        for (_, face) in shell.faces() {
            let at = face.surface.point_at(0.5, 0.5);
            let n = face.surface.normal_at(0.5, 0.5);
            assert!(
                n.dot(&(at - center)) > 0.0,
                "normal at {at:?} must point away from the center"
            );
        }
    }

    #[test]
    fn trim_loops_close_in_order() {
        let shell = make_block(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        for (_, face) in shell.faces() {
            assert_eq!(face.trims.len(), 4);
            for i in 0..4 {
                let next = &face.trims[(i + 1) % 4];
                assert!(
                    points_equal(face.trims[i].finish, next.start),
                    "trims must chain start-to-finish"
                );
            }
        }
    }

    #[test]
    fn trim_direction_flags_match_curve_storage() {
        let shell = make_block(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        for (_, face) in shell.faces() {
            for trim in &face.trims {
                let curve = shell.curve(trim.curve).unwrap();
                let first = curve.pts.first().unwrap().point;
                let last = curve.pts.last().unwrap().point;
                if trim.backwards {
                    assert!(points_equal(trim.start, last));
                    assert!(points_equal(trim.finish, first));
                } else {
                    assert!(points_equal(trim.start, first));
                    assert!(points_equal(trim.finish, last));
                }
            }
        }
    }

    #[test]
    fn degenerate_block_is_rejected() {
        assert!(make_block(p(0.0, 0.0, 0.0), p(1.0, 0.0, 1.0)).is_err());
        assert!(make_block(p(1.0, 0.0, 0.0), p(0.0, 1.0, 1.0)).is_err());
    }
}
