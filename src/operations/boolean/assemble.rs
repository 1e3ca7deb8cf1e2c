use std::collections::HashMap;

use crate::topology::{CurveSource, Face, Shell, TrimBy};

use super::engine::rewrite_surface_handles_for_curves;

/// Copies all the curves and faces from two shells into a single shell,
/// rewriting every handle; no intersection or classification happens,
/// so interfering inputs simply produce a self-intersecting result.
/// Used for assemblies, where it is much faster than merging as union.
#[must_use]
pub fn make_from_assembly_of(a: &Shell, b: &Shell) -> Shell {
    let mut into = Shell::new();

    // Curves first, noting which shell each came from, with new handles.
    let mut curve_map_a = HashMap::new();
    let mut curve_map_b = HashMap::new();
    for (source, shell, map) in [
        (CurveSource::A, a, &mut curve_map_a),
        (CurveSource::B, b, &mut curve_map_b),
    ] {
        for (cid, curve) in shell.curves() {
            let mut copy = curve.clone();
            copy.source = source;
            // The face references are stale until the faces are copied.
            map.insert(cid, into.add_curve(copy));
        }
    }

    // Then the faces, with their trim records redirected to the new
    // curve handles.
    let mut face_map_a = HashMap::new();
    let mut face_map_b = HashMap::new();
    for (shell, curve_map, face_map) in [
        (a, &curve_map_a, &mut face_map_a),
        (b, &curve_map_b, &mut face_map_b),
    ] {
        for (fid, face) in shell.faces() {
            let mut copy = Face::new(face.surface.clone());
            for trim in &face.trims {
                let Some(&mapped) = curve_map.get(&trim.curve) else {
                    continue;
                };
                copy.trims.push(TrimBy {
                    curve: mapped,
                    start: trim.start,
                    finish: trim.finish,
                    backwards: trim.backwards,
                });
            }
            face_map.insert(fid, into.add_face(copy));
        }
    }

    rewrite_surface_handles_for_curves(&mut into, &face_map_a, &face_map_b);
    into
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::make_block;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn counts_sum_exactly() {
        let a = make_block(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        let b = make_block(p(0.5, 0.5, 0.5), p(1.5, 1.5, 1.5)).unwrap();

        let out = make_from_assembly_of(&a, &b);
        assert!(!out.boolean_failed);
        assert_eq!(out.face_count(), a.face_count() + b.face_count());
        assert_eq!(out.curve_count(), a.curve_count() + b.curve_count());
    }

    #[test]
    fn geometry_is_preserved_bit_for_bit() {
        let a = make_block(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        let b = make_block(p(3.0, 0.0, 0.0), p(4.0, 1.0, 1.0)).unwrap();

        let out = make_from_assembly_of(&a, &b);

        // Output curves appear in A-then-B insertion order with their
        // piecewise-linear points untouched.
        let originals: Vec<_> = a.curves().chain(b.curves()).collect();
        let copies: Vec<_> = out.curves().collect();
        assert_eq!(originals.len(), copies.len());
        for ((_, orig), (_, copy)) in originals.iter().zip(copies.iter()) {
            assert_eq!(orig.pts.len(), copy.pts.len());
            for (po, pc) in orig.pts.iter().zip(copy.pts.iter()) {
                assert_eq!(po.point, pc.point);
                assert_eq!(po.vertex, pc.vertex);
            }
        }
    }

    #[test]
    fn curve_face_references_resolve_in_the_output() {
        let a = make_block(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        let b = make_block(p(2.0, 0.0, 0.0), p(3.0, 1.0, 1.0)).unwrap();

        let out = make_from_assembly_of(&a, &b);
        for (_, curve) in out.curves() {
            assert!(out.face(curve.surf_a).is_ok(), "surf_a must resolve");
            assert!(out.face(curve.surf_b).is_ok(), "surf_b must resolve");
        }
    }

    #[test]
    fn trim_records_reference_output_curves() {
        let a = make_block(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        let b = make_block(p(2.0, 0.0, 0.0), p(3.0, 1.0, 1.0)).unwrap();

        let out = make_from_assembly_of(&a, &b);
        for (_, face) in out.faces() {
            assert_eq!(face.trims.len(), 4);
            for trim in &face.trims {
                assert!(out.curve(trim.curve).is_ok());
            }
        }
    }
}
