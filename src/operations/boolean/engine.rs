use std::collections::HashMap;

use crate::math::Tolerances;
use crate::topology::{CurveSource, FaceId, Shell};

use super::face_edges::ShellScratch;
use super::intersect_curves::make_intersection_curves;
use super::select::BooleanKind;
use super::split::copy_curves_split_against;
use super::trim::{make_copy_trim_against, TrimContext};

/// Computes the shell bounding the union of the solids bounded by `a`
/// and `b`.
#[must_use]
pub fn make_from_union_of(a: &Shell, b: &Shell, tol: &Tolerances) -> Shell {
    make_from_boolean(a, b, BooleanKind::Union, tol)
}

/// Computes the shell bounding the solid `a` minus the solid `b`.
#[must_use]
pub fn make_from_difference_of(a: &Shell, b: &Shell, tol: &Tolerances) -> Shell {
    make_from_boolean(a, b, BooleanKind::Difference, tol)
}

/// Runs the Boolean pipeline. The pass order is load-bearing: BSPs must
/// exist before splitting, intersection curves must be generated before
/// short-segment removal, and the classifying data must be rebuilt from
/// the split curves before any face is trimmed.
fn make_from_boolean(a: &Shell, b: &Shell, kind: BooleanKind, tol: &Tolerances) -> Shell {
    let mut into = Shell::new();

    // Classifying data for both inputs, from their original trim curves.
    let scratch_a = ShellScratch::build(a, None, None);
    let scratch_b = ShellScratch::build(b, None, None);

    // Copy over all the original curves, splitting them so that a
    // piecewise-linear segment never crosses a surface of the other
    // shell.
    let curve_map_a =
        copy_curves_split_against(a, CurveSource::A, b, &scratch_b, &mut into, tol);
    let curve_map_b =
        copy_curves_split_against(b, CurveSource::B, a, &scratch_a, &mut into, tol);

    // Intersection curves of every face of A against every face of B.
    make_intersection_curves(a, &scratch_a, b, &scratch_b, &mut into);

    // Splitting can leave segments much shorter than any feature; they
    // would otherwise come back as zero-area trim artifacts.
    for (_, curve) in into.curves_mut() {
        curve.remove_short_segments();
    }

    // Rebuild the classifying data, this time pulling edges from the
    // split curves so classification sees the split topology.
    let scratch_a = ShellScratch::build(a, Some(&into), Some(&curve_map_a));
    let scratch_b = ShellScratch::build(b, Some(&into), Some(&curve_map_b));

    // Trim and copy the faces of both operands.
    let face_map_a = copy_faces_trim_against(
        a, true, a, b, &scratch_b, &mut into, &curve_map_a, kind, tol,
    );
    let face_map_b = copy_faces_trim_against(
        b, false, a, b, &scratch_a, &mut into, &curve_map_b, kind, tol,
    );

    // Now that the new faces exist, rewrite every curve's face
    // references to the output handles.
    rewrite_surface_handles_for_curves(&mut into, &face_map_a, &face_map_b);

    into
}

/// Trims every face of `parent` against the opposite shell, adding the
/// survivors to `into`, and returns the old-to-new face handle map.
#[allow(clippy::too_many_arguments)]
fn copy_faces_trim_against(
    parent: &Shell,
    op_a: bool,
    sha: &Shell,
    shb: &Shell,
    agnst_scratch: &ShellScratch,
    into: &mut Shell,
    curve_map: &HashMap<crate::topology::CurveId, crate::topology::CurveId>,
    kind: BooleanKind,
    tol: &Tolerances,
) -> HashMap<FaceId, FaceId> {
    let mut face_map = HashMap::new();
    let face_ids: Vec<FaceId> = parent.faces().map(|(id, _)| id).collect();

    for face_id in face_ids {
        let outcome = {
            let ctx = TrimContext {
                parent,
                op_a,
                sha,
                shb,
                agnst_scratch,
                into,
                curve_map,
                kind,
                tol,
            };
            make_copy_trim_against(face_id, &ctx)
        };
        if let Some(face) = outcome.face {
            face_map.insert(face_id, into.add_face(face));
        }
        if outcome.failed {
            into.boolean_failed = true;
            log::debug!(
                "face trim failed to close; recording {} naked edges",
                outcome.naked_edges.len()
            );
            into.naked_edges.extend(outcome.naked_edges);
        }
    }
    face_map
}

/// Rewrites every output curve's face handles through the redirection
/// maps the trimming passes produced. A face that did not survive maps
/// to the null handle.
pub(crate) fn rewrite_surface_handles_for_curves(
    into: &mut Shell,
    face_map_a: &HashMap<FaceId, FaceId>,
    face_map_b: &HashMap<FaceId, FaceId>,
) {
    for (_, curve) in into.curves_mut() {
        let (map_a, map_b) = match curve.source {
            CurveSource::A => (face_map_a, face_map_a),
            CurveSource::B => (face_map_b, face_map_b),
            CurveSource::Intersection => (face_map_a, face_map_b),
        };
        curve.surf_a = map_a.get(&curve.surf_a).copied().unwrap_or_default();
        curve.surf_b = map_b.get(&curve.surf_b).copied().unwrap_or_default();
    }
}
