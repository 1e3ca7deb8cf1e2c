use std::collections::HashMap;

use slotmap::SecondaryMap;

use crate::math::{Point2, Point3};
use crate::topology::{Curve, CurveId, Face, FaceId, Shell};

use super::bsp::UvBsp;
use super::edge_list::{points_equal, EdgeList};

/// Which coordinates to emit when walking a face's trim records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSpace {
    /// Surface parameters, stored in x and y with z = 0.
    Uv,
    /// Model coordinates.
    Xyz,
}

/// Walks a face's trim records and emits one directed edge per
/// piecewise-linear segment of the referenced curves.
///
/// `curve_source` is the shell the (possibly redirected) curve handles
/// resolve in; `curve_map` redirects each trim's handle first when the
/// face still references pre-Boolean curves. Emitted edges carry the
/// post-redirection curve handle and the trim's direction flag.
pub(crate) fn make_face_edges(
    face: &Face,
    curve_source: &Shell,
    curve_map: Option<&HashMap<CurveId, CurveId>>,
    space: EdgeSpace,
) -> EdgeList {
    let mut el = EdgeList::new();
    for trim in &face.trims {
        let cid = match curve_map {
            Some(map) => match map.get(&trim.curve) {
                Some(&mapped) => mapped,
                None => continue,
            },
            None => trim.curve,
        };
        let Ok(curve) = curve_source.curve(cid) else {
            continue;
        };
        emit_trim_edges(&mut el, face, curve, cid, trim.start, trim.finish, trim.backwards, space);
    }
    el
}

#[allow(clippy::too_many_arguments)]
fn emit_trim_edges(
    el: &mut EdgeList,
    face: &Face,
    curve: &Curve,
    cid: CurveId,
    start: Point3,
    finish: Point3,
    backwards: bool,
    space: EdgeSpace,
) {
    let n = curve.pts.len();
    let indices: Box<dyn Iterator<Item = usize>> = if backwards {
        Box::new((0..n).rev())
    } else {
        Box::new(0..n)
    };

    let mut in_curve = false;
    let mut prev: Option<Point3> = None;
    let mut uv_hint: Option<Point2> = None;

    for i in indices {
        let tpt = curve.pts[i].point;
        let emit_pt = match space {
            EdgeSpace::Xyz => tpt,
            EdgeSpace::Uv => {
                let (uv, _) = face.surface.closest_point_to(tpt, uv_hint);
                uv_hint = Some(uv);
                Point3::new(uv.x, uv.y, 0.0)
            }
        };
        if in_curve {
            if let Some(p) = prev {
                el.add_edge(p, emit_pt, cid, backwards);
            }
        }
        prev = Some(emit_pt);
        if points_equal(tpt, start) {
            in_curve = true;
        }
        if points_equal(tpt, finish) {
            in_curve = false;
        }
    }
}

/// Per-face scratch for one Boolean invocation: the classifying BSP
/// over the trim region and the trim edges in xyz (used for edge-on-edge
/// detection by the shell classifier).
#[derive(Debug)]
pub(crate) struct FaceScratch {
    pub bsp: UvBsp,
    pub xyz_edges: EdgeList,
}

/// Per-invocation classifying data for every face of a shell.
///
/// Scratch scoped to one Boolean: built before splitting from the
/// shells' own curves, rebuilt after splitting from the split curves in
/// the output shell, and dropped when the driver returns.
#[derive(Debug, Default)]
pub(crate) struct ShellScratch {
    pub by_face: SecondaryMap<FaceId, FaceScratch>,
}

impl ShellScratch {
    /// Builds the scratch for every face of `shell`.
    ///
    /// When `curves_from` and `curve_map` are given, trim handles are
    /// redirected through the map and resolved in that shell instead, so
    /// the classifying data reflects the split topology.
    pub(crate) fn build(
        shell: &Shell,
        curves_from: Option<&Shell>,
        curve_map: Option<&HashMap<CurveId, CurveId>>,
    ) -> Self {
        let mut by_face = SecondaryMap::new();
        for (face_id, face) in shell.faces() {
            let source = curves_from.unwrap_or(shell);
            let uv = make_face_edges(face, source, curve_map, EdgeSpace::Uv);
            let xyz = make_face_edges(face, source, curve_map, EdgeSpace::Xyz);
            by_face.insert(
                face_id,
                FaceScratch {
                    bsp: UvBsp::build(&uv, &face.surface),
                    xyz_edges: xyz,
                },
            );
        }
        Self { by_face }
    }

    /// The classifying BSP for one face, when built.
    pub(crate) fn bsp(&self, id: FaceId) -> Option<&UvBsp> {
        self.by_face.get(id).map(|fs| &fs.bsp)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::boolean::bsp::BspClass;
    use crate::operations::creation::make_block;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn block_face_edges_form_closed_uv_loop() {
        let cube = make_block(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        for (_, face) in cube.faces() {
            let el = make_face_edges(face, &cube, None, EdgeSpace::Uv);
            assert_eq!(el.len(), 4);
            assert!(el.assemble_polygon(), "face uv loop must close");
        }
    }

    #[test]
    fn block_face_edges_xyz_match_corners() {
        let cube = make_block(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0)).unwrap();
        for (_, face) in cube.faces() {
            let el = make_face_edges(face, &cube, None, EdgeSpace::Xyz);
            assert!(el.assemble_polygon());
            for e in &el.edges {
                assert!((e.b - e.a).norm() > 1.9, "block edges are full sides");
            }
        }
    }

    #[test]
    fn built_bsps_classify_face_interiors() {
        let cube = make_block(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        let scratch = ShellScratch::build(&cube, None, None);
        for (face_id, face) in cube.faces() {
            let bsp = scratch.bsp(face_id).unwrap();
            let mid = Point2::new(0.5, 0.5);
            assert_eq!(
                bsp.classify_point(mid, Point2::new(0.6, 0.5), &face.surface),
                BspClass::Inside
            );
            assert_eq!(
                bsp.classify_point(
                    Point2::new(3.0, 0.5),
                    Point2::new(3.1, 0.5),
                    &face.surface
                ),
                BspClass::Outside
            );
        }
    }
}
