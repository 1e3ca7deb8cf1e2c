use crate::math::{Point3, Vector3, LENGTH_EPS};
use crate::operations::boolean::bsp::BspClass;
use crate::operations::boolean::edge_list::points_equal;
use crate::operations::boolean::select::ShellClass;
use crate::operations::boolean::ShellScratch;
use crate::operations::query::segment_intersect::line_surface_hits;
use crate::topology::Shell;

/// Direction-cosine tolerance for "runs along the surface" tests.
const DOTP_TOL: f64 = 1e-3;

/// Classifies the two flanks of a surface edge against a shell.
///
/// `ea`/`eb` are the edge endpoints in xyz, `pt` the refined midpoint,
/// `enin`/`enout` the in-surface flank offsets from the edge-normal
/// probe, and `surfn` the normal of the surface the edge lies on.
///
/// Three cases, in order:
///
/// 1. the edge coincides with an edge of the shell (endpoints match an
///    entry of a face's xyz trim-edge list): each flank is sorted
///    against the material wedge of the two adjacent faces, detecting
///    coincident-same/opposite runs along either face;
/// 2. the midpoint lies on a face: a parallel normal means both flanks
///    are coincident; a crossing face sorts each flank by its side;
/// 3. otherwise both flanks share the midpoint's ray-cast class.
#[allow(clippy::too_many_arguments)]
pub(crate) fn classify_edge_against(
    shell: &Shell,
    scratch: &ShellScratch,
    ea: Point3,
    eb: Point3,
    pt: Point3,
    enin: Vector3,
    enout: Vector3,
    surfn: Vector3,
) -> (ShellClass, ShellClass) {
    let adjacent = edges_matching(shell, scratch, ea, eb, pt);
    if !adjacent.is_empty() {
        let indir = classify_flank_at_shell_edge(shell, scratch, pt, enin, surfn, &adjacent);
        let outdir = classify_flank_at_shell_edge(shell, scratch, pt, enout, surfn, &adjacent);
        return (indir, outdir);
    }

    if let Some(face_normals) = faces_containing(shell, scratch, pt) {
        if let Some(crossing) = face_normals
            .iter()
            .find(|n| n.dot(&surfn).abs() <= 1.0 - 1e-6)
        {
            let indir = flank_side(shell, scratch, pt, enin, *crossing);
            let outdir = flank_side(shell, scratch, pt, enout, *crossing);
            return (indir, outdir);
        }
        let class = if face_normals[0].dot(&surfn) > 0.0 {
            ShellClass::CoincSame
        } else {
            ShellClass::CoincOpp
        };
        return (class, class);
    }

    let class = classify_point_against(shell, scratch, pt);
    (class, class)
}

/// One face of the shell adjacent to a matched shell edge: its outward
/// normal at the edge midpoint and its in-surface direction from the
/// edge into the face's region.
struct AdjacentFace {
    normal: Vector3,
    into_face: Vector3,
}

fn edges_matching(
    shell: &Shell,
    scratch: &ShellScratch,
    ea: Point3,
    eb: Point3,
    pt: Point3,
) -> Vec<AdjacentFace> {
    let mut adjacent = Vec::new();
    for (face_id, face) in shell.faces() {
        let Some(fs) = scratch.by_face.get(face_id) else {
            continue;
        };
        for edge in &fs.xyz_edges.edges {
            let fwd = points_equal(edge.a, ea) && points_equal(edge.b, eb);
            let rev = points_equal(edge.a, eb) && points_equal(edge.b, ea);
            if !fwd && !rev {
                continue;
            }
            let (uv, converged) = face.surface.closest_point_to(pt, None);
            if !converged {
                continue;
            }
            let normal = face.surface.normal_at(uv.x, uv.y);
            let d = edge.b - edge.a;
            let len = d.norm();
            if len < LENGTH_EPS {
                continue;
            }
            // Boundary edges run counter-clockwise around the region, so
            // the surface's left normal points into the face.
            adjacent.push(AdjacentFace {
                normal,
                into_face: normal.cross(&(d / len)),
            });
            break;
        }
    }
    adjacent
}

/// Sorts one flank direction against the material wedge at a shell
/// edge.
fn classify_flank_at_shell_edge(
    shell: &Shell,
    scratch: &ShellScratch,
    pt: Point3,
    flank: Vector3,
    surfn: Vector3,
    adjacent: &[AdjacentFace],
) -> ShellClass {
    let flank_len = flank.norm();
    if flank_len < LENGTH_EPS * 1e-3 {
        return classify_point_against(shell, scratch, pt);
    }
    let w = flank / flank_len;

    // Running along one of the adjacent faces, into its region: the
    // flank region is coincident with that face.
    for adj in adjacent {
        if w.dot(&adj.normal).abs() < DOTP_TOL && w.dot(&adj.into_face) > 0.0 {
            return if surfn.dot(&adj.normal) > 0.0 {
                ShellClass::CoincSame
            } else {
                ShellClass::CoincOpp
            };
        }
    }

    match adjacent {
        [f1, f2, ..] => {
            // Material wedge between the two faces: at a convex edge the
            // inside is below both tangent planes, at a concave edge
            // below either.
            let convex = f2.into_face.dot(&f1.normal);
            let below1 = w.dot(&f1.normal) < -DOTP_TOL;
            let below2 = w.dot(&f2.normal) < -DOTP_TOL;
            let inside = if convex.abs() < DOTP_TOL {
                // Tangent adjacent faces; the wedge is degenerate.
                return classify_point_against(shell, scratch, pt + flank);
            } else if convex < 0.0 {
                below1 && below2
            } else {
                below1 || below2
            };
            if inside {
                ShellClass::Inside
            } else {
                ShellClass::Outside
            }
        }
        [f1] => {
            let dot = w.dot(&f1.normal);
            if dot.abs() < DOTP_TOL {
                return classify_point_against(shell, scratch, pt + flank);
            }
            if dot < 0.0 {
                ShellClass::Inside
            } else {
                ShellClass::Outside
            }
        }
        [] => classify_point_against(shell, scratch, pt),
    }
}

/// Sorts one flank by the sign of its offset against a crossing face's
/// outward normal, falling back to a ray cast of the displaced point
/// when the edge runs tangentially to that face.
fn flank_side(
    shell: &Shell,
    scratch: &ShellScratch,
    pt: Point3,
    flank: Vector3,
    face_normal: Vector3,
) -> ShellClass {
    let dot = flank.dot(&face_normal);
    if dot.abs() < LENGTH_EPS {
        return classify_point_against(shell, scratch, pt + flank);
    }
    if dot < 0.0 {
        ShellClass::Inside
    } else {
        ShellClass::Outside
    }
}

/// Collects the outward normals of every face containing `pt` (closest
/// point within `LENGTH_EPS`, not outside the trim region). Returns
/// `None` when no face contains the point.
fn faces_containing(shell: &Shell, scratch: &ShellScratch, pt: Point3) -> Option<Vec<Vector3>> {
    let mut normals = Vec::new();
    for (face_id, face) in shell.faces() {
        let (uv, converged) = face.surface.closest_point_to(pt, None);
        if !converged {
            continue;
        }
        if (face.surface.point_at_uv(uv) - pt).norm() >= LENGTH_EPS {
            continue;
        }
        let class = scratch.bsp(face_id).map_or(BspClass::Outside, |bsp| {
            bsp.classify_point(uv, uv + nalgebra::Vector2::new(1.0, 0.0), &face.surface)
        });
        if class == BspClass::Outside {
            continue;
        }
        normals.push(face.surface.normal_at(uv.x, uv.y));
    }
    if normals.is_empty() {
        None
    } else {
        Some(normals)
    }
}

/// Ray directions tried in order; the skewed ones break ties when an
/// axis-aligned ray grazes an axis-aligned model.
const RAY_DIRECTIONS: [[f64; 3]; 5] = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.7236, 0.5721, 0.3862],
    [-0.2672, 0.8018, 0.5345],
];

enum RayCast {
    Clear(ShellClass),
    Degenerate,
}

/// Classifies a point strictly off the shell's faces by ray casting:
/// odd crossings mean inside. Degenerate rays (grazing a face or
/// passing near a trim edge) are retried with another direction.
pub(crate) fn classify_point_against(
    shell: &Shell,
    scratch: &ShellScratch,
    pt: Point3,
) -> ShellClass {
    for dir in RAY_DIRECTIONS {
        let dir = Vector3::new(dir[0], dir[1], dir[2]);
        if let RayCast::Clear(class) = cast_ray(shell, scratch, pt, dir) {
            return class;
        }
    }
    // Every direction grazed something; the tolerance logic upstream
    // absorbs the ambiguity.
    log::debug!("all ray casts degenerate at {pt:?}; classifying as outside");
    ShellClass::Outside
}

fn cast_ray(shell: &Shell, scratch: &ShellScratch, pt: Point3, dir: Vector3) -> RayCast {
    let mut crossings = 0u32;

    for (face_id, face) in shell.faces() {
        if let Some((p0, n)) = face.surface.as_plane() {
            if n.dot(&dir).abs() < 1e-9 && n.dot(&(pt - p0)).abs() < LENGTH_EPS {
                // Ray lies in the face plane.
                return RayCast::Degenerate;
            }
        }
        for (t, uv, tangent) in line_surface_hits(&face.surface, pt, dir) {
            if t < LENGTH_EPS {
                continue;
            }
            if tangent {
                return RayCast::Degenerate;
            }
            let class = scratch.bsp(face_id).map_or(BspClass::Outside, |bsp| {
                bsp.classify_point(uv, uv + nalgebra::Vector2::new(1.0, 0.0), &face.surface)
            });
            match class {
                BspClass::Inside => crossings += 1,
                BspClass::Outside => {}
                // On or near a trim edge: the crossing parity is unreliable.
                _ => return RayCast::Degenerate,
            }
        }
    }

    if crossings % 2 == 1 {
        RayCast::Clear(ShellClass::Inside)
    } else {
        RayCast::Clear(ShellClass::Outside)
    }
}
