use std::collections::HashMap;

use crate::geometry::RationalSurface;
use crate::math::{Point3, Tolerances};
use crate::operations::query::classify_edge::classify_edge_against;
use crate::topology::{CurveId, CurveSource, Face, FaceId, Shell, TrimBy};

use super::bsp::{BspClass, UvBsp};
use super::chain::find_chain_avoiding;
use super::edge_list::{points_equal, EdgeList, PointTally};
use super::face_edges::{make_face_edges, EdgeSpace, ShellScratch};
use super::probe::edge_normals_within_surface;
use super::select::{flanks_from_bsp_class, keep_edge, BooleanKind, ShellClass};

/// Result of trimming one face: the surviving face (when any boundary
/// survives) plus failure diagnostics for the driver to record.
pub(crate) struct TrimOutcome {
    pub face: Option<Face>,
    pub failed: bool,
    pub naked_edges: Vec<(Point3, Point3)>,
}

/// Everything a face-trimming pass needs besides the face itself.
pub(crate) struct TrimContext<'a> {
    /// The shell the face being trimmed belongs to.
    pub parent: &'a Shell,
    /// True when `parent` is operand A.
    pub op_a: bool,
    /// Operand A, for resolving curve face references.
    pub sha: &'a Shell,
    /// Operand B, likewise.
    pub shb: &'a Shell,
    /// Classifying scratch for the shell being trimmed against.
    pub agnst_scratch: &'a ShellScratch,
    /// The output shell (already holds all split and intersection curves).
    pub into: &'a Shell,
    /// Redirection from `parent`'s curve handles to `into`'s.
    pub curve_map: &'a HashMap<CurveId, CurveId>,
    pub kind: BooleanKind,
    pub tol: &'a Tolerances,
}

/// Trims one face against the opposite shell, in the way appropriate
/// for the Boolean kind and operand, and reassembles its trim records
/// from the surviving edges.
pub(crate) fn make_copy_trim_against(face_id: FaceId, ctx: &TrimContext) -> TrimOutcome {
    let agnst = if ctx.op_a { ctx.shb } else { ctx.sha };

    let Ok(face) = ctx.parent.face(face_id) else {
        return TrimOutcome {
            face: None,
            failed: true,
            naked_edges: Vec::new(),
        };
    };

    // The output face is identical, only the trim records change. The
    // originals are rewritten to reference the split curves.
    let mut ret = Face::new(face.surface.clone());
    for trim in &face.trims {
        let Some(&mapped) = ctx.curve_map.get(&trim.curve) else {
            continue;
        };
        ret.trims.push(TrimBy {
            curve: mapped,
            start: trim.start,
            finish: trim.finish,
            backwards: trim.backwards,
        });
    }

    if ctx.kind == BooleanKind::Difference && !ctx.op_a {
        // The second operand of a difference is turned inside out: flip
        // the parametrization and re-run the boundary the other way so
        // the loops stay counter-clockwise around the region.
        ret.surface.reverse();
        ret.trims.reverse();
        for trim in &mut ret.trims {
            std::mem::swap(&mut trim.start, &mut trim.finish);
            trim.backwards = !trim.backwards;
        }
    }

    // The original trim polygon, in the (possibly flipped) uv, from the
    // split curves. The old classifying BSP cannot be reused for it.
    let mut orig = make_face_edges(&ret, ctx.into, None, EdgeSpace::Uv);
    ret.trims.clear();
    let orig_bsp = UvBsp::build(&orig, &ret.surface);

    let mut inter = build_intersection_edges(face_id, &ret.surface, agnst, ctx);

    // Points where more than two edges meet ("choosing" points): two
    // edges joining anywhere else must be kept or discarded together,
    // or the result would have an open contour.
    let mut choosing = PointTally::new();
    for e in orig.edges.iter().chain(inter.edges.iter()) {
        choosing.increment_for(e.a);
        choosing.increment_for(e.b);
    }
    choosing.retain_choosing();

    let mut final_edges = EdgeList::new();

    while !orig.is_empty() {
        let chain = find_chain_avoiding(&mut orig, &choosing);
        // Any edge in the chain classifies like the rest of it; take one
        // from the middle.
        let se = chain.edges[chain.len() / 2];

        let (indir_shell, outdir_shell) = classify_representative(&ret.surface, &se, agnst, ctx);
        let (indir_orig, outdir_orig) = (ShellClass::Inside, ShellClass::Outside);

        if keep_edge(
            ctx.kind,
            ctx.op_a,
            indir_shell,
            outdir_shell,
            indir_orig,
            outdir_orig,
        ) {
            for e in &chain.edges {
                final_edges.add_edge(e.a, e.b, e.curve, e.backwards);
            }
        }
    }

    while !inter.is_empty() {
        let chain = find_chain_avoiding(&mut inter, &choosing);
        let se = chain.edges[chain.len() / 2];

        let (indir_shell, outdir_shell) = classify_representative(&ret.surface, &se, agnst, ctx);
        let bsp_class = orig_bsp.classify_edge(se.a.xy(), se.b.xy(), &ret.surface);
        let (indir_orig, outdir_orig) = flanks_from_bsp_class(bsp_class);

        if keep_edge(
            ctx.kind,
            ctx.op_a,
            indir_shell,
            outdir_shell,
            indir_orig,
            outdir_orig,
        ) {
            for e in &chain.edges {
                final_edges.add_edge(e.a, e.b, e.curve, e.backwards);
            }
        }
    }

    // Coincident shell contact generates the same edge from both sides;
    // duplicates and anti-parallel pairs separate nothing.
    final_edges.cull_extraneous_edges();

    ret.trims = trims_from_edge_list(&ret.surface, &final_edges);

    let mut failed = false;
    let mut naked_edges = Vec::new();
    if !final_edges.assemble_polygon() {
        failed = true;
        for e in &final_edges.edges {
            naked_edges.push((
                ret.surface.point_at(e.a.x, e.a.y),
                ret.surface.point_at(e.b.x, e.b.y),
            ));
        }
    }

    TrimOutcome {
        face: if final_edges.is_empty() { None } else { Some(ret) },
        failed,
        naked_edges,
    }
}

/// Builds the edges the opposite shell's intersection curves contribute
/// to this face, oriented so the region they keep lies on their left.
fn build_intersection_edges(
    face_id: FaceId,
    surface: &RationalSurface,
    agnst: &Shell,
    ctx: &TrimContext,
) -> EdgeList {
    let mut inter = EdgeList::new();

    for (gs_id, gs) in agnst.faces() {
        for (cid, sc) in ctx.into.curves() {
            if sc.source != CurveSource::Intersection {
                continue;
            }
            let ours = if ctx.op_a {
                sc.surf_a == face_id && sc.surf_b == gs_id
            } else {
                sc.surf_b == face_id && sc.surf_a == gs_id
            };
            if !ours {
                continue;
            }

            let mut g_hint = None;
            let mut t_hint = None;
            for w in sc.pts.windows(2) {
                let (a, b) = (w[0].point, w[1].point);

                let (auv, _) = gs.surface.closest_point_to(a, g_hint);
                let (buv, _) = gs.surface.closest_point_to(b, Some(auv));
                g_hint = Some(buv);

                let class = ctx
                    .agnst_scratch
                    .bsp(gs_id)
                    .map_or(BspClass::Outside, |bsp| {
                        bsp.classify_edge(auv, buv, &gs.surface)
                    });
                if class == BspClass::Outside {
                    continue;
                }

                let (ta, _) = surface.closest_point_to(a, t_hint);
                let (tb, _) = surface.closest_point_to(b, Some(ta));
                t_hint = Some(tb);

                let tn = surface.normal_at(ta.x, ta.y);
                let sn = gs.surface.normal_at(auv.x, auv.y);

                // Orient the edge so the material this operation keeps
                // lies on its left flank; the flip composition here and
                // in the keep table is load-bearing.
                let mut bkwds = true;
                if tn.cross(&(b - a)).dot(&sn) > 0.0 {
                    bkwds = !bkwds;
                }
                if ctx.kind == BooleanKind::Difference && !ctx.op_a {
                    bkwds = !bkwds;
                }
                let ta3 = Point3::new(ta.x, ta.y, 0.0);
                let tb3 = Point3::new(tb.x, tb.y, 0.0);
                if bkwds {
                    inter.add_edge(tb3, ta3, cid, true);
                } else {
                    inter.add_edge(ta3, tb3, cid, false);
                }
            }
        }
    }
    inter
}

/// Classifies one representative edge's flanks against the opposite
/// shell, via the edge-normal probe.
fn classify_representative(
    surface: &RationalSurface,
    se: &super::edge_list::Edge,
    agnst: &Shell,
    ctx: &TrimContext,
) -> (ShellClass, ShellClass) {
    let auv = se.a.xy();
    let buv = se.b.xy();

    let Ok(curve) = ctx.into.curve(se.curve) else {
        // An edge with no surviving curve record cannot be probed;
        // treat it as fully outside so it is dropped.
        return (ShellClass::Outside, ShellClass::Outside);
    };

    let probe = edge_normals_within_surface(
        surface,
        auv,
        buv,
        curve,
        ctx.sha,
        ctx.shb,
        ctx.tol.chord,
    );

    classify_edge_against(
        agnst,
        ctx.agnst_scratch,
        surface.point_at_uv(auv),
        surface.point_at_uv(buv),
        probe.pt,
        probe.enin,
        probe.enout,
        probe.surfn,
    )
}

/// Reassembles trim records from the final edge list, fusing adjoining
/// edges of the same curve and direction, and converting the uv
/// endpoints back to xyz.
fn trims_from_edge_list(surface: &RationalSurface, el: &EdgeList) -> Vec<TrimBy> {
    let n = el.edges.len();
    let mut used = vec![false; n];
    let mut trims = Vec::new();

    loop {
        let Some(seed) = (0..n).find(|&i| !used[i]) else {
            break;
        };
        used[seed] = true;
        let e = el.edges[seed];
        let mut start = e.a;
        let mut finish = e.b;

        let mut merged = true;
        while merged {
            merged = false;
            for i in 0..n {
                if used[i] {
                    continue;
                }
                let c = &el.edges[i];
                if c.curve != e.curve || c.backwards != e.backwards {
                    continue;
                }
                if points_equal(c.a, finish) {
                    finish = c.b;
                    used[i] = true;
                    merged = true;
                } else if points_equal(c.b, start) {
                    start = c.a;
                    used[i] = true;
                    merged = true;
                }
            }
        }

        trims.push(TrimBy {
            curve: e.curve,
            start: surface.point_at(start.x, start.y),
            finish: surface.point_at(finish.x, finish.y),
            backwards: e.backwards,
        });
    }
    trims
}
