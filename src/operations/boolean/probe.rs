use crate::geometry::RationalSurface;
use crate::math::{Point2, Point3, Vector3, LENGTH_EPS};
use crate::topology::{Curve, Shell};

/// Output of the edge-normal probe: a midpoint that lies on the true
/// curve, the face normal there, and the in-surface offsets to a point
/// just inside and just outside the edge.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EdgeProbe {
    /// Refined edge midpoint, on the true curve.
    pub pt: Point3,
    /// Offset from `pt` to a surface point on the edge's inner flank.
    pub enin: Vector3,
    /// Offset from `pt` to a surface point on the edge's outer flank.
    pub enout: Vector3,
    /// Surface normal at the midpoint.
    pub surfn: Vector3,
}

/// Probes a uv edge on `srf` that approximates `curve`.
///
/// The uv midpoint is first pushed onto the true curve — via the exact
/// representation when one of degree > 1 exists, else via the
/// intersection of the two faces the curve trims — so that point-on-face
/// tests against the other shell see a point genuinely on it. The flank
/// offsets are scaled to the chord tolerance and need not be
/// antiparallel on a curved face.
pub(crate) fn edge_normals_within_surface(
    srf: &RationalSurface,
    auv: Point2,
    buv: Point2,
    curve: &Curve,
    sha: &Shell,
    shb: &Shell,
    chord: f64,
) -> EdgeProbe {
    let mut muv = nalgebra::center(&auv, &buv);
    let mut pt = srf.point_at_uv(muv);

    match &curve.exact {
        Some(exact) if exact.degree() > 1 => {
            let (t, _) = exact.closest_point_to(pt);
            pt = exact.point_at(t);
            let (uv, _) = srf.closest_point_to(pt, Some(muv));
            muv = uv;
        }
        Some(_) => {
            // Degree-1 exact curves are straight; the chord midpoint
            // already lies on them.
        }
        None => {
            let trimmed_a = Shell::surface_a_owner(curve, sha, shb).face(curve.surf_a);
            let trimmed_b = Shell::surface_b_owner(curve, sha, shb).face(curve.surf_b);
            if let (Ok(fa), Ok(fb)) = (trimmed_a, trimmed_b) {
                pt = fa.surface.closest_point_on_both(&fb.surface, pt);
                let (uv, _) = srf.closest_point_to(pt, Some(muv));
                muv = uv;
            }
        }
    }

    let surfn = srf.normal_at(muv.x, muv.y);

    // The edge's inner normal in xyz, then converted to uv. The uv
    // offset is perpendicular to the edge in xyz, not necessarily in uv.
    let ab = srf.point_at_uv(auv) - srf.point_at_uv(buv);
    let cross = ab.cross(&surfn);
    let cross_len = cross.norm();
    let enxyz = if cross_len < LENGTH_EPS * LENGTH_EPS {
        Vector3::zeros()
    } else {
        cross * (chord / cross_len)
    };

    let (tu, tv) = srf.tangents_at(muv.x, muv.y);
    let enuv = nalgebra::Vector2::new(
        enxyz.dot(&tu) / tu.norm_squared(),
        enxyz.dot(&tv) / tv.norm_squared(),
    );

    let pin = srf.point_at_uv(muv - enuv);
    let pout = srf.point_at_uv(muv + enuv);
    EdgeProbe {
        pt,
        enin: pin - pt,
        enout: pout - pt,
        surfn,
    }
}
