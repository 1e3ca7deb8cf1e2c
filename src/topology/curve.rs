use crate::geometry::RationalBezier;
use crate::math::{Point3, LENGTH_EPS};

use super::face::FaceId;

slotmap::new_key_type! {
    /// Unique identifier for a curve within its owning shell.
    pub struct CurveId;
}

/// Which operand a curve in a Boolean result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveSource {
    /// Copied (and split) from operand A.
    A,
    /// Copied (and split) from operand B.
    B,
    /// Generated by face-pair intersection during the Boolean.
    Intersection,
}

/// One point of a curve's piecewise-linear approximation.
#[derive(Debug, Clone, Copy)]
pub struct CurvePoint {
    pub point: Point3,
    /// True if this is a topological vertex (an endpoint, or a split
    /// introduced where the curve crosses the other shell).
    pub vertex: bool,
}

impl CurvePoint {
    #[must_use]
    pub fn new(point: Point3, vertex: bool) -> Self {
        Self { point, vertex }
    }
}

/// A boundary curve: a piecewise-linear point list refined to chord
/// tolerance, optionally backed by an exact rational representation.
///
/// Invariant: every interior point lies (to chord tolerance) on both
/// faces named by `surf_a` and `surf_b`; the first and last points are
/// topological vertices.
#[derive(Debug, Clone)]
pub struct Curve {
    /// Piecewise-linear approximation, in traversal order.
    pub pts: Vec<CurvePoint>,
    /// Exact representation, when one exists.
    pub exact: Option<RationalBezier>,
    /// First face this curve trims. For `source == Intersection` this is
    /// a face of operand A; otherwise a face of the source operand.
    pub surf_a: FaceId,
    /// Second face this curve trims. For `source == Intersection` this
    /// is a face of operand B; otherwise a face of the source operand.
    pub surf_b: FaceId,
    /// Provenance of the curve within a Boolean.
    pub source: CurveSource,
}

impl Curve {
    /// Drops interior piecewise-linear segments shorter than
    /// `LENGTH_EPS`, keeping endpoints and preferring to keep marked
    /// vertices. Prevents zero-area trim artifacts after splitting.
    pub fn remove_short_segments(&mut self) {
        if self.pts.len() <= 2 {
            return;
        }
        let mut kept: Vec<CurvePoint> = Vec::with_capacity(self.pts.len());
        let mut tail = self.pts[0];
        for i in 1..self.pts.len() - 1 {
            let cur = self.pts[i];
            if (cur.point - tail.point).norm() < LENGTH_EPS {
                // Collapse, but never lose a vertex marker.
                tail.vertex = tail.vertex || cur.vertex;
                continue;
            }
            kept.push(tail);
            tail = cur;
        }
        let finish = self.pts[self.pts.len() - 1];
        if kept.is_empty() || (finish.point - tail.point).norm() >= LENGTH_EPS {
            kept.push(tail);
        }
        kept.push(finish);
        self.pts = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cp(x: f64, y: f64, z: f64, vertex: bool) -> CurvePoint {
        CurvePoint::new(Point3::new(x, y, z), vertex)
    }

    fn curve_of(pts: Vec<CurvePoint>) -> Curve {
        Curve {
            pts,
            exact: None,
            surf_a: FaceId::default(),
            surf_b: FaceId::default(),
            source: CurveSource::A,
        }
    }

    #[test]
    fn short_interior_segment_is_collapsed() {
        let mut c = curve_of(vec![
            cp(0.0, 0.0, 0.0, true),
            cp(0.5, 0.0, 0.0, false),
            cp(0.5 + 1e-9, 0.0, 0.0, false),
            cp(1.0, 0.0, 0.0, true),
        ]);
        c.remove_short_segments();
        assert_eq!(c.pts.len(), 3);
    }

    #[test]
    fn vertex_marker_survives_collapse() {
        let mut c = curve_of(vec![
            cp(0.0, 0.0, 0.0, true),
            cp(0.5, 0.0, 0.0, false),
            cp(0.5 + 1e-9, 0.0, 0.0, true),
            cp(1.0, 0.0, 0.0, true),
        ]);
        c.remove_short_segments();
        assert_eq!(c.pts.len(), 3);
        assert!(c.pts[1].vertex);
    }

    #[test]
    fn endpoints_always_survive() {
        let mut c = curve_of(vec![
            cp(0.0, 0.0, 0.0, true),
            cp(1e-9, 0.0, 0.0, false),
            cp(1.0, 0.0, 0.0, true),
        ]);
        c.remove_short_segments();
        assert_eq!(c.pts.len(), 2);
        assert!((c.pts[1].point.x - 1.0).abs() < 1e-12);
    }
}
