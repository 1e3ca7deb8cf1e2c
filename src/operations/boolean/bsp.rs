use crate::geometry::RationalSurface;
use crate::math::{Point2, LENGTH_EPS, VERY_POSITIVE};

use super::edge_list::EdgeList;

/// Classification of a parameter-space point or edge against a face's
/// original trim region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BspClass {
    /// Strictly within the trim region.
    Inside,
    /// Strictly outside the trim region.
    Outside,
    /// On a trim edge, running the same direction.
    EdgeParallel,
    /// On a trim edge, running the opposite direction.
    EdgeAntiparallel,
    /// On a trim edge, crossing it.
    EdgeOther,
}

#[derive(Debug)]
struct BspNode {
    a: Point2,
    b: Point2,
    pos: Option<usize>,
    neg: Option<usize>,
    more: Option<usize>,
}

/// A binary space partition over a face's (u, v) parameter plane, built
/// from the face's trim edges.
///
/// All distance and side tests scale parameter coordinates by the
/// surface tangent magnitudes at the query point, so tolerances keep
/// their xyz meaning (`LENGTH_EPS`) even where the parametrization is
/// stretched. Nodes live in an arena owned by the value and are freed
/// together when the Boolean's scratch is dropped.
#[derive(Debug, Default)]
pub struct UvBsp {
    nodes: Vec<BspNode>,
    root: Option<usize>,
}

fn scale_at(srf: &RationalSurface, at: Point2) -> (f64, f64) {
    let (tu, tv) = srf.tangents_at(at.x, at.y);
    (tu.norm(), tv.norm())
}

fn scaled(p: Point2, mu: f64, mv: f64) -> Point2 {
    Point2::new(p.x * mu, p.y * mv)
}

/// Signed distance of `pt` to the line through `a`, `b`, measured in the
/// locally linearized metric at `pt`.
fn scaled_signed_distance(pt: Point2, a: Point2, b: Point2, srf: &RationalSurface) -> f64 {
    let (mu, mv) = scale_at(srf, pt);
    let pt = scaled(pt, mu, mv);
    let a = scaled(a, mu, mv);
    let b = scaled(b, mu, mv);

    let d = b - a;
    let len = d.norm();
    if len < f64::MIN_POSITIVE.sqrt() {
        return (pt - a).norm();
    }
    // Left-hand normal: the interior of a counter-clockwise trim loop
    // is the positive half-plane of every edge.
    let n = nalgebra::Vector2::new(-d.y, d.x) / len;
    n.dot(&(pt - a))
}

/// Distance of `pt` to the segment (or infinite line) through `a`, `b`,
/// in the locally linearized metric at `pt`.
fn scaled_distance(pt: Point2, a: Point2, b: Point2, as_segment: bool, srf: &RationalSurface) -> f64 {
    let (mu, mv) = scale_at(srf, pt);
    let pt = scaled(pt, mu, mv);
    let a = scaled(a, mu, mv);
    let b = scaled(b, mu, mv);

    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq < f64::MIN_POSITIVE {
        return (pt - a).norm();
    }
    let t = (pt - a).dot(&d) / len_sq;
    let t = if as_segment { t.clamp(0.0, 1.0) } else { t };
    let foot = a + d * t;
    (pt - foot).norm()
}

impl UvBsp {
    /// Builds a BSP from a uv edge list.
    ///
    /// Edges are inserted longest-first (xyz length of the spanned
    /// surface chord), which keeps the split-plane normals numerically
    /// stable.
    #[must_use]
    pub fn build(el: &EdgeList, srf: &RationalSurface) -> Self {
        let mut work: Vec<(Point2, Point2)> = el
            .edges
            .iter()
            .map(|e| (e.a.xy(), e.b.xy()))
            .collect();
        work.sort_by(|x, y| {
            let lx = (srf.point_at_uv(x.0) - srf.point_at_uv(x.1)).norm();
            let ly = (srf.point_at_uv(y.0) - srf.point_at_uv(y.1)).norm();
            ly.partial_cmp(&lx).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut bsp = Self::default();
        for (a, b) in work {
            bsp.insert_edge(a, b, srf);
        }
        bsp
    }

    fn alloc(&mut self, a: Point2, b: Point2) -> usize {
        self.nodes.push(BspNode {
            a,
            b,
            pos: None,
            neg: None,
            more: None,
        });
        self.nodes.len() - 1
    }

    fn insert_edge(&mut self, ea: Point2, eb: Point2, srf: &RationalSurface) {
        match self.root {
            None => self.root = Some(self.alloc(ea, eb)),
            Some(root) => self.insert_at(root, ea, eb, srf),
        }
    }

    fn insert_into_child(
        &mut self,
        node: usize,
        positive: bool,
        ea: Point2,
        eb: Point2,
        srf: &RationalSurface,
    ) {
        let child = if positive {
            self.nodes[node].pos
        } else {
            self.nodes[node].neg
        };
        match child {
            Some(c) => self.insert_at(c, ea, eb, srf),
            None => {
                let c = self.alloc(ea, eb);
                if positive {
                    self.nodes[node].pos = Some(c);
                } else {
                    self.nodes[node].neg = Some(c);
                }
            }
        }
    }

    fn insert_at(&mut self, node: usize, ea: Point2, eb: Point2, srf: &RationalSurface) {
        let (a, b) = (self.nodes[node].a, self.nodes[node].b);
        let dea = scaled_signed_distance(ea, a, b, srf);
        let deb = scaled_signed_distance(eb, a, b, srf);

        if dea.abs() < LENGTH_EPS && deb.abs() < LENGTH_EPS {
            // Coincident with this node's line; store in the same node.
            let m = self.alloc(ea, eb);
            self.nodes[m].more = self.nodes[node].more;
            self.nodes[node].more = Some(m);
        } else if dea.abs() < LENGTH_EPS {
            self.insert_into_child(node, deb > 0.0, ea, eb, srf);
        } else if deb.abs() < LENGTH_EPS {
            self.insert_into_child(node, dea > 0.0, ea, eb, srf);
        } else if dea > 0.0 && deb > 0.0 {
            self.insert_into_child(node, true, ea, eb, srf);
        } else if dea < 0.0 && deb < 0.0 {
            self.insert_into_child(node, false, ea, eb, srf);
        } else {
            // The new edge crosses this node's line; split it there.
            let t = dea / (dea - deb);
            let pi = ea + (eb - ea) * t;
            self.insert_into_child(node, dea > 0.0, ea, pi, srf);
            self.insert_into_child(node, deb > 0.0, pi, eb, srf);
        }
    }

    /// Classifies a parameter-space point against the trim region.
    ///
    /// `hint_partner` is a second point (normally the far end of the
    /// edge being classified) that disambiguates direction when `p` lies
    /// on a trim edge.
    #[must_use]
    pub fn classify_point(&self, p: Point2, hint_partner: Point2, srf: &RationalSurface) -> BspClass {
        match self.root {
            Some(root) => self.classify_at(root, p, hint_partner, srf),
            None => BspClass::Outside,
        }
    }

    fn classify_at(
        &self,
        node: usize,
        p: Point2,
        hint: Point2,
        srf: &RationalSurface,
    ) -> BspClass {
        let n = &self.nodes[node];
        let dp = scaled_signed_distance(p, n.a, n.b, srf);

        if dp.abs() < LENGTH_EPS {
            // On this node's line; find which coincident segment (if
            // any) actually contains the point.
            let mut cursor = Some(node);
            while let Some(f) = cursor {
                let fa = self.nodes[f].a;
                let fb = self.nodes[f].b;
                if scaled_distance(p, fa, fb, true, srf) < LENGTH_EPS {
                    if scaled_distance(hint, fa, fb, false, srf) < LENGTH_EPS {
                        let ba = fb - fa;
                        return if ba.dot(&(hint - p)) > 0.0 {
                            BspClass::EdgeParallel
                        } else {
                            BspClass::EdgeAntiparallel
                        };
                    }
                    return BspClass::EdgeOther;
                }
                cursor = self.nodes[f].more;
            }
            // On the line but on none of its segments; either side
            // should agree, so send it down both and compare.
            let c1 = n
                .neg
                .map_or(BspClass::Outside, |c| self.classify_at(c, p, hint, srf));
            let c2 = n
                .pos
                .map_or(BspClass::Inside, |c| self.classify_at(c, p, hint, srf));
            if c1 != c2 {
                log::debug!("uv-bsp on-line classification mismatch: {c1:?} vs {c2:?}");
            }
            return c1;
        }

        if dp > 0.0 {
            // Trim loops run counter-clockwise around the kept region,
            // so an exhausted positive branch is inside.
            n.pos
                .map_or(BspClass::Inside, |c| self.classify_at(c, p, hint, srf))
        } else {
            n.neg
                .map_or(BspClass::Outside, |c| self.classify_at(c, p, hint, srf))
        }
    }

    /// Classifies a uv edge by its midpoint, retrying off-center when
    /// the midpoint lands tangentially on an unsplit crossing.
    #[must_use]
    pub fn classify_edge(&self, ea: Point2, eb: Point2, srf: &RationalSurface) -> BspClass {
        let mid = nalgebra::center(&ea, &eb);
        let ret = self.classify_point(mid, eb, srf);
        if ret == BspClass::EdgeOther {
            return self.classify_point(ea + (eb - ea) * 0.294, eb, srf);
        }
        ret
    }

    /// Minimum scaled distance from `p` to any inserted trim segment.
    #[must_use]
    pub fn min_distance_to_edge(&self, p: Point2, srf: &RationalSurface) -> f64 {
        match self.root {
            Some(root) => self.min_distance_at(root, p, srf),
            None => VERY_POSITIVE,
        }
    }

    fn min_distance_at(&self, node: usize, p: Point2, srf: &RationalSurface) -> f64 {
        let n = &self.nodes[node];
        let mut d = scaled_distance(p, n.a, n.b, true, srf);
        if let Some(c) = n.neg {
            d = d.min(self.min_distance_at(c, p, srf));
        }
        if let Some(c) = n.pos {
            d = d.min(self.min_distance_at(c, p, srf));
        }
        if let Some(c) = n.more {
            d = d.min(self.min_distance_at(c, p, srf));
        }
        d
    }
}
