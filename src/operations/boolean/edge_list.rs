use crate::math::{Point3, LENGTH_EPS};
use crate::topology::CurveId;

/// Coincidence test used throughout polygon reassembly.
#[must_use]
pub fn points_equal(a: Point3, b: Point3) -> bool {
    (a - b).norm() < LENGTH_EPS
}

/// A directed edge in a scratch edge list.
///
/// Endpoints are either xyz points or (u, v) parameters stored in x and
/// y with z = 0, depending on which list the edge belongs to. The curve
/// handle and direction flag ride along through every polygon operation
/// so trim records can be reassembled at the end.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub a: Point3,
    pub b: Point3,
    /// Handle of the curve this edge approximates.
    pub curve: CurveId,
    /// Traversal direction of that curve along this edge.
    pub backwards: bool,
}

/// A scratch list of directed edges, scoped to one Boolean invocation.
#[derive(Debug, Default)]
pub struct EdgeList {
    pub edges: Vec<Edge>,
}

impl EdgeList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an edge.
    pub fn add_edge(&mut self, a: Point3, b: Point3, curve: CurveId, backwards: bool) {
        self.edges.push(Edge {
            a,
            b,
            curve,
            backwards,
        });
    }

    /// True if the list has no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Removes duplicate edges (keeping one of each pair) and
    /// anti-parallel edge pairs (removing both).
    ///
    /// Duplicates arise when both faces of a shared shell edge generate
    /// coincident intersection edges; anti-parallel pairs are zero-area
    /// artifacts that would otherwise break polygon assembly.
    pub fn cull_extraneous_edges(&mut self) {
        let n = self.edges.len();
        let mut dead = vec![false; n];
        for i in 0..n {
            if dead[i] {
                continue;
            }
            for j in (i + 1)..n {
                if dead[j] {
                    continue;
                }
                let (ei, ej) = (&self.edges[i], &self.edges[j]);
                if points_equal(ei.a, ej.a) && points_equal(ei.b, ej.b) {
                    dead[j] = true;
                } else if points_equal(ei.a, ej.b) && points_equal(ei.b, ej.a) {
                    dead[i] = true;
                    dead[j] = true;
                    break;
                }
            }
        }
        let mut keep = dead.iter().map(|d| !d);
        self.edges.retain(|_| keep.next().unwrap_or(true));
    }

    /// Attempts to chain every edge into closed loops, following each
    /// edge in its stored direction.
    ///
    /// Returns `true` when all edges are consumed by closed loops;
    /// `false` leaves the caller to record diagnostics. An empty list
    /// assembles trivially.
    #[must_use]
    pub fn assemble_polygon(&self) -> bool {
        let n = self.edges.len();
        let mut used = vec![false; n];
        let mut remaining = n;

        while remaining > 0 {
            let start = match used.iter().position(|u| !u) {
                Some(i) => i,
                None => break,
            };
            used[start] = true;
            remaining -= 1;
            let loop_start = self.edges[start].a;
            let mut cursor = self.edges[start].b;

            loop {
                if points_equal(cursor, loop_start) {
                    break;
                }
                let next = (0..n)
                    .find(|&i| !used[i] && points_equal(self.edges[i].a, cursor));
                match next {
                    Some(i) => {
                        used[i] = true;
                        remaining -= 1;
                        cursor = self.edges[i].b;
                    }
                    None => return false,
                }
            }
        }
        true
    }
}

/// A point list with touch multiplicity, used to find "choosing"
/// vertices: points where the trim/intersection edge graph does not meet
/// in exactly two edges.
#[derive(Debug, Default)]
pub struct PointTally {
    entries: Vec<(Point3, u32)>,
}

impl PointTally {
    /// Creates an empty tally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one edge endpoint touching `p`.
    pub fn increment_for(&mut self, p: Point3) {
        for (q, count) in &mut self.entries {
            if points_equal(*q, p) {
                *count += 1;
                return;
            }
        }
        self.entries.push((p, 1));
    }

    /// Keeps only points whose multiplicity differs from two.
    ///
    /// A point touched by exactly two edges is an unambiguous chain
    /// interior; everything else (junctions, and dangling ends in
    /// malformed input) must terminate chains.
    pub fn retain_choosing(&mut self) {
        self.entries.retain(|&(_, count)| count != 2);
    }

    /// True if `p` is in the tally.
    #[must_use]
    pub fn contains(&self, p: Point3) -> bool {
        self.entries.iter().any(|&(q, _)| points_equal(q, p))
    }

    /// Number of recorded points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no points are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn square_list() -> EdgeList {
        let mut el = EdgeList::new();
        let c = CurveId::default();
        el.add_edge(p(0.0, 0.0), p(1.0, 0.0), c, false);
        el.add_edge(p(1.0, 0.0), p(1.0, 1.0), c, false);
        el.add_edge(p(1.0, 1.0), p(0.0, 1.0), c, false);
        el.add_edge(p(0.0, 1.0), p(0.0, 0.0), c, false);
        el
    }

    #[test]
    fn square_assembles() {
        assert!(square_list().assemble_polygon());
    }

    #[test]
    fn open_chain_fails_to_assemble() {
        let mut el = square_list();
        el.edges.pop();
        assert!(!el.assemble_polygon());
    }

    #[test]
    fn two_disjoint_loops_assemble() {
        let mut el = square_list();
        let c = CurveId::default();
        el.add_edge(p(5.0, 5.0), p(6.0, 5.0), c, false);
        el.add_edge(p(6.0, 5.0), p(6.0, 6.0), c, false);
        el.add_edge(p(6.0, 6.0), p(5.0, 5.0), c, false);
        assert!(el.assemble_polygon());
    }

    #[test]
    fn cull_removes_duplicates_keeping_one() {
        let mut el = EdgeList::new();
        let c = CurveId::default();
        el.add_edge(p(0.0, 0.0), p(1.0, 0.0), c, false);
        el.add_edge(p(0.0, 0.0), p(1.0, 0.0), c, false);
        el.cull_extraneous_edges();
        assert_eq!(el.len(), 1);
    }

    #[test]
    fn cull_removes_antiparallel_pairs_entirely() {
        let mut el = EdgeList::new();
        let c = CurveId::default();
        el.add_edge(p(0.0, 0.0), p(1.0, 0.0), c, false);
        el.add_edge(p(1.0, 0.0), p(0.0, 0.0), c, false);
        el.add_edge(p(2.0, 0.0), p(3.0, 0.0), c, false);
        el.cull_extraneous_edges();
        assert_eq!(el.len(), 1);
        assert!(points_equal(el.edges[0].a, p(2.0, 0.0)));
    }

    #[test]
    fn tally_keeps_junctions_and_drops_plain_joints() {
        let mut tally = PointTally::new();
        // A point touched twice (plain joint) and one touched three times.
        tally.increment_for(p(0.0, 0.0));
        tally.increment_for(p(0.0, 0.0));
        tally.increment_for(p(1.0, 0.0));
        tally.increment_for(p(1.0, 0.0));
        tally.increment_for(p(1.0, 0.0));
        tally.retain_choosing();
        assert!(!tally.contains(p(0.0, 0.0)));
        assert!(tally.contains(p(1.0, 0.0)));
    }
}
