use std::collections::VecDeque;

use super::edge_list::{points_equal, EdgeList, PointTally};

/// Extracts one maximal edge chain from `src` such that no point in
/// `avoid` ever occurs in the interior of the chain, and removes the
/// chain's edges from `src`.
///
/// At a point not in `avoid` exactly two edges meet, so the chain is
/// unambiguous and all of its edges share one classification; the face
/// trimmer classifies a single representative for the whole chain.
///
/// # Panics
///
/// Panics if `src` is empty; callers loop until the source is drained.
pub fn find_chain_avoiding(src: &mut EdgeList, avoid: &PointTally) -> EdgeList {
    assert!(!src.is_empty(), "need at least one edge");

    let mut used = vec![false; src.len()];
    let mut chain: VecDeque<usize> = VecDeque::new();
    chain.push_back(0);
    used[0] = true;

    let mut start = src.edges[0].a;
    let mut finish = src.edges[0].b;
    let mut start_okay = !avoid.contains(start);
    let mut finish_okay = !avoid.contains(finish);

    loop {
        let mut added = false;
        for i in 0..src.len() {
            if used[i] {
                continue;
            }
            let e = &src.edges[i];
            if start_okay && points_equal(start, e.b) {
                chain.push_front(i);
                used[i] = true;
                start = e.a;
                start_okay = !avoid.contains(start);
                added = true;
            } else if finish_okay && points_equal(finish, e.a) {
                chain.push_back(i);
                used[i] = true;
                finish = e.b;
                finish_okay = !avoid.contains(finish);
                added = true;
            }
        }
        if !added {
            break;
        }
    }

    let mut dest = EdgeList::new();
    for &i in &chain {
        dest.edges.push(src.edges[i]);
    }
    let mut keep = used.iter().map(|u| !u);
    src.edges.retain(|_| keep.next().unwrap_or(true));
    dest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::topology::CurveId;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn list_of(segs: &[((f64, f64), (f64, f64))]) -> EdgeList {
        let mut el = EdgeList::new();
        for &((ax, ay), (bx, by)) in segs {
            el.add_edge(p(ax, ay), p(bx, by), CurveId::default(), false);
        }
        el
    }

    #[test]
    fn whole_loop_comes_out_as_one_chain() {
        let mut src = list_of(&[
            ((0.0, 0.0), (1.0, 0.0)),
            ((1.0, 0.0), (1.0, 1.0)),
            ((1.0, 1.0), (0.0, 1.0)),
            ((0.0, 1.0), (0.0, 0.0)),
        ]);
        let chain = find_chain_avoiding(&mut src, &PointTally::new());
        assert_eq!(chain.len(), 4);
        assert!(src.is_empty());
    }

    #[test]
    fn chain_stops_at_choosing_point() {
        // Three edges in a row; the middle joint is a choosing point.
        let mut src = list_of(&[
            ((0.0, 0.0), (1.0, 0.0)),
            ((1.0, 0.0), (2.0, 0.0)),
            ((2.0, 0.0), (3.0, 0.0)),
        ]);
        let mut avoid = PointTally::new();
        avoid.increment_for(p(1.0, 0.0));

        let chain = find_chain_avoiding(&mut src, &avoid);
        // Started from the first edge: may not extend through (1, 0).
        assert_eq!(chain.len(), 1);
        assert_eq!(src.len(), 2);

        let chain2 = find_chain_avoiding(&mut src, &avoid);
        assert_eq!(chain2.len(), 2);
        assert!(src.is_empty());
    }

    #[test]
    fn chain_extends_backwards_too() {
        let mut src = list_of(&[
            ((1.0, 0.0), (2.0, 0.0)),
            ((0.0, 0.0), (1.0, 0.0)),
        ]);
        let chain = find_chain_avoiding(&mut src, &PointTally::new());
        assert_eq!(chain.len(), 2);
        assert!(points_equal(chain.edges[0].a, p(0.0, 0.0)));
        assert!(points_equal(chain.edges[1].b, p(2.0, 0.0)));
    }

    #[test]
    #[should_panic(expected = "need at least one edge")]
    fn empty_source_panics() {
        find_chain_avoiding(&mut EdgeList::new(), &PointTally::new());
    }
}
