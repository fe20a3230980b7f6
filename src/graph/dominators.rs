//! Dominator tree and retained sizes.
//!
//! Retained size of an object is the number of bytes the collector would free if
//! that object became unreachable: its own shallow size plus the shallow sizes of
//! everything reachable only through it. That is exactly the subtree weight of the
//! object in the dominator tree of the reachability graph, rooted at a virtual
//! super-root whose successors are the GC roots.
//!
//! Immediate dominators are computed with the iterative Cooper-Harvey-Kennedy
//! data-flow scheme over reverse postorder. It converges in a handful of passes on
//! the shallow, wide graphs heap dumps produce, needs only predecessor sets (served
//! by the CSR reverse index) plus one forward traversal for ordering, and uses two
//! flat vectors of state. Retained sizes then fall out of a single bottom-up
//! accumulation pass: children are visited before parents in reverse order of the
//! reverse postorder.
//!
//! The whole computation is performed once per dump and cached; unreachable
//! objects retain exactly their shallow size.

use crate::index::{HeapIndex, ReverseIndex};

/// Sentinel order/parent value for unreachable nodes.
const UNDEFINED: usize = usize::MAX;

/// The dominator tree of one dump's reachability graph, with retained sizes.
///
/// Nodes are dense object numbers; the virtual super-root is node `n` where `n` is
/// the object count.
#[derive(Debug)]
pub struct DominatorTree {
    /// Immediate dominator per node, `UNDEFINED` for unreachable nodes. The
    /// virtual root dominates itself.
    idom: Vec<usize>,
    /// Retained size per object in bytes.
    retained: Vec<u64>,
    /// Number of real (non-virtual) nodes.
    n: usize,
}

impl DominatorTree {
    /// Compute the tree for a fully built index.
    ///
    /// Outgoing references are decoded lazily during the single forward traversal
    /// that establishes reverse postorder; everything afterwards runs on the
    /// prebuilt reverse index.
    #[must_use]
    pub fn compute(index: &HeapIndex) -> Self {
        let n = index.objects().len();
        let succ = |dense: u32| -> Vec<u32> {
            let Some(object_id) = index.objects().id_of(dense) else {
                return Vec::new();
            };
            let targets = index.outgoing_targets(object_id, false).unwrap_or_default();
            targets
                .into_iter()
                .filter_map(|id| index.objects().dense_of(id))
                .collect()
        };

        let (idom, rpo) = compute_idoms(n, index.root_denses(), succ, index.reverse(), |d| {
            index.is_root(d)
        });
        let retained = accumulate_retained(n, &idom, &rpo, index.objects().shallow_sizes());

        Self { idom, retained, n }
    }

    /// Retained size of the object with this dense number.
    #[must_use]
    pub fn retained_of(&self, dense: u32) -> u64 {
        self.retained.get(dense as usize).copied().unwrap_or(0)
    }

    /// Immediate dominator of a reachable object, `None` for unreachable objects
    /// or objects dominated only by the virtual root.
    #[must_use]
    pub fn idom_of(&self, dense: u32) -> Option<u32> {
        let parent = *self.idom.get(dense as usize)?;
        if parent == UNDEFINED || parent == self.n {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        Some(parent as u32)
    }

    /// Returns `true` if the object is reachable from any GC root.
    #[must_use]
    pub fn is_reachable(&self, dense: u32) -> bool {
        self.idom
            .get(dense as usize)
            .is_some_and(|&parent| parent != UNDEFINED)
    }
}

/// Iterative immediate-dominator computation.
///
/// Returns per-node immediate dominators (virtual root = `n`) and the reverse
/// postorder of reachable real nodes, virtual root excluded.
fn compute_idoms<S, R>(
    n: usize,
    roots: &[u32],
    succ: S,
    preds: &ReverseIndex,
    is_root: R,
) -> (Vec<usize>, Vec<u32>)
where
    S: Fn(u32) -> Vec<u32>,
    R: Fn(u32) -> bool,
{
    let virtual_root = n;

    // One forward DFS from the virtual root establishes postorder.
    let mut visited = vec![false; n];
    let mut postorder: Vec<u32> = Vec::new();
    // Frame: (node, successors, next successor index).
    let mut stack: Vec<(u32, Vec<u32>, usize)> = Vec::new();
    for &root in roots {
        if visited[root as usize] {
            continue;
        }
        visited[root as usize] = true;
        stack.push((root, succ(root), 0));

        while let Some(frame) = stack.last_mut() {
            if frame.2 < frame.1.len() {
                let next = frame.1[frame.2];
                frame.2 += 1;
                if !visited[next as usize] {
                    visited[next as usize] = true;
                    stack.push((next, succ(next), 0));
                }
            } else {
                postorder.push(frame.0);
                stack.pop();
            }
        }
    }

    // Reverse postorder, and each node's position in it. The virtual root gets
    // position 0; reachable real nodes follow.
    let mut rpo: Vec<u32> = postorder;
    rpo.reverse();
    let mut order = vec![UNDEFINED; n + 1];
    order[virtual_root] = 0;
    for (i, &node) in rpo.iter().enumerate() {
        order[node as usize] = i + 1;
    }

    let mut idom = vec![UNDEFINED; n + 1];
    idom[virtual_root] = virtual_root;

    let intersect = |idom: &[usize], order: &[usize], mut a: usize, mut b: usize| -> usize {
        while a != b {
            while order[a] > order[b] {
                a = idom[a];
            }
            while order[b] > order[a] {
                b = idom[b];
            }
        }
        a
    };

    let mut changed = true;
    while changed {
        changed = false;
        for &node in &rpo {
            let d = node as usize;
            let mut new_idom = UNDEFINED;

            if is_root(node) {
                // The virtual root is always a processed predecessor of a GC root.
                new_idom = virtual_root;
            }
            for &pred in preds.incoming(node) {
                let p = pred as usize;
                if order[p] == UNDEFINED || idom[p] == UNDEFINED {
                    continue;
                }
                new_idom = if new_idom == UNDEFINED {
                    p
                } else {
                    intersect(&idom, &order, new_idom, p)
                };
            }

            if new_idom != UNDEFINED && idom[d] != new_idom {
                idom[d] = new_idom;
                changed = true;
            }
        }
    }

    (idom, rpo)
}

/// Bottom-up accumulation of retained sizes over the dominator tree.
fn accumulate_retained(n: usize, idom: &[usize], rpo: &[u32], shallow: &[u64]) -> Vec<u64> {
    // Every object retains at least itself; for unreachable objects that is the
    // final answer.
    let mut retained: Vec<u64> = shallow.to_vec();

    // Children precede parents when the reverse postorder is walked backwards.
    for &node in rpo.iter().rev() {
        let d = node as usize;
        let parent = idom[d];
        if parent != UNDEFINED && parent < n {
            retained[parent] += retained[d];
        }
    }

    retained
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble the reverse index a forward edge list implies.
    fn reverse_of(edges: &[(u32, u32)], n: usize) -> ReverseIndex {
        // Stored pairs are (to, from).
        let pairs: Vec<(u32, u32)> = edges.iter().map(|&(from, to)| (to, from)).collect();
        ReverseIndex::from_edges(pairs, n)
    }

    fn run(
        n: usize,
        roots: &[u32],
        edges: &[(u32, u32)],
        shallow: &[u64],
    ) -> (Vec<usize>, Vec<u64>) {
        let reverse = reverse_of(edges, n);
        let succ = |d: u32| -> Vec<u32> {
            edges
                .iter()
                .filter(|&&(from, _)| from == d)
                .map(|&(_, to)| to)
                .collect()
        };
        let roots_owned = roots.to_vec();
        let (idom, rpo) = compute_idoms(n, roots, succ, &reverse, |d| roots_owned.contains(&d));
        let retained = accumulate_retained(n, &idom, &rpo, shallow);
        (idom, retained)
    }

    #[test]
    fn chain_retains_transitively() {
        // 2 is the root: 2 -> 1 -> 0.
        let (idom, retained) = run(3, &[2], &[(2, 1), (1, 0)], &[10, 20, 30]);

        assert_eq!(idom[2], 3); // virtual root
        assert_eq!(idom[1], 2);
        assert_eq!(idom[0], 1);
        assert_eq!(retained, vec![10, 30, 60]);
    }

    #[test]
    fn diamond_is_dominated_by_the_fork() {
        // 0 -> 1, 0 -> 2, 1 -> 3, 2 -> 3: neither branch dominates the join.
        let (idom, retained) = run(4, &[0], &[(0, 1), (0, 2), (1, 3), (2, 3)], &[1, 1, 1, 1]);

        assert_eq!(idom[3], 0);
        assert_eq!(retained[1], 1);
        assert_eq!(retained[2], 1);
        assert_eq!(retained[0], 4);
    }

    #[test]
    fn exclusive_subtree_is_retained() {
        // 0 -> 1 -> 2, 1 -> 3: object 1 exclusively holds 2 and 3.
        let (idom, retained) = run(4, &[0], &[(0, 1), (1, 2), (1, 3)], &[8, 8, 8, 8]);

        assert_eq!(idom[2], 1);
        assert_eq!(idom[3], 1);
        assert_eq!(retained[1], 24);
        assert_eq!(retained[0], 32);
    }

    #[test]
    fn unreachable_objects_retain_their_shallow_size() {
        // Object 2 is disconnected.
        let (idom, retained) = run(3, &[0], &[(0, 1)], &[5, 6, 7]);

        assert_eq!(idom[2], UNDEFINED);
        assert_eq!(retained[2], 7);
        assert_eq!(retained[0], 11);
    }

    #[test]
    fn multiple_roots_share_the_virtual_root() {
        // Both roots reach object 2; neither dominates it alone.
        let (idom, retained) = run(3, &[0, 1], &[(0, 2), (1, 2)], &[1, 1, 1]);

        assert_eq!(idom[0], 3);
        assert_eq!(idom[1], 3);
        assert_eq!(idom[2], 3);
        assert_eq!(retained[0], 1);
        assert_eq!(retained[1], 1);
        assert_eq!(retained[2], 1);
    }

    #[test]
    fn cycle_hanging_off_a_root() {
        // 0 -> 1 <-> 2: the cycle is exclusively held through 1.
        let (idom, retained) = run(3, &[0], &[(0, 1), (1, 2), (2, 1)], &[4, 4, 4]);

        assert_eq!(idom[1], 0);
        assert_eq!(idom[2], 1);
        assert_eq!(retained[1], 8);
        assert_eq!(retained[0], 12);
    }

    #[test]
    fn root_inside_a_cycle() {
        // 0 <-> 1 with 0 rooted: 0 dominates 1 despite the back edge.
        let (idom, retained) = run(2, &[0], &[(0, 1), (1, 0)], &[3, 3]);

        assert_eq!(idom[0], 2);
        assert_eq!(idom[1], 0);
        assert_eq!(retained[0], 6);
        assert_eq!(retained[1], 3);
    }
}
