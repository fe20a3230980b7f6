//! Shortest path from an object to a GC root.
//!
//! The search answers "why is this object alive": the chain of referrers that
//! connects it to something the runtime holds directly. It runs breadth-first over
//! the prebuilt reverse index - from the queried object toward its referrers -
//! and terminates at the first level containing a GC root, so the returned chain
//! is minimal in hops.
//!
//! Results are deterministic under ties. Levels are expanded in ascending dense
//! order (which is ascending identifier order), each node keeps the first parent
//! that discovered it, and when several roots appear at the terminal level the
//! one with the lowest identifier wins. Re-running the query on an unchanged
//! index always returns the same chain.

use crate::{
    index::{HeapIndex, ReferenceEdge},
    Error, Result,
};

/// Sentinel for an undiscovered node.
const UNDISCOVERED: u32 = u32::MAX;

/// Find a shortest referrer chain from `object_id` to a GC root.
///
/// The returned edges step from the queried object toward the root: `from` of the
/// first edge is the queried object, `to` of each edge is a referrer of `from`,
/// and `to` of the last edge is the root. An object that is itself a root yields
/// an empty chain; an unreachable object yields `None`.
///
/// # Errors
/// Returns [`Error::UnknownObject`] when `object_id` is not in the dump.
pub fn shortest_path_to_root(
    index: &HeapIndex,
    object_id: u64,
) -> Result<Option<Vec<ReferenceEdge>>> {
    let start = index
        .objects()
        .dense_of(object_id)
        .ok_or(Error::UnknownObject(object_id))?;

    if index.is_root(start) {
        return Ok(Some(Vec::new()));
    }

    let n = index.objects().len();
    let mut parent = vec![UNDISCOVERED; n];
    parent[start as usize] = start; // self-parent marks the origin

    let mut level = vec![start];
    while !level.is_empty() {
        let mut next = Vec::new();
        for &node in &level {
            for &referrer in index.reverse().incoming(node) {
                if parent[referrer as usize] == UNDISCOVERED {
                    parent[referrer as usize] = node;
                    next.push(referrer);
                }
            }
        }

        // Level-synchronous: roots are only selected once the whole level is
        // discovered, so the lowest-identifier root at the minimal depth wins.
        next.sort_unstable();
        if let Some(&root) = next.iter().find(|&&d| index.is_root(d)) {
            return Ok(Some(reconstruct(index, &parent, start, root)));
        }
        level = next;
    }

    Ok(None)
}

/// Walk the parent pointers back from the root and emit edges from the queried
/// object outward.
fn reconstruct(
    index: &HeapIndex,
    parent: &[u32],
    start: u32,
    root: u32,
) -> Vec<ReferenceEdge> {
    let mut chain = vec![root];
    let mut cursor = root;
    while cursor != start {
        cursor = parent[cursor as usize];
        chain.push(cursor);
    }
    chain.reverse(); // now start .. root

    chain
        .windows(2)
        .map(|pair| ReferenceEdge {
            from: index.objects().id_of(pair[0]).unwrap_or(0),
            to: index.objects().id_of(pair[1]).unwrap_or(0),
        })
        .collect()
}
