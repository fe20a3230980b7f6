//! Graph analyses over a built index.
//!
//! Everything here consumes the frozen [`crate::index::HeapIndex`] and never
//! touches the raw file except through the index's lazy outgoing-edge decoder.
//!
//! - [`crate::graph::dominators`] - Dominator tree and retained sizes
//! - [`crate::graph::paths`] - Shortest referrer chain to a GC root

pub mod dominators;
pub mod paths;

pub use dominators::DominatorTree;
pub use paths::shortest_path_to_root;
