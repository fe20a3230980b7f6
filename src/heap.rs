//! The heap dump session facade.
//!
//! [`HeapDump`] ties the whole pipeline together: it loads and indexes a dump,
//! answers every graph query, manages guest-language fragments, and owns the
//! session lifecycle. This is the type embedders hold; everything below it is
//! reachable through [`HeapDump::index`] for callers that want the raw tables.
//!
//! # Architecture
//!
//! The session is a readiness gate around an immutable index. Loading builds the
//! [`crate::index::HeapIndex`] up front (the only expensive step, with progress
//! and cancellation); queries then clone one `Arc` out of the gate and run
//! lock-free. [`HeapDump::close`] empties the gate, after which every query
//! fails with [`crate::Error::NotReady`] - no query ever observes partial state.
//!
//! Expensive derived results are computed once on first use: the dominator tree
//! behind retained sizes lives in a `OnceLock`, detected language fragments in a
//! `DashMap` keyed by tag.
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use heapscope::HeapDump;
//!
//! let heap = HeapDump::from_file("dump.hprof".as_ref())?;
//! for object_id in heap.instances_of("java.lang.String", false)? {
//!     println!(
//!         "0x{object_id:x} retains {} bytes",
//!         heap.retained_size(object_id)?
//!     );
//! }
//! heap.close();
//! # Ok::<(), heapscope::Error>(())
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock, RwLock};

use dashmap::DashMap;

use crate::{
    file::{Backend, Memory, Physical},
    fragment::HeapFragment,
    graph::{self, DominatorTree},
    index::{build, HeapIndex, LoadOptions, ReferenceEdge},
    inspection::SourceInspection,
    Error, Result,
};

/// Top-level statistics of a loaded dump.
#[derive(Debug, Clone)]
pub struct HeapSummary {
    /// Format release banner of the dump.
    pub version: String,
    /// Identifier width in bytes.
    pub id_size: u32,
    /// Dump creation time, milliseconds since the epoch.
    pub timestamp_ms: u64,
    /// Number of classes in the class table.
    pub class_count: usize,
    /// Number of objects in the object table.
    pub object_count: usize,
    /// Number of GC roots naming live objects.
    pub root_count: usize,
    /// Number of reference edges in the graph.
    pub edge_count: usize,
    /// Sum of all shallow sizes in bytes.
    pub total_shallow: u64,
    /// Number of diagnostics collected during the load.
    pub diagnostic_count: usize,
}

/// One loaded heap dump session.
///
/// Cheap to share behind an `Arc`; all queries take `&self`.
pub struct HeapDump {
    index: RwLock<Option<Arc<HeapIndex>>>,
    dominators: OnceLock<Arc<DominatorTree>>,
    languages: RwLock<HashMap<String, String>>,
    fragments: DashMap<String, Arc<HeapFragment>>,
    inspection: Arc<dyn SourceInspection>,
}

impl HeapDump {
    /// Load and index a dump from a file, memory-mapped, with default options.
    ///
    /// # Errors
    /// Propagates reader and builder errors; see [`crate::index::build`].
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::load_with(Arc::new(Physical::new(path)?), &LoadOptions::default())
    }

    /// Load and index a dump from an in-memory buffer with default options.
    ///
    /// # Errors
    /// Propagates reader and builder errors; see [`crate::index::build`].
    pub fn from_mem(data: Vec<u8>) -> Result<Self> {
        Self::load_with(Arc::new(Memory::new(data)?), &LoadOptions::default())
    }

    /// Load and index a dump from any backend with explicit options.
    ///
    /// This is the entry point for interactive embedders: `options` carries the
    /// progress sink, the cancellation token, and the source-inspection oracle.
    ///
    /// # Errors
    /// Propagates reader and builder errors; see [`crate::index::build`].
    pub fn load_with(backend: Arc<dyn Backend>, options: &LoadOptions) -> Result<Self> {
        let index = build(backend, options)?;

        Ok(Self {
            index: RwLock::new(Some(Arc::new(index))),
            dominators: OnceLock::new(),
            languages: RwLock::new(HashMap::new()),
            fragments: DashMap::new(),
            inspection: Arc::clone(&options.inspection),
        })
    }

    /// The underlying index, for callers that want the raw tables.
    ///
    /// # Errors
    /// Returns [`Error::NotReady`] once the session is closed.
    pub fn index(&self) -> Result<Arc<HeapIndex>> {
        read_lock!(self.index).clone().ok_or(Error::NotReady)
    }

    /// Identifiers of all instances of the named class, ascending.
    ///
    /// With `include_subclasses` the result covers the class's whole subtree;
    /// object arrays count as instances of their array class.
    ///
    /// # Errors
    /// - [`Error::NotReady`] once the session is closed
    /// - [`Error::UnknownClassName`] when the name matches no class
    pub fn instances_of(&self, class_name: &str, include_subclasses: bool) -> Result<Vec<u64>> {
        let class_id = self
            .index()?
            .classes()
            .get_by_name(class_name)
            .ok_or_else(|| Error::UnknownClassName(class_name.to_string()))?
            .class_id;
        self.instances_of_id(class_id, include_subclasses)
    }

    /// Identifiers of all instances of the class with this identifier, ascending.
    ///
    /// The identifier-keyed counterpart of [`HeapDump::instances_of`], for callers
    /// that already hold a class identifier from the class table or a query result.
    ///
    /// # Errors
    /// - [`Error::NotReady`] once the session is closed
    /// - [`Error::UnknownClass`] when the identifier is not in the class table
    pub fn instances_of_id(&self, class_id: u64, include_subclasses: bool) -> Result<Vec<u64>> {
        let index = self.index()?;
        if index.classes().get(class_id).is_none() {
            return Err(Error::UnknownClass(class_id));
        }

        if !include_subclasses {
            return Ok(index.instance_ids(class_id).to_vec());
        }

        let mut ids: Vec<u64> = index
            .classes()
            .subtree(class_id)
            .unwrap_or_default()
            .into_iter()
            .flat_map(|class_id| index.instance_ids(class_id).iter().copied())
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// The references an object holds, decoded lazily, in field/element order.
    ///
    /// # Errors
    /// - [`Error::NotReady`] once the session is closed
    /// - [`Error::UnknownObject`] for identifiers absent from the dump
    pub fn outgoing_references(&self, object_id: u64) -> Result<Vec<ReferenceEdge>> {
        let index = self.index()?;
        Ok(index
            .outgoing_ids(object_id)?
            .into_iter()
            .map(|target| ReferenceEdge {
                from: object_id,
                to: target,
            })
            .collect())
    }

    /// The references held to an object, ascending by referrer, served from the
    /// prebuilt reverse index.
    ///
    /// # Errors
    /// - [`Error::NotReady`] once the session is closed
    /// - [`Error::UnknownObject`] for identifiers absent from the dump
    pub fn incoming_references(&self, object_id: u64) -> Result<Vec<ReferenceEdge>> {
        let index = self.index()?;
        Ok(index
            .incoming_ids(object_id)?
            .into_iter()
            .map(|referrer| ReferenceEdge {
                from: referrer,
                to: object_id,
            })
            .collect())
    }

    /// Retained size of an object in bytes.
    ///
    /// The first call computes the dominator tree for the whole dump; repeated
    /// calls are table lookups. Unreachable objects retain exactly their
    /// shallow size.
    ///
    /// # Errors
    /// - [`Error::NotReady`] once the session is closed
    /// - [`Error::UnknownObject`] for identifiers absent from the dump
    pub fn retained_size(&self, object_id: u64) -> Result<u64> {
        let index = self.index()?;
        let dense = index
            .objects()
            .dense_of(object_id)
            .ok_or(Error::UnknownObject(object_id))?;

        let dominators = self
            .dominators
            .get_or_init(|| Arc::new(DominatorTree::compute(index.as_ref())));
        Ok(dominators.retained_of(dense))
    }

    /// A shortest referrer chain from an object to a GC root.
    ///
    /// Returns an empty chain for an object that is itself a root and `None`
    /// for an unreachable object. Deterministic under ties: the lowest
    /// identifiers win at every step.
    ///
    /// # Errors
    /// - [`Error::NotReady`] once the session is closed
    /// - [`Error::UnknownObject`] for identifiers absent from the dump
    pub fn shortest_path_to_root(&self, object_id: u64) -> Result<Option<Vec<ReferenceEdge>>> {
        let index = self.index()?;
        graph::shortest_path_to_root(index.as_ref(), object_id)
    }

    /// Register a guest language: objects of `tag` are instances of
    /// `marker_class` or its subclasses.
    ///
    /// Re-registering a tag replaces the marker and drops any cached fragment.
    pub fn register_language(&self, tag: impl Into<String>, marker_class: impl Into<String>) {
        let tag = tag.into();
        self.fragments.remove(&tag);
        write_lock!(self.languages).insert(tag, marker_class.into());
    }

    /// The fragment of the dump belonging to a registered guest language.
    ///
    /// Detection runs once per tag and is cached for the session.
    ///
    /// # Errors
    /// - [`Error::NotReady`] once the session is closed
    /// - [`Error::UnknownLanguageTag`] for unregistered tags or when the
    ///   marker class is absent from the dump
    pub fn fragment(&self, tag: &str) -> Result<Arc<HeapFragment>> {
        if let Some(cached) = self.fragments.get(tag) {
            return Ok(Arc::clone(cached.value()));
        }

        let marker = read_lock!(self.languages)
            .get(tag)
            .cloned()
            .ok_or_else(|| Error::UnknownLanguageTag(tag.to_string()))?;

        let index = self.index()?;
        let fragment = Arc::new(HeapFragment::detect(index, tag, marker)?);
        self.fragments.insert(tag.to_string(), Arc::clone(&fragment));
        Ok(fragment)
    }

    /// The source-inspection oracle this session was loaded with.
    #[must_use]
    pub fn inspection(&self) -> &Arc<dyn SourceInspection> {
        &self.inspection
    }

    /// Top-level statistics of the loaded dump.
    ///
    /// # Errors
    /// Returns [`Error::NotReady`] once the session is closed.
    pub fn summary(&self) -> Result<HeapSummary> {
        let index = self.index()?;
        Ok(HeapSummary {
            version: index.header().version.to_string(),
            id_size: index.id_size(),
            timestamp_ms: index.header().timestamp_ms,
            class_count: index.classes().len(),
            object_count: index.objects().len(),
            root_count: index.roots().len(),
            edge_count: index.reverse().edge_count(),
            total_shallow: index.objects().shallow_sizes().iter().sum(),
            diagnostic_count: index.diagnostics().count(),
        })
    }

    /// Close the session and release the index and the mapped file.
    ///
    /// Idempotent. Every query issued afterwards fails with
    /// [`Error::NotReady`]; queries already holding the index finish normally.
    pub fn close(&self) {
        self.fragments.clear();
        write_lock!(self.index).take();
    }
}

impl std::fmt::Debug for HeapDump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if read_lock!(self.index).is_some() {
            "ready"
        } else {
            "closed"
        };
        f.debug_struct("HeapDump").field("state", &state).finish()
    }
}
