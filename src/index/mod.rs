//! Heap dump index: the immutable, query-ready view of one dump.
//!
//! The index is what two passes over the raw file produce: a string table, a class
//! table, an object table with dense numbering, the GC root set, and a reverse
//! reference index in CSR form. Everything else - retained sizes, paths to roots,
//! language fragments - is computed over this structure without touching the file
//! again, except for the one deliberately lazy part: outgoing references, which are
//! decoded from the mapped payload bytes on demand.
//!
//! # Architecture
//!
//! - [`crate::index::builder`] - The two-pass build: sequential scan, then parallel
//!   edge extraction
//! - [`crate::index::classes`] - Class metadata and hierarchy walks
//! - [`crate::index::objects`] - Object placements and dense numbering
//! - [`crate::index::refs`] - The CSR reverse-reference index
//! - [`crate::index::progress`] - Progress reporting and cooperative cancellation
//!
//! # Edge semantics
//!
//! A single decoder produces outgoing references for both the parallel build pass
//! and later per-object queries, so the forward and reverse views of the graph can
//! never disagree. References to the null identifier are skipped; references to
//! identifiers absent from the object table are dropped and reported once, during
//! the build, as dangling-reference diagnostics.

pub mod builder;
pub mod classes;
pub mod objects;
pub mod progress;
pub mod refs;

pub use builder::{build, LoadOptions};
pub use classes::{ClassInfo, ClassTable};
pub use objects::{ObjectEntry, ObjectKind, ObjectTable};
pub use progress::{CancelToken, NullProgress, Progress};
pub use refs::ReverseIndex;

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics},
    file::{parser::Parser, Backend},
    format::{BasicType, DumpHeader, GcRoot},
    Error, Result,
};

/// One directed step between two objects in a query result.
///
/// For reference queries `from` is the holding object and `to` the held one. In a
/// path to a GC root the steps read from the queried object toward the root
/// through its referrers: `from` of the first edge is the queried object and `to`
/// of the last edge is the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceEdge {
    /// The referencing object.
    pub from: u64,
    /// The referenced object.
    pub to: u64,
}

/// The complete, immutable index over one heap dump.
///
/// Construction goes through [`build`]; all fields are frozen afterwards except the
/// lock-free diagnostics sink. The backing file stays mapped for the lifetime of
/// the index because instance payloads are decoded lazily from it.
pub struct HeapIndex {
    backend: Arc<dyn Backend>,
    header: DumpHeader,
    strings: HashMap<u64, String>,
    classes: ClassTable,
    objects: ObjectTable,
    instances_by_class: HashMap<u64, Vec<u64>>,
    roots: Vec<GcRoot>,
    root_denses: Vec<u32>,
    reverse: ReverseIndex,
    diagnostics: Diagnostics,
}

impl HeapIndex {
    /// Identifier width of this dump in bytes (4 or 8).
    #[must_use]
    pub fn id_size(&self) -> u32 {
        self.header.id_size
    }

    /// The parsed dump header.
    #[must_use]
    pub fn header(&self) -> &DumpHeader {
        &self.header
    }

    /// Resolve a string table identifier.
    #[must_use]
    pub fn string(&self, string_id: u64) -> Option<&str> {
        self.strings.get(&string_id).map(String::as_str)
    }

    /// The class table.
    #[must_use]
    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    /// The object table.
    #[must_use]
    pub fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    /// All GC root declarations whose objects exist in the dump.
    #[must_use]
    pub fn roots(&self) -> &[GcRoot] {
        &self.roots
    }

    /// Dense numbers of the root set, sorted ascending and deduplicated.
    #[must_use]
    pub fn root_denses(&self) -> &[u32] {
        &self.root_denses
    }

    /// Returns `true` if the object with this dense number is a GC root.
    #[must_use]
    pub fn is_root(&self, dense: u32) -> bool {
        self.root_denses.binary_search(&dense).is_ok()
    }

    /// The reverse-reference index.
    #[must_use]
    pub fn reverse(&self) -> &ReverseIndex {
        &self.reverse
    }

    /// Diagnostics collected while loading.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Object identifiers of all direct instances of `class_id`, ascending.
    ///
    /// Direct means declared class only; subclass expansion happens above this
    /// layer via [`ClassTable::subtree`].
    #[must_use]
    pub fn instance_ids(&self, class_id: u64) -> &[u64] {
        self.instances_by_class
            .get(&class_id)
            .map_or(&[], Vec::as_slice)
    }

    /// Identifiers of the objects this object references, with multiplicity, in
    /// field/element order.
    ///
    /// Decoded lazily from the mapped payload bytes. Null references are skipped;
    /// dangling references were dropped and reported during the build and are
    /// silently absent here.
    ///
    /// # Errors
    /// Returns [`Error::UnknownObject`] when `object_id` is not in the dump.
    pub fn outgoing_ids(&self, object_id: u64) -> Result<Vec<u64>> {
        self.outgoing_targets(object_id, false)
    }

    /// Identifiers of the objects referencing this object, ascending, with
    /// multiplicity.
    ///
    /// Served from the prebuilt reverse index; no file access.
    ///
    /// # Errors
    /// Returns [`Error::UnknownObject`] when `object_id` is not in the dump.
    pub fn incoming_ids(&self, object_id: u64) -> Result<Vec<u64>> {
        let dense = self
            .objects
            .dense_of(object_id)
            .ok_or(Error::UnknownObject(object_id))?;

        Ok(self
            .reverse
            .incoming(dense)
            .iter()
            .filter_map(|&d| self.objects.id_of(d))
            .collect())
    }

    /// Shared edge decoder behind both the build pass and per-object queries.
    ///
    /// Returns only targets present in the object table. `report_dangling` is set
    /// by the build pass so each dropped edge is diagnosed exactly once.
    pub(crate) fn outgoing_targets(
        &self,
        object_id: u64,
        report_dangling: bool,
    ) -> Result<Vec<u64>> {
        let entry = self
            .objects
            .get(object_id)
            .ok_or(Error::UnknownObject(object_id))?;

        let mut raw = Vec::new();
        match entry.kind {
            ObjectKind::Instance => self.instance_targets(object_id, &entry, &mut raw),
            ObjectKind::ObjectArray => self.array_targets(object_id, &entry, &mut raw),
            ObjectKind::PrimitiveArray => {}
            ObjectKind::Class => {
                if let Some(class) = self.classes.get(object_id) {
                    raw.extend_from_slice(&class.static_refs);
                }
            }
        }

        raw.retain(|&target| {
            if self.objects.get(target).is_some() {
                return true;
            }
            if report_dangling {
                self.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticSeverity::Warning,
                        DiagnosticCategory::DanglingReference,
                        format!("reference to missing object 0x{target:x} dropped"),
                    )
                    .with_object_id(object_id),
                );
            }
            false
        });

        Ok(raw)
    }

    /// Decode an instance's field payload against its class chain layout.
    fn instance_targets(&self, object_id: u64, entry: &ObjectEntry, out: &mut Vec<u64>) {
        let Ok(data) = self
            .backend
            .data_slice(entry.data_offset as usize, entry.data_len as usize)
        else {
            return;
        };
        let mut parser = Parser::new(data);

        for class in self.classes.superclass_chain(entry.class_id) {
            for field in &class.fields {
                if field.ty == BasicType::Object {
                    match parser.read_id(self.header.id_size) {
                        Ok(target) if target != 0 => out.push(target),
                        Ok(_) => {}
                        Err(_) => {
                            self.diagnostics.push(
                                Diagnostic::new(
                                    DiagnosticSeverity::Error,
                                    DiagnosticCategory::Record,
                                    "instance payload shorter than its class layout",
                                )
                                .with_object_id(object_id)
                                .with_offset(entry.data_offset),
                            );
                            return;
                        }
                    }
                } else if parser
                    .advance_by(field.ty.byte_size(self.header.id_size) as usize)
                    .is_err()
                {
                    self.diagnostics.push(
                        Diagnostic::new(
                            DiagnosticSeverity::Error,
                            DiagnosticCategory::Record,
                            "instance payload shorter than its class layout",
                        )
                        .with_object_id(object_id)
                        .with_offset(entry.data_offset),
                    );
                    return;
                }
            }
        }
    }

    /// Decode an object array's element identifiers.
    fn array_targets(&self, object_id: u64, entry: &ObjectEntry, out: &mut Vec<u64>) {
        let Ok(data) = self
            .backend
            .data_slice(entry.data_offset as usize, entry.data_len as usize)
        else {
            self.diagnostics.push(
                Diagnostic::new(
                    DiagnosticSeverity::Error,
                    DiagnosticCategory::Record,
                    "object array elements overrun the file",
                )
                .with_object_id(object_id)
                .with_offset(entry.data_offset),
            );
            return;
        };

        let mut parser = Parser::new(data);
        while parser.has_more_data() {
            match parser.read_id(self.header.id_size) {
                Ok(target) if target != 0 => out.push(target),
                Ok(_) => {}
                Err(_) => break,
            }
        }
    }
}

impl std::fmt::Debug for HeapIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapIndex")
            .field("id_size", &self.header.id_size)
            .field("classes", &self.classes.len())
            .field("objects", &self.objects.len())
            .field("roots", &self.roots.len())
            .field("edges", &self.reverse.edge_count())
            .finish_non_exhaustive()
    }
}
