//! Two-pass index construction.
//!
//! The build is the only place the whole file is traversed. Pass one is a single
//! sequential scan over the record stream: it decodes the string table and class
//! load notices, fully decodes class dumps, locates (without decoding) every
//! instance and array payload, and collects GC root declarations. Pass two is
//! embarrassingly parallel: with the object table frozen, workers decode each
//! object's outgoing references through the shared edge decoder and emit
//! `(target, source)` pairs in dense numbers, which a parallel sort turns into the
//! CSR reverse index.
//!
//! Progress is reported as 0-50% for the sequential scan (weighted by file bytes)
//! and 50-100% for edge extraction (weighted by objects). Cancellation is checked
//! between records and between objects; a cancelled build returns
//! [`crate::Error::Cancelled`] and drops all partial state.
//!
//! # Failure model
//!
//! Corrupt structure (truncated records, undecodable sub-records) aborts the build
//! with [`crate::Error::CorruptFormat`]. A structurally valid dump with no class
//! dumps cannot support queries and aborts with [`crate::Error::IndexBuild`].
//! Everything else - dangling references, duplicate identifiers, roots naming
//! absent objects - is diagnosed and worked around.

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics},
    file::{parser::Parser, Backend},
    format::{read_sub_record, DumpHeader, GcRoot, RecordIter, RecordTag, SubRecord},
    index::{
        classes::{ClassInfo, ClassTable},
        objects::{ObjectKind, ObjectTable, Placement},
        progress::{CancelToken, NullProgress, Progress},
        refs::ReverseIndex,
        HeapIndex,
    },
    inspection::{NullSourceInspection, SourceInspection},
    Error, Result,
};

/// Options controlling a heap dump load.
///
/// The defaults discard progress, never cancel, and answer every source
/// inspection question negatively, so `LoadOptions::default()` is the common
/// non-interactive configuration.
#[derive(Clone)]
pub struct LoadOptions {
    /// Sink for build progress percentages.
    pub progress: Arc<dyn Progress>,
    /// Cooperative cancellation flag checked throughout the build.
    pub cancel: CancelToken,
    /// Source-model oracle consulted by language fragments and summaries.
    pub inspection: Arc<dyn SourceInspection>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            progress: Arc::new(NullProgress),
            cancel: CancelToken::new(),
            inspection: Arc::new(NullSourceInspection),
        }
    }
}

impl std::fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadOptions")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Everything pass one accumulates before the object table can be frozen.
#[derive(Default)]
struct Scan {
    strings: HashMap<u64, String>,
    class_names: Vec<(u64, u64)>,
    classes: ClassTable,
    placements: Vec<Placement>,
    roots: Vec<GcRoot>,
}

/// Build the complete index for one dump.
///
/// # Arguments
/// * `backend` - The mapped or in-memory dump bytes
/// * `options` - Progress sink and cancellation token
///
/// # Errors
/// - [`Error::UnsupportedVersion`] / [`Error::CorruptFormat`] from the reader
/// - [`Error::IndexBuild`] when the dump contains no class dumps or overflows
///   the dense object space
/// - [`Error::Cancelled`] when the token fires mid-build
pub fn build(backend: Arc<dyn Backend>, options: &LoadOptions) -> Result<HeapIndex> {
    let header = DumpHeader::parse(backend.data())?;
    let diagnostics = Diagnostics::new();

    let scan = scan_records(backend.as_ref(), &header, options, &diagnostics)?;
    if scan.classes.is_empty() {
        return Err(Error::IndexBuild(
            "dump contains no class dumps; nothing can be queried".into(),
        ));
    }

    let mut index = freeze(backend, header, scan, diagnostics)?;

    if options.cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    options.progress.report(50);

    let edges = extract_edges(&index, options)?;
    index.reverse = ReverseIndex::from_edges(edges, index.objects.len());
    options.progress.report(100);

    Ok(index)
}

/// Pass one: sequential scan of the record stream.
fn scan_records(
    backend: &dyn Backend,
    header: &DumpHeader,
    options: &LoadOptions,
    diagnostics: &Diagnostics,
) -> Result<Scan> {
    let data = backend.data();
    let id_size = header.id_size;
    let total = data.len() as u64;
    let mut scan = Scan::default();

    for record in RecordIter::new(data, header.records_offset) {
        if options.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let record = record?;

        match record.tag {
            Some(RecordTag::Utf8) => read_utf8(data, &record, id_size, &mut scan, diagnostics)?,
            Some(RecordTag::LoadClass) => read_load_class(data, &record, id_size, &mut scan)?,
            Some(RecordTag::HeapDump | RecordTag::HeapDumpSegment) => {
                read_segment(data, &record, id_size, &mut scan, diagnostics)?;
            }
            // Remaining known tags and vendor records carry nothing the index needs.
            _ => {}
        }

        let done = record.body_offset + u64::from(record.length);
        #[allow(clippy::cast_possible_truncation)]
        options.progress.report((done * 50 / total.max(1)) as u32);
    }

    Ok(scan)
}

fn read_utf8(
    data: &[u8],
    record: &crate::format::RecordHeader,
    id_size: u32,
    scan: &mut Scan,
    diagnostics: &Diagnostics,
) -> Result<()> {
    if record.length < id_size {
        diagnostics.error(
            DiagnosticCategory::Record,
            format!("string record at 0x{:x} shorter than an identifier", record.offset),
        );
        return Ok(());
    }

    let mut parser = Parser::new(data);
    parser.seek(record.body_offset as usize)?;
    let string_id = parser.read_id(id_size)?;
    let bytes = parser.read_bytes((record.length - id_size) as usize)?;
    scan.strings
        .insert(string_id, String::from_utf8_lossy(bytes).into_owned());
    Ok(())
}

fn read_load_class(
    data: &[u8],
    record: &crate::format::RecordHeader,
    id_size: u32,
    scan: &mut Scan,
) -> Result<()> {
    let mut parser = Parser::new(data);
    parser.seek(record.body_offset as usize)?;
    parser.read_be::<u32>()?; // class serial
    let class_id = parser.read_id(id_size)?;
    parser.read_be::<u32>()?; // stack trace serial
    let name_id = parser.read_id(id_size)?;
    scan.class_names.push((class_id, name_id));
    Ok(())
}

/// Walk the packed sub-records of one heap-dump segment.
fn read_segment(
    data: &[u8],
    record: &crate::format::RecordHeader,
    id_size: u32,
    scan: &mut Scan,
    diagnostics: &Diagnostics,
) -> Result<()> {
    let end = (record.body_offset + u64::from(record.length)) as usize;
    let mut parser = Parser::new(&data[..end]);
    parser.seek(record.body_offset as usize)?;

    while parser.has_more_data() {
        match read_sub_record(&mut parser, id_size)? {
            SubRecord::Root(root) => scan.roots.push(root),
            SubRecord::Class(class) => {
                let shallow = u64::from(2 * id_size) + u64::from(class.static_storage);
                scan.placements.push(Placement {
                    object_id: class.class_id,
                    kind: ObjectKind::Class,
                    class_id: 0,
                    data_offset: 0,
                    data_len: 0,
                    shallow,
                });
                let inserted = scan.classes.insert(ClassInfo {
                    class_id: class.class_id,
                    super_id: class.super_id,
                    name: None,
                    instance_size: class.instance_size,
                    fields: class.fields,
                    static_refs: class.static_refs,
                    static_storage: class.static_storage,
                });
                if !inserted {
                    diagnostics.warning(
                        DiagnosticCategory::Class,
                        format!("duplicate class dump for 0x{:x} ignored", class.class_id),
                    );
                }
            }
            SubRecord::Instance(instance) => {
                // Shallow size needs the class table, which may still be
                // incomplete here; fixed up after the scan.
                scan.placements.push(Placement {
                    object_id: instance.object_id,
                    kind: ObjectKind::Instance,
                    class_id: instance.class_id,
                    data_offset: instance.data_offset,
                    data_len: u64::from(instance.data_len),
                    shallow: 0,
                });
            }
            SubRecord::ObjectArray(array) => {
                let shallow = u64::from(2 * id_size + 4)
                    + u64::from(array.count) * u64::from(id_size);
                scan.placements.push(Placement {
                    object_id: array.object_id,
                    kind: ObjectKind::ObjectArray,
                    class_id: array.array_class_id,
                    data_offset: array.elements_offset,
                    data_len: u64::from(array.count) * u64::from(id_size),
                    shallow,
                });
            }
            SubRecord::PrimitiveArray(array) => {
                let shallow = u64::from(2 * id_size + 4)
                    + u64::from(array.count) * u64::from(array.element_type.byte_size(id_size));
                scan.placements.push(Placement {
                    object_id: array.object_id,
                    kind: ObjectKind::PrimitiveArray,
                    class_id: 0,
                    data_offset: 0,
                    data_len: 0,
                    shallow,
                });
            }
        }
    }

    Ok(())
}

/// Freeze the scan results into a query-ready index (reverse index still empty).
fn freeze(
    backend: Arc<dyn Backend>,
    header: DumpHeader,
    mut scan: Scan,
    diagnostics: Diagnostics,
) -> Result<HeapIndex> {
    // Resolve class names through the load notices and the string table.
    for &(class_id, name_id) in &scan.class_names {
        if let Some(name) = scan.strings.get(&name_id) {
            scan.classes.set_name(class_id, name.clone());
        }
    }
    scan.classes.build_hierarchy();

    // Instance shallow sizes come from the now-complete class table.
    for placement in &mut scan.placements {
        if placement.kind == ObjectKind::Instance {
            match scan.classes.get(placement.class_id) {
                Some(class) => placement.shallow = u64::from(class.instance_size),
                None => {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticSeverity::Warning,
                            DiagnosticCategory::Class,
                            format!("instance of unknown class 0x{:x}", placement.class_id),
                        )
                        .with_object_id(placement.object_id),
                    );
                    placement.shallow = placement.data_len;
                }
            }
        }
    }

    let placement_count = scan.placements.len();
    let objects = ObjectTable::from_placements(scan.placements).ok_or_else(|| {
        Error::IndexBuild("dump exceeds the addressable object count".into())
    })?;
    if objects.len() < placement_count {
        diagnostics.warning(
            DiagnosticCategory::Record,
            format!(
                "{} duplicate object dumps ignored",
                placement_count - objects.len()
            ),
        );
    }

    // Roots naming objects the dump never wrote out are dropped.
    let mut roots = Vec::with_capacity(scan.roots.len());
    let mut root_denses = Vec::new();
    for root in scan.roots {
        match objects.dense_of(root.object_id) {
            Some(dense) => {
                roots.push(root);
                root_denses.push(dense);
            }
            None => diagnostics.push(
                Diagnostic::new(
                    DiagnosticSeverity::Warning,
                    DiagnosticCategory::Root,
                    format!("{} root names an absent object", root.kind),
                )
                .with_object_id(root.object_id),
            ),
        }
    }
    root_denses.sort_unstable();
    root_denses.dedup();

    let mut instances_by_class: HashMap<u64, Vec<u64>> = HashMap::new();
    for (object_id, entry) in objects.iter() {
        if matches!(entry.kind, ObjectKind::Instance | ObjectKind::ObjectArray) {
            instances_by_class
                .entry(entry.class_id)
                .or_default()
                .push(object_id);
        }
    }

    Ok(HeapIndex {
        backend,
        header,
        strings: scan.strings,
        classes: scan.classes,
        objects,
        instances_by_class,
        roots,
        root_denses,
        reverse: ReverseIndex::default(),
        diagnostics,
    })
}

/// Pass two: parallel edge extraction in dense numbers.
fn extract_edges(index: &HeapIndex, options: &LoadOptions) -> Result<Vec<(u32, u32)>> {
    let n = index.objects.len();
    let processed = AtomicUsize::new(0);
    // High-water mark for delivered percentages. Workers report under the lock
    // and only upward, so the sink sees a non-decreasing sequence.
    let reported = Mutex::new(50u32);

    let edges: Vec<(u32, u32)> = (0..n as u32)
        .into_par_iter()
        .flat_map_iter(|from| {
            let mut pairs = Vec::new();
            if !options.cancel.is_cancelled() {
                if let Some(object_id) = index.objects.id_of(from) {
                    if let Ok(targets) = index.outgoing_targets(object_id, true) {
                        pairs.reserve(targets.len());
                        for target in targets {
                            if let Some(to) = index.objects.dense_of(target) {
                                pairs.push((to, from));
                            }
                        }
                    }
                }
            }

            let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 4096 == 0 || done == n {
                #[allow(clippy::cast_possible_truncation)]
                let percent = 50 + (done * 50 / n.max(1)) as u32;
                let mut last = reported.lock().expect("Failed to acquire progress lock");
                if percent > *last {
                    *last = percent;
                    options.progress.report(percent);
                }
            }
            pairs.into_iter()
        })
        .collect();

    if options.cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(edges)
}
