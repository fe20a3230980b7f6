//! End-to-end query behavior over synthetic dumps.

mod common;

use std::sync::{Arc, Mutex};

use heapscope::prelude::*;

use common::{chain_dump, DumpWriter, SegmentWriter, TYPE_OBJECT};

fn load(bytes: Vec<u8>) -> HeapDump {
    HeapDump::from_mem(bytes).expect("dump should load")
}

#[test]
fn summary_reflects_the_dump() {
    let heap = load(chain_dump());
    let summary = heap.summary().unwrap();

    assert_eq!(summary.id_size, 8);
    assert_eq!(summary.class_count, 2);
    // A, B, C, O plus the two class objects.
    assert_eq!(summary.object_count, 6);
    assert_eq!(summary.root_count, 1);
    // C -> B -> A -> O.
    assert_eq!(summary.edge_count, 3);
}

#[test]
fn instances_of_direct_and_with_subclasses() {
    let heap = load(chain_dump());

    assert_eq!(
        heap.instances_of("com.example.Holder", false).unwrap(),
        vec![0x1, 0x2, 0x3]
    );
    // Direct Object instances exclude the Holders.
    assert_eq!(
        heap.instances_of("java.lang.Object", false).unwrap(),
        vec![0x4]
    );
    // Subtree expansion pulls them in.
    assert_eq!(
        heap.instances_of("java.lang.Object", true).unwrap(),
        vec![0x1, 0x2, 0x3, 0x4]
    );

    assert!(matches!(
        heap.instances_of("missing.Class", false),
        Err(Error::UnknownClassName(name)) if name == "missing.Class"
    ));
}

#[test]
fn instances_of_id_mirrors_the_name_query() {
    let heap = load(chain_dump());

    assert_eq!(
        heap.instances_of_id(0x200, false).unwrap(),
        vec![0x1, 0x2, 0x3]
    );
    assert_eq!(heap.instances_of_id(0x100, false).unwrap(), vec![0x4]);
    assert_eq!(
        heap.instances_of_id(0x100, true).unwrap(),
        vec![0x1, 0x2, 0x3, 0x4]
    );

    // An identifier absent from the class table is an error, not an empty set.
    assert!(matches!(
        heap.instances_of_id(0xBAD, false),
        Err(Error::UnknownClass(0xBAD))
    ));
    assert!(matches!(
        heap.instances_of_id(0xBAD, true),
        Err(Error::UnknownClass(0xBAD))
    ));
}

#[test]
fn outgoing_and_incoming_agree() {
    let heap = load(chain_dump());

    assert_eq!(
        heap.outgoing_references(0x3).unwrap(),
        vec![ReferenceEdge { from: 0x3, to: 0x2 }]
    );
    assert_eq!(
        heap.incoming_references(0x2).unwrap(),
        vec![ReferenceEdge { from: 0x3, to: 0x2 }]
    );

    // Every forward edge appears in the reverse view and vice versa.
    let index = heap.index().unwrap();
    for (object_id, _) in index.objects().iter() {
        for target in index.outgoing_ids(object_id).unwrap() {
            assert!(
                index.incoming_ids(target).unwrap().contains(&object_id),
                "edge 0x{object_id:x} -> 0x{target:x} missing from reverse view"
            );
        }
    }

    assert!(matches!(
        heap.outgoing_references(0x999),
        Err(Error::UnknownObject(0x999))
    ));
}

#[test]
fn path_to_root_walks_the_referrer_chain() {
    let heap = load(chain_dump());

    // A is held by B, which is held by the root C.
    assert_eq!(
        heap.shortest_path_to_root(0x1).unwrap().unwrap(),
        vec![
            ReferenceEdge { from: 0x1, to: 0x2 },
            ReferenceEdge { from: 0x2, to: 0x3 },
        ]
    );

    // A root's path is empty.
    assert_eq!(heap.shortest_path_to_root(0x3).unwrap().unwrap(), vec![]);

    // Class objects have no referrers here and are unreachable.
    assert!(heap.shortest_path_to_root(0x100).unwrap().is_none());
}

#[test]
fn path_tie_break_prefers_the_lowest_identifier() {
    // Two roots (0x10 and 0x20) both hold object 0x1 directly.
    let mut dump = DumpWriter::new();
    dump.utf8(0x1000, "com.example.Holder")
        .load_class(0x100, 0x1000);
    let mut segment = SegmentWriter::new();
    segment
        .class(0x100, 0, 16, &[(0x1000, TYPE_OBJECT)])
        .instance(0x1, 0x100, &[0])
        .instance(0x10, 0x100, &[0x1])
        .instance(0x20, 0x100, &[0x1])
        .root(0x10)
        .root(0x20);
    dump.segment(segment).end();

    let heap = load(dump.into_bytes());
    let path = heap.shortest_path_to_root(0x1).unwrap().unwrap();
    assert_eq!(path, vec![ReferenceEdge { from: 0x1, to: 0x10 }]);

    // Deterministic: repeated queries return the same chain.
    assert_eq!(heap.shortest_path_to_root(0x1).unwrap().unwrap(), path);
}

#[test]
fn retained_sizes_follow_dominators() {
    let heap = load(chain_dump());

    // Shallow sizes: Holders 24 (declared), O 16.
    assert_eq!(heap.retained_size(0x4).unwrap(), 16);
    assert_eq!(heap.retained_size(0x1).unwrap(), 40); // A + O
    assert_eq!(heap.retained_size(0x2).unwrap(), 64); // B + A + O
    assert_eq!(heap.retained_size(0x3).unwrap(), 88); // C + B + A + O

    // Unreachable class objects retain their shallow size (2 ids + statics).
    assert_eq!(heap.retained_size(0x100).unwrap(), 16);
}

#[test]
fn diamond_retains_only_exclusive_objects() {
    // R -> X, R -> Y, X -> Z, Y -> Z: Z is shared, so only R retains it.
    let mut dump = DumpWriter::new();
    dump.utf8(0x1000, "com.example.Node")
        .load_class(0x100, 0x1000);
    let mut segment = SegmentWriter::new();
    segment
        .class(
            0x100,
            0,
            24,
            &[(0x1000, TYPE_OBJECT), (0x1000, TYPE_OBJECT)],
        )
        .instance(0x1, 0x100, &[0x2, 0x3]) // R
        .instance(0x2, 0x100, &[0x4, 0]) // X
        .instance(0x3, 0x100, &[0x4, 0]) // Y
        .instance(0x4, 0x100, &[0, 0]) // Z
        .root(0x1);
    dump.segment(segment).end();

    let heap = load(dump.into_bytes());
    assert_eq!(heap.retained_size(0x2).unwrap(), 24);
    assert_eq!(heap.retained_size(0x3).unwrap(), 24);
    assert_eq!(heap.retained_size(0x4).unwrap(), 24);
    assert_eq!(heap.retained_size(0x1).unwrap(), 96);
}

#[test]
fn object_arrays_carry_references() {
    let mut dump = DumpWriter::new();
    dump.utf8(0x1000, "com.example.Item")
        .utf8(0x1001, "[Lcom.example.Item;")
        .load_class(0x100, 0x1000)
        .load_class(0x300, 0x1001);
    let mut segment = SegmentWriter::new();
    segment
        .class(0x100, 0, 16, &[])
        .class(0x300, 0, 0, &[])
        .instance(0x1, 0x100, &[])
        .instance(0x2, 0x100, &[])
        .object_array(0xA, 0x300, &[0x1, 0x2, 0, 0x1])
        .root(0xA);
    dump.segment(segment).end();

    let heap = load(dump.into_bytes());

    // Null elements are skipped, duplicates are kept in element order.
    assert_eq!(
        heap.outgoing_references(0xA)
            .unwrap()
            .into_iter()
            .map(|e| e.to)
            .collect::<Vec<_>>(),
        vec![0x1, 0x2, 0x1]
    );
    // The array counts as an instance of its array class.
    assert_eq!(
        heap.instances_of("[Lcom.example.Item;", false).unwrap(),
        vec![0xA]
    );
    // 2 ids + length + 4 elements of id width.
    assert_eq!(heap.retained_size(0x1).unwrap(), 16);
    assert_eq!(heap.retained_size(0xA).unwrap(), 52 + 32);
}

#[test]
fn dangling_references_are_dropped_and_diagnosed() {
    let mut dump = DumpWriter::new();
    dump.utf8(0x1000, "com.example.Holder")
        .load_class(0x100, 0x1000);
    let mut segment = SegmentWriter::new();
    segment
        .class(0x100, 0, 16, &[(0x1000, TYPE_OBJECT)])
        .instance(0x1, 0x100, &[0xDEAD]) // target never dumped
        .root(0x1);
    dump.segment(segment).end();

    let heap = load(dump.into_bytes());

    assert!(heap.outgoing_references(0x1).unwrap().is_empty());
    let index = heap.index().unwrap();
    assert!(!index
        .diagnostics()
        .by_category(DiagnosticCategory::DanglingReference)
        .is_empty());
}

#[test]
fn static_references_are_class_edges() {
    let mut dump = DumpWriter::new();
    dump.utf8(0x1000, "com.example.Registry")
        .load_class(0x100, 0x1000);
    let mut segment = SegmentWriter::new();
    segment
        .class_with_statics(0x100, 0, 16, &[(0x1000, 0x1)], &[])
        .instance(0x1, 0x100, &[])
        .root(0x100); // sticky class root
    dump.segment(segment).end();

    let heap = load(dump.into_bytes());

    assert_eq!(
        heap.outgoing_references(0x100).unwrap(),
        vec![ReferenceEdge { from: 0x100, to: 0x1 }]
    );
    // The instance is alive only through the class's static field.
    assert_eq!(
        heap.shortest_path_to_root(0x1).unwrap().unwrap(),
        vec![ReferenceEdge { from: 0x1, to: 0x100 }]
    );
}

#[test]
fn fragments_project_one_language() {
    let heap = load(chain_dump());
    heap.register_language("holder", "com.example.Holder");

    let fragment = heap.fragment("holder").unwrap();
    assert_eq!(fragment.instances(), vec![0x1, 0x2, 0x3]);
    assert!(fragment.contains(0x1));
    assert!(!fragment.contains(0x4)); // plain Object is outside

    // A's reference to O leaves the language and is filtered out.
    assert!(fragment.outgoing_references(0x1).unwrap().is_empty());
    assert_eq!(
        fragment.incoming_references(0x1).unwrap(),
        vec![ReferenceEdge { from: 0x2, to: 0x1 }]
    );

    // The cached fragment is reused.
    assert!(Arc::ptr_eq(&fragment, &heap.fragment("holder").unwrap()));

    assert!(matches!(
        heap.fragment("unregistered"),
        Err(Error::UnknownLanguageTag(tag)) if tag == "unregistered"
    ));

    heap.register_language("ghost", "com.example.Missing");
    assert!(matches!(
        heap.fragment("ghost"),
        Err(Error::UnknownLanguageTag(tag)) if tag == "ghost"
    ));
}

#[test]
fn close_gates_every_query() {
    let heap = load(chain_dump());
    assert!(heap.summary().is_ok());

    heap.close();

    assert!(matches!(heap.summary(), Err(Error::NotReady)));
    assert!(matches!(heap.instances_of("x", false), Err(Error::NotReady)));
    assert!(matches!(heap.outgoing_references(0x1), Err(Error::NotReady)));
    assert!(matches!(heap.retained_size(0x1), Err(Error::NotReady)));
    assert!(matches!(heap.shortest_path_to_root(0x1), Err(Error::NotReady)));

    // Idempotent.
    heap.close();
    assert!(matches!(heap.summary(), Err(Error::NotReady)));
}

#[test]
fn cancellation_aborts_the_load() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let options = LoadOptions {
        cancel,
        ..LoadOptions::default()
    };

    let backend: Arc<dyn Backend> = Arc::new(Memory::new(chain_dump()).unwrap());
    assert!(matches!(
        HeapDump::load_with(backend, &options),
        Err(Error::Cancelled)
    ));
}

struct Recorder(Mutex<Vec<u32>>);

impl Progress for Recorder {
    fn report(&self, percent: u32) {
        self.0.lock().unwrap().push(percent);
    }
}

#[test]
fn progress_is_monotonic_and_completes() {
    let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
    let options = LoadOptions {
        progress: Arc::clone(&recorder) as Arc<dyn Progress>,
        ..LoadOptions::default()
    };

    let backend: Arc<dyn Backend> = Arc::new(Memory::new(chain_dump()).unwrap());
    HeapDump::load_with(backend, &options).unwrap();

    let reports = recorder.0.lock().unwrap();
    assert!(!reports.is_empty());
    assert!(reports.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(*reports.last().unwrap(), 100);
    assert!(reports.iter().all(|&p| p <= 100));
}

#[test]
fn progress_stays_monotonic_across_parallel_extraction() {
    // Enough objects that the parallel pass reports from several workers.
    let mut dump = DumpWriter::new();
    dump.utf8(0x1000, "com.example.Node")
        .load_class(0x100, 0x1000);
    let mut segment = SegmentWriter::new();
    segment.class(0x100, 0, 24, &[(0x1000, TYPE_OBJECT)]);
    let n = 10_000u64;
    for i in 1..=n {
        // Each node holds its predecessor; node 1 holds null.
        segment.instance(i, 0x100, &[i - 1]);
    }
    segment.root(n);
    dump.segment(segment).end();

    let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
    let options = LoadOptions {
        progress: Arc::clone(&recorder) as Arc<dyn Progress>,
        ..LoadOptions::default()
    };

    let backend: Arc<dyn Backend> = Arc::new(Memory::new(dump.into_bytes()).unwrap());
    HeapDump::load_with(backend, &options).unwrap();

    let reports = recorder.0.lock().unwrap();
    assert!(reports.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(reports.iter().any(|&p| p > 50 && p < 100));
    assert_eq!(*reports.last().unwrap(), 100);
}

#[test]
fn loading_is_deterministic() {
    let first = load(chain_dump());
    let second = load(chain_dump());

    let a = first.summary().unwrap();
    let b = second.summary().unwrap();
    assert_eq!(a.object_count, b.object_count);
    assert_eq!(a.edge_count, b.edge_count);
    assert_eq!(
        first.shortest_path_to_root(0x1).unwrap(),
        second.shortest_path_to_root(0x1).unwrap()
    );
    assert_eq!(
        first.retained_size(0x3).unwrap(),
        second.retained_size(0x3).unwrap()
    );
}
