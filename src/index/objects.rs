//! Object table: identity, placement, and dense numbering for every heap object.
//!
//! Every object the dump contains - instances, object arrays, primitive arrays, and
//! class objects - gets one entry mapping its identifier to its kind, class, shallow
//! size, and the file offset of its payload. Entries are additionally assigned a
//! dense `u32` number in ascending identifier order; the reverse-reference index and
//! the dominator computation address objects exclusively through those numbers.
//!
//! The table is backed by a `crossbeam_skiplist::SkipMap`, which keeps identifiers
//! ordered during the concurrent build and serves ordered range scans afterwards
//! without a separate sort.
//!
//! # Key Components
//!
//! - [`ObjectKind`] - Which sub-record kind produced the entry
//! - [`ObjectEntry`] - One object's placement, class, sizes, and dense number
//! - [`ObjectTable`] - Lookup by identifier or dense number, ordered iteration

use crossbeam_skiplist::SkipMap;

/// The kind of heap object an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A plain instance with a field payload.
    Instance,
    /// An array of object references.
    ObjectArray,
    /// An array of primitive values; holds no outgoing references.
    PrimitiveArray,
    /// A class object. Its outgoing references are its static reference fields.
    Class,
}

/// One object's entry in the table.
///
/// `data_offset`/`data_len` locate the undecoded payload in the backing file:
/// field bytes for instances, element identifiers for object arrays. Primitive
/// arrays and class objects carry no lazily decoded payload and use zero.
#[derive(Debug, Clone, Copy)]
pub struct ObjectEntry {
    /// Dense number of this object, unique and ascending with the identifier.
    pub dense: u32,
    /// What kind of object this is.
    pub kind: ObjectKind,
    /// Identifier of the object's class. Zero for primitive arrays and class
    /// objects, whose type is implied by their kind.
    pub class_id: u64,
    /// Offset of the payload bytes within the dump.
    pub data_offset: u64,
    /// Length of the payload bytes.
    pub data_len: u64,
    /// Shallow size of the object in bytes.
    pub shallow: u64,
}

/// Placement of one object collected during the sequential scan, before dense
/// numbers are assigned.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Placement {
    pub object_id: u64,
    pub kind: ObjectKind,
    pub class_id: u64,
    pub data_offset: u64,
    pub data_len: u64,
    pub shallow: u64,
}

/// Immutable table of every object in the dump.
///
/// Frozen after the first indexing pass. Supports identifier lookup, dense-number
/// lookup, and iteration in ascending identifier order (which is also ascending
/// dense order).
#[derive(Debug, Default)]
pub struct ObjectTable {
    entries: SkipMap<u64, ObjectEntry>,
    by_dense: Vec<u64>,
    shallow: Vec<u64>,
}

impl ObjectTable {
    /// Build the table from collected placements, assigning dense numbers in
    /// ascending identifier order.
    ///
    /// Duplicate identifiers keep their first placement; the caller reports the
    /// duplicates it detects. Returns the table, or `None` when the dense space
    /// would overflow `u32` (a dump with more than four billion objects).
    pub(crate) fn from_placements(mut placements: Vec<Placement>) -> Option<Self> {
        // Stable sort: equal identifiers stay in file order, so dedup keeps
        // the first placement.
        placements.sort_by_key(|p| p.object_id);
        placements.dedup_by_key(|p| p.object_id);

        if u32::try_from(placements.len()).is_err() {
            return None;
        }

        let entries = SkipMap::new();
        let mut by_dense = Vec::with_capacity(placements.len());
        let mut shallow = Vec::with_capacity(placements.len());

        for (dense, p) in placements.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let dense = dense as u32;
            entries.insert(
                p.object_id,
                ObjectEntry {
                    dense,
                    kind: p.kind,
                    class_id: p.class_id,
                    data_offset: p.data_offset,
                    data_len: p.data_len,
                    shallow: p.shallow,
                },
            );
            by_dense.push(p.object_id);
            shallow.push(p.shallow);
        }

        Some(Self {
            entries,
            by_dense,
            shallow,
        })
    }

    /// Look up an object by its identifier.
    #[must_use]
    pub fn get(&self, object_id: u64) -> Option<ObjectEntry> {
        self.entries.get(&object_id).map(|e| *e.value())
    }

    /// The dense number of an object, if present.
    #[must_use]
    pub fn dense_of(&self, object_id: u64) -> Option<u32> {
        self.get(object_id).map(|e| e.dense)
    }

    /// The identifier of the object with the given dense number.
    #[must_use]
    pub fn id_of(&self, dense: u32) -> Option<u64> {
        self.by_dense.get(dense as usize).copied()
    }

    /// The shallow size of the object with the given dense number.
    #[must_use]
    pub fn shallow_of(&self, dense: u32) -> u64 {
        self.shallow.get(dense as usize).copied().unwrap_or(0)
    }

    /// Shallow sizes indexed by dense number.
    #[must_use]
    pub fn shallow_sizes(&self) -> &[u64] {
        &self.shallow
    }

    /// Number of objects in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_dense.len()
    }

    /// Returns `true` if the table holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_dense.is_empty()
    }

    /// Iterate entries in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, ObjectEntry)> + '_ {
        self.entries.iter().map(|e| (*e.key(), *e.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(object_id: u64, shallow: u64) -> Placement {
        Placement {
            object_id,
            kind: ObjectKind::Instance,
            class_id: 0x10,
            data_offset: 0x100,
            data_len: 16,
            shallow,
        }
    }

    #[test]
    fn dense_numbers_follow_identifier_order() {
        // Deliberately out of order.
        let table = ObjectTable::from_placements(vec![
            placement(0x30, 24),
            placement(0x10, 16),
            placement(0x20, 32),
        ])
        .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.dense_of(0x10), Some(0));
        assert_eq!(table.dense_of(0x20), Some(1));
        assert_eq!(table.dense_of(0x30), Some(2));
        assert_eq!(table.id_of(1), Some(0x20));
        assert_eq!(table.id_of(3), None);
        assert_eq!(table.shallow_of(2), 24);
        assert_eq!(table.shallow_sizes(), &[16, 32, 24]);
    }

    #[test]
    fn duplicates_keep_first() {
        let table = ObjectTable::from_placements(vec![
            placement(0x10, 16),
            Placement {
                shallow: 999,
                ..placement(0x10, 16)
            },
        ])
        .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0x10).unwrap().shallow, 16);
    }

    #[test]
    fn interleaved_duplicates_keep_first_file_order() {
        let mut placements = Vec::new();
        for round in 0..4u64 {
            for id in [0x30, 0x10, 0x20] {
                placements.push(placement(id, (round + 1) * 100 + id));
            }
        }

        let table = ObjectTable::from_placements(placements).unwrap();

        assert_eq!(table.len(), 3);
        // Each identifier's first occurrence came from round zero.
        assert_eq!(table.get(0x10).unwrap().shallow, 100 + 0x10);
        assert_eq!(table.get(0x20).unwrap().shallow, 100 + 0x20);
        assert_eq!(table.get(0x30).unwrap().shallow, 100 + 0x30);
    }

    #[test]
    fn iteration_is_ordered() {
        let table = ObjectTable::from_placements(vec![
            placement(5, 1),
            placement(1, 1),
            placement(3, 1),
        ])
        .unwrap();

        let ids: Vec<u64> = table.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn missing_lookups() {
        let table = ObjectTable::from_placements(vec![placement(1, 8)]).unwrap();
        assert!(table.get(2).is_none());
        assert!(table.dense_of(2).is_none());
        assert_eq!(table.shallow_of(9), 0);
    }
}
