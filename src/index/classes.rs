//! Class table: class metadata, hierarchy walks, and name resolution.
//!
//! Classes form a tree through superclass identifiers. The chain is walked
//! iteratively over explicit parent IDs - never recursively - because real dumps
//! contain hierarchies hundreds of classes deep and, when corrupt, cyclic.
//!
//! # Key Components
//!
//! - [`ClassInfo`] - One class: identity, layout, statics, resolved name
//! - [`ClassTable`] - Lookup by ID and by name, subclass expansion, chain iteration

use std::collections::HashMap;

use crate::format::FieldDescriptor;

/// Metadata for a single class from the dump.
///
/// Field layout covers only the fields this class declares; an instance's full
/// layout is the concatenation of its class's fields followed by each superclass's
/// fields in chain order, which is exactly how HPROF serializes instance payloads.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    /// The class object's identifier.
    pub class_id: u64,
    /// Superclass identifier, `0` at the root of the hierarchy.
    pub super_id: u64,
    /// Fully qualified class name, when the dump's string table resolves it.
    pub name: Option<String>,
    /// Declared size of one instance's field data in bytes.
    pub instance_size: u32,
    /// Instance fields declared by this class, in file order.
    pub fields: Vec<FieldDescriptor>,
    /// Non-null object references held in static fields.
    pub static_refs: Vec<u64>,
    /// Total bytes of static field storage.
    pub static_storage: u32,
}

/// Immutable table of all classes in the dump.
///
/// Built once during the first indexing pass and frozen. Offers ID lookup, name
/// lookup (used by language fragments), subclass expansion, and iterative
/// superclass-chain walks.
#[derive(Debug, Default)]
pub struct ClassTable {
    classes: HashMap<u64, ClassInfo>,
    by_name: HashMap<String, u64>,
    children: HashMap<u64, Vec<u64>>,
}

impl ClassTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a class. Returns `false` (and keeps the existing entry) on a
    /// duplicate class ID.
    pub(crate) fn insert(&mut self, class: ClassInfo) -> bool {
        if self.classes.contains_key(&class.class_id) {
            return false;
        }

        if let Some(name) = &class.name {
            self.by_name.entry(name.clone()).or_insert(class.class_id);
        }
        self.classes.insert(class.class_id, class);
        true
    }

    /// Attach a resolved name to an already inserted class.
    pub(crate) fn set_name(&mut self, class_id: u64, name: String) {
        if let Some(class) = self.classes.get_mut(&class_id) {
            self.by_name.entry(name.clone()).or_insert(class_id);
            class.name = Some(name);
        }
    }

    /// Build the child adjacency used for subclass expansion.
    ///
    /// Must be called once after all classes are inserted. Superclass references
    /// to classes absent from the table are ignored here; the builder reports
    /// them as diagnostics.
    pub(crate) fn build_hierarchy(&mut self) {
        let mut children: HashMap<u64, Vec<u64>> = HashMap::new();
        for class in self.classes.values() {
            if class.super_id != 0 && self.classes.contains_key(&class.super_id) {
                children.entry(class.super_id).or_default().push(class.class_id);
            }
        }
        for list in children.values_mut() {
            list.sort_unstable();
        }
        self.children = children;
    }

    /// Look up a class by its identifier.
    #[must_use]
    pub fn get(&self, class_id: u64) -> Option<&ClassInfo> {
        self.classes.get(&class_id)
    }

    /// Look up a class by its fully qualified name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&ClassInfo> {
        self.by_name.get(name).and_then(|id| self.classes.get(id))
    }

    /// Number of classes in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if the table holds no classes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Iterate over all classes in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.values()
    }

    /// Iterate the superclass chain starting at `class_id` (inclusive).
    ///
    /// The walk is iterative and guards against cycles by bounding the chain
    /// length at the table size.
    pub fn superclass_chain(&self, class_id: u64) -> SuperclassIter<'_> {
        SuperclassIter {
            table: self,
            current: class_id,
            remaining: self.classes.len(),
        }
    }

    /// The class IDs of `class_id` and all its transitive subclasses, ascending.
    ///
    /// Returns `None` when `class_id` is not in the table.
    #[must_use]
    pub fn subtree(&self, class_id: u64) -> Option<Vec<u64>> {
        if !self.classes.contains_key(&class_id) {
            return None;
        }

        let mut result = Vec::new();
        let mut stack = vec![class_id];
        while let Some(id) = stack.pop() {
            result.push(id);
            if let Some(kids) = self.children.get(&id) {
                stack.extend_from_slice(kids);
            }
        }
        result.sort_unstable();
        Some(result)
    }
}

/// Iterator over a superclass chain, produced by [`ClassTable::superclass_chain`].
pub struct SuperclassIter<'a> {
    table: &'a ClassTable,
    current: u64,
    remaining: usize,
}

impl<'a> Iterator for SuperclassIter<'a> {
    type Item = &'a ClassInfo;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == 0 || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let class = self.table.get(self.current)?;
        self.current = class.super_id;
        Some(class)
    }
}
