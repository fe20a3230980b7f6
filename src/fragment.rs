//! Guest-language heap fragments.
//!
//! A polyglot runtime's heap contains objects of several guest languages side by
//! side, all encoded as ordinary Java objects. Each guest language is identified
//! by a marker class: every object whose class descends from the marker belongs
//! to that language. A fragment is the projection of the dump onto one language -
//! the same dump, filtered.
//!
//! Fragments are cheap views. Detection resolves the marker class once and
//! expands its subclass set; membership tests and reference filtering afterwards
//! are table lookups against the shared index. Queries through a fragment behave
//! like the whole-heap queries but never surface objects outside the language.

use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    index::{HeapIndex, ReferenceEdge},
    Error, Result,
};

/// The projection of one heap dump onto a single guest language.
///
/// Created through [`HeapFragment::detect`]; holds the shared index alive.
pub struct HeapFragment {
    index: Arc<HeapIndex>,
    tag: String,
    marker_class: String,
    /// The marker class and all its transitive subclasses.
    class_ids: HashSet<u64>,
}

impl HeapFragment {
    /// Build the fragment for `tag` whose objects are instances of
    /// `marker_class` or any of its subclasses.
    ///
    /// # Errors
    /// Returns [`Error::UnknownLanguageTag`] when the marker class is absent
    /// from the dump - the dump then simply contains no such language.
    pub fn detect(
        index: Arc<HeapIndex>,
        tag: impl Into<String>,
        marker_class: impl Into<String>,
    ) -> Result<Self> {
        let tag = tag.into();
        let marker_class = marker_class.into();

        let marker = index
            .classes()
            .get_by_name(&marker_class)
            .ok_or_else(|| Error::UnknownLanguageTag(tag.clone()))?;
        let class_ids: HashSet<u64> = index
            .classes()
            .subtree(marker.class_id)
            .unwrap_or_default()
            .into_iter()
            .collect();

        Ok(Self {
            index,
            tag,
            marker_class,
            class_ids,
        })
    }

    /// The language tag this fragment was detected for.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The marker class name that identifies the language.
    #[must_use]
    pub fn marker_class(&self) -> &str {
        &self.marker_class
    }

    /// Returns `true` if the object belongs to this language.
    #[must_use]
    pub fn contains(&self, object_id: u64) -> bool {
        self.index
            .objects()
            .get(object_id)
            .is_some_and(|entry| self.class_ids.contains(&entry.class_id))
    }

    /// Identifiers of every object of this language, ascending.
    #[must_use]
    pub fn instances(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .class_ids
            .iter()
            .flat_map(|&class_id| self.index.instance_ids(class_id).iter().copied())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of objects of this language.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.class_ids
            .iter()
            .map(|&class_id| self.index.instance_ids(class_id).len())
            .sum()
    }

    /// Outgoing references of an object, restricted to targets inside the
    /// language.
    ///
    /// # Errors
    /// Returns [`Error::UnknownObject`] for objects absent from the dump or
    /// outside this fragment.
    pub fn outgoing_references(&self, object_id: u64) -> Result<Vec<ReferenceEdge>> {
        if !self.contains(object_id) {
            return Err(Error::UnknownObject(object_id));
        }

        Ok(self
            .index
            .outgoing_ids(object_id)?
            .into_iter()
            .filter(|&target| self.contains(target))
            .map(|target| ReferenceEdge {
                from: object_id,
                to: target,
            })
            .collect())
    }

    /// Incoming references of an object, restricted to referrers inside the
    /// language.
    ///
    /// # Errors
    /// Returns [`Error::UnknownObject`] for objects absent from the dump or
    /// outside this fragment.
    pub fn incoming_references(&self, object_id: u64) -> Result<Vec<ReferenceEdge>> {
        if !self.contains(object_id) {
            return Err(Error::UnknownObject(object_id));
        }

        Ok(self
            .index
            .incoming_ids(object_id)?
            .into_iter()
            .filter(|&referrer| self.contains(referrer))
            .map(|referrer| ReferenceEdge {
                from: referrer,
                to: object_id,
            })
            .collect())
    }
}

impl std::fmt::Debug for HeapFragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapFragment")
            .field("tag", &self.tag)
            .field("marker_class", &self.marker_class)
            .field("classes", &self.class_ids.len())
            .finish()
    }
}
