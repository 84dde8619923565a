//! Bounded top-N collection over a field comparator
//!
//! The collector keeps a binary heap of slots whose root is the worst
//! retained document. Equal values are ordered by ascending global document
//! id, so results are stable with respect to collection order.

use std::cmp::Ordering;
use std::sync::Arc;

use fieldex_core::{Error, Result, SortConfig};
use fieldex_index::{FieldComparator, IndexReader, Leaf};

use crate::comparator::MappedSortComparator;

/// One retained document.
#[derive(Debug, Clone, Copy)]
struct Entry {
    slot: usize,
    doc: u32,
}

/// A sorted hit: global document id and its sort value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldHit<V> {
    /// Global document id
    pub doc: u32,
    /// Sort value, `None` when the document has no value
    pub value: Option<V>,
}

/// Result of a sorted collection.
#[derive(Debug, Clone, PartialEq)]
pub struct TopDocs<V> {
    /// Documents offered to the collector
    pub total_hits: usize,
    /// Best first
    pub hits: Vec<FieldHit<V>>,
}

/// Collects the best `num_hits` documents by one field.
pub struct TopFieldCollector<C: FieldComparator> {
    comparator: MappedSortComparator<C>,
    heap: Vec<Entry>,
    num_hits: usize,
    doc_base: u32,
    total_hits: usize,
}

impl<C: FieldComparator> TopFieldCollector<C> {
    /// Collector keeping the top `num_hits` documents
    pub fn new(field: impl Into<Arc<str>>, comparator: C, num_hits: usize, config: &SortConfig) -> Self {
        TopFieldCollector {
            comparator: MappedSortComparator::new(field, comparator, num_hits, config),
            heap: Vec::with_capacity(num_hits.min(config.initial_slot_capacity)),
            num_hits,
            doc_base: 0,
            total_hits: 0,
        }
    }

    /// Start collecting documents of the next segment
    pub fn set_next_segment(&mut self, reader: Arc<dyn IndexReader>, doc_base: u32) {
        self.doc_base = doc_base;
        self.comparator.set_next_segment(reader);
    }

    /// Start collecting documents of `leaf`
    pub fn set_next_leaf(&mut self, leaf: &Leaf) {
        self.set_next_segment(Arc::clone(leaf.shared_reader()), leaf.doc_base());
    }

    /// Offer a segment-local document.
    ///
    /// Documents must be offered in ascending global id order for ties to
    /// keep collection order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SortValue`] if the document's value cannot be read;
    /// the collection is then unusable. A global id past `u32::MAX` is
    /// [`Error::InvalidInput`].
    pub fn collect(&mut self, doc: u32) -> Result<()> {
        self.total_hits += 1;
        if self.num_hits == 0 {
            return Ok(());
        }
        let global = self.doc_base.checked_add(doc).ok_or_else(|| {
            Error::invalid_input(format!(
                "document {} at doc base {} overflows u32 global ids",
                doc, self.doc_base
            ))
        })?;

        if self.heap.len() < self.num_hits {
            let slot = self.heap.len();
            self.comparator.copy(slot, doc)?;
            self.heap.push(Entry { slot, doc: global });
            self.sift_up(slot);
            if self.heap.len() == self.num_hits {
                self.comparator.set_bottom(self.heap[0].slot);
            }
            return Ok(());
        }

        // equal to the bottom loses: the bottom has the smaller global id
        if self.comparator.compare_bottom(doc)? != Ordering::Greater {
            return Ok(());
        }
        let slot = self.heap[0].slot;
        self.comparator.copy(slot, doc)?;
        self.heap[0].doc = global;
        self.sift_down(0);
        self.comparator.set_bottom(self.heap[0].slot);
        Ok(())
    }

    /// Documents offered so far
    pub fn total_hits(&self) -> usize {
        self.total_hits
    }

    /// Retained documents, best first
    pub fn top_docs(&self) -> TopDocs<C::Value> {
        let mut entries = self.heap.clone();
        entries.sort_by(|a, b| self.order(a, b));
        TopDocs {
            total_hits: self.total_hits,
            hits: entries
                .into_iter()
                .map(|e| FieldHit {
                    doc: e.doc,
                    value: self.comparator.value(e.slot).cloned(),
                })
                .collect(),
        }
    }

    fn order(&self, a: &Entry, b: &Entry) -> Ordering {
        self.comparator
            .compare(a.slot, b.slot)
            .then_with(|| a.doc.cmp(&b.doc))
    }

    fn worse(&self, a: usize, b: usize) -> bool {
        self.order(&self.heap[a], &self.heap[b]) == Ordering::Greater
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !self.worse(i, parent) {
                break;
            }
            self.heap.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut worst = i;
            if left < len && self.worse(left, worst) {
                worst = left;
            }
            if right < len && self.worse(right, worst) {
                worst = right;
            }
            if worst == i {
                break;
            }
            self.heap.swap(i, worst);
            i = worst;
        }
    }
}
