//! Slot-based field comparator
//!
//! [`MappedSortComparator`] follows the classic top-N field comparator
//! protocol: the collector copies competitive documents into numbered slots,
//! compares slots with each other, and compares incoming documents against
//! the current bottom slot. Missing values sort after every present value in
//! both directions of comparison.

use std::cmp::Ordering;
use std::ptr;
use std::sync::Arc;

use fieldex_core::{Result, SortConfig};
use fieldex_index::{FieldComparator, IndexReader};

use crate::resolver::{AdaptiveResolver, Mode};
use crate::slots::SlotValues;

/// Order two optional values, `None` last.
pub fn compare_nulls_last<C>(comparator: &C, a: Option<&C::Value>, b: Option<&C::Value>) -> Ordering
where
    C: FieldComparator + ?Sized,
{
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) if ptr::eq(a, b) => Ordering::Equal,
        (Some(a), Some(b)) => comparator.compare(a, b),
    }
}

/// Field comparator over mapped sort values with adaptive per-segment
/// resolution.
pub struct MappedSortComparator<C: FieldComparator> {
    resolver: AdaptiveResolver<C>,
    slots: SlotValues<C::Value>,
    bottom: Option<C::Value>,
}

impl<C: FieldComparator> MappedSortComparator<C> {
    /// Comparator for the top `num_hits` documents by `field`
    pub fn new(field: impl Into<Arc<str>>, comparator: C, num_hits: usize, config: &SortConfig) -> Self {
        MappedSortComparator {
            resolver: AdaptiveResolver::new(field, comparator, config.sample_ratio),
            slots: SlotValues::new(num_hits, config.initial_slot_capacity),
            bottom: None,
        }
    }

    /// Compare the values held in two slots
    pub fn compare(&self, slot1: usize, slot2: usize) -> Ordering {
        if slot1 == slot2 {
            return Ordering::Equal;
        }
        compare_nulls_last(
            self.resolver.comparator(),
            self.slots.get(slot1),
            self.slots.get(slot2),
        )
    }

    /// Compare the bottom slot against a segment-local document.
    ///
    /// `Greater` means the document sorts before the current bottom.
    ///
    /// # Errors
    ///
    /// Returns [`fieldex_core::Error::SortValue`] if the value cannot be read.
    pub fn compare_bottom(&mut self, doc: u32) -> Result<Ordering> {
        let value = self.resolver.value(doc)?;
        Ok(compare_nulls_last(
            self.resolver.comparator(),
            self.bottom.as_ref(),
            value.as_ref(),
        ))
    }

    /// Copy a segment-local document's value into `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`fieldex_core::Error::SortValue`] if the value cannot be read.
    pub fn copy(&mut self, slot: usize, doc: u32) -> Result<()> {
        let value = self.resolver.value(doc)?;
        self.slots.set(slot, value);
        Ok(())
    }

    /// Remember `slot` as the current bottom
    pub fn set_bottom(&mut self, slot: usize) {
        self.bottom = self.slots.get(slot).cloned();
    }

    /// Switch to the next segment
    pub fn set_next_segment(&mut self, reader: Arc<dyn IndexReader>) {
        self.resolver.set_next_segment(reader);
    }

    /// Value held in `slot`
    pub fn value(&self, slot: usize) -> Option<&C::Value> {
        self.slots.get(slot)
    }

    /// Resolution strategy for the current segment
    pub fn mode(&self) -> Mode {
        self.resolver.mode()
    }

    /// Sort field
    pub fn field(&self) -> &str {
        self.resolver.field()
    }
}
