//! Per-segment sort value resolution
//!
//! Two strategies resolve the sort value of a document:
//!
//! - [`LazyResolver`] reads the one stored field of the one document asked
//!   for, remembering the previous lookup because comparators typically ask
//!   for the same document twice in a row (compare, then copy).
//! - [`EagerResolver`] materializes the whole segment's values with a single
//!   term scan.
//!
//! [`AdaptiveResolver`] starts every segment lazy and switches to eager once
//! the number of lookups exceeds `max_doc / sample_ratio`. The switch is
//! sticky until the next segment. Both strategies apply the same selection
//! rule, so the switch never changes a value.

use std::io;
use std::sync::Arc;

use fieldex_core::{Error, Result};
use fieldex_index::{resolve_values, stored_value, FieldComparator, IndexReader};

// ============================================================================
// LazyResolver
// ============================================================================

/// Resolves values one stored document at a time.
pub struct LazyResolver<V> {
    reader: Arc<dyn IndexReader>,
    field: Arc<str>,
    last: Option<(u32, Option<V>)>,
    fetches: usize,
}

impl<V: Clone> LazyResolver<V> {
    /// Resolver over one segment
    pub fn new(reader: Arc<dyn IndexReader>, field: Arc<str>) -> Self {
        LazyResolver {
            reader,
            field,
            last: None,
            fetches: 0,
        }
    }

    /// Value of `doc`; repeated lookups of the same document hit the cache
    pub fn value<C>(&mut self, comparator: &C, doc: u32) -> io::Result<Option<V>>
    where
        C: FieldComparator<Value = V> + ?Sized,
    {
        if let Some((last_doc, value)) = &self.last {
            if *last_doc == doc {
                return Ok(value.clone());
            }
        }
        let value = stored_value(&*self.reader, doc, &self.field, comparator)?;
        self.fetches += 1;
        self.last = Some((doc, value.clone()));
        Ok(value)
    }

    /// Stored-field reads performed so far
    pub fn fetches(&self) -> usize {
        self.fetches
    }
}

// ============================================================================
// EagerResolver
// ============================================================================

/// Holds every document's value of one segment.
#[derive(Debug, Clone)]
pub struct EagerResolver<V> {
    values: Vec<Option<V>>,
}

impl<V: Clone> EagerResolver<V> {
    /// Scan the whole field once
    pub fn load<C>(reader: &dyn IndexReader, field: &str, comparator: &C) -> io::Result<Self>
    where
        C: FieldComparator<Value = V> + ?Sized,
    {
        Ok(EagerResolver {
            values: resolve_values(reader, field, comparator)?,
        })
    }

    /// Value of `doc`
    pub fn value(&self, doc: u32) -> Option<V> {
        self.values.get(doc as usize).cloned().flatten()
    }

    /// Number of document slots
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for an empty segment
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// AdaptiveResolver
// ============================================================================

/// Which strategy is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No segment set yet
    Uninitialized,
    /// Per-document stored-field reads
    Lazy,
    /// Whole segment materialized
    Hungry,
}

enum State<V> {
    Uninitialized,
    Lazy(LazyResolver<V>),
    Hungry(EagerResolver<V>),
}

/// Lazy-then-hungry resolver for one sort field.
pub struct AdaptiveResolver<C: FieldComparator> {
    comparator: C,
    field: Arc<str>,
    sample_ratio: u32,
    reader: Option<Arc<dyn IndexReader>>,
    counter: u32,
    threshold: u32,
    state: State<C::Value>,
}

impl<C: FieldComparator> AdaptiveResolver<C> {
    /// Resolver for `field`; `sample_ratio` must be non-zero
    pub fn new(field: impl Into<Arc<str>>, comparator: C, sample_ratio: u32) -> Self {
        AdaptiveResolver {
            comparator,
            field: field.into(),
            sample_ratio: sample_ratio.max(1),
            reader: None,
            counter: 0,
            threshold: 0,
            state: State::Uninitialized,
        }
    }

    /// Move to the next segment: counter reset, lazy mode
    pub fn set_next_segment(&mut self, reader: Arc<dyn IndexReader>) {
        self.counter = 0;
        self.threshold = reader.max_doc() / self.sample_ratio;
        self.state = State::Lazy(LazyResolver::new(Arc::clone(&reader), Arc::clone(&self.field)));
        self.reader = Some(reader);
    }

    /// Sort value of a segment-local document.
    ///
    /// # Errors
    ///
    /// Any index failure is returned as [`Error::SortValue`].
    pub fn value(&mut self, doc: u32) -> Result<Option<C::Value>> {
        self.counter = self.counter.saturating_add(1);
        if self.counter > self.threshold {
            if let State::Lazy(lazy) = &self.state {
                let lazy_fetches = lazy.fetches();
                if let Some(reader) = self.reader.clone() {
                    tracing::debug!(
                        target: "fieldex::sort",
                        field = %self.field,
                        max_doc = reader.max_doc(),
                        threshold = self.threshold,
                        lazy_fetches,
                        "Switching sort to hungry mode"
                    );
                    let eager = EagerResolver::load(reader.as_ref(), &self.field, &self.comparator)
                        .map_err(|e| Error::sort_value(self.field.as_ref(), doc, e))?;
                    self.state = State::Hungry(eager);
                }
            }
        }

        match &mut self.state {
            State::Uninitialized => Err(Error::invalid_input(format!(
                "sort on '{}' resolved a value before any segment was set",
                self.field
            ))),
            State::Lazy(lazy) => lazy
                .value(&self.comparator, doc)
                .map_err(|e| Error::sort_value(self.field.as_ref(), doc, e)),
            State::Hungry(eager) => Ok(eager.value(doc)),
        }
    }

    /// Active strategy
    pub fn mode(&self) -> Mode {
        match self.state {
            State::Uninitialized => Mode::Uninitialized,
            State::Lazy(_) => Mode::Lazy,
            State::Hungry(_) => Mode::Hungry,
        }
    }

    /// Lookups allowed in lazy mode for the current segment
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Sort field
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Value comparator
    pub fn comparator(&self) -> &C {
        &self.comparator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldex_index::{Document, NumberComparator, SegmentBuilder, TextComparator};

    fn segment(n: u32) -> Arc<dyn IndexReader> {
        let mut builder = SegmentBuilder::new(0);
        for i in 0..n {
            builder.add_document(Document::new().field("n", (i % 7).to_string()));
        }
        Arc::new(builder.build().unwrap())
    }

    #[test]
    fn test_lazy_caches_previous_lookup() {
        let mut lazy = LazyResolver::new(segment(10), Arc::from("n"));
        assert_eq!(lazy.value(&NumberComparator, 3).unwrap(), Some(3.0));
        assert_eq!(lazy.value(&NumberComparator, 3).unwrap(), Some(3.0));
        assert_eq!(lazy.fetches(), 1);
        assert_eq!(lazy.value(&NumberComparator, 8).unwrap(), Some(1.0));
        assert_eq!(lazy.fetches(), 2);
    }

    #[test]
    fn test_eager_out_of_range_is_none() {
        let reader = segment(3);
        let eager = EagerResolver::load(reader.as_ref(), "n", &TextComparator).unwrap();
        assert_eq!(eager.len(), 3);
        assert!(eager.value(5).is_none());
    }

    #[test]
    fn test_switches_after_threshold() {
        let mut r = AdaptiveResolver::new("n", NumberComparator, 500);
        assert_eq!(r.mode(), Mode::Uninitialized);
        assert!(r.value(0).is_err());

        r.set_next_segment(segment(1500));
        assert_eq!(r.threshold(), 3);
        for doc in 0..3 {
            r.value(doc).unwrap();
            assert_eq!(r.mode(), Mode::Lazy);
        }
        assert_eq!(r.value(3).unwrap(), Some(3.0));
        assert_eq!(r.mode(), Mode::Hungry);

        // sticky until the next segment
        r.value(4).unwrap();
        assert_eq!(r.mode(), Mode::Hungry);
        r.set_next_segment(segment(1500));
        assert_eq!(r.mode(), Mode::Lazy);
    }

    #[test]
    fn test_small_segment_goes_hungry_immediately() {
        let mut r = AdaptiveResolver::new("n", NumberComparator, 500);
        r.set_next_segment(segment(10));
        assert_eq!(r.threshold(), 0);
        assert_eq!(r.value(9).unwrap(), Some(2.0));
        assert_eq!(r.mode(), Mode::Hungry);
    }
}
