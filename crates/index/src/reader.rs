//! Index reader contract
//!
//! The scanning and sorting layers only need four things from a segment:
//! its document count, an ordered term cursor seekable to a (field, text)
//! position, the postings of the current term, and random access to one
//! stored field of one document.
//!
//! Term dictionaries are field-major: a cursor walks every term of a field
//! in ascending text order and then carries on into the next field. Callers
//! scanning one field must stop at the first term of a different field.

use std::fmt;
use std::io;
use std::sync::Arc;

/// A (field, text) pair borrowed from a term cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TermRef<'a> {
    /// Field name
    pub field: &'a str,
    /// Term text
    pub text: &'a str,
}

impl<'a> TermRef<'a> {
    /// True if this term belongs to `field`
    pub fn is_field(&self, field: &str) -> bool {
        self.field == field
    }
}

/// Ascending document ids of one term.
pub trait PostingCursor {
    /// Next document id, `None` when exhausted
    fn next_doc(&mut self) -> io::Result<Option<u32>>;
}

/// Ordered walk over a term dictionary.
pub trait TermCursor {
    /// Current term, `None` when the dictionary is exhausted
    fn term(&self) -> Option<TermRef<'_>>;

    /// Number of documents carrying the current term (0 when exhausted)
    fn doc_freq(&self) -> u32;

    /// Move to the next term in (field, text) order
    fn advance(&mut self) -> io::Result<()>;

    /// Postings of the current term (empty when exhausted)
    fn postings(&self) -> io::Result<Box<dyn PostingCursor + '_>>;
}

/// Read-only access to one index segment.
///
/// Implementations must be safe to share between threads without locking.
pub trait IndexReader: Send + Sync {
    /// Number of document slots; document ids are `0..max_doc`
    fn max_doc(&self) -> u32;

    /// Cursor positioned at the first term ≥ (field, text)
    fn terms_from(&self, field: &str, text: &str) -> io::Result<Box<dyn TermCursor + '_>>;

    /// Stored values of a single field of a single document, in stored order
    fn stored_values(&self, doc: u32, field: &str) -> io::Result<Vec<String>>;
}

// ============================================================================
// SegmentedIndex
// ============================================================================

/// One segment reader and the offset of its first document in the whole index.
#[derive(Clone)]
pub struct Leaf {
    reader: Arc<dyn IndexReader>,
    doc_base: u32,
}

impl Leaf {
    /// Segment reader
    pub fn reader(&self) -> &dyn IndexReader {
        self.reader.as_ref()
    }

    /// Shared handle to the segment reader
    pub fn shared_reader(&self) -> &Arc<dyn IndexReader> {
        &self.reader
    }

    /// Global id of this segment's document 0
    pub fn doc_base(&self) -> u32 {
        self.doc_base
    }
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leaf")
            .field("doc_base", &self.doc_base)
            .field("max_doc", &self.reader.max_doc())
            .finish()
    }
}

/// Ordered list of segments forming one logical index.
///
/// Global document id = leaf doc base + segment-local id.
#[derive(Clone, Debug, Default)]
pub struct SegmentedIndex {
    leaves: Vec<Leaf>,
    max_doc: u32,
}

impl SegmentedIndex {
    /// Build from segment readers in order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the segments hold more documents than a
    /// u32 global id can address.
    pub fn new(readers: Vec<Arc<dyn IndexReader>>) -> io::Result<Self> {
        let mut leaves = Vec::with_capacity(readers.len());
        let mut doc_base = 0u32;
        for reader in readers {
            let max_doc = reader.max_doc();
            leaves.push(Leaf { reader, doc_base });
            doc_base = doc_base.checked_add(max_doc).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "segment {} with {} documents overflows u32 global doc ids",
                        leaves.len() - 1,
                        max_doc
                    ),
                )
            })?;
        }
        Ok(SegmentedIndex {
            leaves,
            max_doc: doc_base,
        })
    }

    /// Segments in order
    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    /// Total document slots across all segments
    pub fn max_doc(&self) -> u32 {
        self.max_doc
    }

    /// Map a global document id to (leaf, segment-local id)
    pub fn locate(&self, global_doc: u32) -> Option<(&Leaf, u32)> {
        let idx = self
            .leaves
            .partition_point(|leaf| leaf.doc_base <= global_doc)
            .checked_sub(1)?;
        let leaf = &self.leaves[idx];
        let local = global_doc - leaf.doc_base;
        (local < leaf.reader.max_doc()).then_some((leaf, local))
    }
}
