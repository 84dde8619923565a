//! Term dictionary access for fieldex
//!
//! This crate provides:
//! - IndexReader / TermCursor / PostingCursor: the minimal contract a
//!   text-search segment must offer
//! - Segment: immutable, mmap-able segment with a field-major term
//!   dictionary, posting lists and stored fields
//! - SegmentBuilder: builds segments from documents
//! - term_finder: term-ordered scans resolving document → value mappings
//! - Match handlers: AllValuesHandler, SingleValueHandler
//! - FieldComparator: converts term text into sortable values
//! - query: evaluates an IndexQuery into a DocSet

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod comparator;
pub mod match_handler;
pub mod query;
pub mod reader;
pub mod segment;
pub mod term_finder;

pub use builder::{Document, SegmentBuilder};
pub use comparator::{FieldComparator, NumberComparator, Reverse, TextComparator};
pub use match_handler::{AllValuesHandler, DocTerms, MatchHandler, SingleValueHandler};
pub use query::{matching_docs, DocSet};
pub use reader::{IndexReader, Leaf, PostingCursor, SegmentedIndex, TermCursor, TermRef};
pub use segment::{Segment, MAX_TERM_BYTES};
pub use term_finder::{
    collect_matches, field_contains_term, resolve_values, select_value, stored_value,
    term_values_for_field,
};
