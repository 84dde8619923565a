//! Field sorting for fieldex
//!
//! This crate provides:
//! - AdaptiveResolver: per-segment sort values, lazy at first and switching
//!   to a whole-segment scan once lookups pass a sampling threshold
//! - SlotValues: bounded, growable slot storage
//! - MappedSortComparator: slot/bottom comparator with missing values last
//! - TopFieldCollector: bounded top-N collection with stable ties

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collector;
pub mod comparator;
pub mod resolver;
pub mod slots;

pub use collector::{FieldHit, TopDocs, TopFieldCollector};
pub use comparator::{compare_nulls_last, MappedSortComparator};
pub use resolver::{AdaptiveResolver, EagerResolver, LazyResolver, Mode};
pub use slots::SlotValues;
