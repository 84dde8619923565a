//! Search engine for fieldex
//!
//! This crate ties the lower layers together:
//! - SearchService: resolves clauses through the search handler manager,
//!   evaluates them against every segment and collects sorted or unsorted
//!   results
//! - Directory layout: `fieldex.toml` plus `*.fidx` segment files
//!
//! The engine is the only component that knows about both clause handlers
//! and index segments.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod directory;
pub mod service;

pub use directory::{open_index_dir, segment_file_name, SEGMENT_EXTENSION};
pub use service::{SearchResults, SearchService, SortField, SortKind};
