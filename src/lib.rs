//! fieldex - issue search plumbing over a term dictionary
//!
//! fieldex maps JQL clause names to the clause handlers registered by system
//! and custom fields, filters them by user permission, evaluates clauses
//! against immutable index segments and sorts results by field values.
//!
//! # Quick Start
//!
//! ```ignore
//! use fieldex::{Clause, Operator, Query, SearchService, SortField, SortKind};
//!
//! let service = SearchService::open(path, registry)?;
//! let query = Query::all().and(Clause::new("status", Operator::Equals, ["Open"]));
//! let sort = SortField::descending("votes", SortKind::Number);
//! let results = service.search(Some(&user), &query, Some(&sort), 50)?;
//! ```
//!
//! # Architecture
//!
//! - `fieldex-core`: shared types, collaborator traits, errors, config
//! - `fieldex-index`: segments, term scans and match handlers
//! - `fieldex-handlers`: clause indexer and the search handler manager
//! - `fieldex-sort`: adaptive field sort comparators and top-N collection
//! - `fieldex-engine`: the search service tying them together

pub use fieldex_core::*;
pub use fieldex_engine::{
    open_index_dir, segment_file_name, SearchResults, SearchService, SortField, SortKind,
    SEGMENT_EXTENSION,
};
pub use fieldex_handlers::{
    CacheEvent, CacheEventBus, CacheEventListener, ClauseIndexer, Helper, ModuleKind,
    SearchHandlerManager, SearcherGroup,
};
pub use fieldex_index::{
    collect_matches, field_contains_term, resolve_values, term_values_for_field,
    AllValuesHandler, DocTerms, Document, FieldComparator, IndexReader, MatchHandler,
    NumberComparator, Reverse, Segment, SegmentBuilder, SegmentedIndex, SingleValueHandler,
    TextComparator,
};
pub use fieldex_sort::{MappedSortComparator, TopFieldCollector};
