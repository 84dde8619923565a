//! Core types and traits for fieldex
//!
//! This crate defines the foundational types shared by every layer:
//! - User, SearchContext: who is searching and where
//! - ClauseNames, ClauseInformation: how a JQL clause is named
//! - SearcherGroupType, SearcherInformation: UI-facing searcher metadata
//! - ClauseHandler, SearchHandler, SearcherRegistration: what a field registers
//! - Traits: collaborator seams (FieldRegistry, SearchableField, IssueSearcher,
//!   ClausePermissionHandler, ClauseQueryFactory)
//! - Query types: Clause, Query, IndexQuery
//! - Error: Error type hierarchy
//! - FieldexConfig: `fieldex.toml` settings

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod handler;
pub mod query;
pub mod traits;
pub mod types;

pub use config::{FieldexConfig, HandlerConfig, SortConfig, CONFIG_FILE_NAME};
pub use error::{Error, Result};
pub use handler::{ClauseHandler, SearchHandler, SearcherRegistration};
pub use query::{Clause, IndexQuery, Operator, Query, TermQueryFactory};
pub use traits::{
    ClausePermissionHandler, ClauseQueryFactory, FieldRegistry, IssueSearcher, SearchableField,
    Unrestricted,
};
pub use types::{
    fold_clause_name, ClauseInformation, ClauseNames, SearchContext, SearcherGroupType,
    SearcherInformation, User,
};
