//! Clause handler indexing for fieldex
//!
//! This crate provides:
//! - ClauseIndexer: builds the handler index from a field registry
//! - Helper: the immutable index snapshot
//! - SearcherGroup: searchers bucketed for display
//! - SearchHandlerManager: cached, permission-aware lookups with refresh
//! - Cache events: CacheEvent, CacheEventListener, CacheEventBus

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod events;
pub mod group;
pub mod helper;
pub mod indexer;
pub mod manager;

pub use events::{CacheEvent, CacheEventBus, CacheEventListener, ModuleKind};
pub use group::SearcherGroup;
pub use helper::Helper;
pub use indexer::ClauseIndexer;
pub use manager::SearchHandlerManager;
