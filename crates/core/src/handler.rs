//! Clause handlers and the search handlers that bundle them
//!
//! A `ClauseHandler` answers one JQL clause: it knows its names, whether a
//! user may use it and how to turn a clause into an index query. Handlers
//! are shared through `Arc`, and `Arc` identity is what the indices use for
//! set membership: registering the same handler twice under one name is a
//! no-op, two equal-looking handlers are still two handlers.

use std::fmt;
use std::sync::Arc;

use crate::query::{Clause, IndexQuery};
use crate::traits::{ClausePermissionHandler, ClauseQueryFactory, IssueSearcher};
use crate::types::{ClauseInformation, User};

// ============================================================================
// ClauseHandler
// ============================================================================

/// Resolves a JQL clause name to query construction and permission logic.
pub struct ClauseHandler {
    information: ClauseInformation,
    permission: Arc<dyn ClausePermissionHandler>,
    query_factory: Arc<dyn ClauseQueryFactory>,
}

impl ClauseHandler {
    /// Create a handler from its parts
    pub fn new(
        information: ClauseInformation,
        permission: Arc<dyn ClausePermissionHandler>,
        query_factory: Arc<dyn ClauseQueryFactory>,
    ) -> Self {
        ClauseHandler {
            information,
            permission,
            query_factory,
        }
    }

    /// Field id and JQL names
    pub fn information(&self) -> &ClauseInformation {
        &self.information
    }

    /// Backing field id, if the clause has one
    pub fn field_id(&self) -> Option<&str> {
        self.information.field_id()
    }

    /// Permission check for this clause
    pub fn has_permission(&self, user: Option<&User>) -> bool {
        self.permission.has_permission(user)
    }

    /// Build the index query for a clause addressed to this handler
    pub fn create_query(&self, clause: &Clause) -> IndexQuery {
        self.query_factory.create_query(clause)
    }
}

impl fmt::Debug for ClauseHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClauseHandler")
            .field("information", &self.information)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SearcherRegistration / SearchHandler
// ============================================================================

/// Pairs an optional issue searcher with the clause handlers it drives.
///
/// Text-only registrations carry no searcher.
#[derive(Debug, Clone)]
pub struct SearcherRegistration {
    searcher: Option<Arc<dyn IssueSearcher>>,
    clause_handlers: Vec<Arc<ClauseHandler>>,
}

impl SearcherRegistration {
    /// Registration with a concrete searcher
    pub fn new(searcher: Arc<dyn IssueSearcher>, clause_handlers: Vec<Arc<ClauseHandler>>) -> Self {
        SearcherRegistration {
            searcher: Some(searcher),
            clause_handlers,
        }
    }

    /// Registration without a searcher
    pub fn without_searcher(clause_handlers: Vec<Arc<ClauseHandler>>) -> Self {
        SearcherRegistration {
            searcher: None,
            clause_handlers,
        }
    }

    /// The searcher, if any
    pub fn searcher(&self) -> Option<&Arc<dyn IssueSearcher>> {
        self.searcher.as_ref()
    }

    /// Clause handlers driven by the searcher
    pub fn clause_handlers(&self) -> &[Arc<ClauseHandler>] {
        &self.clause_handlers
    }
}

/// Everything one field (or fieldless system clause) registers.
#[derive(Debug, Clone, Default)]
pub struct SearchHandler {
    searcher_registration: Option<Arc<SearcherRegistration>>,
    clause_registrations: Vec<Arc<ClauseHandler>>,
}

impl SearchHandler {
    /// Handler with a searcher registration and additional clause handlers
    pub fn new(
        searcher_registration: Option<SearcherRegistration>,
        clause_registrations: Vec<Arc<ClauseHandler>>,
    ) -> Self {
        SearchHandler {
            searcher_registration: searcher_registration.map(Arc::new),
            clause_registrations,
        }
    }

    /// Handler that only contributes clause handlers
    pub fn clauses_only(clause_registrations: Vec<Arc<ClauseHandler>>) -> Self {
        Self::new(None, clause_registrations)
    }

    /// Searcher registration, if any
    pub fn searcher_registration(&self) -> Option<&Arc<SearcherRegistration>> {
        self.searcher_registration.as_ref()
    }

    /// Clause handlers registered outside the searcher registration
    pub fn clause_registrations(&self) -> &[Arc<ClauseHandler>] {
        &self.clause_registrations
    }
}
