//! Collaborator traits
//!
//! Everything the indexing and query layers need from the surrounding
//! application is passed in through these traits at construction time:
//! the field registry, per-clause permission checks, issue searchers and
//! clause query factories.

use std::fmt;
use std::sync::Arc;

use crate::handler::SearchHandler;
use crate::query::{Clause, IndexQuery};
use crate::types::{SearchContext, SearcherInformation, User};

/// Predicate deciding whether a user may use a clause.
///
/// Must be side-effect free; it is evaluated per handler, per lookup.
pub trait ClausePermissionHandler: Send + Sync {
    /// True if `user` (`None` = anonymous) may use the clause
    fn has_permission(&self, user: Option<&User>) -> bool;
}

impl<F> ClausePermissionHandler for F
where
    F: Fn(Option<&User>) -> bool + Send + Sync,
{
    fn has_permission(&self, user: Option<&User>) -> bool {
        self(user)
    }
}

/// Permission handler that lets everybody use the clause.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unrestricted;

impl ClausePermissionHandler for Unrestricted {
    fn has_permission(&self, _user: Option<&User>) -> bool {
        true
    }
}

/// Builds the index query a clause evaluates to.
pub trait ClauseQueryFactory: Send + Sync {
    /// Translate a clause into an index query
    fn create_query(&self, clause: &Clause) -> IndexQuery;
}

/// UI-facing search widget associated with a field.
pub trait IssueSearcher: Send + Sync + fmt::Debug {
    /// Id, display name and declared group
    fn information(&self) -> &SearcherInformation;

    /// Whether the searcher's renderer is shown for this user and context
    fn is_shown(&self, user: Option<&User>, context: &SearchContext) -> bool;
}

/// A system or custom field that participates in search.
pub trait SearchableField: Send + Sync {
    /// Field id (e.g. `status`, `customfield_10001`)
    fn id(&self) -> &str;

    /// Display name
    fn name(&self) -> &str;

    /// True for custom fields
    fn is_custom(&self) -> bool;

    /// Custom field type name, used in log messages only
    fn custom_field_type_name(&self) -> Option<&str> {
        None
    }

    /// Searcher and clause registrations for this field; `None` makes the
    /// field unsearchable
    fn create_search_handler(&self) -> Option<SearchHandler>;
}

/// Source of everything the clause indexer registers.
pub trait FieldRegistry: Send + Sync {
    /// System fields, registered first
    fn system_fields(&self) -> Vec<Arc<dyn SearchableField>>;

    /// Fieldless free-text handler that carries a searcher
    fn text_query_handler(&self) -> Option<SearchHandler> {
        None
    }

    /// Fieldless system clause handlers (saved filter, issue key, ...)
    fn system_clause_handlers(&self) -> Vec<SearchHandler>;

    /// Custom fields, registered last
    fn custom_fields(&self) -> Vec<Arc<dyn SearchableField>>;
}
