//! Immutable handler index snapshot
//!
//! A `Helper` is produced whole by the clause indexer and never mutated
//! afterwards. Clause-name keys are case-folded; lookups fold their argument.

use std::sync::Arc;

use fieldex_core::{
    fold_clause_name, ClauseHandler, ClauseNames, IssueSearcher, SearcherGroupType,
    SearcherRegistration,
};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::group::SearcherGroup;

static EMPTY: Lazy<Arc<Helper>> = Lazy::new(|| Arc::new(Helper::default()));

/// Cross-reference indices over every registered clause handler and searcher.
#[derive(Debug, Clone)]
pub struct Helper {
    /// folded clause name -> handlers, registration ordered
    pub(crate) handler_index: FxHashMap<String, Vec<Arc<ClauseHandler>>>,
    /// every distinct handler, in first-registration order
    pub(crate) handlers: Vec<Arc<ClauseHandler>>,
    /// searcher id -> position in `searchers`
    pub(crate) searcher_ids: FxHashMap<String, usize>,
    pub(crate) searchers: Vec<Arc<dyn IssueSearcher>>,
    /// folded clause name -> searcher registrations
    pub(crate) registration_index: FxHashMap<String, Vec<Arc<SearcherRegistration>>>,
    /// field id -> distinct clause names
    pub(crate) field_clause_names: FxHashMap<String, Vec<ClauseNames>>,
    pub(crate) groups: Vec<SearcherGroup>,
}

impl Default for Helper {
    fn default() -> Self {
        Helper {
            handler_index: FxHashMap::default(),
            handlers: Vec::new(),
            searcher_ids: FxHashMap::default(),
            searchers: Vec::new(),
            registration_index: FxHashMap::default(),
            field_clause_names: FxHashMap::default(),
            groups: SearcherGroupType::ALL
                .iter()
                .map(|&t| SearcherGroup::new(t, Vec::new()))
                .collect(),
        }
    }
}

impl Helper {
    /// Shared snapshot with nothing registered
    pub fn empty() -> Arc<Helper> {
        Arc::clone(&EMPTY)
    }

    /// Handlers registered under a clause name (case-insensitive)
    pub fn clause_handlers(&self, jql_name: &str) -> &[Arc<ClauseHandler>] {
        self.handler_index
            .get(&fold_clause_name(jql_name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every distinct handler
    pub fn all_clause_handlers(&self) -> &[Arc<ClauseHandler>] {
        &self.handlers
    }

    /// Searcher by id
    pub fn searcher(&self, id: &str) -> Option<&Arc<dyn IssueSearcher>> {
        self.searcher_ids.get(id).map(|&i| &self.searchers[i])
    }

    /// All searchers in registration order
    pub fn all_searchers(&self) -> &[Arc<dyn IssueSearcher>] {
        &self.searchers
    }

    /// Searcher registrations reachable through a clause name
    pub fn searcher_registrations(&self, jql_name: &str) -> &[Arc<SearcherRegistration>] {
        self.registration_index
            .get(&fold_clause_name(jql_name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Clause names registered for a field id
    pub fn jql_clause_names(&self, field_id: &str) -> &[ClauseNames] {
        self.field_clause_names
            .get(field_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every group, in display order
    pub fn searcher_groups(&self) -> &[SearcherGroup] {
        &self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_helper_has_every_group() {
        let helper = Helper::empty();
        let types: Vec<_> = helper.searcher_groups().iter().map(|g| g.group_type()).collect();
        assert_eq!(types, SearcherGroupType::ALL.to_vec());
        assert!(helper.searcher_groups().iter().all(SearcherGroup::is_empty));
        assert!(helper.clause_handlers("status").is_empty());
        assert!(helper.searcher("status").is_none());
        assert!(helper.jql_clause_names("status").is_empty());
    }

    #[test]
    fn test_empty_is_shared() {
        assert!(Arc::ptr_eq(&Helper::empty(), &Helper::empty()));
    }
}
