//! Searcher groups
//!
//! Every searcher lands in exactly one group. Groups are listed in
//! `SearcherGroupType` declaration order and every group type is present,
//! possibly empty.

use std::fmt;
use std::sync::Arc;

use fieldex_core::{IssueSearcher, SearcherGroupType};

/// A group type and the searchers displayed in it.
#[derive(Clone)]
pub struct SearcherGroup {
    group_type: SearcherGroupType,
    searchers: Vec<Arc<dyn IssueSearcher>>,
}

impl SearcherGroup {
    /// Create a group, ordering searchers the way the group displays them.
    ///
    /// The custom group is ordered by searcher name, case-insensitively; the
    /// other groups keep registration order.
    pub fn new(group_type: SearcherGroupType, mut searchers: Vec<Arc<dyn IssueSearcher>>) -> Self {
        if group_type == SearcherGroupType::Custom {
            searchers.sort_by_cached_key(|s| s.information().name().to_lowercase());
        }
        SearcherGroup {
            group_type,
            searchers,
        }
    }

    /// Group type
    pub fn group_type(&self) -> SearcherGroupType {
        self.group_type
    }

    /// Searchers in display order
    pub fn searchers(&self) -> &[Arc<dyn IssueSearcher>] {
        &self.searchers
    }

    /// True if no searcher was placed in this group
    pub fn is_empty(&self) -> bool {
        self.searchers.is_empty()
    }
}

impl fmt::Debug for SearcherGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.searchers.iter().map(|s| s.information().id()).collect();
        f.debug_struct("SearcherGroup")
            .field("group_type", &self.group_type)
            .field("searchers", &ids)
            .finish()
    }
}
