//! Core identity and naming types
//!
//! This module defines:
//! - User: the principal a search runs as (`None` means anonymous)
//! - SearchContext: projects / issue types a search is scoped to
//! - ClauseNames / ClauseInformation: JQL naming of a clause
//! - SearcherGroupType / SearcherInformation: searcher metadata

use std::collections::BTreeSet;
use std::fmt;

/// Case-fold a JQL clause name the way all clause indices store it.
pub fn fold_clause_name(name: &str) -> String {
    name.to_lowercase()
}

// ============================================================================
// User
// ============================================================================

/// A named principal.
///
/// The anonymous user is represented as `Option::<&User>::None` at every
/// permission seam.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    name: String,
}

impl User {
    /// Create a user with the given login name
    pub fn new(name: impl Into<String>) -> Self {
        User { name: name.into() }
    }

    /// Login name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ============================================================================
// SearchContext
// ============================================================================

/// Projects and issue types a search is scoped to.
///
/// Empty sets mean "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchContext {
    project_ids: BTreeSet<u64>,
    issue_type_ids: BTreeSet<String>,
}

impl SearchContext {
    /// An unscoped context (all projects, all issue types)
    pub fn global() -> Self {
        Self::default()
    }

    /// A context scoped to the given projects and issue types
    pub fn new(
        project_ids: impl IntoIterator<Item = u64>,
        issue_type_ids: impl IntoIterator<Item = String>,
    ) -> Self {
        SearchContext {
            project_ids: project_ids.into_iter().collect(),
            issue_type_ids: issue_type_ids.into_iter().collect(),
        }
    }

    /// Project scope
    pub fn project_ids(&self) -> &BTreeSet<u64> {
        &self.project_ids
    }

    /// Issue type scope
    pub fn issue_type_ids(&self) -> &BTreeSet<String> {
        &self.issue_type_ids
    }

    /// True when neither projects nor issue types are restricted
    pub fn is_global(&self) -> bool {
        self.project_ids.is_empty() && self.issue_type_ids.is_empty()
    }

    /// True when the context covers exactly one project
    pub fn is_single_project(&self) -> bool {
        self.project_ids.len() == 1
    }
}

// ============================================================================
// ClauseNames
// ============================================================================

/// The JQL names a clause answers to.
///
/// The primary name is what autocomplete shows; every name (primary included)
/// is accepted in queries. Comparison is on the exact names given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClauseNames {
    primary: String,
    names: BTreeSet<String>,
}

impl ClauseNames {
    /// A clause with a single name
    pub fn new(primary: impl Into<String>) -> Self {
        let primary = primary.into();
        let mut names = BTreeSet::new();
        names.insert(primary.clone());
        ClauseNames { primary, names }
    }

    /// A clause with a primary name and additional aliases
    pub fn with_aliases<I, S>(primary: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut clause_names = Self::new(primary);
        clause_names
            .names
            .extend(aliases.into_iter().map(Into::into));
        clause_names
    }

    /// Name shown to users
    pub fn primary_name(&self) -> &str {
        &self.primary
    }

    /// Every JQL name, primary included, in sorted order
    pub fn jql_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Case-insensitive membership test
    pub fn contains(&self, name: &str) -> bool {
        let folded = fold_clause_name(name);
        self.names.iter().any(|n| fold_clause_name(n) == folded)
    }
}

impl fmt::Display for ClauseNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.primary)
    }
}

/// Which field (if any) a clause belongs to and what it is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseInformation {
    field_id: Option<String>,
    clause_names: ClauseNames,
}

impl ClauseInformation {
    /// Clause backed by a field
    pub fn for_field(field_id: impl Into<String>, clause_names: ClauseNames) -> Self {
        ClauseInformation {
            field_id: Some(field_id.into()),
            clause_names,
        }
    }

    /// Clause with no backing field (e.g. saved filter, text search)
    pub fn fieldless(clause_names: ClauseNames) -> Self {
        ClauseInformation {
            field_id: None,
            clause_names,
        }
    }

    /// Backing field id
    pub fn field_id(&self) -> Option<&str> {
        self.field_id.as_deref()
    }

    /// JQL names
    pub fn clause_names(&self) -> &ClauseNames {
        &self.clause_names
    }
}

// ============================================================================
// Searcher metadata
// ============================================================================

/// Bucket a searcher is displayed in.
///
/// Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SearcherGroupType {
    /// Free-text searchers
    Text,
    /// Project / issue type context searchers
    Context,
    /// Project-scoped fields (components, versions)
    Project,
    /// Issue attribute fields (status, priority, assignee)
    Issue,
    /// Date fields
    Date,
    /// Time tracking fields
    Work,
    /// Custom fields, and the fallback bucket
    Custom,
}

impl SearcherGroupType {
    /// All group types in display order
    pub const ALL: [SearcherGroupType; 7] = [
        SearcherGroupType::Text,
        SearcherGroupType::Context,
        SearcherGroupType::Project,
        SearcherGroupType::Issue,
        SearcherGroupType::Date,
        SearcherGroupType::Work,
        SearcherGroupType::Custom,
    ];

    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            SearcherGroupType::Text => "text",
            SearcherGroupType::Context => "context",
            SearcherGroupType::Project => "project",
            SearcherGroupType::Issue => "issue",
            SearcherGroupType::Date => "date",
            SearcherGroupType::Work => "work",
            SearcherGroupType::Custom => "custom",
        }
    }
}

impl fmt::Display for SearcherGroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and grouping of an issue searcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearcherInformation {
    id: String,
    name: String,
    group_type: Option<SearcherGroupType>,
}

impl SearcherInformation {
    /// Searcher metadata; `group_type` may be left undeclared
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        group_type: Option<SearcherGroupType>,
    ) -> Self {
        SearcherInformation {
            id: id.into(),
            name: name.into(),
            group_type,
        }
    }

    /// Searcher id (unique across the snapshot)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared group, if any
    pub fn group_type(&self) -> Option<SearcherGroupType> {
        self.group_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_clause_name() {
        assert_eq!(fold_clause_name("Status"), "status");
        assert_eq!(fold_clause_name("CF[10001]"), "cf[10001]");
    }

    #[test]
    fn test_clause_names_primary_included() {
        let names = ClauseNames::with_aliases("issuekey", ["key", "id"]);
        assert_eq!(names.primary_name(), "issuekey");
        let all: Vec<_> = names.jql_names().collect();
        assert_eq!(all, vec!["id", "issuekey", "key"]);
    }

    #[test]
    fn test_clause_names_contains_is_case_insensitive() {
        let names = ClauseNames::with_aliases("assignee", ["Owner"]);
        assert!(names.contains("ASSIGNEE"));
        assert!(names.contains("owner"));
        assert!(!names.contains("reporter"));
    }

    #[test]
    fn test_clause_information_fieldless() {
        let info = ClauseInformation::fieldless(ClauseNames::new("filter"));
        assert!(info.field_id().is_none());
        assert_eq!(info.clause_names().primary_name(), "filter");
    }

    #[test]
    fn test_search_context_scope() {
        assert!(SearchContext::global().is_global());
        let ctx = SearchContext::new([10], Vec::<String>::new());
        assert!(!ctx.is_global());
        assert!(ctx.is_single_project());
    }

    #[test]
    fn test_group_type_order() {
        let mut sorted = SearcherGroupType::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, SearcherGroupType::ALL.to_vec());
        assert_eq!(SearcherGroupType::Custom.to_string(), "custom");
    }
}
