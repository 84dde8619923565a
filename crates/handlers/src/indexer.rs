//! Clause indexer
//!
//! Builds a [`Helper`] from a [`FieldRegistry`]. Registration order is fixed:
//! system fields, then the free-text handler, then fieldless system clause
//! handlers, then custom fields. System registrations therefore always win
//! clause name conflicts.
//!
//! # Conflict rules
//!
//! Clause names are case-folded before indexing.
//!
//! - A system clause name registered twice aborts the build with
//!   [`Error::DuplicateSystemClause`].
//! - A custom clause name that is already a system name is dropped with a
//!   warning, for clause handlers and for searcher registrations alike.
//! - Custom fields sharing a name are all kept, in registration order.
//! - Searcher ids are first-registrant-wins.
//!
//! Handlers, registrations and searchers are compared by `Arc` identity.

use std::collections::BTreeSet;
use std::sync::Arc;

use fieldex_core::{
    fold_clause_name, ClauseHandler, ClauseNames, Error, FieldRegistry, IssueSearcher, Result,
    SearchHandler, SearchableField, SearcherGroupType, SearcherRegistration,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::group::SearcherGroup;
use crate::helper::Helper;

/// Who is registering: a system or custom field, or a fieldless system handler.
#[derive(Clone, Copy)]
struct Origin<'a> {
    field: Option<&'a dyn SearchableField>,
    system: bool,
}

impl<'a> Origin<'a> {
    fn system(field: Option<&'a dyn SearchableField>) -> Self {
        Origin {
            field,
            system: true,
        }
    }

    fn custom(field: &'a dyn SearchableField) -> Self {
        Origin {
            field: Some(field),
            system: false,
        }
    }

    fn field_name(&self) -> &'a str {
        self.field.map_or("<none>", |f| f.name())
    }

    fn type_name(&self) -> &'a str {
        self.field
            .and_then(|f| f.custom_field_type_name())
            .unwrap_or("Unknown Type")
    }
}

fn same_searcher(a: &Arc<dyn IssueSearcher>, b: &Arc<dyn IssueSearcher>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Distinct folded JQL names of a handler.
fn folded_names(handler: &ClauseHandler) -> BTreeSet<String> {
    handler
        .information()
        .clause_names()
        .jql_names()
        .map(fold_clause_name)
        .collect()
}

/// Accumulates registrations; single-threaded, consumed by [`finish`](Self::finish).
#[derive(Default)]
pub struct ClauseIndexer {
    system_clauses: FxHashSet<String>,
    handler_index: FxHashMap<String, Vec<Arc<ClauseHandler>>>,
    handlers: Vec<Arc<ClauseHandler>>,
    seen_handlers: FxHashSet<usize>,
    registration_index: FxHashMap<String, Vec<Arc<SearcherRegistration>>>,
    searcher_ids: FxHashMap<String, usize>,
    searchers: Vec<Arc<dyn IssueSearcher>>,
    groups: FxHashMap<SearcherGroupType, Vec<Arc<dyn IssueSearcher>>>,
    field_clause_names: FxHashMap<String, Vec<ClauseNames>>,
}

impl ClauseIndexer {
    /// Empty indexer
    pub fn new() -> Self {
        Self::default()
    }

    /// Index everything the registry supplies, in the fixed order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateSystemClause`] if two system registrations
    /// share a clause name.
    pub fn build(registry: &dyn FieldRegistry) -> Result<Helper> {
        let mut indexer = ClauseIndexer::new();
        for field in registry.system_fields() {
            indexer.index_system_field(field.as_ref())?;
        }
        if let Some(handler) = registry.text_query_handler() {
            indexer.index_text_query_handler(&handler)?;
        }
        indexer.index_system_clause_handlers(&registry.system_clause_handlers())?;
        for field in registry.custom_fields() {
            indexer.index_custom_field(field.as_ref());
        }
        Ok(indexer.finish())
    }

    /// Index a system field
    pub fn index_system_field(&mut self, field: &dyn SearchableField) -> Result<()> {
        match field.create_search_handler() {
            Some(handler) => self.index_search_handler(Origin::system(Some(field)), &handler),
            None => {
                tracing::debug!(
                    target: "fieldex::handlers",
                    field = field.id(),
                    "Searchable field does not have a search handler, will not be searchable"
                );
                Ok(())
            }
        }
    }

    /// Index the fieldless free-text handler
    pub fn index_text_query_handler(&mut self, handler: &SearchHandler) -> Result<()> {
        self.index_search_handler(Origin::system(None), handler)
    }

    /// Index fieldless system clause handlers.
    ///
    /// Only their clause registrations are indexed.
    pub fn index_system_clause_handlers(&mut self, handlers: &[SearchHandler]) -> Result<()> {
        for handler in handlers {
            self.index_clause_handlers(Origin::system(None), handler.clause_registrations())?;
        }
        Ok(())
    }

    /// Index a custom field. Conflicts with system names are logged and skipped.
    pub fn index_custom_field(&mut self, field: &dyn SearchableField) {
        match field.create_search_handler() {
            Some(handler) => {
                // custom registrations never abort the build
                let _ = self.index_search_handler(Origin::custom(field), &handler);
            }
            None => tracing::debug!(
                target: "fieldex::handlers",
                field = field.id(),
                "Searchable field does not have a search handler, will not be searchable"
            ),
        }
    }

    fn index_search_handler(&mut self, origin: Origin<'_>, handler: &SearchHandler) -> Result<()> {
        if let Some(registration) = handler.searcher_registration() {
            if let Some(searcher) = registration.searcher() {
                self.index_searcher_by_id(origin, searcher);
            }
            // populates system_clauses, must precede the registration index
            self.index_clause_handlers(origin, registration.clause_handlers())?;
            self.index_registration_by_name(origin, registration);
        }
        self.index_clause_handlers(origin, handler.clause_registrations())
    }

    fn index_clause_handlers(
        &mut self,
        origin: Origin<'_>,
        handlers: &[Arc<ClauseHandler>],
    ) -> Result<()> {
        for handler in handlers {
            for name in folded_names(handler) {
                if self.system_clauses.contains(&name) {
                    if origin.system {
                        return Err(Error::DuplicateSystemClause {
                            clause: name,
                            field: origin.field.map(|f| f.name().to_string()),
                        });
                    }
                    tracing::warn!(
                        target: "fieldex::handlers",
                        field = origin.field_name(),
                        field_type = origin.type_name(),
                        clause = %name,
                        "Custom field is trying to register a clause handler against a system clause, ignoring"
                    );
                    continue;
                }
                if origin.system {
                    self.system_clauses.insert(name.clone());
                }
                self.register_handler(name, handler);
            }
        }
        Ok(())
    }

    fn register_handler(&mut self, name: String, handler: &Arc<ClauseHandler>) {
        let entry = self.handler_index.entry(name).or_default();
        if entry.iter().any(|h| Arc::ptr_eq(h, handler)) {
            return;
        }
        entry.push(Arc::clone(handler));

        if self.seen_handlers.insert(Arc::as_ptr(handler) as usize) {
            self.handlers.push(Arc::clone(handler));
            if let Some(field_id) = handler.field_id() {
                let names = self.field_clause_names.entry(field_id.to_string()).or_default();
                let clause_names = handler.information().clause_names();
                // one entry per distinct name set, not per handler
                if !names.contains(clause_names) {
                    names.push(clause_names.clone());
                }
            }
        }
    }

    fn index_registration_by_name(
        &mut self,
        origin: Origin<'_>,
        registration: &Arc<SearcherRegistration>,
    ) {
        for handler in registration.clause_handlers() {
            for name in folded_names(handler) {
                if !origin.system && self.system_clauses.contains(&name) {
                    tracing::warn!(
                        target: "fieldex::handlers",
                        field = origin.field_name(),
                        field_type = origin.type_name(),
                        clause = %name,
                        "Custom field is trying to register a searcher against a system clause, ignoring"
                    );
                    continue;
                }
                let entry = self.registration_index.entry(name).or_default();
                if !entry.iter().any(|r| Arc::ptr_eq(r, registration)) {
                    entry.push(Arc::clone(registration));
                }
            }
        }
    }

    fn index_searcher_by_id(&mut self, origin: Origin<'_>, searcher: &Arc<dyn IssueSearcher>) {
        let info = searcher.information();
        if let Some(&idx) = self.searcher_ids.get(info.id()) {
            if !same_searcher(&self.searchers[idx], searcher) {
                tracing::debug!(
                    target: "fieldex::handlers",
                    field = origin.field_name(),
                    searcher_id = info.id(),
                    current = ?self.searchers[idx],
                    new = ?searcher,
                    "Trying to register two searchers to the same id"
                );
            }
            return;
        }

        self.searcher_ids
            .insert(info.id().to_string(), self.searchers.len());
        self.searchers.push(Arc::clone(searcher));

        let group = if origin.system {
            info.group_type().unwrap_or_else(|| {
                tracing::warn!(
                    target: "fieldex::handlers",
                    field = origin.field_name(),
                    group = %SearcherGroupType::Custom,
                    "System field does not have a group type registered"
                );
                SearcherGroupType::Custom
            })
        } else {
            if let Some(declared) = info.group_type().filter(|g| *g != SearcherGroupType::Custom) {
                tracing::warn!(
                    target: "fieldex::handlers",
                    field = origin.field_name(),
                    field_type = origin.type_name(),
                    group = %declared,
                    "Custom field is trying to register itself outside the custom group"
                );
            }
            SearcherGroupType::Custom
        };
        self.groups.entry(group).or_default().push(Arc::clone(searcher));
    }

    /// Freeze the indices into a snapshot.
    pub fn finish(mut self) -> Helper {
        let groups = SearcherGroupType::ALL
            .iter()
            .map(|&t| SearcherGroup::new(t, self.groups.remove(&t).unwrap_or_default()))
            .collect();
        Helper {
            handler_index: self.handler_index,
            handlers: self.handlers,
            searcher_ids: self.searcher_ids,
            searchers: self.searchers,
            registration_index: self.registration_index,
            field_clause_names: self.field_clause_names,
            groups,
        }
    }
}
