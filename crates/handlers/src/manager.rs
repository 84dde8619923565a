//! Search handler manager
//!
//! Thread-safe query surface over the current [`Helper`] snapshot.
//!
//! # Snapshot lifecycle
//!
//! The live snapshot is an `Arc` published behind a `RwLock` that is only
//! held to clone or swap the pointer. `refresh()` bumps a generation counter;
//! the next access notices the stale generation and rebuilds under a separate
//! rebuild mutex, outside the pointer lock, then publishes the new snapshot
//! whole. Readers never observe a partially built index.
//!
//! A failed rebuild leaves the previous snapshot (or an empty one) in place,
//! logs the error and is not retried until the next `refresh()`.
//!
//! Permission-filtered lookups are cached per (user, folded clause name)
//! inside the snapshot, so a refresh drops them together with the indices.

use std::collections::HashSet;
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use fieldex_core::{
    fold_clause_name, ClauseHandler, ClauseNames, FieldRegistry, HandlerConfig, IssueSearcher,
    Result, SearchContext, User,
};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHasher;

use crate::events::{CacheEvent, CacheEventListener, ModuleKind};
use crate::group::SearcherGroup;
use crate::helper::Helper;
use crate::indexer::ClauseIndexer;

type PermissionCache =
    DashMap<(Option<String>, String), Arc<[Arc<ClauseHandler>]>, BuildHasherDefault<FxHasher>>;

/// One published build of the handler index.
struct Snapshot {
    generation: u64,
    helper: Arc<Helper>,
    permitted: PermissionCache,
}

impl Snapshot {
    fn new(generation: u64, helper: Arc<Helper>) -> Self {
        Snapshot {
            generation,
            helper,
            permitted: PermissionCache::default(),
        }
    }
}

/// Cached, permission-aware access to clause handlers and searchers.
pub struct SearchHandlerManager {
    registry: Arc<dyn FieldRegistry>,
    config: HandlerConfig,
    current: RwLock<Option<Arc<Snapshot>>>,
    generation: AtomicU64,
    rebuild_lock: Mutex<()>,
}

impl SearchHandlerManager {
    /// Manager over `registry`; the first access builds the index
    pub fn new(registry: Arc<dyn FieldRegistry>) -> Self {
        Self::with_config(registry, HandlerConfig::default())
    }

    /// Manager with explicit settings
    pub fn with_config(registry: Arc<dyn FieldRegistry>, config: HandlerConfig) -> Self {
        SearchHandlerManager {
            registry,
            config,
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
            rebuild_lock: Mutex::new(()),
        }
    }

    // ========================================================================
    // Clause handlers
    // ========================================================================

    /// Handlers registered under a clause name, case-insensitive.
    ///
    /// Empty for unknown or blank names.
    pub fn clause_handlers(&self, jql_name: &str) -> Vec<Arc<ClauseHandler>> {
        if jql_name.trim().is_empty() {
            return Vec::new();
        }
        self.snapshot().helper.clause_handlers(jql_name).to_vec()
    }

    /// Handlers under a clause name that `user` may use.
    ///
    /// Always a subset of [`clause_handlers`](Self::clause_handlers).
    pub fn clause_handlers_for(&self, user: Option<&User>, jql_name: &str) -> Vec<Arc<ClauseHandler>> {
        if jql_name.trim().is_empty() {
            return Vec::new();
        }
        self.permitted(&self.snapshot(), user, jql_name).to_vec()
    }

    fn permitted(
        &self,
        snapshot: &Snapshot,
        user: Option<&User>,
        jql_name: &str,
    ) -> Arc<[Arc<ClauseHandler>]> {
        let registered = snapshot.helper.clause_handlers(jql_name);
        let filter = || -> Arc<[Arc<ClauseHandler>]> {
            registered
                .iter()
                .filter(|h| h.has_permission(user))
                .cloned()
                .collect()
        };
        // unknown names are never cached, so the cache is bounded by
        // users × registered names
        if registered.is_empty() || !self.config.cache_permission_lookups {
            return filter();
        }

        let key = (user.map(|u| u.name().to_string()), fold_clause_name(jql_name));
        if let Some(hit) = snapshot.permitted.get(&key) {
            return Arc::clone(&hit);
        }
        let handlers = filter();
        snapshot.permitted.insert(key, Arc::clone(&handlers));
        handlers
    }

    /// Field ids behind a clause name
    pub fn field_ids(&self, jql_name: &str) -> Vec<String> {
        field_ids_of(&self.clause_handlers(jql_name))
    }

    /// Field ids behind a clause name, restricted to handlers `user` may use
    pub fn field_ids_for(&self, user: Option<&User>, jql_name: &str) -> Vec<String> {
        field_ids_of(&self.clause_handlers_for(user, jql_name))
    }

    /// Clause names of every handler `user` may use
    pub fn visible_clause_names(&self, user: Option<&User>) -> HashSet<ClauseNames> {
        self.snapshot()
            .helper
            .all_clause_handlers()
            .iter()
            .filter(|h| h.has_permission(user))
            .map(|h| h.information().clause_names().clone())
            .collect()
    }

    /// Every handler `user` may use
    pub fn visible_clause_handlers(&self, user: Option<&User>) -> Vec<Arc<ClauseHandler>> {
        self.snapshot()
            .helper
            .all_clause_handlers()
            .iter()
            .filter(|h| h.has_permission(user))
            .cloned()
            .collect()
    }

    /// Clause names registered for a field id
    pub fn jql_clause_names(&self, field_id: &str) -> Vec<ClauseNames> {
        if field_id.trim().is_empty() {
            return Vec::new();
        }
        self.snapshot().helper.jql_clause_names(field_id).to_vec()
    }

    // ========================================================================
    // Searchers
    // ========================================================================

    /// Searchers reachable through a clause name. Registrations without a
    /// searcher are skipped.
    pub fn searchers_by_clause_name(
        &self,
        _user: Option<&User>,
        jql_name: &str,
    ) -> Vec<Arc<dyn IssueSearcher>> {
        if jql_name.trim().is_empty() {
            return Vec::new();
        }
        self.snapshot()
            .helper
            .searcher_registrations(jql_name)
            .iter()
            .filter_map(|r| r.searcher().cloned())
            .collect()
    }

    /// Searchers shown to `user` in `context`, in registration order
    pub fn searchers(&self, user: Option<&User>, context: &SearchContext) -> Vec<Arc<dyn IssueSearcher>> {
        self.snapshot()
            .helper
            .all_searchers()
            .iter()
            .filter(|s| s.is_shown(user, context))
            .cloned()
            .collect()
    }

    /// Every searcher, in registration order
    pub fn all_searchers(&self) -> Vec<Arc<dyn IssueSearcher>> {
        self.snapshot().helper.all_searchers().to_vec()
    }

    /// Searcher by id
    pub fn searcher(&self, id: &str) -> Option<Arc<dyn IssueSearcher>> {
        self.snapshot().helper.searcher(id).cloned()
    }

    /// Every searcher group, in display order
    pub fn searcher_groups(&self) -> Vec<SearcherGroup> {
        self.snapshot().helper.searcher_groups().to_vec()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Invalidate the snapshot; the next access rebuilds it.
    pub fn refresh(&self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(target: "fieldex::handlers", generation, "Handler index invalidated");
    }

    /// Rebuild now and publish the result.
    ///
    /// # Errors
    ///
    /// Returns the configuration error that aborted the build; the previous
    /// snapshot stays live.
    pub fn rebuild(&self) -> Result<()> {
        let _guard = self.rebuild_lock.lock();
        let generation = self.generation.load(Ordering::Acquire);
        let helper = ClauseIndexer::build(self.registry.as_ref())?;
        self.publish(Snapshot::new(generation, Arc::new(helper)));
        Ok(())
    }

    /// Generation of the published snapshot, if any
    pub fn published_generation(&self) -> Option<u64> {
        self.current.read().as_ref().map(|s| s.generation)
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        let wanted = self.generation.load(Ordering::Acquire);
        if let Some(current) = self.current.read().as_ref() {
            if current.generation == wanted {
                return Arc::clone(current);
            }
        }

        let _guard = self.rebuild_lock.lock();
        let wanted = self.generation.load(Ordering::Acquire);
        let previous = self.current.read().clone();
        if let Some(current) = &previous {
            if current.generation == wanted {
                return Arc::clone(current);
            }
        }

        let snapshot = match ClauseIndexer::build(self.registry.as_ref()) {
            Ok(helper) => {
                tracing::debug!(
                    target: "fieldex::handlers",
                    generation = wanted,
                    handlers = helper.all_clause_handlers().len(),
                    searchers = helper.all_searchers().len(),
                    "Handler index rebuilt"
                );
                Snapshot::new(wanted, Arc::new(helper))
            }
            Err(e) => {
                tracing::error!(
                    target: "fieldex::handlers",
                    generation = wanted,
                    error = %e,
                    "Handler index rebuild failed, keeping previous index"
                );
                let helper = previous.map_or_else(Helper::empty, |p| Arc::clone(&p.helper));
                Snapshot::new(wanted, helper)
            }
        };
        self.publish(snapshot)
    }

    fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write() = Some(Arc::clone(&snapshot));
        snapshot
    }
}

impl CacheEventListener for SearchHandlerManager {
    fn on_event(&self, event: &CacheEvent) {
        match event {
            CacheEvent::ClearCache
            | CacheEvent::ModuleEnabled(ModuleKind::CustomFieldSearcher)
            | CacheEvent::ModuleDisabled(ModuleKind::CustomFieldSearcher) => self.refresh(),
            CacheEvent::ModuleEnabled(_) | CacheEvent::ModuleDisabled(_) => {}
        }
    }
}

impl std::fmt::Debug for SearchHandlerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchHandlerManager")
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .field("published", &self.published_generation())
            .finish_non_exhaustive()
    }
}

fn field_ids_of(handlers: &[Arc<ClauseHandler>]) -> Vec<String> {
    handlers
        .iter()
        .filter_map(|h| h.field_id().map(str::to_string))
        .collect()
}
