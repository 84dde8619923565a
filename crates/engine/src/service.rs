//! Permission-aware search over a segmented index
//!
//! A search resolves each clause of the query to the clause handlers the
//! user may see, ORs the handlers' index queries within a clause, ANDs the
//! clauses, and collects matching documents either in document order or
//! through a [`TopFieldCollector`].

use std::path::Path;
use std::sync::Arc;

use fieldex_core::{
    Error, FieldRegistry, FieldexConfig, IndexQuery, Query, Result, SortConfig, User,
};
use fieldex_handlers::SearchHandlerManager;
use fieldex_index::{
    matching_docs, DocSet, FieldComparator, NumberComparator, Reverse, SegmentedIndex,
    TextComparator,
};
use fieldex_sort::TopFieldCollector;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::directory::open_index_dir;

// ============================================================================
// Sort and result types
// ============================================================================

/// How sort values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
    /// Lexicographic term text
    Text,
    /// Term text parsed as a number
    Number,
}

/// Sort order of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    /// Index field holding the sort values
    pub field: String,
    /// Value interpretation
    pub kind: SortKind,
    /// Largest value first
    pub descending: bool,
}

impl SortField {
    /// Ascending sort on `field`
    pub fn ascending(field: impl Into<String>, kind: SortKind) -> Self {
        SortField {
            field: field.into(),
            kind,
            descending: false,
        }
    }

    /// Descending sort on `field`
    pub fn descending(field: impl Into<String>, kind: SortKind) -> Self {
        SortField {
            field: field.into(),
            kind,
            descending: true,
        }
    }
}

/// Documents returned by a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    /// Global document ids, in result order, at most `limit`
    pub docs: Vec<u32>,
    /// Number of matching documents
    pub total_hits: usize,
}

// ============================================================================
// SearchService
// ============================================================================

/// Search entry point combining clause handlers with an index.
pub struct SearchService {
    handlers: Arc<SearchHandlerManager>,
    index: RwLock<Arc<SegmentedIndex>>,
    config: FieldexConfig,
}

impl SearchService {
    /// Service over `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(
        handlers: Arc<SearchHandlerManager>,
        index: SegmentedIndex,
        config: FieldexConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(SearchService {
            handlers,
            index: RwLock::new(Arc::new(index)),
            config,
        })
    }

    /// Open the index directory at `dir` and build a handler manager over
    /// `registry` with the directory's configuration.
    ///
    /// # Errors
    ///
    /// See [`open_index_dir`].
    pub fn open(dir: &Path, registry: Arc<dyn FieldRegistry>) -> Result<Self> {
        let (config, index) = open_index_dir(dir)?;
        let handlers = Arc::new(SearchHandlerManager::with_config(
            registry,
            config.handlers.clone(),
        ));
        Self::new(handlers, index, config)
    }

    /// Swap in a new index; searches already running keep the old one
    pub fn replace_index(&self, index: SegmentedIndex) {
        *self.index.write() = Arc::new(index);
    }

    /// Current index
    pub fn index(&self) -> Arc<SegmentedIndex> {
        Arc::clone(&self.index.read())
    }

    /// Clause handler manager
    pub fn handlers(&self) -> &Arc<SearchHandlerManager> {
        &self.handlers
    }

    /// Active configuration
    pub fn config(&self) -> &FieldexConfig {
        &self.config
    }

    /// Run `query` as `user`, returning at most `limit` documents.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownClause`] if a clause has no handler visible to the user
    /// - [`Error::SortValue`] if a sort value cannot be read
    /// - [`Error::Io`] if evaluating a clause fails
    pub fn search(
        &self,
        user: Option<&User>,
        query: &Query,
        sort: Option<&SortField>,
        limit: usize,
    ) -> Result<SearchResults> {
        let plan = self.plan(user, query)?;
        let index = self.index();
        let matches = evaluate(&index, &plan)?;

        let results = match sort {
            None => collect_unsorted(&matches, &index, limit),
            Some(sort) => {
                let sort_config = &self.config.sort;
                let sorted = match (sort.kind, sort.descending) {
                    (SortKind::Text, false) => {
                        collect_sorted(&index, &matches, sort, TextComparator, limit, sort_config)
                    }
                    (SortKind::Text, true) => collect_sorted(
                        &index,
                        &matches,
                        sort,
                        Reverse(TextComparator),
                        limit,
                        sort_config,
                    ),
                    (SortKind::Number, false) => {
                        collect_sorted(&index, &matches, sort, NumberComparator, limit, sort_config)
                    }
                    (SortKind::Number, true) => collect_sorted(
                        &index,
                        &matches,
                        sort,
                        Reverse(NumberComparator),
                        limit,
                        sort_config,
                    ),
                };
                sorted.map_err(|e| {
                    warn!(target: "fieldex::engine", field = %sort.field, error = %e, "Sort aborted");
                    e
                })?
            }
        };

        debug!(
            target: "fieldex::engine",
            user = ?user.map(User::name),
            clauses = query.clauses().len(),
            total_hits = results.total_hits,
            returned = results.docs.len(),
            "Search complete"
        );
        Ok(results)
    }

    /// Index queries per clause: OR within, AND across
    fn plan(&self, user: Option<&User>, query: &Query) -> Result<Vec<Vec<IndexQuery>>> {
        query
            .clauses()
            .iter()
            .map(|clause| {
                let handlers = self.handlers.clause_handlers_for(user, clause.name());
                if handlers.is_empty() {
                    return Err(Error::UnknownClause(clause.name().to_string()));
                }
                let mut queries: Vec<IndexQuery> = Vec::with_capacity(handlers.len());
                for handler in &handlers {
                    let q = handler.create_query(clause);
                    if !queries.contains(&q) {
                        queries.push(q);
                    }
                }
                Ok(queries)
            })
            .collect()
    }
}

/// Matching documents of every segment, segment-local ids
fn evaluate(index: &SegmentedIndex, plan: &[Vec<IndexQuery>]) -> Result<Vec<DocSet>> {
    let mut per_leaf = Vec::with_capacity(index.leaves().len());
    for leaf in index.leaves() {
        let reader = leaf.reader();
        let mut docs = DocSet::full(reader.max_doc());
        for queries in plan {
            let mut clause_docs = DocSet::empty(reader.max_doc());
            for q in queries {
                clause_docs.union_with(&matching_docs(reader, q)?);
            }
            docs.intersect_with(&clause_docs);
            if docs.is_empty() {
                break;
            }
        }
        per_leaf.push(docs);
    }
    Ok(per_leaf)
}

fn collect_unsorted(matches: &[DocSet], index: &SegmentedIndex, limit: usize) -> SearchResults {
    let mut results = SearchResults::default();
    for (docs, leaf) in matches.iter().zip(index.leaves()) {
        results.total_hits += docs.count();
        let room = limit.saturating_sub(results.docs.len());
        results
            .docs
            .extend(docs.iter().take(room).map(|d| leaf.doc_base() + d));
    }
    results
}

fn collect_sorted<C: FieldComparator>(
    index: &SegmentedIndex,
    matches: &[DocSet],
    sort: &SortField,
    comparator: C,
    limit: usize,
    config: &SortConfig,
) -> Result<SearchResults> {
    let mut collector = TopFieldCollector::new(sort.field.as_str(), comparator, limit, config);
    for (docs, leaf) in matches.iter().zip(index.leaves()) {
        if docs.is_empty() {
            continue;
        }
        collector.set_next_leaf(leaf);
        for doc in docs.iter() {
            collector.collect(doc)?;
        }
    }
    let top = collector.top_docs();
    Ok(SearchResults {
        docs: top.hits.into_iter().map(|h| h.doc).collect(),
        total_hits: top.total_hits,
    })
}
