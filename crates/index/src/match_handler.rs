//! Match handlers
//!
//! A term scan reports every (document, term text) pair of one field to a
//! [`MatchHandler`]. The handlers here build one slot per document.
//!
//! Most documents carry a single value per field. Both handlers therefore
//! intern single-value lists within one scan: consecutive matches of the same
//! term share one `Arc<[String]>`, so a scan over single-valued data never
//! allocates a per-document collection. A document only gets its own `Vec`
//! when it receives a second value.

use std::sync::Arc;

/// Receives matches from a term scan, in ascending term order.
pub trait MatchHandler {
    /// `doc` carries the term `value`
    fn on_match(&mut self, doc: u32, value: &str);
}

/// Values of one document for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocTerms {
    /// Single value, shared with every document holding the same term
    Shared(Arc<[String]>),
    /// Several values, owned by this document
    Owned(Vec<String>),
}

impl DocTerms {
    /// Values in match order
    pub fn as_slice(&self) -> &[String] {
        match self {
            DocTerms::Shared(list) => list,
            DocTerms::Owned(list) => list,
        }
    }

    /// The shared singleton, if this slot holds one
    pub fn shared(&self) -> Option<&Arc<[String]>> {
        match self {
            DocTerms::Shared(list) => Some(list),
            DocTerms::Owned(_) => None,
        }
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// True if there are no values
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

/// Interns the singleton list of the term currently being scanned.
#[derive(Debug, Default)]
struct Singletons {
    last: Option<Arc<[String]>>,
}

impl Singletons {
    fn get(&mut self, value: &str) -> Arc<[String]> {
        match &self.last {
            Some(list) if list[0] == value => Arc::clone(list),
            _ => {
                let list: Arc<[String]> = Arc::from(vec![value.to_owned()]);
                self.last = Some(Arc::clone(&list));
                list
            }
        }
    }
}

// ============================================================================
// AllValuesHandler
// ============================================================================

/// Collects every value of every document.
#[derive(Debug)]
pub struct AllValuesHandler {
    docs: Vec<Option<DocTerms>>,
    singletons: Singletons,
    promotions: usize,
}

impl AllValuesHandler {
    /// Handler for a segment with `max_doc` documents
    pub fn new(max_doc: u32) -> Self {
        AllValuesHandler {
            docs: vec![None; max_doc as usize],
            singletons: Singletons::default(),
            promotions: 0,
        }
    }

    /// Number of documents that were promoted to an owned multi-value list
    pub fn promotions(&self) -> usize {
        self.promotions
    }

    /// Per-document results so far
    pub fn results(&self) -> &[Option<DocTerms>] {
        &self.docs
    }

    /// Per-document results, indexed by document id
    pub fn into_results(self) -> Vec<Option<DocTerms>> {
        self.docs
    }
}

impl MatchHandler for AllValuesHandler {
    fn on_match(&mut self, doc: u32, value: &str) {
        let Some(slot) = self.docs.get_mut(doc as usize) else {
            return;
        };
        match slot {
            None => *slot = Some(DocTerms::Shared(self.singletons.get(value))),
            Some(DocTerms::Shared(list)) => {
                let mut owned = Vec::with_capacity(list.len() + 1);
                owned.extend(list.iter().cloned());
                owned.push(value.to_owned());
                *slot = Some(DocTerms::Owned(owned));
                self.promotions += 1;
            }
            Some(DocTerms::Owned(list)) => list.push(value.to_owned()),
        }
    }
}

// ============================================================================
// SingleValueHandler
// ============================================================================

/// Keeps one value per document, last writer wins.
///
/// Meant for fields known to be single-valued; a multi-valued document
/// silently keeps its greatest term.
#[derive(Debug)]
pub struct SingleValueHandler {
    docs: Vec<Option<Arc<[String]>>>,
    singletons: Singletons,
}

impl SingleValueHandler {
    /// Handler for a segment with `max_doc` documents
    pub fn new(max_doc: u32) -> Self {
        SingleValueHandler {
            docs: vec![None; max_doc as usize],
            singletons: Singletons::default(),
        }
    }

    /// Per-document results, indexed by document id
    pub fn into_results(self) -> Vec<Option<DocTerms>> {
        self.docs
            .into_iter()
            .map(|slot| slot.map(DocTerms::Shared))
            .collect()
    }
}

impl MatchHandler for SingleValueHandler {
    fn on_match(&mut self, doc: u32, value: &str) {
        if let Some(slot) = self.docs.get_mut(doc as usize) {
            *slot = Some(self.singletons.get(value));
        }
    }
}
