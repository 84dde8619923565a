//! Index query evaluation
//!
//! Evaluates a single-field [`IndexQuery`] against one segment into a
//! [`DocSet`] of segment-local document ids.

use std::io;

use fieldex_core::IndexQuery;

use crate::reader::{IndexReader, TermCursor};

/// Fixed-size set of document ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocSet {
    words: Vec<u64>,
    len: u32,
}

impl DocSet {
    /// Empty set over `0..len`
    pub fn empty(len: u32) -> Self {
        DocSet {
            words: vec![0; (len as usize + 63) / 64],
            len,
        }
    }

    /// Set containing every id in `0..len`
    pub fn full(len: u32) -> Self {
        let mut set = Self::empty(len);
        for word in &mut set.words {
            *word = u64::MAX;
        }
        set.clear_tail();
        set
    }

    fn clear_tail(&mut self) {
        let rem = self.len % 64;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }

    /// Universe size
    pub fn universe(&self) -> u32 {
        self.len
    }

    /// Add a document; ids outside the universe are ignored
    pub fn insert(&mut self, doc: u32) {
        if doc < self.len {
            self.words[(doc / 64) as usize] |= 1 << (doc % 64);
        }
    }

    /// Membership test
    pub fn contains(&self, doc: u32) -> bool {
        doc < self.len && self.words[(doc / 64) as usize] & (1 << (doc % 64)) != 0
    }

    /// Number of documents in the set
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// True if no document is in the set
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Keep only documents also in `other`
    pub fn intersect_with(&mut self, other: &DocSet) {
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= *b;
        }
        for a in self.words.iter_mut().skip(other.words.len()) {
            *a = 0;
        }
    }

    /// Add every document of `other`
    pub fn union_with(&mut self, other: &DocSet) {
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= *b;
        }
        self.clear_tail();
    }

    /// Complement within the universe
    pub fn negate(&mut self) {
        for word in &mut self.words {
            *word = !*word;
        }
        self.clear_tail();
    }

    /// Document ids in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let base = i as u32 * 64;
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let tz = bits.trailing_zeros();
                bits &= bits - 1;
                Some(base + tz)
            })
        })
    }
}

/// Evaluate `query` against one segment.
pub fn matching_docs(reader: &dyn IndexReader, query: &IndexQuery) -> io::Result<DocSet> {
    let max_doc = reader.max_doc();
    let mut set = DocSet::empty(max_doc);
    if max_doc == 0 {
        return Ok(set);
    }

    match query {
        IndexQuery::Nothing => {}
        IndexQuery::Terms { field, values } => {
            for value in values {
                let terms = reader.terms_from(field, value)?;
                let exact = terms
                    .term()
                    .map_or(false, |t| t.is_field(field) && t.text == value.as_str());
                if exact {
                    add_postings(&*terms, &mut set)?;
                }
            }
        }
        IndexQuery::Present { field } => add_field(reader, field, &mut set)?,
        IndexQuery::Missing { field } => {
            add_field(reader, field, &mut set)?;
            set.negate();
        }
    }
    Ok(set)
}

fn add_field(reader: &dyn IndexReader, field: &str, set: &mut DocSet) -> io::Result<()> {
    let mut terms = reader.terms_from(field, "")?;
    while terms.term().map_or(false, |t| t.is_field(field)) {
        add_postings(&*terms, set)?;
        terms.advance()?;
    }
    Ok(())
}

fn add_postings(terms: &dyn TermCursor, set: &mut DocSet) -> io::Result<()> {
    let mut postings = terms.postings()?;
    while let Some(doc) = postings.next_doc()? {
        set.insert(doc);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Document, SegmentBuilder};
    use crate::segment::Segment;

    fn segment() -> Segment {
        let mut builder = SegmentBuilder::new(0);
        builder.add_document(Document::new().field("status", "Open").field("label", "x"));
        builder.add_document(Document::new().field("status", "Closed"));
        builder.add_document(Document::new().field("status", "Open"));
        builder.add_document(Document::new().field("label", "y"));
        builder.build().unwrap()
    }

    #[test]
    fn test_docset_ops() {
        let mut a = DocSet::empty(130);
        a.insert(0);
        a.insert(64);
        a.insert(129);
        a.insert(500);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![0, 64, 129]);
        assert_eq!(a.count(), 3);

        let mut b = DocSet::full(130);
        assert_eq!(b.count(), 130);
        b.intersect_with(&a);
        assert_eq!(b, a);

        a.negate();
        assert_eq!(a.count(), 127);
        assert!(!a.contains(64));
        assert!(a.contains(1));
    }

    #[test]
    fn test_terms_query() {
        let seg = segment();
        let q = IndexQuery::Terms {
            field: "status".into(),
            values: vec!["Open".into(), "Reopened".into()],
        };
        let docs = matching_docs(&seg, &q).unwrap();
        assert_eq!(docs.iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_presence_queries() {
        let seg = segment();
        let present = matching_docs(&seg, &IndexQuery::Present { field: "label".into() }).unwrap();
        assert_eq!(present.iter().collect::<Vec<_>>(), vec![0, 3]);

        let missing = matching_docs(&seg, &IndexQuery::Missing { field: "label".into() }).unwrap();
        assert_eq!(missing.iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_nothing_query() {
        let seg = segment();
        assert!(matching_docs(&seg, &IndexQuery::Nothing).unwrap().is_empty());
    }
}
