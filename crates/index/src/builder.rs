//! Segment builder
//!
//! Accumulates documents in memory and encodes them into an immutable
//! [`Segment`]. Every field value is both indexed as a (field, text) term and
//! stored, so the sort layer can resolve values either from the term
//! dictionary or from the stored record of one document.

use std::collections::BTreeMap;

use std::io;

use crate::segment::{build_segment, encode_varint, Segment, MAX_TERM_BYTES};

/// A document: field names with their values, in insertion order.
///
/// Repeating a field name appends another value to that field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    fields: Vec<(String, Vec<String>)>,
}

impl Document {
    /// Empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value to a field (builder style)
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(name, value);
        self
    }

    /// Add a value to a field
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => self.fields.push((name, vec![value])),
        }
    }

    /// Values of a field, in insertion order
    pub fn values(&self, name: &str) -> &[String] {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// Field names in insertion order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }
}

/// Builds one segment from a sequence of documents.
///
/// Document ids are assigned densely from 0 in insertion order.
#[derive(Debug)]
pub struct SegmentBuilder {
    segment_id: u64,
    terms: BTreeMap<(String, String), Vec<u32>>,
    stored: Vec<Vec<u8>>,
}

impl SegmentBuilder {
    /// Builder for the segment with the given id
    pub fn new(segment_id: u64) -> Self {
        SegmentBuilder {
            segment_id,
            terms: BTreeMap::new(),
            stored: Vec::new(),
        }
    }

    /// Number of documents added so far
    pub fn doc_count(&self) -> u32 {
        self.stored.len() as u32
    }

    /// Add a document, returning its segment-local id.
    ///
    /// Names or values longer than 65535 bytes are stored but not indexed.
    pub fn add_document(&mut self, doc: Document) -> u32 {
        let doc_id = self.stored.len() as u32;
        let mut record = Vec::new();
        encode_varint(doc.fields.len() as u32, &mut record);

        for (name, values) in &doc.fields {
            encode_bytes(name.as_bytes(), &mut record);
            encode_varint(values.len() as u32, &mut record);
            for value in values {
                encode_bytes(value.as_bytes(), &mut record);
                if name.len() > MAX_TERM_BYTES || value.len() > MAX_TERM_BYTES {
                    tracing::warn!(
                        target: "fieldex::index",
                        field = %truncated(name),
                        doc = doc_id,
                        len = value.len(),
                        "Term too long to index, storing only"
                    );
                    continue;
                }
                let postings = self.terms.entry((name.clone(), value.clone())).or_default();
                if postings.last() != Some(&doc_id) {
                    postings.push(doc_id);
                }
            }
        }

        self.stored.push(record);
        doc_id
    }

    /// Encode the segment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a section of the segment would pass 4 GiB.
    pub fn build(self) -> io::Result<Segment> {
        let segment = build_segment(self.segment_id, self.terms.into_iter(), &self.stored)?;
        tracing::debug!(
            target: "fieldex::index",
            segment_id = self.segment_id,
            docs = self.stored.len(),
            "Built segment"
        );
        Ok(segment)
    }
}

fn encode_bytes(bytes: &[u8], buf: &mut Vec<u8>) {
    encode_varint(bytes.len() as u32, buf);
    buf.extend_from_slice(bytes);
}

fn truncated(name: &str) -> &str {
    match name.char_indices().nth(64) {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}
