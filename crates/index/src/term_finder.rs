//! Term-ordered field scans
//!
//! These functions walk the terms of one field in ascending text order and
//! their postings in ascending document order. Dictionaries are field-major,
//! so every scan seeks to `(field, "")` and stops at the first term of a
//! different field. A segment without documents is never scanned.
//!
//! Index failures propagate as `io::Error`.

use std::cmp::Ordering;
use std::io;

use crate::comparator::FieldComparator;
use crate::match_handler::MatchHandler;
use crate::reader::{IndexReader, TermRef};
use crate::segment::MAX_TERM_BYTES;

/// Resolve one comparable value per document.
///
/// Terms are visited in ascending order and a slot is overwritten when it is
/// empty or when the new value does not compare greater than the current
/// one. With a natural-order comparator a multi-valued document ends up with
/// its smallest value; under a reversing comparator it keeps the largest.
/// Terms without a comparable form are skipped.
pub fn resolve_values<C>(
    reader: &dyn IndexReader,
    field: &str,
    comparator: &C,
) -> io::Result<Vec<Option<C::Value>>>
where
    C: FieldComparator + ?Sized,
{
    let mut values: Vec<Option<C::Value>> = vec![None; reader.max_doc() as usize];
    if values.is_empty() {
        return Ok(values);
    }

    let mut terms = reader.terms_from(field, "")?;
    while let Some(term) = terms.term() {
        if !term.is_field(field) {
            break;
        }
        if let Some(value) = comparator.to_comparable(term.text) {
            let mut postings = terms.postings()?;
            while let Some(doc) = postings.next_doc()? {
                if let Some(slot) = values.get_mut(doc as usize) {
                    replace_if_not_greater(comparator, slot, &value);
                }
            }
        }
        terms.advance()?;
    }
    Ok(values)
}

/// Apply the [`resolve_values`] rule to the stored values of one document.
///
/// Values are visited in term order, so the result matches what a full scan
/// of the term dictionary would have put in this document's slot. Values
/// longer than [`MAX_TERM_BYTES`] were never indexed and are skipped.
pub fn select_value<C, S>(comparator: &C, stored: &[S]) -> Option<C::Value>
where
    C: FieldComparator + ?Sized,
    S: AsRef<str>,
{
    let mut texts: Vec<&str> = stored
        .iter()
        .map(AsRef::as_ref)
        .filter(|text| text.len() <= MAX_TERM_BYTES)
        .collect();
    texts.sort_unstable();
    texts.dedup();

    let mut slot = None;
    for text in texts {
        if let Some(value) = comparator.to_comparable(text) {
            replace_if_not_greater(comparator, &mut slot, &value);
        }
    }
    slot
}

/// Value of one document read from its stored field.
///
/// Agrees with the slot [`resolve_values`] fills for `doc`: a field whose
/// name is too long to index has no value.
pub fn stored_value<C>(
    reader: &dyn IndexReader,
    doc: u32,
    field: &str,
    comparator: &C,
) -> io::Result<Option<C::Value>>
where
    C: FieldComparator + ?Sized,
{
    if field.len() > MAX_TERM_BYTES {
        return Ok(None);
    }
    let stored = reader.stored_values(doc, field)?;
    Ok(select_value(comparator, &stored))
}

#[inline]
fn replace_if_not_greater<C>(comparator: &C, slot: &mut Option<C::Value>, value: &C::Value)
where
    C: FieldComparator + ?Sized,
{
    let replace = match slot {
        Some(current) => comparator.compare(value, current) != Ordering::Greater,
        None => true,
    };
    if replace {
        *slot = Some(value.clone());
    }
}

/// Report every (document, term) pair of `field` to `handler`, in ascending
/// term order and ascending document order within a term.
pub fn collect_matches<H>(reader: &dyn IndexReader, field: &str, handler: &mut H) -> io::Result<()>
where
    H: MatchHandler + ?Sized,
{
    if reader.max_doc() == 0 {
        return Ok(());
    }

    let mut terms = reader.terms_from(field, "")?;
    while let Some(term) = terms.term() {
        if !term.is_field(field) {
            break;
        }
        let mut postings = terms.postings()?;
        while let Some(doc) = postings.next_doc()? {
            handler.on_match(doc, term.text);
        }
        drop(postings);
        terms.advance()?;
    }
    Ok(())
}

/// True if some document carries `text` in `field`. Single seek, no scan.
pub fn field_contains_term(reader: &dyn IndexReader, field: &str, text: &str) -> io::Result<bool> {
    if reader.max_doc() == 0 {
        return Ok(false);
    }
    let terms = reader.terms_from(field, text)?;
    Ok(terms.term() == Some(TermRef { field, text }) && terms.doc_freq() > 0)
}

/// Distinct term texts of `field` in ascending order; empty if the field is
/// absent.
pub fn term_values_for_field(reader: &dyn IndexReader, field: &str) -> io::Result<Vec<String>> {
    let mut out = Vec::new();
    if reader.max_doc() == 0 {
        return Ok(out);
    }

    let mut terms = reader.terms_from(field, "")?;
    while let Some(term) = terms.term() {
        if !term.is_field(field) {
            break;
        }
        out.push(term.text.to_owned());
        terms.advance()?;
    }
    Ok(out)
}
