//! Field comparators
//!
//! A `FieldComparator` is the type adapter between raw term text and a sort
//! value: it converts text into a comparable value and orders those values.
//! Numbers, dates and custom field types participate in sorting through
//! their own comparator without the term scan knowing their semantics.

use std::cmp::Ordering;
use std::sync::Arc;

/// Converts term text into comparable values and orders them.
pub trait FieldComparator: Send + Sync {
    /// Comparable value
    type Value: Clone + Send + Sync;

    /// Convert term text; `None` means the text has no comparable form
    fn to_comparable(&self, text: &str) -> Option<Self::Value>;

    /// Order two values
    fn compare(&self, a: &Self::Value, b: &Self::Value) -> Ordering;
}

/// Identity comparator: lexicographic order of the term text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextComparator;

impl FieldComparator for TextComparator {
    type Value = Arc<str>;

    fn to_comparable(&self, text: &str) -> Option<Arc<str>> {
        Some(Arc::from(text))
    }

    fn compare(&self, a: &Arc<str>, b: &Arc<str>) -> Ordering {
        if Arc::ptr_eq(a, b) {
            return Ordering::Equal;
        }
        a.cmp(b)
    }
}

/// Numeric comparator: parses term text as `f64`.
///
/// Unparsable text and NaN have no comparable form.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberComparator;

impl FieldComparator for NumberComparator {
    type Value = f64;

    fn to_comparable(&self, text: &str) -> Option<f64> {
        text.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
    }

    fn compare(&self, a: &f64, b: &f64) -> Ordering {
        a.total_cmp(b)
    }
}

/// Reverses the order of another comparator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reverse<C>(pub C);

impl<C: FieldComparator> FieldComparator for Reverse<C> {
    type Value = C::Value;

    fn to_comparable(&self, text: &str) -> Option<C::Value> {
        self.0.to_comparable(text)
    }

    fn compare(&self, a: &C::Value, b: &C::Value) -> Ordering {
        self.0.compare(b, a)
    }
}
