//! Query types
//!
//! A `Query` is a conjunction of JQL `Clause`s. Each clause is handed to the
//! clause handlers registered under its name, which translate it into an
//! `IndexQuery` over one indexed field.

use crate::traits::ClauseQueryFactory;

/// Clause operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `name = value`
    Equals,
    /// `name in (v1, v2, ...)`
    In,
    /// `name is EMPTY`
    IsEmpty,
    /// `name is not EMPTY`
    IsNotEmpty,
}

/// A single JQL terminal clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    name: String,
    operator: Operator,
    values: Vec<String>,
}

impl Clause {
    /// Create a clause
    pub fn new<I, S>(name: impl Into<String>, operator: Operator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Clause {
            name: name.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `name is EMPTY`
    pub fn is_empty(name: impl Into<String>) -> Self {
        Self::new(name, Operator::IsEmpty, Vec::<String>::new())
    }

    /// Clause name as written in the query
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operator
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Operand values
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// Conjunction of clauses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    clauses: Vec<Clause>,
}

impl Query {
    /// Query matching every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a clause (builder style)
    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Clauses in the order they were added
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }
}

/// Query over a single indexed field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexQuery {
    /// Documents carrying any of the terms
    Terms {
        /// Index field
        field: String,
        /// Exact term texts
        values: Vec<String>,
    },
    /// Documents without any term for the field
    Missing {
        /// Index field
        field: String,
    },
    /// Documents with at least one term for the field
    Present {
        /// Index field
        field: String,
    },
    /// Matches nothing
    Nothing,
}

/// Default query factory: exact term match on one index field.
#[derive(Debug, Clone)]
pub struct TermQueryFactory {
    index_field: String,
}

impl TermQueryFactory {
    /// Factory targeting `index_field`
    pub fn new(index_field: impl Into<String>) -> Self {
        TermQueryFactory {
            index_field: index_field.into(),
        }
    }

    /// Index field this factory queries
    pub fn index_field(&self) -> &str {
        &self.index_field
    }
}

impl ClauseQueryFactory for TermQueryFactory {
    fn create_query(&self, clause: &Clause) -> IndexQuery {
        let field = self.index_field.clone();
        match clause.operator() {
            Operator::Equals | Operator::In if clause.values().is_empty() => IndexQuery::Nothing,
            Operator::Equals | Operator::In => IndexQuery::Terms {
                field,
                values: clause.values().to_vec(),
            },
            Operator::IsEmpty => IndexQuery::Missing { field },
            Operator::IsNotEmpty => IndexQuery::Present { field },
        }
    }
}
