//! Collection-oriented document store interface.
//!
//! The store is an external collaborator: the core consumes this trait and
//! assumes nothing beyond per-operation atomicity. There is no cross-collection
//! transaction, so every multi-collection read (feed assembly, conversation
//! enrichment) works on independent snapshots by design.
//!
//! Filters are conjunctions of typed clauses, covering exactly the query
//! shapes the services need: equality, membership, greater-than (timestamps),
//! and array containment.

mod memory;

pub use memory::MemoryStore;

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Clone)]
pub enum Clause {
    /// Field equals value.
    Eq(String, Value),
    /// Field equals any of the listed values.
    In(String, Vec<Value>),
    /// Field is strictly greater than value (canonical timestamps compare
    /// lexicographically, so this works for recency cutoffs).
    Gt(String, Value),
    /// Array field contains the value.
    Contains(String, Value),
    /// Array field contains every listed value.
    ContainsAll(String, Vec<Value>),
}

/// Conjunction of clauses. An empty filter matches every document.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq(field.into(), value.into()));
        self
    }

    pub fn is_in(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.clauses.push(Clause::In(field.into(), values));
        self
    }

    pub fn gt(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Gt(field.into(), value.into()));
        self
    }

    pub fn contains(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Contains(field.into(), value.into()));
        self
    }

    pub fn contains_all(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.clauses.push(Clause::ContainsAll(field.into(), values));
        self
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Eq(field, value) => doc.get(field) == Some(value),
            Clause::In(field, values) => doc
                .get(field)
                .map(|v| values.contains(v))
                .unwrap_or(false),
            Clause::Gt(field, value) => doc
                .get(field)
                .map(|v| compare_values(v, value) == Ordering::Greater)
                .unwrap_or(false),
            Clause::Contains(field, value) => doc
                .get(field)
                .and_then(Value::as_array)
                .map(|items| items.contains(value))
                .unwrap_or(false),
            Clause::ContainsAll(field, values) => doc
                .get(field)
                .and_then(Value::as_array)
                .map(|items| values.iter().all(|v| items.contains(v)))
                .unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Pagination and ordering for [`DocumentStore::find`].
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub sort: Option<(String, SortOrder)>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn sort_asc(mut self, field: impl Into<String>) -> Self {
        self.sort = Some((field.into(), SortOrder::Ascending));
        self
    }

    pub fn sort_desc(mut self, field: impl Into<String>) -> Self {
        self.sort = Some((field.into(), SortOrder::Descending));
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Ordering over JSON scalars. Mixed types order by type tag so sorting is
/// total; within a type: booleans false < true, numbers by value, strings
/// lexicographically (which is chronological for canonical timestamps).
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn type_rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Decode a stored document into a typed entity. A document that fails to
/// decode is a store-level fault, not a caller error.
pub fn decode<T: serde::de::DeserializeOwned>(doc: Value) -> Result<T> {
    serde_json::from_value(doc).map_err(|e| crate::error::Error::store(e.to_string()))
}

/// Encode an entity for insertion.
pub fn encode<T: Serialize>(entity: &T) -> Result<Value> {
    serde_json::to_value(entity).map_err(|e| crate::error::Error::store(e.to_string()))
}

/// The store contract consumed by every service.
///
/// Implementations must not assume callers hold any lock across a call; every
/// method is a suspension point from the caller's perspective.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Append a document to a collection.
    async fn insert(&self, collection: &str, doc: Value) -> Result<()>;

    /// First matching document in insertion order, if any.
    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>>;

    /// Matching documents with optional sort and skip/limit pagination.
    /// Sorting is stable: equal keys keep insertion order, which serves as
    /// the tie-breaking secondary sort key.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Value>>;

    /// Shallow-merge `patch` (a JSON object) into the first matching
    /// document. Returns whether a document matched.
    async fn update_one(&self, collection: &str, filter: &Filter, patch: Value) -> Result<bool>;

    /// Remove the first matching document. Returns whether one was removed.
    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<bool>;

    /// Number of matching documents.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64>;
}
