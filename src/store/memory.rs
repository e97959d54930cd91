//! In-process document store.
//!
//! Default backend for the binary and the test backend for the integration
//! suite. Collections are plain vectors in insertion order; the stable sort in
//! `find` therefore tie-breaks equal sort keys by insertion order. Critical
//! sections are short and never span an await.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use super::{compare_values, DocumentStore, Filter, FindOptions, SortOrder};
use crate::error::{Error, Result};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, doc: Value) -> Result<()> {
        if !doc.is_object() {
            return Err(Error::store("document must be a JSON object"));
        }
        let mut collections = self
            .collections
            .write()
            .map_err(|_| Error::store("store lock poisoned"))?;
        collections.entry(collection.to_string()).or_default().push(doc);
        Ok(())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| Error::store("store lock poisoned"))?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)).cloned()))
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Value>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| Error::store("store lock poisoned"))?;
        let mut matched: Vec<Value> = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).cloned().collect())
            .unwrap_or_default();
        drop(collections);

        if let Some((field, order)) = &options.sort {
            let null = Value::Null;
            // Vec::sort_by is stable; equal keys keep insertion order.
            matched.sort_by(|a, b| {
                let ka = a.get(field).unwrap_or(&null);
                let kb = b.get(field).unwrap_or(&null);
                match order {
                    SortOrder::Ascending => compare_values(ka, kb),
                    SortOrder::Descending => compare_values(kb, ka),
                }
            });
        }

        let page = matched
            .into_iter()
            .skip(options.skip)
            .take(options.limit.unwrap_or(usize::MAX))
            .collect();
        Ok(page)
    }

    async fn update_one(&self, collection: &str, filter: &Filter, patch: Value) -> Result<bool> {
        let fields = match patch {
            Value::Object(map) => map,
            _ => return Err(Error::store("patch must be a JSON object")),
        };
        let mut collections = self
            .collections
            .write()
            .map_err(|_| Error::store("store lock poisoned"))?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(doc) = docs.iter_mut().find(|doc| filter.matches(doc)) else {
            return Ok(false);
        };
        if let Value::Object(existing) = doc {
            for (key, value) in fields {
                existing.insert(key, value);
            }
        }
        Ok(true)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<bool> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| Error::store("store lock poisoned"))?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        match docs.iter().position(|doc| filter.matches(doc)) {
            Some(index) => {
                docs.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let collections = self
            .collections
            .read()
            .map_err(|_| Error::store("store lock poisoned"))?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).count() as u64)
            .unwrap_or(0))
    }
}
