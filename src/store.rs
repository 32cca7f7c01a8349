//! Document store contract and in-memory implementation.
//!
//! The marketplace core never talks to a concrete database; it consumes the
//! [`DocumentStore`] contract (get-by-id, query-by-field, insert, partial
//! update) and receives the store as an explicit dependency. [`MemoryStore`]
//! implements the contract in process for the demo and for tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {collection}/{id}")]
    Missing { collection: String, id: String },

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A stored record paired with its store-assigned id.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

/// Durable keyed storage for marketplace records.
///
/// Updates are partial: the patch is merged field-by-field into the existing
/// record, with explicit `null` values overwriting (not removing) fields.
pub trait DocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    async fn query(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        order_by: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError>;

    async fn insert(&self, collection: &str, record: Value) -> Result<String, StoreError>;

    /// Merge `patch` into an existing record. Fails if the id is absent.
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError>;
}

/// Merge `patch` into `target` one top-level field at a time.
pub fn merge_fields(target: &mut Value, patch: &Value) {
    if let (Value::Object(target), Value::Object(patch)) = (target, patch) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// In-memory [`DocumentStore`] keyed by collection name then document id.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, BTreeMap<String, Value>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner.get(collection).and_then(|c| c.get(id)).cloned())
    }

    async fn query(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        order_by: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let mut matches: Vec<Document> = inner
            .get(collection)
            .map(|c| {
                c.iter()
                    .filter(|(_, body)| body.get(field) == Some(value))
                    .map(|(id, body)| Document {
                        id: id.clone(),
                        body: body.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order_field) = order_by {
            // Descending, matching the listing order the marketplace uses
            // (newest first, highest reputation first).
            matches.sort_by(|a, b| {
                compare_values(b.body.get(order_field), a.body.get(order_field))
            });
        }
        if let Some(limit) = limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }

    async fn insert(&self, collection: &str, record: Value) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), record);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let record = inner
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| StoreError::Missing {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        merge_fields(record, &patch);
        Ok(())
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(std::cmp::Ordering::Equal),
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
        (Some(_), None) => std::cmp::Ordering::Greater,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (None, None) => std::cmp::Ordering::Equal,
    }
}
