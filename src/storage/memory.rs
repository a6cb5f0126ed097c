use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use super::Store;
use crate::error::Result;
use crate::model::Model;

/// In-memory storage registry.
///
/// Tracks serialized records keyed `"<Kind>.<id>"`. `persist` copies the
/// tracked set into a snapshot observable through
/// [`MemoryStore::persisted`]; there is no durable backend behind it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: HashMap<String, Map<String, Value>>,
    persisted: HashMap<String, Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked records.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Tracked state of a record, if registered.
    pub fn get(&self, key: &str) -> Option<&Map<String, Value>> {
        self.objects.get(key)
    }

    /// Persisted state of a record, if flushed.
    pub fn persisted(&self, key: &str) -> Option<&Map<String, Value>> {
        self.persisted.get(key)
    }

    /// Number of persisted records.
    pub fn persisted_len(&self) -> usize {
        self.persisted.len()
    }
}

impl Store for MemoryStore {
    fn register(&mut self, model: &dyn Model) -> Result<()> {
        let key = model.storage_key();
        debug!(%key, "tracking record");
        self.objects.insert(key, model.to_map());
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        debug!(count = self.objects.len(), "persisting tracked records");
        self.persisted = self.objects.clone();
        Ok(())
    }
}
