use crate::core::{DomainError, EntityId, ID_FIELD, Result, VERSION_FIELD};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One named collection of JSON documents, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    name: String,
    documents: Vec<Value>,
    index: HashMap<EntityId, usize>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&Value> {
        self.index.get(&id).map(|pos| &self.documents[*pos])
    }

    /// Stored version of a document, 0 when absent.
    pub fn version_of(&self, id: EntityId) -> u64 {
        self.get(id)
            .and_then(|doc| doc.get(VERSION_FIELD))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    pub fn scan(&self) -> Vec<Value> {
        self.documents.clone()
    }

    /// Documents for the given ids in insertion order; unknown ids skipped.
    pub fn select(&self, ids: &[EntityId]) -> Vec<Value> {
        let mut positions: Vec<usize> = ids
            .iter()
            .filter_map(|id| self.index.get(id).copied())
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions
            .into_iter()
            .map(|pos| self.documents[pos].clone())
            .collect()
    }

    /// Version-checked insert or replace.
    pub fn write(&mut self, id: EntityId, expected_version: u64, document: Value) -> Result<Value> {
        let current = self.version_of(id);
        if current != expected_version {
            return Err(DomainError::conflict(format!(
                "{} '{}' is at version {}, write expected {}",
                self.name, id, current, expected_version
            )));
        }
        Ok(self.put(id, expected_version + 1, document))
    }

    /// Store a document at an already validated version.
    pub(crate) fn put(&mut self, id: EntityId, version: u64, mut document: Value) -> Value {
        if let Value::Object(fields) = &mut document {
            fields.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
            fields.insert(VERSION_FIELD.to_string(), Value::from(version));
        }

        match self.index.get(&id) {
            Some(pos) => self.documents[*pos] = document.clone(),
            None => {
                self.index.insert(id, self.documents.len());
                self.documents.push(document.clone());
            }
        }
        document
    }

    /// Overwrite top-level fields of one document. `id` and `version` in
    /// the field set are ignored.
    pub fn patch(&mut self, id: EntityId, fields: Map<String, Value>) -> Option<Value> {
        let pos = *self.index.get(&id)?;
        let document = &mut self.documents[pos];
        let next_version = document
            .get(VERSION_FIELD)
            .and_then(Value::as_u64)
            .unwrap_or(0)
            + 1;

        if let Value::Object(stored) = &mut *document {
            for (key, value) in fields {
                if key == ID_FIELD || key == VERSION_FIELD {
                    continue;
                }
                stored.insert(key, value);
            }
            stored.insert(VERSION_FIELD.to_string(), Value::from(next_version));
        }
        Some(document.clone())
    }

    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(pos) = self.index.remove(&id) else {
            return false;
        };
        self.documents.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        true
    }
}
