//! In-memory entity store for tests and embedding hosts.

use std::cell::RefCell;
use std::collections::BTreeMap;

use super::EntityStore;
use crate::error::StorageError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    // (kind, id) -> (owner_id, body)
    rows: RefCell<BTreeMap<(String, String), (String, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }
}

impl EntityStore for MemoryStore {
    fn get_raw(&self, kind: &str, id: &str) -> Result<Option<String>, StorageError> {
        let rows = self.rows.borrow();
        Ok(rows
            .get(&(kind.to_string(), id.to_string()))
            .map(|(_, body)| body.clone()))
    }

    fn list_raw(&self, kind: &str, owner_id: &str) -> Result<Vec<(String, String)>, StorageError> {
        let rows = self.rows.borrow();
        Ok(rows
            .iter()
            .filter(|((k, _), (owner, _))| k == kind && owner == owner_id)
            .map(|((_, id), (_, body))| (id.clone(), body.clone()))
            .collect())
    }

    fn put_raw(&self, kind: &str, id: &str, owner_id: &str, body: &str) -> Result<(), StorageError> {
        self.rows.borrow_mut().insert(
            (kind.to_string(), id.to_string()),
            (owner_id.to_string(), body.to_string()),
        );
        Ok(())
    }

    fn delete_raw(&self, kind: &str, id: &str) -> Result<bool, StorageError> {
        Ok(self
            .rows
            .borrow_mut()
            .remove(&(kind.to_string(), id.to_string()))
            .is_some())
    }
}
