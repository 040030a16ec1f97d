use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::Store;
use crate::utils::{QueueError, Result};

#[derive(Debug, Default)]
struct State {
    lists: HashMap<String, VecDeque<String>>,
    hashes: HashMap<String, HashMap<String, Vec<u8>>>,
}

/// In-process store. Every primitive runs under a single lock, which makes
/// `move_atomic` trivially atomic for all callers sharing the instance.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| QueueError::StoreUnavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn append(&self, list: &str, value: &str) -> Result<()> {
        let mut state = self.lock()?;
        state
            .lists
            .entry(list.to_string())
            .or_default()
            .push_back(value.to_string());
        Ok(())
    }

    async fn move_atomic(&self, src: &str, dst: &str) -> Result<Option<String>> {
        let mut state = self.lock()?;
        let value = match state.lists.get_mut(src) {
            Some(items) => items.pop_front(),
            None => None,
        };
        let Some(value) = value else {
            return Ok(None);
        };
        if state.lists.get(src).is_some_and(|items| items.is_empty()) {
            state.lists.remove(src);
        }
        state
            .lists
            .entry(dst.to_string())
            .or_default()
            .push_back(value.clone());
        Ok(Some(value))
    }

    async fn remove(&self, list: &str, value: &str) -> Result<bool> {
        let mut state = self.lock()?;
        let Some(items) = state.lists.get_mut(list) else {
            return Ok(false);
        };
        let Some(pos) = items.iter().position(|item| item == value) else {
            return Ok(false);
        };
        items.remove(pos);
        if items.is_empty() {
            state.lists.remove(list);
        }
        Ok(true)
    }

    async fn hash_set(&self, map: &str, field: &str, value: &[u8]) -> Result<()> {
        let mut state = self.lock()?;
        state
            .hashes
            .entry(map.to_string())
            .or_default()
            .insert(field.to_string(), value.to_vec());
        Ok(())
    }

    async fn hash_get(&self, map: &str, field: &str) -> Result<Option<Vec<u8>>> {
        let state = self.lock()?;
        Ok(state
            .hashes
            .get(map)
            .and_then(|fields| fields.get(field))
            .cloned())
    }

    async fn hash_del(&self, map: &str, field: &str) -> Result<bool> {
        let mut state = self.lock()?;
        let Some(fields) = state.hashes.get_mut(map) else {
            return Ok(false);
        };
        let found = fields.remove(field).is_some();
        if fields.is_empty() {
            state.hashes.remove(map);
        }
        Ok(found)
    }

    async fn list_contents(&self, list: &str) -> Result<Vec<String>> {
        let state = self.lock()?;
        Ok(state
            .lists
            .get(list)
            .map(|items| items.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let state = self.lock()?;
        Ok(state
            .lists
            .keys()
            .chain(state.hashes.keys())
            .cloned()
            .collect())
    }
}
