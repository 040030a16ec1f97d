//! Store backed by `sled`.
//!
//! Three trees hold the data:
//! - `items`: one entry per list element, keyed `list \0 <seq as u64 BE>`,
//!   so a prefix scan yields a list head first.
//! - `bounds`: per list, the half-open sequence range `[head, tail)` as two
//!   big-endian u64s. Absent for empty lists.
//! - `hashes`: key is `map \0 field`, value is the raw field bytes.
//!
//! List mutations run in one transaction over `items` and `bounds` and touch
//! a constant number of keys, apart from skipping the gaps `remove` leaves
//! in the middle of a list. The slots at `head` and `tail - 1` are always
//! occupied, so an emptied list loses its `bounds` entry.
//! Names must not contain NUL; topic validation guarantees that for queue
//! keys.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    Transactional, TransactionalTree,
};
use sled::{Db, IVec, Tree};

use super::Store;
use crate::utils::{QueueError, Result};

const SEPARATOR: u8 = 0;

type TxResult<T> = ConflictableTransactionResult<T, QueueError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Bounds {
    head: u64,
    tail: u64,
}

impl Bounds {
    fn is_empty(&self) -> bool {
        self.head >= self.tail
    }

    fn encode(&self) -> [u8; 16] {
        let mut raw = [0u8; 16];
        raw[..8].copy_from_slice(&self.head.to_be_bytes());
        raw[8..].copy_from_slice(&self.tail.to_be_bytes());
        raw
    }

    fn decode(list: &str, raw: &[u8]) -> std::result::Result<Self, QueueError> {
        let corrupt = || {
            QueueError::Storage(sled::Error::Unsupported(format!(
                "corrupt bounds for list '{list}'"
            )))
        };
        let head: [u8; 8] = raw.get(..8).and_then(|b| b.try_into().ok()).ok_or_else(corrupt)?;
        let tail: [u8; 8] = raw.get(8..16).and_then(|b| b.try_into().ok()).ok_or_else(corrupt)?;
        Ok(Self {
            head: u64::from_be_bytes(head),
            tail: u64::from_be_bytes(tail),
        })
    }
}

#[derive(Clone)]
pub struct SledStore {
    db: Db,
    items: Tree,
    bounds: Tree,
    hashes: Tree,
}

impl SledStore {
    /// Open or create a sled database at `path`.
    pub fn open(path: &str) -> Result<Self> {
        let db = sled::open(path)?;
        let items = db.open_tree("items")?;
        let bounds = db.open_tree("bounds")?;
        let hashes = db.open_tree("hashes")?;
        Ok(Self {
            db,
            items,
            bounds,
            hashes,
        })
    }

    /// Flush dirty pages to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Run `f` against the `items` and `bounds` trees inside one transaction.
    fn with_lists<T>(
        &self,
        f: impl Fn(&TransactionalTree, &TransactionalTree) -> TxResult<T>,
    ) -> Result<T> {
        (&self.items, &self.bounds)
            .transaction(|(items, bounds)| f(items, bounds))
            .map_err(|e| match e {
                TransactionError::Abort(e) => e,
                TransactionError::Storage(e) => QueueError::Storage(e),
            })
    }

    /// First key in `list` holding `value`, from a non-transactional scan.
    fn find(&self, list: &str, value: &str) -> Result<Option<IVec>> {
        let prefix = list_prefix(list);
        for entry in self.items.scan_prefix(&prefix) {
            let (key, item) = entry?;
            if key.len() == prefix.len() + 8 && &*item == value.as_bytes() {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }
}

fn list_prefix(list: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(list.len() + 9);
    key.extend_from_slice(list.as_bytes());
    key.push(SEPARATOR);
    key
}

fn item_key(list: &str, seq: u64) -> Vec<u8> {
    let mut key = list_prefix(list);
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

fn field_key(map: &str, field: &str) -> Vec<u8> {
    let mut key = list_prefix(map);
    key.extend_from_slice(field.as_bytes());
    key
}

fn read_bounds(bounds: &TransactionalTree, list: &str) -> TxResult<Bounds> {
    match bounds.get(list)? {
        Some(raw) => Bounds::decode(list, &raw).map_err(ConflictableTransactionError::Abort),
        None => Ok(Bounds::default()),
    }
}

fn write_bounds(bounds: &TransactionalTree, list: &str, range: Bounds) -> TxResult<()> {
    if range.is_empty() {
        bounds.remove(list)?;
    } else {
        bounds.insert(list, &range.encode()[..])?;
    }
    Ok(())
}

/// Shrink `range` past vacant slots at either end.
fn trim(items: &TransactionalTree, list: &str, range: &mut Bounds) -> TxResult<()> {
    while !range.is_empty() && items.get(item_key(list, range.head))?.is_none() {
        range.head += 1;
    }
    while !range.is_empty() && items.get(item_key(list, range.tail - 1))?.is_none() {
        range.tail -= 1;
    }
    Ok(())
}

fn push_back(
    items: &TransactionalTree,
    bounds: &TransactionalTree,
    list: &str,
    value: &str,
) -> TxResult<()> {
    let mut range = read_bounds(bounds, list)?;
    items.insert(item_key(list, range.tail), value.as_bytes())?;
    range.tail += 1;
    write_bounds(bounds, list, range)
}

fn pop_front(
    items: &TransactionalTree,
    bounds: &TransactionalTree,
    list: &str,
) -> TxResult<Option<String>> {
    let mut range = read_bounds(bounds, list)?;
    if range.is_empty() {
        return Ok(None);
    }
    let value = items.remove(item_key(list, range.head))?;
    range.head += 1;
    trim(items, list, &mut range)?;
    write_bounds(bounds, list, range)?;
    Ok(value.map(|raw| String::from_utf8_lossy(&raw).into_owned()))
}

#[async_trait]
impl Store for SledStore {
    async fn append(&self, list: &str, value: &str) -> Result<()> {
        self.with_lists(|items, bounds| push_back(items, bounds, list, value))
    }

    async fn move_atomic(&self, src: &str, dst: &str) -> Result<Option<String>> {
        self.with_lists(|items, bounds| {
            let Some(value) = pop_front(items, bounds, src)? else {
                return Ok(None);
            };
            push_back(items, bounds, dst, &value)?;
            Ok(Some(value))
        })
    }

    async fn remove(&self, list: &str, value: &str) -> Result<bool> {
        loop {
            let Some(key) = self.find(list, value)? else {
                return Ok(false);
            };
            // None: the slot changed after the scan, look again
            let removed = self.with_lists(|items, bounds| {
                match items.get(&key)? {
                    Some(current) if &*current == value.as_bytes() => {}
                    _ => return Ok(None),
                }
                items.remove(key.clone())?;
                let mut range = read_bounds(bounds, list)?;
                trim(items, list, &mut range)?;
                write_bounds(bounds, list, range)?;
                Ok(Some(()))
            })?;
            if removed.is_some() {
                return Ok(true);
            }
        }
    }

    async fn hash_set(&self, map: &str, field: &str, value: &[u8]) -> Result<()> {
        self.hashes.insert(field_key(map, field), value)?;
        Ok(())
    }

    async fn hash_get(&self, map: &str, field: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .hashes
            .get(field_key(map, field))?
            .map(|value| value.to_vec()))
    }

    async fn hash_del(&self, map: &str, field: &str) -> Result<bool> {
        Ok(self.hashes.remove(field_key(map, field))?.is_some())
    }

    async fn list_contents(&self, list: &str) -> Result<Vec<String>> {
        let prefix = list_prefix(list);
        let mut values = Vec::new();
        for entry in self.items.scan_prefix(&prefix) {
            let (key, value) = entry?;
            if key.len() == prefix.len() + 8 {
                values.push(String::from_utf8_lossy(&value).into_owned());
            }
        }
        Ok(values)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = BTreeSet::new();
        for entry in self.bounds.iter() {
            let (key, _) = entry?;
            keys.insert(String::from_utf8_lossy(&key).into_owned());
        }
        for entry in self.hashes.iter() {
            let (key, _) = entry?;
            if let Some(pos) = key.iter().position(|b| *b == SEPARATOR) {
                keys.insert(String::from_utf8_lossy(&key[..pos]).into_owned());
            }
        }
        Ok(keys.into_iter().collect())
    }
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore")
            .field("db", &"sled::Db")
            .field("lists", &self.bounds.len())
            .finish()
    }
}

#[cfg(test)]
impl SledStore {
    /// Number of stored list elements across all lists.
    pub(crate) fn item_count(&self) -> usize {
        self.items.len()
    }
}
