//! Backing store adapter.
//!
//! The queue only needs a handful of primitives over named lists and named
//! hash maps. [`Store`] captures them; every higher layer talks to an
//! `Arc<dyn Store>` that the caller constructs and owns.
//!
//! Backends:
//! - [`MemoryStore`]: process-local, for tests and `rfq serve --in-memory`.
//! - [`SledStore`]: durable embedded store built on `sled`.
//! - [`RemoteStore`]: WebSocket client for a store served by `rfq serve`.
//!
//! Lists and maps spring into existence on first write and disappear when
//! they become empty, so [`Store::keys`] only reports keys holding data.

pub mod memory;
pub mod remote;
pub mod sled_store;

use async_trait::async_trait;

use crate::utils::Result;

pub use memory::MemoryStore;
pub use remote::RemoteStore;
pub use sled_store::SledStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Push `value` onto the tail of `list`.
    async fn append(&self, list: &str, value: &str) -> Result<()>;

    /// Pop the head of `src` and push it onto the tail of `dst` as one
    /// indivisible step. Returns `None` when `src` is empty. Two concurrent
    /// callers never receive the same value.
    async fn move_atomic(&self, src: &str, dst: &str) -> Result<Option<String>>;

    /// Remove the first occurrence of `value` from `list`.
    async fn remove(&self, list: &str, value: &str) -> Result<bool>;

    async fn hash_set(&self, map: &str, field: &str, value: &[u8]) -> Result<()>;

    async fn hash_get(&self, map: &str, field: &str) -> Result<Option<Vec<u8>>>;

    /// Returns whether the field existed.
    async fn hash_del(&self, map: &str, field: &str) -> Result<bool>;

    /// Snapshot of `list`, head first.
    async fn list_contents(&self, list: &str) -> Result<Vec<String>>;

    /// Every list and map key currently holding data, in no particular order.
    async fn keys(&self) -> Result<Vec<String>>;
}
