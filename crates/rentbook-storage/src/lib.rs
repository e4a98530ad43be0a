//! Transactional key-value persistence for Rentbook
//!
//! This crate is the persistence collaborator of the reconciliation engine.
//! It exposes a small surface:
//!
//! - [`Store::transaction`] runs a closure against a [`Transaction`] view and
//!   commits every write atomically, or discards all of them when the closure
//!   returns an error.
//! - [`Store::scan`] returns a consistent snapshot of one [`Table`] for list
//!   queries.
//!
//! Two backends are provided:
//!
//! - [`MemoryStore`]: process-local, transactions are serialized behind a
//!   single writer lock. Used by tests and by servers started without a data
//!   directory.
//! - [`SledStore`]: on-disk, backed by a sled tree and sled's serializable
//!   transactions (conflicting transactions are retried by sled).
//!
//! ## Example
//!
//! ```rust
//! use rentbook_storage::{MemoryStore, Store, StorageError, Table};
//!
//! let store = MemoryStore::new();
//! store
//!     .transaction(|tx| -> Result<(), StorageError> {
//!         tx.insert(Table::Renters, b"r1", b"{}".to_vec())?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(store.scan(Table::Renters).unwrap().len(), 1);
//! ```

pub mod error;
pub mod memory;
pub mod sled_store;
pub mod table;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use sled_store::SledStore;
pub use table::Table;

/// A key/value pair returned by [`Store::scan`]; the key has its table tag stripped
pub type Entry = (Vec<u8>, Vec<u8>);

/// View of the store inside one transaction
///
/// Reads observe the transaction's own earlier writes. Nothing becomes
/// visible to other readers until the enclosing [`Store::transaction`]
/// commits.
pub trait Transaction {
    /// Read a value
    fn get(&self, table: Table, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Write a value, returning the previous one
    fn insert(&self, table: Table, key: &[u8], value: Vec<u8>) -> StorageResult<Option<Vec<u8>>>;

    /// Delete a value, returning the previous one
    fn remove(&self, table: Table, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Check whether a key is present
    fn contains(&self, table: Table, key: &[u8]) -> StorageResult<bool> {
        Ok(self.get(table, key)?.is_some())
    }
}

/// A transactional key-value store
pub trait Store: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Run `f` as one atomic transaction
    ///
    /// `f` may be invoked more than once when the backend detects a
    /// conflicting concurrent transaction, so it must not have side effects
    /// outside the [`Transaction`] it is given. Any `Err` returned by `f`
    /// aborts the transaction and is handed back to the caller unchanged.
    fn transaction<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: Fn(&dyn Transaction) -> Result<R, E>,
        E: From<StorageError>;

    /// Snapshot every entry of a table, ordered by key
    fn scan(&self, table: Table) -> StorageResult<Vec<Entry>>;

    /// Flush buffered writes to durable storage
    fn flush(&self) -> StorageResult<()> {
        Ok(())
    }
}
