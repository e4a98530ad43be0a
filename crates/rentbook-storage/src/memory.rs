//! In-memory store
//!
//! All tables live in one ordered map. A transaction holds the writer lock
//! for its whole duration and stages its writes in an overlay, so concurrent
//! transactions are fully serialized and an aborted transaction leaves the
//! committed map untouched.

use crate::{Entry, StorageError, StorageResult, Store, Table, Transaction};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};

type Keyspace = BTreeMap<Vec<u8>, Vec<u8>>;

/// Process-local [`Store`] backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Keyspace>,
    writer: Mutex<()>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed entries across all tables
    pub fn len(&self) -> usize {
        self.data.read().map(|data| data.len()).unwrap_or(0)
    }

    /// Whether no entries are committed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Staged writes of one transaction; `None` marks a deletion
struct MemoryTransaction<'a> {
    committed: &'a Keyspace,
    staged: RefCell<BTreeMap<Vec<u8>, Option<Vec<u8>>>>,
}

impl<'a> MemoryTransaction<'a> {
    fn new(committed: &'a Keyspace) -> Self {
        Self {
            committed,
            staged: RefCell::new(BTreeMap::new()),
        }
    }

    fn read(&self, physical: &[u8]) -> Option<Vec<u8>> {
        match self.staged.borrow().get(physical) {
            Some(staged) => staged.clone(),
            None => self.committed.get(physical).cloned(),
        }
    }

    fn into_writes(self) -> BTreeMap<Vec<u8>, Option<Vec<u8>>> {
        self.staged.into_inner()
    }
}

impl Transaction for MemoryTransaction<'_> {
    fn get(&self, table: Table, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.read(&table.physical_key(key)))
    }

    fn insert(&self, table: Table, key: &[u8], value: Vec<u8>) -> StorageResult<Option<Vec<u8>>> {
        let physical = table.physical_key(key);
        let previous = self.read(&physical);
        self.staged.borrow_mut().insert(physical, Some(value));
        Ok(previous)
    }

    fn remove(&self, table: Table, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let physical = table.physical_key(key);
        let previous = self.read(&physical);
        if previous.is_some() {
            self.staged.borrow_mut().insert(physical, None);
        }
        Ok(previous)
    }
}

impl Store for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn transaction<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: Fn(&dyn Transaction) -> Result<R, E>,
        E: From<StorageError>,
    {
        let _writer = self.writer.lock().map_err(|_| StorageError::LockPoisoned)?;

        let (result, writes) = {
            let committed = self.data.read().map_err(|_| StorageError::LockPoisoned)?;
            let tx = MemoryTransaction::new(&committed);
            let result = f(&tx);
            (result, tx.into_writes())
        };

        let value = result?;

        let mut data = self.data.write().map_err(|_| StorageError::LockPoisoned)?;
        for (key, write) in writes {
            match write {
                Some(value) => {
                    data.insert(key, value);
                }
                None => {
                    data.remove(&key);
                }
            }
        }
        Ok(value)
    }

    fn scan(&self, table: Table) -> StorageResult<Vec<Entry>> {
        let data = self.data.read().map_err(|_| StorageError::LockPoisoned)?;
        let start = vec![table.tag()];
        let entries = data
            .range(start..)
            .take_while(|(key, _)| key.first() == Some(&table.tag()))
            .map(|(key, value)| (key[1..].to_vec(), value.clone()))
            .collect();
        Ok(entries)
    }
}
