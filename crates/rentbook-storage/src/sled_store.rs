//! Sled-backed store
//!
//! All tables share one sled tree; keys carry the table tag. Transactions
//! use sled's serializable transactions, which replay the closure when a
//! concurrent transaction conflicts.

use crate::{Entry, StorageError, StorageResult, Store, Table, Transaction};
use sled::transaction::{
    ConflictableTransactionError, TransactionError, TransactionalTree, UnabortableTransactionError,
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

const TREE_NAME: &str = "rentbook";

/// On-disk [`Store`] backend
#[derive(Debug, Clone)]
pub struct SledStore {
    db: sled::Db,
    tree: sled::Tree,
    path: Option<PathBuf>,
}

impl SledStore {
    /// Open (or create) a store in the given directory
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        let tree = db.open_tree(TREE_NAME)?;
        tracing::info!(path = %path.display(), "Opened sled store");
        Ok(Self {
            db,
            tree,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a throwaway store that is removed when dropped
    pub fn temporary() -> StorageResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        let tree = db.open_tree(TREE_NAME)?;
        Ok(Self {
            db,
            tree,
            path: None,
        })
    }

    /// Directory backing this store, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Transaction view over a sled transactional tree
///
/// Sled reports conflicts and storage failures through its own error type,
/// which the closure cannot return directly; the first such failure is kept
/// here so the store can hand it back to sled after the closure unwinds.
struct SledTransaction<'a> {
    tree: &'a TransactionalTree,
    failure: RefCell<Option<UnabortableTransactionError>>,
}

impl SledTransaction<'_> {
    fn record(&self, err: UnabortableTransactionError) -> StorageError {
        let mapped = match &err {
            UnabortableTransactionError::Conflict => StorageError::Conflict,
            UnabortableTransactionError::Storage(inner) => StorageError::Backend(inner.to_string()),
        };
        self.failure.borrow_mut().get_or_insert(err);
        mapped
    }
}

impl Transaction for SledTransaction<'_> {
    fn get(&self, table: Table, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.tree
            .get(table.physical_key(key))
            .map(|value| value.map(|v| v.to_vec()))
            .map_err(|e| self.record(e))
    }

    fn insert(&self, table: Table, key: &[u8], value: Vec<u8>) -> StorageResult<Option<Vec<u8>>> {
        self.tree
            .insert(table.physical_key(key), value)
            .map(|previous| previous.map(|v| v.to_vec()))
            .map_err(|e| self.record(e))
    }

    fn remove(&self, table: Table, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.tree
            .remove(table.physical_key(key))
            .map(|previous| previous.map(|v| v.to_vec()))
            .map_err(|e| self.record(e))
    }
}

impl Store for SledStore {
    fn name(&self) -> &str {
        "sled"
    }

    fn transaction<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: Fn(&dyn Transaction) -> Result<R, E>,
        E: From<StorageError>,
    {
        let outcome = self.tree.transaction(|tree| {
            let tx = SledTransaction {
                tree,
                failure: RefCell::new(None),
            };
            match f(&tx) {
                Ok(value) => Ok(value),
                Err(err) => match tx.failure.into_inner() {
                    Some(failure) => Err(ConflictableTransactionError::from(failure)),
                    None => Err(ConflictableTransactionError::Abort(err)),
                },
            }
        });

        match outcome {
            Ok(value) => Ok(value),
            Err(TransactionError::Abort(err)) => Err(err),
            Err(TransactionError::Storage(err)) => Err(E::from(StorageError::from(err))),
        }
    }

    fn scan(&self, table: Table) -> StorageResult<Vec<Entry>> {
        self.tree
            .scan_prefix([table.tag()])
            .map(|item| {
                let (key, value) = item?;
                Ok((key[1..].to_vec(), value.to_vec()))
            })
            .collect()
    }

    fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        Ok(())
    }
}
