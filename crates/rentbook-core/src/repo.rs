//! Typed access to the key-value store inside one transaction
//!
//! Records are stored as JSON under their UUID bytes. Secondary lookups that
//! the engine needs inside a transaction are kept as index tables rather than
//! scans:
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `links` | `ledger/{agreement}` | payment ids of an agreement |
//! | `links` | `asset/{kind}/{asset}` | agreement ids over an asset |
//! | `links` | `renter/{kind}/{renter}` | agreement ids naming a renter |
//! | `active_claims` | `{kind}/{asset}` | id of the agreement holding the asset |
//! | `unique_keys` | `{kind}:{plate number}` | id of the owning asset |
//! | `sequences` | counter name | last issued value, big-endian `u64` |
//!
//! Writing an `active_claims` entry is how exclusivity is enforced: two
//! transactions racing to claim the same asset touch the same key, so the
//! backend serializes them and the loser observes the winner's claim.

use crate::error::{LedgerError, LedgerResult};
use crate::model::AssetKind;
use rentbook_storage::{StorageError, Table, Transaction};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

pub(crate) fn ledger_key(agreement_id: Uuid) -> String {
    format!("ledger/{}", agreement_id)
}

pub(crate) fn asset_key(kind: AssetKind, asset_id: Uuid) -> String {
    format!("asset/{}/{}", kind, asset_id)
}

pub(crate) fn renter_key(kind: AssetKind, renter_id: Uuid) -> String {
    format!("renter/{}/{}", kind, renter_id)
}

fn claim_key(kind: AssetKind, asset_id: Uuid) -> String {
    format!("{}/{}", kind, asset_id)
}

fn unique_key(kind: AssetKind, value: &str) -> String {
    format!("{}:{}", kind, value.to_uppercase())
}

fn decode<T: DeserializeOwned>(table: Table, bytes: &[u8]) -> LedgerResult<T> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::corrupt(table.name(), e.to_string()).into())
}

fn decode_id(table: Table, bytes: &[u8]) -> LedgerResult<Uuid> {
    Uuid::from_slice(bytes).map_err(|e| StorageError::corrupt(table.name(), e.to_string()).into())
}

/// Decode every value of a scanned table
pub(crate) fn decode_all<T: DeserializeOwned>(table: Table, entries: Vec<rentbook_storage::Entry>) -> LedgerResult<Vec<T>> {
    entries.iter().map(|(_, value)| decode(table, value)).collect()
}

/// Typed view over a [`Transaction`]
pub(crate) struct Repo<'t> {
    tx: &'t dyn Transaction,
}

impl<'t> Repo<'t> {
    pub fn new(tx: &'t dyn Transaction) -> Self {
        Self { tx }
    }

    pub fn get<T: DeserializeOwned>(&self, table: Table, id: Uuid) -> LedgerResult<Option<T>> {
        self.tx
            .get(table, id.as_bytes())?
            .map(|bytes| decode(table, &bytes))
            .transpose()
    }

    /// Like [`get`](Self::get) but a missing record is `NotFound`
    pub fn load<T: DeserializeOwned>(&self, table: Table, entity: &'static str, id: Uuid) -> LedgerResult<T> {
        self.get(table, id)?.ok_or_else(|| LedgerError::not_found(entity, id))
    }

    pub fn exists(&self, table: Table, id: Uuid) -> LedgerResult<bool> {
        Ok(self.tx.contains(table, id.as_bytes())?)
    }

    pub fn put<T: Serialize>(&self, table: Table, id: Uuid, record: &T) -> LedgerResult<()> {
        self.tx.insert(table, id.as_bytes(), serde_json::to_vec(record)?)?;
        Ok(())
    }

    pub fn delete(&self, table: Table, id: Uuid) -> LedgerResult<bool> {
        Ok(self.tx.remove(table, id.as_bytes())?.is_some())
    }

    // -- links ---------------------------------------------------------------

    pub fn links(&self, key: &str) -> LedgerResult<Vec<Uuid>> {
        match self.tx.get(Table::Links, key.as_bytes())? {
            Some(bytes) => decode(Table::Links, &bytes),
            None => Ok(Vec::new()),
        }
    }

    fn store_links(&self, key: &str, ids: &[Uuid]) -> LedgerResult<()> {
        if ids.is_empty() {
            self.tx.remove(Table::Links, key.as_bytes())?;
        } else {
            self.tx.insert(Table::Links, key.as_bytes(), serde_json::to_vec(ids)?)?;
        }
        Ok(())
    }

    pub fn link(&self, key: &str, id: Uuid) -> LedgerResult<()> {
        let mut ids = self.links(key)?;
        if !ids.contains(&id) {
            ids.push(id);
            self.store_links(key, &ids)?;
        }
        Ok(())
    }

    pub fn unlink(&self, key: &str, id: Uuid) -> LedgerResult<()> {
        let mut ids = self.links(key)?;
        let before = ids.len();
        ids.retain(|linked| *linked != id);
        if ids.len() != before {
            self.store_links(key, &ids)?;
        }
        Ok(())
    }

    /// Remove a link list, returning what it held
    pub fn take_links(&self, key: &str) -> LedgerResult<Vec<Uuid>> {
        let ids = self.links(key)?;
        self.tx.remove(Table::Links, key.as_bytes())?;
        Ok(ids)
    }

    // -- active claims -------------------------------------------------------

    pub fn claim_holder(&self, kind: AssetKind, asset_id: Uuid) -> LedgerResult<Option<Uuid>> {
        self.tx
            .get(Table::ActiveClaims, claim_key(kind, asset_id).as_bytes())?
            .map(|bytes| decode_id(Table::ActiveClaims, &bytes))
            .transpose()
    }

    pub fn set_claim(&self, kind: AssetKind, asset_id: Uuid, agreement_id: Uuid) -> LedgerResult<()> {
        self.tx.insert(
            Table::ActiveClaims,
            claim_key(kind, asset_id).as_bytes(),
            agreement_id.as_bytes().to_vec(),
        )?;
        Ok(())
    }

    pub fn clear_claim(&self, kind: AssetKind, asset_id: Uuid) -> LedgerResult<()> {
        self.tx.remove(Table::ActiveClaims, claim_key(kind, asset_id).as_bytes())?;
        Ok(())
    }

    // -- unique keys ---------------------------------------------------------

    /// Reserve `value` for `owner`, failing with `Conflict` if another record holds it
    pub fn reserve_unique(&self, kind: AssetKind, value: &str, owner: Uuid) -> LedgerResult<()> {
        let key = unique_key(kind, value);
        if let Some(bytes) = self.tx.get(Table::UniqueKeys, key.as_bytes())? {
            if decode_id(Table::UniqueKeys, &bytes)? != owner {
                return Err(LedgerError::conflict(format!(
                    "{} with plate number {} already exists",
                    kind.asset_noun(),
                    value
                )));
            }
            return Ok(());
        }
        self.tx.insert(Table::UniqueKeys, key.as_bytes(), owner.as_bytes().to_vec())?;
        Ok(())
    }

    pub fn release_unique(&self, kind: AssetKind, value: &str) -> LedgerResult<()> {
        self.tx.remove(Table::UniqueKeys, unique_key(kind, value).as_bytes())?;
        Ok(())
    }

    // -- sequences -----------------------------------------------------------

    /// Issue the next value of a counter, starting at 1
    pub fn next_sequence(&self, name: &str) -> LedgerResult<u64> {
        let current = match self.tx.get(Table::Sequences, name.as_bytes())? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    StorageError::corrupt(Table::Sequences.name(), format!("bad counter width for {}", name))
                })?;
                u64::from_be_bytes(raw)
            }
            None => 0,
        };
        let next = current + 1;
        self.tx.insert(Table::Sequences, name.as_bytes(), next.to_be_bytes().to_vec())?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rentbook_storage::{MemoryStore, Store};

    #[test]
    fn test_put_get_delete() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store
            .transaction(|tx| -> LedgerResult<()> {
                let repo = Repo::new(tx);
                repo.put(Table::Renters, id, &vec!["a".to_string()])?;
                let back: Vec<String> = repo.load(Table::Renters, "Renter", id)?;
                assert_eq!(back, vec!["a".to_string()]);
                assert!(repo.delete(Table::Renters, id)?);
                assert!(!repo.exists(Table::Renters, id)?);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .transaction(|tx| Repo::new(tx).load::<String>(Table::Cars, "Car", Uuid::nil()))
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_links() {
        let store = MemoryStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let key = ledger_key(Uuid::new_v4());
        store
            .transaction(|tx| -> LedgerResult<()> {
                let repo = Repo::new(tx);
                repo.link(&key, a)?;
                repo.link(&key, b)?;
                repo.link(&key, a)?;
                assert_eq!(repo.links(&key)?, vec![a, b]);
                repo.unlink(&key, a)?;
                assert_eq!(repo.take_links(&key)?, vec![b]);
                assert!(repo.links(&key)?.is_empty());
                Ok(())
            })
            .unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_claims() {
        let store = MemoryStore::new();
        let (asset, agreement) = (Uuid::new_v4(), Uuid::new_v4());
        store
            .transaction(|tx| -> LedgerResult<()> {
                let repo = Repo::new(tx);
                assert_eq!(repo.claim_holder(AssetKind::Plate, asset)?, None);
                repo.set_claim(AssetKind::Plate, asset, agreement)?;
                assert_eq!(repo.claim_holder(AssetKind::Plate, asset)?, Some(agreement));
                assert_eq!(repo.claim_holder(AssetKind::Car, asset)?, None);
                repo.clear_claim(AssetKind::Plate, asset)?;
                assert_eq!(repo.claim_holder(AssetKind::Plate, asset)?, None);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_unique_keys() {
        let store = MemoryStore::new();
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
        store
            .transaction(|tx| -> LedgerResult<()> {
                let repo = Repo::new(tx);
                repo.reserve_unique(AssetKind::Plate, "T1C", first)?;
                repo.reserve_unique(AssetKind::Plate, "t1c", first)?;
                let err = repo.reserve_unique(AssetKind::Plate, "T1C", second).unwrap_err();
                assert_eq!(err.code(), "CONFLICT");
                repo.reserve_unique(AssetKind::Car, "T1C", second)?;
                repo.release_unique(AssetKind::Plate, "T1C")?;
                repo.reserve_unique(AssetKind::Plate, "T1C", second)?;
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_sequence() {
        let store = MemoryStore::new();
        for expected in 1..=3 {
            let n = store
                .transaction(|tx| Repo::new(tx).next_sequence("car_number"))
                .unwrap();
            assert_eq!(n, expected);
        }
    }
}
