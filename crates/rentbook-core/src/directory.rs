//! Renter directory

use crate::error::{LedgerError, LedgerResult};
use crate::model::{now, AssetKind, Principal, Renter, RenterDraft, RenterPatch};
use crate::query::{matches, ListParams, Page};
use crate::repo::{decode_all, renter_key, Repo};
use rentbook_storage::{Store, Table};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenterFilter {
    /// Substring of the full name
    #[serde(default)]
    pub name: Option<String>,
}

pub struct Directory<S> {
    store: Arc<S>,
}

impl<S> Clone for Directory<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> Directory<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create(&self, draft: RenterDraft, principal: &Principal) -> LedgerResult<Renter> {
        let renter = Renter::from_draft(Uuid::new_v4(), draft, principal, now())?;
        self.store
            .transaction(|tx| Repo::new(tx).put(Table::Renters, renter.id, &renter))?;
        tracing::info!(renter_id = %renter.id, "Renter created");
        Ok(renter)
    }

    pub fn get(&self, id: Uuid) -> LedgerResult<Renter> {
        self.store
            .transaction(|tx| Repo::new(tx).load(Table::Renters, "Renter", id))
    }

    pub fn update(&self, id: Uuid, patch: RenterPatch) -> LedgerResult<Renter> {
        let renter = self.store.transaction(|tx| -> LedgerResult<Renter> {
            let repo = Repo::new(tx);
            let mut renter: Renter = repo.load(Table::Renters, "Renter", id)?;
            renter.apply_patch(&patch, now())?;
            repo.put(Table::Renters, id, &renter)?;
            Ok(renter)
        })?;
        tracing::info!(renter_id = %id, "Renter updated");
        Ok(renter)
    }

    /// Delete a renter no agreement refers to
    pub fn delete(&self, id: Uuid) -> LedgerResult<()> {
        self.store.transaction(|tx| {
            let repo = Repo::new(tx);
            if !repo.exists(Table::Renters, id)? {
                return Err(LedgerError::not_found("Renter", id));
            }
            for kind in [AssetKind::Plate, AssetKind::Car] {
                let referencing = repo.links(&renter_key(kind, id))?;
                if let Some(agreement) = referencing.first() {
                    return Err(LedgerError::conflict(format!(
                        "Renter {} is referenced by {} {}",
                        id,
                        kind.agreement_noun().to_lowercase(),
                        agreement
                    )));
                }
            }
            repo.delete(Table::Renters, id)?;
            Ok(())
        })?;
        tracing::info!(renter_id = %id, "Renter deleted");
        Ok(())
    }

    /// List renters by name
    pub fn list(&self, filter: &RenterFilter, params: ListParams) -> LedgerResult<Page<Renter>> {
        let mut renters: Vec<Renter> = decode_all(Table::Renters, self.store.scan(Table::Renters)?)?;
        renters.retain(|r| matches(Some(&r.full_name), filter.name.as_deref()));
        renters.sort_by(|a, b| a.full_name.to_lowercase().cmp(&b.full_name.to_lowercase()));
        Ok(Page::paginate(renters, params))
    }
}
