//! Asset registry: plates and cars
//!
//! Asset status is never written here except to initialize it; only the
//! reconciliation engine moves an asset between `available` and `rented`.

use crate::engine::remove_agreement;
use crate::error::{LedgerError, LedgerResult};
use crate::model::{now, Agreement, Asset, AssetStatus, PaymentStatus, Principal};
use crate::query::{matches, ListParams, Page};
use crate::repo::{asset_key, decode_all, Repo};
use rentbook_storage::Store;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Filters for asset lists; every supplied filter must match
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetFilter {
    /// Substring of the vehicle model; plates have none, so nothing matches
    #[serde(default)]
    pub model: Option<String>,
    /// Substring of the plate number
    #[serde(default)]
    pub plate_number: Option<String>,
    #[serde(default)]
    pub status: Option<AssetStatus>,
}

impl AssetFilter {
    fn accepts<A: Asset>(&self, asset: &A) -> bool {
        matches(asset.model(), self.model.as_deref())
            && matches(asset.plate_number(), self.plate_number.as_deref())
            && self.status.map_or(true, |s| s == asset.status())
    }
}

pub struct Registry<S> {
    store: Arc<S>,
}

impl<S> Clone for Registry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> Registry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Register a new asset; it starts `available`
    ///
    /// Numbered kinds get the next value of their sequence. A plate number
    /// already used by another asset of the same kind is a `Conflict`.
    pub fn create<A: Asset>(&self, draft: A::Draft, principal: &Principal) -> LedgerResult<A> {
        let kind = A::KIND;
        let record = A::from_draft(Uuid::new_v4(), draft, principal, now())?;

        let asset = self.store.transaction(|tx| -> LedgerResult<A> {
            let repo = Repo::new(tx);
            let mut asset = record.clone();
            if let Some(sequence) = kind.sequence() {
                asset.assign_number(repo.next_sequence(sequence)?);
            }
            if let Some(plate) = asset.plate_number() {
                repo.reserve_unique(kind, plate, asset.id())?;
            }
            repo.put(kind.asset_table(), asset.id(), &asset)?;
            Ok(asset)
        })?;

        tracing::info!(kind = %kind, asset_id = %asset.id(), label = %asset.label(), "Asset registered");
        Ok(asset)
    }

    pub fn get<A: Asset>(&self, id: Uuid) -> LedgerResult<A> {
        let kind = A::KIND;
        self.store
            .transaction(|tx| Repo::new(tx).load(kind.asset_table(), kind.asset_noun(), id))
    }

    /// Apply a sparse patch, moving the plate-number reservation if it changes
    pub fn update<A: Asset>(&self, id: Uuid, patch: A::Patch) -> LedgerResult<A> {
        let kind = A::KIND;
        let asset = self.store.transaction(|tx| -> LedgerResult<A> {
            let repo = Repo::new(tx);
            let mut asset: A = repo.load(kind.asset_table(), kind.asset_noun(), id)?;
            let previous = asset.plate_number().map(str::to_string);

            asset.apply_patch(&patch, now())?;

            let current = asset.plate_number().map(str::to_string);
            if current != previous {
                if let Some(plate) = &current {
                    repo.reserve_unique(kind, plate, id)?;
                }
                if let Some(plate) = &previous {
                    repo.release_unique(kind, plate)?;
                }
            }
            repo.put(kind.asset_table(), id, &asset)?;
            Ok(asset)
        })?;

        tracing::info!(kind = %kind, asset_id = %id, "Asset updated");
        Ok(asset)
    }

    /// Delete an asset together with its agreements and their payments
    ///
    /// Rejected with `Conflict` while any agreement over the asset is unpaid.
    pub fn delete<A: Asset>(&self, id: Uuid) -> LedgerResult<()> {
        let kind = A::KIND;
        let removed = self.store.transaction(|tx| {
            let repo = Repo::new(tx);
            let asset: A = repo.load(kind.asset_table(), kind.asset_noun(), id)?;

            let agreements = repo
                .links(&asset_key(kind, id))?
                .into_iter()
                .map(|agreement_id| {
                    repo.load::<Agreement<A>>(kind.agreement_table(), kind.agreement_noun(), agreement_id)
                })
                .collect::<LedgerResult<Vec<_>>>()?;

            if let Some(unpaid) = agreements.iter().find(|a| a.payment_status == PaymentStatus::Unpaid) {
                return Err(LedgerError::conflict(format!(
                    "{} {} has an unpaid {} ({})",
                    kind.asset_noun(),
                    asset.label(),
                    kind.agreement_noun().to_lowercase(),
                    unpaid.id
                )));
            }

            let at = now();
            for agreement in &agreements {
                remove_agreement(&repo, agreement, at)?;
            }
            if let Some(plate) = asset.plate_number() {
                repo.release_unique(kind, plate)?;
            }
            repo.clear_claim(kind, id)?;
            repo.delete(kind.asset_table(), id)?;
            Ok(agreements.len())
        });

        match &removed {
            Ok(agreements) => tracing::info!(kind = %kind, asset_id = %id, agreements, "Asset deleted"),
            Err(err) => tracing::warn!(kind = %kind, asset_id = %id, error = %err, "Asset delete rejected"),
        }
        removed.map(|_| ())
    }

    /// List assets, newest first
    pub fn list<A: Asset>(&self, filter: &AssetFilter, params: ListParams) -> LedgerResult<Page<A>> {
        let kind = A::KIND;
        let mut assets: Vec<A> = decode_all(kind.asset_table(), self.store.scan(kind.asset_table())?)?;
        assets.retain(|a| filter.accepts(a));
        assets.sort_by(|a, b| b.create_time().cmp(&a.create_time()));
        Ok(Page::paginate(assets, params))
    }
}
