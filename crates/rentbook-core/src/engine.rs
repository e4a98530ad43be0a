//! Reconciliation engine
//!
//! The five write operations over agreements: [`create`](Engine::create),
//! [`update`](Engine::update), [`pay`](Engine::pay),
//! [`freeze`](Engine::freeze) and [`delete`](Engine::delete). Each runs as a
//! single storage transaction that reads and validates the agreement and its
//! asset, then writes the ledger, the agreement and the asset together. Any
//! error aborts the transaction, leaving stored state untouched.
//!
//! Every operation is generic over the asset kind, so leases and rentals
//! share one implementation:
//!
//! ```rust
//! use chrono::NaiveDate;
//! use rentbook_core::model::{AssetStatus, LicensePlate, NewAgreement, NewPayment, PlateDraft, Principal, RenterDraft};
//! use rentbook_core::{Directory, Engine, Registry};
//! use rentbook_storage::MemoryStore;
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let (engine, registry, directory) = (
//!     Engine::new(store.clone()),
//!     Registry::new(store.clone()),
//!     Directory::new(store),
//! );
//! let clerk = Principal::new("clerk@example.com");
//!
//! let plate = registry.create::<LicensePlate>(PlateDraft {
//!     plate_number: "T123456C".into(),
//!     plate_state: "NY".into(),
//!     purchase_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
//!     purchase_amount: dec!(18000),
//!     notes: None,
//! }, &clerk).unwrap();
//! let renter = directory.create(RenterDraft {
//!     full_name: "Ana Ruiz".into(),
//!     phone: "7185550123".into(),
//!     email: None,
//!     driver_license_number: "R5550123".into(),
//!     driver_license_state: "NY".into(),
//!     address: None,
//! }, &clerk).unwrap();
//!
//! let lease = engine.create::<LicensePlate>(NewAgreement {
//!     asset_id: plate.id,
//!     renter_id: renter.id,
//!     start_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
//!     end_date: None,
//!     total_amount: Some(dec!(1000)),
//!     frequency: Default::default(),
//!     rental_type: Default::default(),
//!     notes: None,
//! }, &clerk).unwrap();
//!
//! let pay_day = NaiveDate::from_ymd_opt(2024, 2, 8).unwrap();
//! let lease = engine.pay::<LicensePlate>(lease.id, NewPayment::new(dec!(1000), pay_day), &clerk).unwrap();
//! assert_eq!(lease.remaining_amount, dec!(0));
//! assert_eq!(registry.get::<LicensePlate>(plate.id).unwrap().status, AssetStatus::Available);
//! ```

use crate::error::{LedgerError, LedgerResult};
use crate::model::{
    now, Agreement, AgreementPatch, AgreementStatus, Asset, AssetStatus, NewAgreement, NewPayment, Payment, Principal,
    Rebalance,
};
use crate::repo::{asset_key, ledger_key, renter_key, Repo};
use chrono::{DateTime, Utc};
use rentbook_storage::{Store, Table};
use std::sync::Arc;
use uuid::Uuid;

/// Bind `asset` to `agreement_id` and mark it rented
///
/// Fails with `Conflict` when a different agreement already holds the
/// asset's active claim.
fn claim<A: Asset>(repo: &Repo<'_>, asset: &mut A, agreement_id: Uuid, at: DateTime<Utc>) -> LedgerResult<()> {
    let kind = A::KIND;
    if let Some(holder) = repo.claim_holder(kind, asset.id())? {
        if holder != agreement_id {
            return Err(LedgerError::conflict(format!(
                "{} {} already has an active {} ({})",
                kind.asset_noun(),
                asset.label(),
                kind.agreement_noun().to_lowercase(),
                holder
            )));
        }
    }
    repo.set_claim(kind, asset.id(), agreement_id)?;
    asset.set_status(AssetStatus::Rented, at);
    repo.put(kind.asset_table(), asset.id(), asset)
}

/// Mark the asset available, unless another agreement holds its claim
fn release<A: Asset>(repo: &Repo<'_>, asset_id: Uuid, agreement_id: Uuid, at: DateTime<Utc>) -> LedgerResult<()> {
    let kind = A::KIND;
    if let Some(holder) = repo.claim_holder(kind, asset_id)? {
        if holder != agreement_id {
            tracing::debug!(
                kind = %kind,
                asset_id = %asset_id,
                agreement_id = %agreement_id,
                holder = %holder,
                "Asset held by another agreement, not released"
            );
            return Ok(());
        }
    }
    let Some(mut asset) = repo.get::<A>(kind.asset_table(), asset_id)? else {
        return Err(LedgerError::not_found(kind.asset_noun(), asset_id));
    };
    if asset.status() != AssetStatus::Available {
        asset.set_status(AssetStatus::Available, at);
        repo.put(kind.asset_table(), asset_id, &asset)?;
    }
    Ok(())
}

/// Release the asset and drop this agreement's claim on it
fn unbind<A: Asset>(repo: &Repo<'_>, asset_id: Uuid, agreement_id: Uuid, at: DateTime<Utc>) -> LedgerResult<()> {
    release::<A>(repo, asset_id, agreement_id, at)?;
    if repo.claim_holder(A::KIND, asset_id)? == Some(agreement_id) {
        repo.clear_claim(A::KIND, asset_id)?;
    }
    Ok(())
}

/// Delete an agreement, its ledger and its index entries
///
/// Shared with the asset registry, which cascades asset deletion through here.
pub(crate) fn remove_agreement<A: Asset>(repo: &Repo<'_>, agreement: &Agreement<A>, at: DateTime<Utc>) -> LedgerResult<usize> {
    let kind = A::KIND;
    let payments = repo.take_links(&ledger_key(agreement.id))?;
    for payment_id in &payments {
        repo.delete(Table::Payments, *payment_id)?;
    }
    if agreement.is_active() {
        unbind::<A>(repo, agreement.asset_id, agreement.id, at)?;
    }
    repo.unlink(&asset_key(kind, agreement.asset_id), agreement.id)?;
    repo.unlink(&renter_key(kind, agreement.renter_id), agreement.id)?;
    repo.delete(kind.agreement_table(), agreement.id)?;
    Ok(payments.len())
}

fn rejected(operation: &'static str, kind: &str, id: Uuid, err: &LedgerError) {
    if err.is_client_error() {
        tracing::warn!(operation, kind, agreement_id = %id, code = err.code(), error = %err, "Operation rejected");
    } else {
        tracing::error!(operation, kind, agreement_id = %id, error = %err, "Operation failed");
    }
}

fn create_rejected(kind: &str, asset_id: Uuid, renter_id: Uuid, err: &LedgerError) {
    if err.is_client_error() {
        tracing::warn!(
            operation = "create",
            kind,
            asset_id = %asset_id,
            renter_id = %renter_id,
            code = err.code(),
            error = %err,
            "Operation rejected"
        );
    } else {
        tracing::error!(
            operation = "create",
            kind,
            asset_id = %asset_id,
            renter_id = %renter_id,
            error = %err,
            "Operation failed"
        );
    }
}

/// Applies payments and keeps agreements and assets consistent
pub struct Engine<S> {
    pub(crate) store: Arc<S>,
}

impl<S> Clone for Engine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> Engine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create an active, unpaid agreement and mark its asset rented
    ///
    /// # Errors
    ///
    /// `NotFound` if the asset or renter is missing, `Conflict` if the asset
    /// already has an active agreement, `Validation` for bad terms.
    pub fn create<A: Asset>(&self, input: NewAgreement, principal: &Principal) -> LedgerResult<Agreement<A>> {
        let kind = A::KIND;
        let id = Uuid::new_v4();

        let result = self.store.transaction(|tx| {
            let repo = Repo::new(tx);
            let at = now();

            let mut asset: A = repo.load(kind.asset_table(), kind.asset_noun(), input.asset_id)?;
            if !repo.exists(Table::Renters, input.renter_id)? {
                return Err(LedgerError::not_found("Renter", input.renter_id));
            }

            let agreement = Agreement::<A>::new(id, &input, &asset, principal, at)?;
            claim(&repo, &mut asset, id, at)?;
            repo.put(kind.agreement_table(), id, &agreement)?;
            repo.link(&asset_key(kind, asset.id()), id)?;
            repo.link(&renter_key(kind, agreement.renter_id), id)?;
            Ok(agreement)
        });

        match &result {
            Ok(agreement) => tracing::info!(
                kind = %kind,
                agreement_id = %agreement.id,
                asset_id = %agreement.asset_id,
                total = %agreement.total_amount,
                "Agreement created"
            ),
            Err(err) => create_rejected(kind.as_str(), input.asset_id, input.renter_id, err),
        }
        result
    }

    /// Apply a sparse patch
    ///
    /// A status change away from active releases the asset and drops the
    /// claim. A change back to active re-checks exclusivity and claims the
    /// asset again. A new total that settles the agreement releases the
    /// asset like a final payment; raising the total of a paid, active
    /// agreement marks its asset rented again.
    pub fn update<A: Asset>(&self, id: Uuid, patch: AgreementPatch) -> LedgerResult<Agreement<A>> {
        let kind = A::KIND;

        let result = self.store.transaction(|tx| {
            let repo = Repo::new(tx);
            let at = now();

            let mut agreement: Agreement<A> = repo.load(kind.agreement_table(), kind.agreement_noun(), id)?;
            let previous_renter = agreement.renter_id;
            if let Some(renter_id) = patch.renter_id {
                if renter_id != previous_renter && !repo.exists(Table::Renters, renter_id)? {
                    return Err(LedgerError::not_found("Renter", renter_id));
                }
            }

            let rebalance = agreement.apply_terms(&patch, at)?;

            if let Some(status) = patch.status {
                let was_active = agreement.is_active();
                agreement.status = status;
                match (was_active, status == AgreementStatus::Active) {
                    (true, false) => unbind::<A>(&repo, agreement.asset_id, id, at)?,
                    (false, true) => {
                        let mut asset: A = repo.load(kind.asset_table(), kind.asset_noun(), agreement.asset_id)?;
                        claim(&repo, &mut asset, id, at)?;
                    }
                    _ => {}
                }
            }

            match rebalance {
                Rebalance::Settled => release::<A>(&repo, agreement.asset_id, id, at)?,
                Rebalance::Reopened if agreement.is_active() => {
                    let mut asset: A = repo.load(kind.asset_table(), kind.asset_noun(), agreement.asset_id)?;
                    claim(&repo, &mut asset, id, at)?;
                }
                _ => {}
            }

            if agreement.renter_id != previous_renter {
                repo.unlink(&renter_key(kind, previous_renter), id)?;
                repo.link(&renter_key(kind, agreement.renter_id), id)?;
            }
            repo.put(kind.agreement_table(), id, &agreement)?;
            Ok(agreement)
        });

        match &result {
            Ok(agreement) => tracing::info!(
                kind = %kind,
                agreement_id = %id,
                status = agreement.status.as_str(),
                payment_status = ?agreement.payment_status,
                remaining = %agreement.remaining_amount,
                "Agreement updated"
            ),
            Err(err) => rejected("update", kind.as_str(), id, err),
        }
        result
    }

    /// Record a payment and update the aggregates
    ///
    /// The amount is checked against `total_amount - paid_amount` computed
    /// now, not the stored `remaining_amount`. A payment that settles the
    /// agreement marks it paid and releases the asset. Payments after a
    /// freeze are accepted.
    pub fn pay<A: Asset>(&self, id: Uuid, input: NewPayment, principal: &Principal) -> LedgerResult<Agreement<A>> {
        let kind = A::KIND;
        let payment_id = Uuid::new_v4();

        let result = self.store.transaction(|tx| {
            let repo = Repo::new(tx);
            let at = now();

            let mut agreement: Agreement<A> = repo.load(kind.agreement_table(), kind.agreement_noun(), id)?;
            agreement.check_payment(input.amount)?;

            let payment = Payment::record(payment_id, id, kind, &input, principal, at)?;
            repo.put(Table::Payments, payment_id, &payment)?;
            repo.link(&ledger_key(id), payment_id)?;

            if agreement.apply_payment(input.amount, at) {
                release::<A>(&repo, agreement.asset_id, id, at)?;
            }
            repo.put(kind.agreement_table(), id, &agreement)?;
            Ok(agreement)
        });

        match &result {
            Ok(agreement) => tracing::info!(
                kind = %kind,
                agreement_id = %id,
                payment_id = %payment_id,
                amount = %input.amount,
                paid = %agreement.paid_amount,
                remaining = %agreement.remaining_amount,
                "Payment applied"
            ),
            Err(err) => rejected("pay", kind.as_str(), id, err),
        }
        result
    }

    /// Cancel the agreement and release its asset, whatever has been paid
    pub fn freeze<A: Asset>(&self, id: Uuid) -> LedgerResult<Agreement<A>> {
        let kind = A::KIND;

        let result = self.store.transaction(|tx| {
            let repo = Repo::new(tx);
            let at = now();

            let mut agreement: Agreement<A> = repo.load(kind.agreement_table(), kind.agreement_noun(), id)?;
            agreement.freeze(at);
            release::<A>(&repo, agreement.asset_id, id, at)?;
            repo.put(kind.agreement_table(), id, &agreement)?;
            Ok(agreement)
        });

        match &result {
            Ok(agreement) => tracing::info!(
                kind = %kind,
                agreement_id = %id,
                asset_id = %agreement.asset_id,
                "Agreement frozen"
            ),
            Err(err) => rejected("freeze", kind.as_str(), id, err),
        }
        result
    }

    /// Delete the agreement with all of its payments
    ///
    /// If the agreement was active its asset is released.
    pub fn delete<A: Asset>(&self, id: Uuid) -> LedgerResult<()> {
        let kind = A::KIND;

        let result = self.store.transaction(|tx| {
            let repo = Repo::new(tx);
            let agreement: Agreement<A> = repo.load(kind.agreement_table(), kind.agreement_noun(), id)?;
            remove_agreement(&repo, &agreement, now())
        });

        match &result {
            Ok(payments) => tracing::info!(kind = %kind, agreement_id = %id, payments, "Agreement deleted"),
            Err(err) => rejected("delete", kind.as_str(), id, err),
        }
        result.map(|_| ())
    }
}
