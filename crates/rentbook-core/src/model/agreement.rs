//! Agreements binding one asset to one renter under financial terms
//!
//! [`Agreement`] is generic over the asset kind so the reconciliation rules
//! are written once: a [`Lease`] is an agreement over a [`LicensePlate`], a
//! [`Rental`] is one over a [`Car`]. The type parameter only exists at
//! compile time; the stored JSON is the same shape for both.
//!
//! The financial aggregates (`paid_amount`, `remaining_amount`,
//! `payment_status`) are only changed through the methods on this type, each
//! of which keeps `paid_amount + remaining_amount == total_amount` within
//! [`EPSILON`](crate::money::EPSILON).

use super::asset::{Asset, AssetKind, Car, LicensePlate};
use super::{nullable, optional_text, Principal};
use crate::error::{LedgerError, LedgerResult};
use crate::money;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use uuid::Uuid;

/// Lifecycle status of an agreement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementStatus {
    #[default]
    Active,
    Ended,
    Paused,
}

impl AgreementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgreementStatus::Active => "active",
            AgreementStatus::Ended => "ended",
            AgreementStatus::Paused => "paused",
        }
    }
}

/// Settlement status of an agreement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Cancel,
}

/// Billing frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    #[default]
    Monthly,
    /// Single payment, no schedule
    #[serde(alias = "-")]
    Once,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalType {
    #[default]
    Lease,
    /// Priced at the asset's full ownership cost when no total is given
    LeaseToOwn,
}

/// An agreement over an asset of kind `A`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agreement<A> {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub renter_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub frequency: Frequency,
    pub rental_type: RentalType,
    pub status: AgreementStatus,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub create_by: Option<String>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    #[serde(skip)]
    asset: PhantomData<fn() -> A>,
}

/// A plate lease
pub type Lease = Agreement<LicensePlate>;

/// A car rental
pub type Rental = Agreement<Car>;

/// Input for creating an agreement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAgreement {
    pub asset_id: Uuid,
    pub renter_id: Uuid,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Required unless `rental_type` is `lease_to_own`
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub rental_type: RentalType,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Sparse update of an agreement; absent fields are left unchanged
///
/// The asset binding and the payment aggregates cannot be patched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgreementPatch {
    #[serde(default)]
    pub renter_id: Option<Uuid>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// `Some(None)` (an explicit `null`) clears the end date
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub rental_type: Option<RentalType>,
    #[serde(default)]
    pub status: Option<AgreementStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Effect of a `total_amount` change on the payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rebalance {
    Unchanged,
    /// The new total is covered by what was already paid
    Settled,
    /// A paid agreement owes money again
    Reopened,
}

fn check_dates(start: NaiveDate, end: Option<NaiveDate>) -> LedgerResult<()> {
    match end {
        Some(end) if end < start => Err(LedgerError::validation("end_date must not be before start_date")),
        _ => Ok(()),
    }
}

fn check_total(total: Decimal) -> LedgerResult<Decimal> {
    if total <= Decimal::ZERO {
        return Err(LedgerError::validation("total_amount must be greater than 0"));
    }
    Ok(total)
}

impl<A: Asset> Agreement<A> {
    /// Build a fresh, active, unpaid agreement over `asset`
    pub fn new(id: Uuid, input: &NewAgreement, asset: &A, principal: &Principal, at: DateTime<Utc>) -> LedgerResult<Self> {
        let total = match (input.total_amount, input.rental_type) {
            (Some(total), _) => total,
            (None, RentalType::LeaseToOwn) => asset.ownership_cost().ok_or_else(|| {
                LedgerError::validation(format!(
                    "total_amount is required: {} {} has no ownership cost on record",
                    A::KIND.asset_noun(),
                    asset.label()
                ))
            })?,
            (None, RentalType::Lease) => return Err(LedgerError::validation("total_amount is required")),
        };
        let total = check_total(total)?;
        check_dates(input.start_date, input.end_date)?;

        Ok(Self {
            id,
            asset_id: asset.id(),
            renter_id: input.renter_id,
            start_date: input.start_date,
            end_date: input.end_date,
            total_amount: total,
            paid_amount: Decimal::ZERO,
            remaining_amount: total,
            frequency: input.frequency,
            rental_type: input.rental_type,
            status: AgreementStatus::Active,
            payment_status: PaymentStatus::Unpaid,
            notes: optional_text("notes", input.notes.as_deref(), 255)?,
            create_by: Some(principal.as_str().to_string()),
            create_time: at,
            update_time: at,
            asset: PhantomData,
        })
    }

    pub fn kind(&self) -> AssetKind {
        A::KIND
    }

    pub fn is_active(&self) -> bool {
        self.status == AgreementStatus::Active
    }

    /// Amount still owed, computed from the totals rather than the stored field
    pub fn outstanding(&self) -> Decimal {
        self.total_amount - self.paid_amount
    }

    /// Reject a payment that is not positive or exceeds what is still owed
    pub fn check_payment(&self, amount: Decimal) -> LedgerResult<()> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount("payment amount must be greater than 0"));
        }
        let outstanding = self.outstanding();
        if amount > outstanding {
            return Err(LedgerError::invalid_amount(format!(
                "payment of {} exceeds remaining balance of {}",
                money::display(amount),
                money::display(outstanding.max(Decimal::ZERO))
            )));
        }
        Ok(())
    }

    /// Add a checked payment to the aggregates
    ///
    /// Returns `true` when this payment settles the agreement; the caller is
    /// then responsible for releasing the asset.
    pub fn apply_payment(&mut self, amount: Decimal, at: DateTime<Utc>) -> bool {
        self.paid_amount += amount;
        self.remaining_amount = money::remaining(self.total_amount, self.paid_amount);
        self.update_time = at;

        if money::is_settled(self.total_amount, self.paid_amount) {
            self.payment_status = PaymentStatus::Paid;
            self.paid_amount = self.total_amount;
            self.remaining_amount = Decimal::ZERO;
            return true;
        }
        false
    }

    /// Mark the agreement cancelled; aggregates are left as they are
    pub fn freeze(&mut self, at: DateTime<Utc>) {
        self.payment_status = PaymentStatus::Cancel;
        self.update_time = at;
    }

    /// Apply every patched field except `status`, which needs the asset
    /// claim and is handled by the engine
    ///
    /// A new total at or within [`EPSILON`](money::EPSILON) of `paid_amount`
    /// settles the agreement; a total raised above what a paid agreement
    /// has covered puts it back to unpaid. The returned [`Rebalance`] tells
    /// the caller which asset transition to make.
    pub fn apply_terms(&mut self, patch: &AgreementPatch, at: DateTime<Utc>) -> LedgerResult<Rebalance> {
        let start = patch.start_date.unwrap_or(self.start_date);
        let end = patch.end_date.unwrap_or(self.end_date);
        check_dates(start, end)?;

        let total = match patch.total_amount {
            Some(total) => {
                let total = check_total(total)?;
                if total < self.paid_amount {
                    return Err(LedgerError::invalid_amount(format!(
                        "total_amount {} is below the {} already paid",
                        money::display(total),
                        money::display(self.paid_amount)
                    )));
                }
                Some(total)
            }
            None => None,
        };
        let notes = match &patch.notes {
            Some(notes) => optional_text("notes", Some(notes.as_str()), 255)?,
            None => self.notes.clone(),
        };

        let mut rebalance = Rebalance::Unchanged;
        if let Some(total) = total {
            self.total_amount = total;
            self.remaining_amount = money::remaining(total, self.paid_amount);
            if money::is_settled(total, self.paid_amount) {
                if self.payment_status != PaymentStatus::Paid {
                    rebalance = Rebalance::Settled;
                }
                self.payment_status = PaymentStatus::Paid;
                self.paid_amount = total;
                self.remaining_amount = Decimal::ZERO;
            } else if self.payment_status == PaymentStatus::Paid {
                self.payment_status = PaymentStatus::Unpaid;
                rebalance = Rebalance::Reopened;
            }
        }
        self.notes = notes;
        if let Some(renter_id) = patch.renter_id {
            self.renter_id = renter_id;
        }
        if let Some(frequency) = patch.frequency {
            self.frequency = frequency;
        }
        if let Some(rental_type) = patch.rental_type {
            self.rental_type = rental_type;
        }
        self.start_date = start;
        self.end_date = end;
        self.update_time = at;
        Ok(rebalance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlateDraft;
    use rust_decimal_macros::dec;

    fn plate() -> LicensePlate {
        LicensePlate::from_draft(
            Uuid::new_v4(),
            PlateDraft {
                plate_number: "T100000C".to_string(),
                plate_state: "NY".to_string(),
                purchase_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                purchase_amount: dec!(20000),
                notes: None,
            },
            &Principal::system(),
            Utc::now(),
        )
        .unwrap()
    }

    fn input(total: Option<Decimal>) -> NewAgreement {
        NewAgreement {
            asset_id: Uuid::nil(),
            renter_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: None,
            total_amount: total,
            frequency: Frequency::Weekly,
            rental_type: RentalType::Lease,
            notes: None,
        }
    }

    fn lease(total: Decimal) -> Lease {
        Lease::new(Uuid::new_v4(), &input(Some(total)), &plate(), &Principal::system(), Utc::now()).unwrap()
    }

    #[test]
    fn test_new_agreement_is_active_unpaid() {
        let asset = plate();
        let lease = Lease::new(Uuid::new_v4(), &input(Some(dec!(1000))), &asset, &Principal::system(), Utc::now()).unwrap();
        assert_eq!(lease.asset_id, asset.id);
        assert_eq!(lease.status, AgreementStatus::Active);
        assert_eq!(lease.payment_status, PaymentStatus::Unpaid);
        assert_eq!(lease.paid_amount, Decimal::ZERO);
        assert_eq!(lease.remaining_amount, dec!(1000));
        assert_eq!(lease.kind(), AssetKind::Plate);
    }

    #[test]
    fn test_new_requires_positive_total() {
        let err = Lease::new(Uuid::new_v4(), &input(Some(dec!(0))), &plate(), &Principal::system(), Utc::now()).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        let err = Lease::new(Uuid::new_v4(), &input(None), &plate(), &Principal::system(), Utc::now()).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_new_rejects_end_before_start() {
        let mut input = input(Some(dec!(10)));
        input.end_date = NaiveDate::from_ymd_opt(2024, 2, 1);
        assert!(Lease::new(Uuid::new_v4(), &input, &plate(), &Principal::system(), Utc::now()).is_err());
    }

    #[test]
    fn test_partial_then_full_payment() {
        let mut lease = lease(dec!(1000.00));
        lease.check_payment(dec!(600)).unwrap();
        assert!(!lease.apply_payment(dec!(600), Utc::now()));
        assert_eq!(lease.paid_amount, dec!(600));
        assert_eq!(lease.remaining_amount, dec!(400));
        assert_eq!(lease.payment_status, PaymentStatus::Unpaid);

        lease.check_payment(dec!(400)).unwrap();
        assert!(lease.apply_payment(dec!(400), Utc::now()));
        assert_eq!(lease.paid_amount, dec!(1000));
        assert_eq!(lease.remaining_amount, Decimal::ZERO);
        assert_eq!(lease.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_payment_within_epsilon_snaps() {
        let mut lease = lease(dec!(100));
        assert!(lease.apply_payment(dec!(99.995), Utc::now()));
        assert_eq!(lease.paid_amount, dec!(100));
        assert_eq!(lease.remaining_amount, Decimal::ZERO);
    }

    #[test]
    fn test_check_payment_rejects() {
        let lease = lease(dec!(100));
        assert!(matches!(lease.check_payment(dec!(-5)), Err(LedgerError::InvalidAmount(_))));
        assert!(matches!(lease.check_payment(Decimal::ZERO), Err(LedgerError::InvalidAmount(_))));
        assert!(matches!(lease.check_payment(dec!(100.01)), Err(LedgerError::InvalidAmount(_))));
        assert!(lease.check_payment(dec!(100)).is_ok());
    }

    #[test]
    fn test_freeze_keeps_aggregates() {
        let mut lease = lease(dec!(100));
        lease.apply_payment(dec!(30), Utc::now());
        lease.freeze(Utc::now());
        assert_eq!(lease.payment_status, PaymentStatus::Cancel);
        assert_eq!(lease.paid_amount, dec!(30));
        assert_eq!(lease.remaining_amount, dec!(70));
    }

    #[test]
    fn test_terms_recompute_remaining() {
        let mut lease = lease(dec!(1000));
        lease.apply_payment(dec!(200), Utc::now());
        let patch = AgreementPatch {
            total_amount: Some(dec!(500)),
            frequency: Some(Frequency::Daily),
            ..Default::default()
        };
        lease.apply_terms(&patch, Utc::now()).unwrap();
        assert_eq!(lease.total_amount, dec!(500));
        assert_eq!(lease.remaining_amount, dec!(300));
        assert_eq!(lease.frequency, Frequency::Daily);
    }

    #[test]
    fn test_terms_reject_total_below_paid() {
        let mut lease = lease(dec!(1000));
        lease.apply_payment(dec!(200), Utc::now());
        let before = lease.clone();
        let patch = AgreementPatch {
            total_amount: Some(dec!(150)),
            ..Default::default()
        };
        assert!(matches!(lease.apply_terms(&patch, Utc::now()), Err(LedgerError::InvalidAmount(_))));
        assert_eq!(lease, before);
    }

    #[test]
    fn test_terms_total_lowered_to_paid_settles() {
        let mut lease = lease(dec!(1000));
        lease.apply_payment(dec!(200), Utc::now());
        let patch = AgreementPatch {
            total_amount: Some(dec!(200.005)),
            ..Default::default()
        };
        assert_eq!(lease.apply_terms(&patch, Utc::now()).unwrap(), Rebalance::Settled);
        assert_eq!(lease.remaining_amount, Decimal::ZERO);
        assert_eq!(lease.paid_amount, dec!(200.005));
        assert_eq!(lease.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_terms_total_raised_after_settlement_reopens() {
        let mut lease = lease(dec!(100));
        assert!(lease.apply_payment(dec!(100), Utc::now()));
        let patch = AgreementPatch {
            total_amount: Some(dec!(150)),
            ..Default::default()
        };
        assert_eq!(lease.apply_terms(&patch, Utc::now()).unwrap(), Rebalance::Reopened);
        assert_eq!(lease.payment_status, PaymentStatus::Unpaid);
        assert_eq!(lease.remaining_amount, dec!(50));
        lease.check_payment(dec!(50)).unwrap();
    }

    #[test]
    fn test_terms_total_change_on_cancelled_stays_cancelled() {
        let mut lease = lease(dec!(100));
        lease.apply_payment(dec!(40), Utc::now());
        lease.freeze(Utc::now());
        let patch = AgreementPatch {
            total_amount: Some(dec!(120)),
            ..Default::default()
        };
        assert_eq!(lease.apply_terms(&patch, Utc::now()).unwrap(), Rebalance::Unchanged);
        assert_eq!(lease.payment_status, PaymentStatus::Cancel);
        assert_eq!(lease.remaining_amount, dec!(80));
    }

    #[test]
    fn test_patch_end_date_null_clears() {
        let mut lease = lease(dec!(100));
        lease.end_date = NaiveDate::from_ymd_opt(2024, 12, 31);

        let patch: AgreementPatch = serde_json::from_str(r#"{"notes": "open ended"}"#).unwrap();
        assert_eq!(patch.end_date, None);
        lease.apply_terms(&patch, Utc::now()).unwrap();
        assert_eq!(lease.end_date, NaiveDate::from_ymd_opt(2024, 12, 31));

        let patch: AgreementPatch = serde_json::from_str(r#"{"end_date": null}"#).unwrap();
        assert_eq!(patch.end_date, Some(None));
        lease.apply_terms(&patch, Utc::now()).unwrap();
        assert_eq!(lease.end_date, None);
        assert_eq!(lease.notes.as_deref(), Some("open ended"));
    }

    #[test]
    fn test_serde_shape() {
        let lease = lease(dec!(12.5));
        let json = serde_json::to_value(&lease).unwrap();
        assert_eq!(json["status"], "active");
        assert_eq!(json["payment_status"], "unpaid");
        assert_eq!(json["frequency"], "weekly");
        assert_eq!(json["total_amount"], "12.5");
        assert!(json.get("asset").is_none());

        let back: Lease = serde_json::from_value(json).unwrap();
        assert_eq!(back, lease);
    }

    #[test]
    fn test_frequency_dash_alias() {
        let f: Frequency = serde_json::from_str("\"-\"").unwrap();
        assert_eq!(f, Frequency::Once);
    }
}
