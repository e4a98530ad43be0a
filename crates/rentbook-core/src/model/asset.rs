//! Assets: the things being leased or rented
//!
//! An [`Asset`] is either a [`LicensePlate`] (leased) or a [`Car`] (rented).
//! Both carry an [`AssetStatus`] that only the reconciliation engine writes;
//! drafts and patches coming from clients have no status field.

use super::{default_state, optional_text, required_text, state_code, Principal};
use crate::error::{LedgerError, LedgerResult};
use chrono::{DateTime, NaiveDate, Utc};
use rentbook_storage::Table;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Availability of an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    #[default]
    Available,
    Rented,
}

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Available => "available",
            AssetStatus::Rented => "rented",
        }
    }
}

/// The two asset kinds and everything that differs between them at the storage level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Plate,
    Car,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Plate => "plate",
            AssetKind::Car => "car",
        }
    }

    /// Human name of the asset, for messages
    pub fn asset_noun(&self) -> &'static str {
        match self {
            AssetKind::Plate => "License plate",
            AssetKind::Car => "Car",
        }
    }

    /// Human name of an agreement over this asset kind
    pub fn agreement_noun(&self) -> &'static str {
        match self {
            AssetKind::Plate => "Lease",
            AssetKind::Car => "Rental",
        }
    }

    pub fn asset_table(&self) -> Table {
        match self {
            AssetKind::Plate => Table::Plates,
            AssetKind::Car => Table::Cars,
        }
    }

    pub fn agreement_table(&self) -> Table {
        match self {
            AssetKind::Plate => Table::Leases,
            AssetKind::Car => Table::Rentals,
        }
    }

    /// Counter used to number new assets, if this kind is numbered
    pub fn sequence(&self) -> Option<&'static str> {
        match self {
            AssetKind::Plate => None,
            AssetKind::Car => Some("car_number"),
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behaviour shared by every leasable asset
pub trait Asset: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Client input for creating an asset
    type Draft: fmt::Debug + DeserializeOwned + Send + Sync + 'static;
    /// Client input for a sparse update
    type Patch: fmt::Debug + DeserializeOwned + Send + Sync + 'static;

    const KIND: AssetKind;

    /// Build a validated record from a draft; numbering happens later, in storage
    fn from_draft(id: Uuid, draft: Self::Draft, principal: &Principal, at: DateTime<Utc>) -> LedgerResult<Self>;

    /// Apply a sparse update, validating each supplied field
    fn apply_patch(&mut self, patch: &Self::Patch, at: DateTime<Utc>) -> LedgerResult<()>;

    fn id(&self) -> Uuid;

    fn status(&self) -> AssetStatus;

    fn set_status(&mut self, status: AssetStatus, at: DateTime<Utc>);

    fn create_time(&self) -> DateTime<Utc>;

    /// Registration plate, used for uniqueness and search
    fn plate_number(&self) -> Option<&str>;

    /// Vehicle model, for kinds that record one
    fn model(&self) -> Option<&str> {
        None
    }

    /// Display label used in agreement views
    fn label(&self) -> String;

    /// Sequential short number, for numbered kinds
    fn number(&self) -> Option<u64> {
        None
    }

    fn assign_number(&mut self, _number: u64) {}

    /// Full cost of ownership, used to price lease-to-own agreements
    fn ownership_cost(&self) -> Option<Decimal> {
        None
    }
}

fn non_negative(field: &str, amount: Decimal) -> LedgerResult<Decimal> {
    if amount.is_sign_negative() {
        return Err(LedgerError::validation(format!("{} must not be negative", field)));
    }
    Ok(amount)
}

fn optional_non_negative(field: &str, amount: Option<Decimal>) -> LedgerResult<Option<Decimal>> {
    amount.map(|a| non_negative(field, a)).transpose()
}

fn plate(value: &str) -> LedgerResult<String> {
    required_text("plate_number", value, 2, 16).map(|p| p.to_uppercase())
}

// ---------------------------------------------------------------------------
// License plates
// ---------------------------------------------------------------------------

/// A registration plate leased to renters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicensePlate {
    pub id: Uuid,
    pub plate_number: String,
    pub plate_state: String,
    pub purchase_date: NaiveDate,
    pub purchase_amount: Decimal,
    pub status: AssetStatus,
    pub notes: Option<String>,
    pub create_by: Option<String>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateDraft {
    pub plate_number: String,
    #[serde(default = "default_state")]
    pub plate_state: String,
    pub purchase_date: NaiveDate,
    pub purchase_amount: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatePatch {
    #[serde(default)]
    pub plate_number: Option<String>,
    #[serde(default)]
    pub plate_state: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub purchase_amount: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Asset for LicensePlate {
    type Draft = PlateDraft;
    type Patch = PlatePatch;

    const KIND: AssetKind = AssetKind::Plate;

    fn from_draft(id: Uuid, draft: PlateDraft, principal: &Principal, at: DateTime<Utc>) -> LedgerResult<Self> {
        Ok(Self {
            id,
            plate_number: plate(&draft.plate_number)?,
            plate_state: state_code("plate_state", &draft.plate_state)?,
            purchase_date: draft.purchase_date,
            purchase_amount: non_negative("purchase_amount", draft.purchase_amount)?,
            status: AssetStatus::Available,
            notes: optional_text("notes", draft.notes.as_deref(), 255)?,
            create_by: Some(principal.as_str().to_string()),
            create_time: at,
            update_time: at,
        })
    }

    fn apply_patch(&mut self, patch: &PlatePatch, at: DateTime<Utc>) -> LedgerResult<()> {
        if let Some(number) = &patch.plate_number {
            self.plate_number = plate(number)?;
        }
        if let Some(state) = &patch.plate_state {
            self.plate_state = state_code("plate_state", state)?;
        }
        if let Some(date) = patch.purchase_date {
            self.purchase_date = date;
        }
        if let Some(amount) = patch.purchase_amount {
            self.purchase_amount = non_negative("purchase_amount", amount)?;
        }
        if patch.notes.is_some() {
            self.notes = optional_text("notes", patch.notes.as_deref(), 255)?;
        }
        self.update_time = at;
        Ok(())
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn status(&self) -> AssetStatus {
        self.status
    }

    fn set_status(&mut self, status: AssetStatus, at: DateTime<Utc>) {
        self.status = status;
        self.update_time = at;
    }

    fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    fn plate_number(&self) -> Option<&str> {
        Some(&self.plate_number)
    }

    fn label(&self) -> String {
        self.plate_number.clone()
    }
}

// ---------------------------------------------------------------------------
// Cars
// ---------------------------------------------------------------------------

/// A vehicle rented to renters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub id: Uuid,
    /// Short sequential number shown to staff
    pub car_number: Option<u64>,
    pub model: String,
    /// Wheelchair accessible vehicle
    pub wav: bool,
    pub marker: Option<String>,
    pub color: Option<String>,
    pub year: i32,
    pub vin_number: Option<String>,
    pub plate_number: Option<String>,
    pub state: String,
    pub registration_expires_at: Option<DateTime<Utc>>,
    pub insurance_expires_at: Option<DateTime<Utc>>,
    pub price: Option<Decimal>,
    pub installation_fee_for_safety_equipment: Option<Decimal>,
    pub insurance_expenses: Option<Decimal>,
    pub service_expenses: Option<Decimal>,
    pub maintenance_costs: Option<Decimal>,
    pub full_coverage_auto_insurance: Option<Decimal>,
    pub other_expenses: Option<Decimal>,
    pub status: AssetStatus,
    pub notes: Option<String>,
    pub create_by: Option<String>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

fn default_marker() -> Option<String> {
    Some("premium".to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarDraft {
    pub model: String,
    #[serde(default)]
    pub wav: bool,
    #[serde(default = "default_marker")]
    pub marker: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub year: i32,
    #[serde(default)]
    pub vin_number: Option<String>,
    #[serde(default)]
    pub plate_number: Option<String>,
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(default)]
    pub registration_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub insurance_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub installation_fee_for_safety_equipment: Option<Decimal>,
    #[serde(default)]
    pub insurance_expenses: Option<Decimal>,
    #[serde(default)]
    pub service_expenses: Option<Decimal>,
    #[serde(default)]
    pub maintenance_costs: Option<Decimal>,
    #[serde(default)]
    pub full_coverage_auto_insurance: Option<Decimal>,
    #[serde(default)]
    pub other_expenses: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarPatch {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub wav: Option<bool>,
    #[serde(default)]
    pub marker: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub vin_number: Option<String>,
    #[serde(default)]
    pub plate_number: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub registration_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub insurance_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub installation_fee_for_safety_equipment: Option<Decimal>,
    #[serde(default)]
    pub insurance_expenses: Option<Decimal>,
    #[serde(default)]
    pub service_expenses: Option<Decimal>,
    #[serde(default)]
    pub maintenance_costs: Option<Decimal>,
    #[serde(default)]
    pub full_coverage_auto_insurance: Option<Decimal>,
    #[serde(default)]
    pub other_expenses: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn model_year(year: i32) -> LedgerResult<i32> {
    if !(1900..=2100).contains(&year) {
        return Err(LedgerError::validation("year must be between 1900 and 2100"));
    }
    Ok(year)
}

impl Car {
    fn cost_components(&self) -> [Option<Decimal>; 7] {
        [
            self.price,
            self.installation_fee_for_safety_equipment,
            self.insurance_expenses,
            self.service_expenses,
            self.maintenance_costs,
            self.full_coverage_auto_insurance,
            self.other_expenses,
        ]
    }
}

impl Asset for Car {
    type Draft = CarDraft;
    type Patch = CarPatch;

    const KIND: AssetKind = AssetKind::Car;

    fn from_draft(id: Uuid, draft: CarDraft, principal: &Principal, at: DateTime<Utc>) -> LedgerResult<Self> {
        Ok(Self {
            id,
            car_number: None,
            model: required_text("model", &draft.model, 1, 255)?,
            wav: draft.wav,
            marker: optional_text("marker", draft.marker.as_deref(), 64)?,
            color: optional_text("color", draft.color.as_deref(), 64)?,
            year: model_year(draft.year)?,
            vin_number: optional_text("vin_number", draft.vin_number.as_deref(), 64)?,
            plate_number: draft.plate_number.as_deref().map(plate).transpose()?,
            state: state_code("state", &draft.state)?,
            registration_expires_at: draft.registration_expires_at,
            insurance_expires_at: draft.insurance_expires_at,
            price: optional_non_negative("price", draft.price)?,
            installation_fee_for_safety_equipment: optional_non_negative(
                "installation_fee_for_safety_equipment",
                draft.installation_fee_for_safety_equipment,
            )?,
            insurance_expenses: optional_non_negative("insurance_expenses", draft.insurance_expenses)?,
            service_expenses: optional_non_negative("service_expenses", draft.service_expenses)?,
            maintenance_costs: optional_non_negative("maintenance_costs", draft.maintenance_costs)?,
            full_coverage_auto_insurance: optional_non_negative(
                "full_coverage_auto_insurance",
                draft.full_coverage_auto_insurance,
            )?,
            other_expenses: optional_non_negative("other_expenses", draft.other_expenses)?,
            status: AssetStatus::Available,
            notes: optional_text("notes", draft.notes.as_deref(), 255)?,
            create_by: Some(principal.as_str().to_string()),
            create_time: at,
            update_time: at,
        })
    }

    fn apply_patch(&mut self, patch: &CarPatch, at: DateTime<Utc>) -> LedgerResult<()> {
        if let Some(model) = &patch.model {
            self.model = required_text("model", model, 1, 255)?;
        }
        if let Some(wav) = patch.wav {
            self.wav = wav;
        }
        if patch.marker.is_some() {
            self.marker = optional_text("marker", patch.marker.as_deref(), 64)?;
        }
        if patch.color.is_some() {
            self.color = optional_text("color", patch.color.as_deref(), 64)?;
        }
        if let Some(year) = patch.year {
            self.year = model_year(year)?;
        }
        if patch.vin_number.is_some() {
            self.vin_number = optional_text("vin_number", patch.vin_number.as_deref(), 64)?;
        }
        if let Some(number) = &patch.plate_number {
            self.plate_number = Some(plate(number)?);
        }
        if let Some(state) = &patch.state {
            self.state = state_code("state", state)?;
        }
        if patch.registration_expires_at.is_some() {
            self.registration_expires_at = patch.registration_expires_at;
        }
        if patch.insurance_expires_at.is_some() {
            self.insurance_expires_at = patch.insurance_expires_at;
        }
        let costs = [
            ("price", patch.price, &mut self.price),
            (
                "installation_fee_for_safety_equipment",
                patch.installation_fee_for_safety_equipment,
                &mut self.installation_fee_for_safety_equipment,
            ),
            ("insurance_expenses", patch.insurance_expenses, &mut self.insurance_expenses),
            ("service_expenses", patch.service_expenses, &mut self.service_expenses),
            ("maintenance_costs", patch.maintenance_costs, &mut self.maintenance_costs),
            (
                "full_coverage_auto_insurance",
                patch.full_coverage_auto_insurance,
                &mut self.full_coverage_auto_insurance,
            ),
            ("other_expenses", patch.other_expenses, &mut self.other_expenses),
        ];
        for (field, value, slot) in costs {
            if let Some(amount) = value {
                *slot = Some(non_negative(field, amount)?);
            }
        }
        if patch.notes.is_some() {
            self.notes = optional_text("notes", patch.notes.as_deref(), 255)?;
        }
        self.update_time = at;
        Ok(())
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn status(&self) -> AssetStatus {
        self.status
    }

    fn set_status(&mut self, status: AssetStatus, at: DateTime<Utc>) {
        self.status = status;
        self.update_time = at;
    }

    fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    fn plate_number(&self) -> Option<&str> {
        self.plate_number.as_deref()
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }

    fn label(&self) -> String {
        match &self.plate_number {
            Some(plate) => format!("{} ({})", self.model, plate),
            None => self.model.clone(),
        }
    }

    fn number(&self) -> Option<u64> {
        self.car_number
    }

    fn assign_number(&mut self, number: u64) {
        self.car_number = Some(number);
    }

    fn ownership_cost(&self) -> Option<Decimal> {
        let total: Decimal = self.cost_components().iter().flatten().sum();
        (total > Decimal::ZERO).then_some(total)
    }
}
