//! Domain model
//!
//! - [`asset`]: the [`Asset`] abstraction with its two kinds, [`LicensePlate`] and [`Car`]
//! - [`renter`]: renter contact records
//! - [`agreement`]: the generic [`Agreement`] (a [`Lease`] over a plate, a [`Rental`] over a car)
//! - [`payment`]: append-only payment records
//!
//! All timestamps are generated in UTC by [`now`].

pub mod agreement;
pub mod asset;
pub mod payment;
pub mod renter;

pub use agreement::{
    Agreement, AgreementPatch, AgreementStatus, Frequency, Lease, NewAgreement, PaymentStatus,
    Rebalance, Rental, RentalType,
};
pub use asset::{
    Asset, AssetKind, AssetStatus, Car, CarDraft, CarPatch, LicensePlate, PlateDraft, PlatePatch,
};
pub use payment::{NewPayment, Payment};
pub use renter::{Renter, RenterDraft, RenterPatch};

use crate::error::{LedgerError, LedgerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Current wall-clock time; the single time zone used for every stored timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Authenticated caller, used only for creator attribution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Principal recorded for operations not driven by a user
    pub const SYSTEM: &'static str = "system";

    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    pub fn system() -> Self {
        Self(Self::SYSTEM.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim a required text field and check its length in characters
pub(crate) fn required_text(field: &str, value: &str, min: usize, max: usize) -> LedgerResult<String> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < min || len > max {
        return Err(LedgerError::validation(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field; blank becomes `None`
pub(crate) fn optional_text(field: &str, value: Option<&str>, max: usize) -> LedgerResult<Option<String>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) if v.chars().count() > max => Err(LedgerError::validation(format!(
            "{} must be at most {} characters",
            field, max
        ))),
        Some(v) => Ok(Some(v.to_string())),
        None => Ok(None),
    }
}

/// Two-letter US state code, uppercased
pub(crate) fn state_code(field: &str, value: &str) -> LedgerResult<String> {
    let code = value.trim().to_uppercase();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(LedgerError::validation(format!(
            "{} must be a two-letter state code",
            field
        )));
    }
    Ok(code)
}

/// Deserialize a present field, `null` included, as `Some`
///
/// Paired with `#[serde(default)]` so an absent field stays `None` and an
/// explicit `null` becomes `Some(None)`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Default state for plates, cars and driver licenses
pub(crate) fn default_state() -> String {
    "NY".to_string()
}
