//! Renter contact records

use super::{default_state, optional_text, required_text, state_code, Principal};
use crate::error::{LedgerError, LedgerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person who leases plates or rents cars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Renter {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub driver_license_number: String,
    pub driver_license_state: String,
    pub address: Option<String>,
    pub create_by: Option<String>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenterDraft {
    pub full_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub driver_license_number: String,
    #[serde(default = "default_state")]
    pub driver_license_state: String,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenterPatch {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub driver_license_number: Option<String>,
    #[serde(default)]
    pub driver_license_state: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

fn phone(value: &str) -> LedgerResult<String> {
    required_text("phone", value, 7, 20)
}

fn email(value: Option<&str>) -> LedgerResult<Option<String>> {
    let email = optional_text("email", value, 255)?;
    match &email {
        Some(e) if !e.contains('@') || e.starts_with('@') || e.ends_with('@') => {
            Err(LedgerError::validation("email is not a valid address"))
        }
        _ => Ok(email),
    }
}

impl Renter {
    pub fn from_draft(id: Uuid, draft: RenterDraft, principal: &Principal, at: DateTime<Utc>) -> LedgerResult<Self> {
        Ok(Self {
            id,
            full_name: required_text("full_name", &draft.full_name, 1, 255)?,
            phone: phone(&draft.phone)?,
            email: email(draft.email.as_deref())?,
            driver_license_number: required_text("driver_license_number", &draft.driver_license_number, 4, 64)?,
            driver_license_state: state_code("driver_license_state", &draft.driver_license_state)?,
            address: optional_text("address", draft.address.as_deref(), 255)?,
            create_by: Some(principal.as_str().to_string()),
            create_time: at,
            update_time: at,
        })
    }

    pub fn apply_patch(&mut self, patch: &RenterPatch, at: DateTime<Utc>) -> LedgerResult<()> {
        if let Some(name) = &patch.full_name {
            self.full_name = required_text("full_name", name, 1, 255)?;
        }
        if let Some(value) = &patch.phone {
            self.phone = phone(value)?;
        }
        if patch.email.is_some() {
            self.email = email(patch.email.as_deref())?;
        }
        if let Some(license) = &patch.driver_license_number {
            self.driver_license_number = required_text("driver_license_number", license, 4, 64)?;
        }
        if let Some(state) = &patch.driver_license_state {
            self.driver_license_state = state_code("driver_license_state", state)?;
        }
        if patch.address.is_some() {
            self.address = optional_text("address", patch.address.as_deref(), 255)?;
        }
        self.update_time = at;
        Ok(())
    }
}
