//! Payment ledger records

use super::asset::AssetKind;
use super::{optional_text, Principal};
use crate::error::LedgerResult;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Funds applied to one agreement. Never modified once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub agreement_id: Uuid,
    pub kind: AssetKind,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub note: Option<String>,
    pub create_by: Option<String>,
    pub create_time: DateTime<Utc>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Input for [`pay`](crate::engine::Engine::pay)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub amount: Decimal,
    #[serde(default = "today")]
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
}

impl NewPayment {
    pub fn new(amount: Decimal, payment_date: NaiveDate) -> Self {
        Self {
            amount,
            payment_date,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

impl Payment {
    pub(crate) fn record(
        id: Uuid,
        agreement_id: Uuid,
        kind: AssetKind,
        input: &NewPayment,
        principal: &Principal,
        at: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        Ok(Self {
            id,
            agreement_id,
            kind,
            amount: input.amount,
            payment_date: input.payment_date,
            note: optional_text("note", input.note.as_deref(), 255)?,
            create_by: Some(principal.as_str().to_string()),
            create_time: at,
        })
    }
}
