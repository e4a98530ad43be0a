//! Shared fixtures for the rentbook-core integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use rentbook_core::model::{
    Car, CarDraft, LicensePlate, NewAgreement, PlateDraft, Principal, RenterDraft,
};
use rentbook_core::{Directory, Engine, Registry};
use rentbook_storage::{Entry, Store, Table};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

pub struct Book<S> {
    pub store: Arc<S>,
    pub engine: Engine<S>,
    pub registry: Registry<S>,
    pub directory: Directory<S>,
    pub clerk: Principal,
}

impl<S: Store> Book<S> {
    pub fn new(store: S) -> Self {
        let store = Arc::new(store);
        Self {
            engine: Engine::new(store.clone()),
            registry: Registry::new(store.clone()),
            directory: Directory::new(store.clone()),
            store,
            clerk: Principal::new("clerk@example.com"),
        }
    }

    pub fn renter(&self, name: &str) -> Uuid {
        self.directory
            .create(
                RenterDraft {
                    full_name: name.to_string(),
                    phone: "7185550142".to_string(),
                    email: Some("renter@example.com".to_string()),
                    driver_license_number: "D1234567".to_string(),
                    driver_license_state: "NY".to_string(),
                    address: None,
                },
                &self.clerk,
            )
            .unwrap()
            .id
    }

    pub fn plate(&self, number: &str) -> Uuid {
        self.registry
            .create::<LicensePlate>(
                PlateDraft {
                    plate_number: number.to_string(),
                    plate_state: "NY".to_string(),
                    purchase_date: day(1),
                    purchase_amount: Decimal::new(2_000_000, 2),
                    notes: None,
                },
                &self.clerk,
            )
            .unwrap()
            .id
    }

    pub fn car(&self, model: &str, plate: &str) -> Uuid {
        let draft: CarDraft = serde_json::from_value(serde_json::json!({
            "model": model,
            "year": 2022,
            "plate_number": plate,
            "price": "24000.00",
            "insurance_expenses": "2400.00",
        }))
        .unwrap();
        self.registry.create::<Car>(draft, &self.clerk).unwrap().id
    }

    /// Every committed entry, table by table
    pub fn snapshot(&self) -> Vec<(Table, Vec<Entry>)> {
        Table::ALL
            .iter()
            .map(|table| (*table, self.store.scan(*table).unwrap()))
            .collect()
    }
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
}

pub fn terms(asset_id: Uuid, renter_id: Uuid, total: Decimal) -> NewAgreement {
    NewAgreement {
        asset_id,
        renter_id,
        start_date: day(1),
        end_date: Some(day(31)),
        total_amount: Some(total),
        frequency: Default::default(),
        rental_type: Default::default(),
        notes: None,
    }
}
