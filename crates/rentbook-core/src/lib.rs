//! Rentbook Core
//!
//! Lease and rental bookkeeping for a fleet of license plates and cars, built
//! around a payment reconciliation engine.
//!
//! ## Features
//!
//! - **Reconciliation Engine**: create, update, pay, freeze and delete
//!   agreements while keeping the payment aggregates and the asset's
//!   availability consistent in a single transaction
//! - **Payment Ledger**: append-only payment records per agreement
//! - **Asset Registry**: plates and cars, with unique plate numbers and
//!   sequential car numbers
//! - **Renter Directory**: renter contact records
//! - **Fixed-point money**: `rust_decimal` amounts snapped to their clean
//!   endpoint within one cent
//!
//! ## Architecture
//!
//! 1. **Model** (`model/`): records, drafts and patches. [`model::Agreement`]
//!    is generic over [`model::Asset`]; [`model::Lease`] and
//!    [`model::Rental`] are its two instances.
//!
//! 2. **Repo** (`repo`): typed JSON access over a storage transaction, plus the
//!    index tables (ledger links, active claims, unique plate numbers,
//!    sequences).
//!
//! 3. **Engine** (`engine`): the write operations and the `claim`/`release`
//!    pair that binds assets to agreements.
//!
//! 4. **Query** (`query`): reads, filtered lists and pagination.
//!
//! 5. **Registry** / **Directory**: asset and renter CRUD.
//!
//! Persistence is abstracted by [`rentbook_storage::Store`]; any backend
//! works, and every error leaves stored state unchanged.

pub mod directory;
pub mod engine;
pub mod error;
pub mod model;
pub mod money;
pub mod query;
pub mod registry;

mod repo;

pub use directory::{Directory, RenterFilter};
pub use engine::Engine;
pub use error::{LedgerError, LedgerResult};
pub use query::{AgreementFilter, AgreementView, ListParams, Page};
pub use registry::{AssetFilter, Registry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
