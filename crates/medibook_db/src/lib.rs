//! Durable storage for MediBook
//!
//! Slots, bookings and accounts behind an SQLx `Any` client over SQLite, plus an
//! in-process store with the same guarantees.
//!
//! # Example
//!
//! ```rust,no_run
//! use medibook_db::{DbClient, ReservationStore, SqlReservationStore};
//!
//! async fn setup_store() -> Result<SqlReservationStore, Box<dyn std::error::Error>> {
//!     let db_client = DbClient::from_url("sqlite:data/medibook.db").await?;
//!     let store = SqlReservationStore::new(db_client);
//!     store.init_schema().await?;
//!     Ok(store)
//! }
//! ```

pub mod client;
pub mod error;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod repository;
pub mod sql_store;

pub use client::{DbClient, DbTransaction};
pub use error::DbError;
pub use memory::MemoryReservationStore;
pub use models::{
    Account, AccountDefaults, Booking, BookingStatus, CapacityClaim, CommitOutcome, NewBooking,
    Slot, SlotKey, UnknownStatus, PATIENT_ROLE,
};
pub use repositories::{
    AccountDirectory, BookingStore, SlotRegistry, SqlAccountDirectory, SqlBookingStore,
    SqlSlotRegistry,
};
pub use repository::{RepositoryFactory, ReservationStore};
pub use sql_store::{SqlReservationStore, SqlStoreFactory};
