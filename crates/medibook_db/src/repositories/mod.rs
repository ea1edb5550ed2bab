//! Repositories for MediBook's persistent records

pub mod account;
pub mod account_sql;
pub mod booking;
pub mod booking_sql;
mod rows;
pub mod slot;
pub mod slot_sql;

pub use account::AccountDirectory;
pub use account_sql::SqlAccountDirectory;
pub use booking::BookingStore;
pub use booking_sql::SqlBookingStore;
pub use slot::SlotRegistry;
pub use slot_sql::{claim_capacity, SqlSlotRegistry};

pub(crate) use rows::{account_from_row, booking_from_row, slot_from_row, status_filter};
