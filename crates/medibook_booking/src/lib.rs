// --- File: crates/medibook_booking/src/lib.rs ---
pub mod admin;
pub mod coordinator;
#[cfg(test)]
mod coordinator_proptest;
pub mod doc;
pub mod error;
pub mod handlers;
pub mod locks;
#[cfg(test)]
mod locks_test;
pub mod models;
pub mod routes;
#[cfg(test)]
mod test_support;
pub mod verification;

pub use coordinator::{CoordinatorSettings, ReservationCoordinator, ReservationOutcome};
pub use error::{BookingError, Rejection, RejectionCode, ReservationFault};
pub use handlers::BookingState;
pub use routes::routes;
pub use verification::{VerificationOutcome, VerificationService};
