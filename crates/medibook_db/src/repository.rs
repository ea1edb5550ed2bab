//! The store seam used by the reservation services

use crate::error::DbError;
use crate::models::{CommitOutcome, NewBooking};
use crate::repositories::{AccountDirectory, BookingStore, SlotRegistry};
use std::future::Future;

/// Everything the reservation services need from durable storage
///
/// [`commit_new_booking`](ReservationStore::commit_new_booking) is the only
/// write that spans two records: it takes one unit of slot capacity and
/// inserts the Pending booking as a single atomic step. Either both persist
/// or neither does.
pub trait ReservationStore: Send + Sync + 'static {
    type Slots: SlotRegistry;
    type Bookings: BookingStore;
    type Accounts: AccountDirectory;

    fn slots(&self) -> &Self::Slots;
    fn bookings(&self) -> &Self::Bookings;
    fn accounts(&self) -> &Self::Accounts;

    /// Create all backing tables
    fn init_schema(&self) -> impl Future<Output = Result<(), DbError>> + Send {
        async move {
            self.accounts().init_schema().await?;
            self.slots().init_schema().await?;
            self.bookings().init_schema().await?;
            Ok(())
        }
    }

    /// Claim capacity on `booking.slot` and insert the booking atomically
    fn commit_new_booking(
        &self,
        booking: NewBooking,
    ) -> impl Future<Output = Result<CommitOutcome, DbError>> + Send;
}

/// Creates stores of a given kind
pub trait RepositoryFactory<S: ReservationStore> {
    fn create_store(&self) -> impl Future<Output = Result<S, DbError>> + Send;
}
