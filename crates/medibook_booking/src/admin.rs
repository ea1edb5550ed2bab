//! Slot administration, cancellation and read access

use crate::error::{BookingError, Rejection, RejectionCode};
use chrono::NaiveDate;
use medibook_db::{
    Booking, BookingStatus, BookingStore, DbError, ReservationStore, Slot, SlotKey, SlotRegistry,
};
use std::sync::Arc;
use tracing::info;

pub struct BookingAdmin<S> {
    store: Arc<S>,
}

impl<S: ReservationStore> BookingAdmin<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn get_booking(&self, id: i64) -> Result<Booking, BookingError> {
        self.store
            .bookings()
            .get(id)
            .await?
            .ok_or_else(|| not_found(format!("Booking {} not found", id)))
    }

    /// Cancel a Pending or Confirmed booking
    ///
    /// The slot keeps its count: the capacity stays with the booking so that a
    /// later re-booking can reuse it.
    pub async fn cancel(&self, id: i64) -> Result<Booking, BookingError> {
        let cancelled = self
            .store
            .bookings()
            .transition(id, &BookingStatus::ACTIVE, BookingStatus::Cancelled, None)
            .await?
            .ok_or_else(|| not_found(format!("No active booking with id {}", id)))?;

        info!("Booking {} cancelled", cancelled.id);
        Ok(cancelled)
    }

    /// Create a slot or change its capacity
    pub async fn define_slot(&self, key: SlotKey, max_number: i64) -> Result<Slot, BookingError> {
        match self.store.slots().define(&key, max_number).await {
            Ok(slot) => Ok(slot),
            Err(DbError::InvalidCapacity(message)) => Err(BookingError::Rejected(Rejection::new(
                RejectionCode::InvalidCapacity,
                message,
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_slots(
        &self,
        provider_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Slot>, BookingError> {
        Ok(self
            .store
            .slots()
            .list_for_provider(provider_id, date)
            .await?)
    }

    pub async fn provider_bookings(
        &self,
        provider_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, BookingError> {
        Ok(self
            .store
            .bookings()
            .list_for_provider(provider_id, date)
            .await?)
    }
}

fn not_found(message: String) -> BookingError {
    BookingError::Rejected(Rejection::new(RejectionCode::BookingNotFound, message))
}
