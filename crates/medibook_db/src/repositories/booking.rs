//! Booking records

use crate::error::DbError;
use crate::models::{Booking, BookingStatus, NewBooking};
use chrono::NaiveDate;
use std::future::Future;

/// Durable record of bookings
///
/// At most one booking per (patient, provider, date) may be Pending or Confirmed;
/// implementations reject a second active one with [`DbError::UniqueViolation`].
pub trait BookingStore: Send + Sync {
    fn init_schema(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Insert a Pending booking without touching slot capacity
    fn insert(&self, booking: NewBooking)
        -> impl Future<Output = Result<Booking, DbError>> + Send;

    fn get(&self, id: i64) -> impl Future<Output = Result<Option<Booking>, DbError>> + Send;

    /// The requester's booking with this provider on this day, if its status is one of
    /// `statuses`. The requester is identified by the account email.
    fn find_for_requester(
        &self,
        email: &str,
        provider_id: i64,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> impl Future<Output = Result<Option<Booking>, DbError>> + Send;

    /// Booking carrying `token` for this provider in the given status
    fn find_by_token(
        &self,
        provider_id: i64,
        token: &str,
        status: BookingStatus,
    ) -> impl Future<Output = Result<Option<Booking>, DbError>> + Send;

    /// Conditional status change
    ///
    /// Applies only while the booking is still in one of `from`; returns `None`
    /// when another writer got there first. `token` replaces the stored token
    /// when given.
    fn transition(
        &self,
        id: i64,
        from: &[BookingStatus],
        to: BookingStatus,
        token: Option<&str>,
    ) -> impl Future<Output = Result<Option<Booking>, DbError>> + Send;

    /// A provider's bookings on a day, oldest first
    fn list_for_provider(
        &self,
        provider_id: i64,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Booking>, DbError>> + Send;
}
