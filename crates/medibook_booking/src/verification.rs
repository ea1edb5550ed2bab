//! Token-based booking confirmation

use crate::error::{Rejection, RejectionCode, ReservationFault};
use crate::models::VerifyRequest;
use medibook_db::{Booking, BookingStatus, BookingStore, ReservationStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a confirmation attempt that reached a decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Confirmed(Booking),
    Declined(Rejection),
}

/// Moves Pending bookings to Confirmed when presented with their token
pub struct VerificationService<S> {
    store: Arc<S>,
}

impl<S: ReservationStore> VerificationService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Confirm the Pending booking of `provider_id` carrying `token`
    ///
    /// Unknown tokens and already confirmed bookings get the same answer. The
    /// status change is conditional on the booking still being Pending, so of
    /// several concurrent confirms exactly one succeeds.
    pub async fn confirm(
        &self,
        request: VerifyRequest,
    ) -> Result<VerificationOutcome, ReservationFault> {
        let (provider_id, token) = match request.validate() {
            Ok(parts) => parts,
            Err(rejection) => return Ok(VerificationOutcome::Declined(rejection)),
        };

        let bookings = self.store.bookings();
        let Some(pending) = bookings
            .find_by_token(provider_id, &token, BookingStatus::Pending)
            .await?
        else {
            return Ok(unknown(provider_id));
        };

        match bookings
            .transition(
                pending.id,
                &[BookingStatus::Pending],
                BookingStatus::Confirmed,
                None,
            )
            .await?
        {
            Some(confirmed) => {
                info!("Booking {} confirmed", confirmed.id);
                Ok(VerificationOutcome::Confirmed(confirmed))
            }
            None => Ok(unknown(provider_id)),
        }
    }
}

fn unknown(provider_id: i64) -> VerificationOutcome {
    warn!(
        "Confirmation for provider {} matched no pending booking",
        provider_id
    );
    VerificationOutcome::Declined(Rejection::new(
        RejectionCode::AlreadyConfirmedOrUnknown,
        "Appointment has been activated or does not exist",
    ))
}
