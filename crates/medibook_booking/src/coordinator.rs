//! Reservation coordination
//!
//! `reserve` serialises work per requester day and per slot, then decides
//! between rejecting, restoring a cancelled booking and creating a new one.
//! A restore never needs a free seat.
//! New bookings are committed together with their capacity claim.

use crate::error::{Rejection, RejectionCode, ReservationFault};
use crate::locks::{KeyedLocks, LockTimeout};
use crate::models::{ReservationRequest, ValidReservation};
use chrono::NaiveDate;
use medibook_common::services::{BookingNotification, SharedDispatcher};
use medibook_db::{
    AccountDirectory, Booking, BookingStatus, BookingStore, CommitOutcome, DbError, NewBooking,
    ReservationStore, SlotKey, SlotRegistry,
};
use medibook_notify::confirmation_link;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of a reservation attempt that reached a decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationOutcome {
    /// A new Pending booking was created and one unit of capacity taken
    Created(Booking),
    /// The requester's cancelled booking was set back to Pending with a fresh token
    Restored(Booking),
    /// A business rule refused the request; nothing was changed
    Declined(Rejection),
}

impl ReservationOutcome {
    pub fn booking(&self) -> Option<&Booking> {
        match self {
            ReservationOutcome::Created(b) | ReservationOutcome::Restored(b) => Some(b),
            ReservationOutcome::Declined(_) => None,
        }
    }
}

/// What a reservation holds exclusively while it decides
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LockKey {
    Requester {
        email: String,
        provider_id: i64,
        date: NaiveDate,
    },
    Slot(SlotKey),
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockKey::Requester {
                email,
                provider_id,
                date,
            } => write!(f, "requester {}/{}/{}", email, provider_id, date),
            LockKey::Slot(key) => write!(f, "slot {}", key),
        }
    }
}

impl From<LockTimeout> for ReservationFault {
    fn from(timeout: LockTimeout) -> Self {
        ReservationFault::ContentionTimeout(timeout.to_string())
    }
}

/// Settings of a [`ReservationCoordinator`]
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub lock_timeout: Duration,
    pub frontend_url: String,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(5000),
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

impl From<&medibook_config::ReservationConfig> for CoordinatorSettings {
    fn from(config: &medibook_config::ReservationConfig) -> Self {
        Self {
            lock_timeout: Duration::from_millis(config.lock_timeout_ms),
            frontend_url: config.frontend_url.clone(),
        }
    }
}

pub struct ReservationCoordinator<S> {
    store: Arc<S>,
    locks: KeyedLocks<LockKey>,
    dispatcher: SharedDispatcher,
    settings: CoordinatorSettings,
}

impl<S: ReservationStore> ReservationCoordinator<S> {
    pub fn new(store: Arc<S>, dispatcher: SharedDispatcher, settings: CoordinatorSettings) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
            dispatcher,
            settings,
        }
    }

    /// Lock table, shared with tests that need to hold a key from outside
    pub fn locks(&self) -> &KeyedLocks<LockKey> {
        &self.locks
    }

    /// Reserve one unit of a slot for the requester
    ///
    /// Validation happens before any store access. Locks are taken in the order
    /// requester, then slot, and released before the confirmation is dispatched.
    pub async fn reserve(
        &self,
        request: ReservationRequest,
    ) -> Result<ReservationOutcome, ReservationFault> {
        let valid = match request.validate() {
            Ok(valid) => valid,
            Err(rejection) => {
                warn!("Rejected reservation: {}", rejection.message);
                return Ok(ReservationOutcome::Declined(rejection));
            }
        };

        let outcome = {
            let requester_key = LockKey::Requester {
                email: valid.email.clone(),
                provider_id: valid.slot.provider_id,
                date: valid.slot.date,
            };
            let _requester = self
                .locks
                .acquire(requester_key, self.settings.lock_timeout)
                .await?;
            let _slot = self
                .locks
                .acquire(LockKey::Slot(valid.slot.clone()), self.settings.lock_timeout)
                .await?;

            self.decide(&valid).await?
        };

        match &outcome {
            ReservationOutcome::Created(booking) => self.dispatch(&valid, booking, false),
            ReservationOutcome::Restored(booking) => self.dispatch(&valid, booking, true),
            ReservationOutcome::Declined(rejection) => {
                warn!(
                    "Reservation for {} on {} declined: {}",
                    valid.email, valid.slot, rejection.message
                );
            }
        }
        Ok(outcome)
    }

    async fn decide(&self, valid: &ValidReservation) -> Result<ReservationOutcome, ReservationFault> {
        let key = &valid.slot;
        let slot = match self.store.slots().get(key).await? {
            Some(slot) => slot,
            None => {
                return Ok(declined(
                    RejectionCode::SlotNotFound,
                    format!(
                        "No schedule for provider {} at {} on {}",
                        key.provider_id, key.time_slot, key.date
                    ),
                ))
            }
        };
        let bookings = self.store.bookings();
        if bookings
            .find_for_requester(&valid.email, key.provider_id, key.date, &BookingStatus::ACTIVE)
            .await?
            .is_some()
        {
            return Ok(duplicate(valid));
        }

        if let Some(cancelled) = bookings
            .find_for_requester(
                &valid.email,
                key.provider_id,
                key.date,
                &[BookingStatus::Cancelled],
            )
            .await?
        {
            return self.restore(valid, cancelled).await;
        }

        // Restores reuse the seat their booking still holds
        if slot.is_full() {
            return Ok(declined(
                RejectionCode::SlotFull,
                format!("Time slot {} on {} is fully booked", key.time_slot, key.date),
            ));
        }

        self.create(valid).await
    }

    async fn restore(
        &self,
        valid: &ValidReservation,
        cancelled: Booking,
    ) -> Result<ReservationOutcome, ReservationFault> {
        debug!("Re-activating cancelled booking {}", cancelled.id);
        let token = new_token();
        let restored = self
            .store
            .bookings()
            .transition(
                cancelled.id,
                &[BookingStatus::Cancelled],
                BookingStatus::Pending,
                Some(token.as_str()),
            )
            .await;

        match restored {
            Ok(Some(booking)) => {
                info!(
                    "Booking {} restored to Pending for {}",
                    booking.id, valid.email
                );
                Ok(ReservationOutcome::Restored(booking))
            }
            // Changed by another process since the lookup
            Ok(None) | Err(DbError::UniqueViolation(_)) => Ok(duplicate(valid)),
            Err(e) => Err(e.into()),
        }
    }

    async fn create(&self, valid: &ValidReservation) -> Result<ReservationOutcome, ReservationFault> {
        let account = self
            .store
            .accounts()
            .find_or_create(&valid.email, &valid.account_defaults())
            .await?;

        let committed = self
            .store
            .commit_new_booking(NewBooking {
                patient_id: account.id,
                slot: valid.slot.clone(),
                token: new_token(),
            })
            .await;

        match committed {
            Ok(CommitOutcome::Committed { booking, slot }) => {
                info!(
                    "Booking {} created for {} on {} ({}/{})",
                    booking.id, valid.email, slot.key, slot.current_number, slot.max_number
                );
                Ok(ReservationOutcome::Created(booking))
            }
            Ok(CommitOutcome::SlotFull) => Ok(declined(
                RejectionCode::SlotFull,
                format!(
                    "Time slot {} on {} is fully booked",
                    valid.slot.time_slot, valid.slot.date
                ),
            )),
            Ok(CommitOutcome::SlotMissing) => Ok(declined(
                RejectionCode::SlotNotFound,
                format!(
                    "No schedule for provider {} at {} on {}",
                    valid.slot.provider_id, valid.slot.time_slot, valid.slot.date
                ),
            )),
            Err(DbError::UniqueViolation(_)) => Ok(duplicate(valid)),
            Err(e) => Err(e.into()),
        }
    }

    /// Fire-and-forget confirmation message; the outcome is only logged.
    fn dispatch(&self, valid: &ValidReservation, booking: &Booking, restored: bool) {
        let dispatcher = self.dispatcher.clone();
        let receiver = valid.email.clone();
        let notification = BookingNotification {
            booking_id: booking.id,
            patient_name: valid.full_name.clone(),
            time: valid.time_string.clone(),
            provider_name: valid.provider_name.clone(),
            language: valid.language.clone(),
            redirect_link: confirmation_link(
                &self.settings.frontend_url,
                booking.provider_id,
                &booking.token,
            ),
            restored,
        };

        tokio::spawn(async move {
            let booking_id = notification.booking_id;
            match dispatcher.send(&receiver, notification).await {
                Ok(result) => debug!(
                    "Confirmation for booking {} dispatched: {} ({})",
                    booking_id, result.id, result.status
                ),
                Err(e) => warn!(
                    "Failed to dispatch confirmation for booking {}: {}",
                    booking_id, e
                ),
            }
        });
    }
}

fn new_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn declined(code: RejectionCode, message: String) -> ReservationOutcome {
    ReservationOutcome::Declined(Rejection::new(code, message))
}

fn duplicate(valid: &ValidReservation) -> ReservationOutcome {
    declined(
        RejectionCode::DuplicateBooking,
        format!(
            "{} already holds a booking with provider {} on {}",
            valid.email, valid.slot.provider_id, valid.slot.date
        ),
    )
}
