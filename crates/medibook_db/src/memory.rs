//! In-process reservation store
//!
//! Used when no database is configured and throughout the test suites. A single
//! mutex guards all records, so every operation (including the combined
//! claim-and-insert) is atomic with respect to the others.

use crate::error::DbError;
use crate::models::{
    Account, AccountDefaults, Booking, BookingStatus, CapacityClaim, CommitOutcome, NewBooking,
    Slot, SlotKey, PATIENT_ROLE,
};
use crate::repositories::{AccountDirectory, BookingStore, SlotRegistry};
use crate::repository::ReservationStore;
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Default)]
struct MemoryState {
    slots: BTreeMap<SlotKey, Slot>,
    bookings: BTreeMap<i64, Booking>,
    accounts: HashMap<String, Account>,
    next_booking_id: i64,
    next_account_id: i64,
}

impl MemoryState {
    fn has_active_booking(&self, patient_id: i64, provider_id: i64, date: NaiveDate) -> bool {
        self.bookings.values().any(|b| {
            b.patient_id == patient_id
                && b.provider_id == provider_id
                && b.date == date
                && b.status.is_active()
        })
    }

    fn insert_booking(&mut self, booking: &NewBooking) -> Result<Booking, DbError> {
        if self.has_active_booking(booking.patient_id, booking.slot.provider_id, booking.slot.date)
        {
            return Err(DbError::UniqueViolation(format!(
                "patient {} already holds an active booking with provider {} on {}",
                booking.patient_id, booking.slot.provider_id, booking.slot.date
            )));
        }
        self.next_booking_id += 1;
        let created = Booking {
            id: self.next_booking_id,
            patient_id: booking.patient_id,
            provider_id: booking.slot.provider_id,
            date: booking.slot.date,
            time_slot: booking.slot.time_slot.clone(),
            status: BookingStatus::Pending,
            token: booking.token.clone(),
            created_at: Utc::now(),
        };
        self.bookings.insert(created.id, created.clone());
        Ok(created)
    }

    fn claim(&mut self, key: &SlotKey) -> CapacityClaim {
        match self.slots.get_mut(key) {
            None => CapacityClaim::Missing,
            Some(slot) if slot.is_full() => CapacityClaim::Full(slot.clone()),
            Some(slot) => {
                slot.current_number += 1;
                CapacityClaim::Claimed(slot.clone())
            }
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<MemoryState>,
    operations: AtomicUsize,
    latency_ms: AtomicU64,
    unavailable: AtomicBool,
}

impl Shared {
    async fn run<T>(
        &self,
        op: impl FnOnce(&mut MemoryState) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DbError::ConnectionError(
                "memory store is unavailable".to_string(),
            ));
        }
        let mut state = self
            .state
            .lock()
            .map_err(|_| DbError::Other("memory store lock poisoned".to_string()))?;
        op(&mut state)
    }
}

/// In-memory [`SlotRegistry`]
#[derive(Debug, Clone)]
pub struct MemorySlotRegistry {
    shared: Arc<Shared>,
}

/// In-memory [`BookingStore`]
#[derive(Debug, Clone)]
pub struct MemoryBookingStore {
    shared: Arc<Shared>,
}

/// In-memory [`AccountDirectory`]
#[derive(Debug, Clone)]
pub struct MemoryAccountDirectory {
    shared: Arc<Shared>,
}

/// In-memory [`ReservationStore`]
///
/// Clones share the same records.
#[derive(Debug, Clone)]
pub struct MemoryReservationStore {
    shared: Arc<Shared>,
    slots: MemorySlotRegistry,
    bookings: MemoryBookingStore,
    accounts: MemoryAccountDirectory,
}

impl Default for MemoryReservationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryReservationStore {
    pub fn new() -> Self {
        let shared = Arc::new(Shared::default());
        Self {
            slots: MemorySlotRegistry {
                shared: shared.clone(),
            },
            bookings: MemoryBookingStore {
                shared: shared.clone(),
            },
            accounts: MemoryAccountDirectory {
                shared: shared.clone(),
            },
            shared,
        }
    }

    /// Number of store operations attempted so far
    pub fn operation_count(&self) -> usize {
        self.shared.operations.load(Ordering::SeqCst)
    }

    /// Delay every operation, to widen race windows in tests
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.shared.latency_ms.store(millis, Ordering::SeqCst);
    }

    /// Make every operation fail with [`DbError::ConnectionError`] until cleared
    pub fn set_unavailable(&self, unavailable: bool) {
        self.shared.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl SlotRegistry for MemorySlotRegistry {
    async fn init_schema(&self) -> Result<(), DbError> {
        self.shared.run(|_| Ok(())).await
    }

    async fn get(&self, key: &SlotKey) -> Result<Option<Slot>, DbError> {
        self.shared
            .run(|state| Ok(state.slots.get(key).cloned()))
            .await
    }

    async fn define(&self, key: &SlotKey, max_number: i64) -> Result<Slot, DbError> {
        self.shared
            .run(|state| {
                if max_number < 0 {
                    return Err(DbError::InvalidCapacity(format!(
                        "capacity must not be negative, got {}",
                        max_number
                    )));
                }
                let slot = state.slots.entry(key.clone()).or_insert_with(|| Slot {
                    key: key.clone(),
                    max_number,
                    current_number: 0,
                });
                if slot.current_number > max_number {
                    return Err(DbError::InvalidCapacity(format!(
                        "slot {} already holds {} reservations",
                        key, slot.current_number
                    )));
                }
                slot.max_number = max_number;
                debug!("Slot {} defined with capacity {}", key, max_number);
                Ok(slot.clone())
            })
            .await
    }

    async fn increment_reserved(&self, key: &SlotKey) -> Result<CapacityClaim, DbError> {
        self.shared.run(|state| Ok(state.claim(key))).await
    }

    async fn list_for_provider(
        &self,
        provider_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Slot>, DbError> {
        self.shared
            .run(|state| {
                Ok(state
                    .slots
                    .values()
                    .filter(|s| s.key.provider_id == provider_id && s.key.date == date)
                    .cloned()
                    .collect())
            })
            .await
    }
}

impl BookingStore for MemoryBookingStore {
    async fn init_schema(&self) -> Result<(), DbError> {
        self.shared.run(|_| Ok(())).await
    }

    async fn insert(&self, booking: NewBooking) -> Result<Booking, DbError> {
        self.shared
            .run(|state| state.insert_booking(&booking))
            .await
    }

    async fn get(&self, id: i64) -> Result<Option<Booking>, DbError> {
        self.shared
            .run(|state| Ok(state.bookings.get(&id).cloned()))
            .await
    }

    async fn find_for_requester(
        &self,
        email: &str,
        provider_id: i64,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> Result<Option<Booking>, DbError> {
        self.shared
            .run(|state| {
                let Some(account) = state.accounts.get(email) else {
                    return Ok(None);
                };
                Ok(state
                    .bookings
                    .values()
                    .rev()
                    .find(|b| {
                        b.patient_id == account.id
                            && b.provider_id == provider_id
                            && b.date == date
                            && statuses.contains(&b.status)
                    })
                    .cloned())
            })
            .await
    }

    async fn find_by_token(
        &self,
        provider_id: i64,
        token: &str,
        status: BookingStatus,
    ) -> Result<Option<Booking>, DbError> {
        self.shared
            .run(|state| {
                Ok(state
                    .bookings
                    .values()
                    .find(|b| b.provider_id == provider_id && b.token == token && b.status == status)
                    .cloned())
            })
            .await
    }

    async fn transition(
        &self,
        id: i64,
        from: &[BookingStatus],
        to: BookingStatus,
        token: Option<&str>,
    ) -> Result<Option<Booking>, DbError> {
        self.shared
            .run(|state| {
                let Some(current) = state.bookings.get(&id) else {
                    return Ok(None);
                };
                if !from.contains(&current.status) {
                    return Ok(None);
                }
                if to.is_active()
                    && !current.status.is_active()
                    && state.has_active_booking(current.patient_id, current.provider_id, current.date)
                {
                    return Err(DbError::UniqueViolation(format!(
                        "patient {} already holds an active booking with provider {} on {}",
                        current.patient_id, current.provider_id, current.date
                    )));
                }
                let Some(booking) = state.bookings.get_mut(&id) else {
                    return Ok(None);
                };
                booking.status = to;
                if let Some(token) = token {
                    booking.token = token.to_string();
                }
                Ok(Some(booking.clone()))
            })
            .await
    }

    async fn list_for_provider(
        &self,
        provider_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, DbError> {
        self.shared
            .run(|state| {
                Ok(state
                    .bookings
                    .values()
                    .filter(|b| b.provider_id == provider_id && b.date == date)
                    .cloned()
                    .collect())
            })
            .await
    }
}

impl AccountDirectory for MemoryAccountDirectory {
    async fn init_schema(&self) -> Result<(), DbError> {
        self.shared.run(|_| Ok(())).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DbError> {
        self.shared
            .run(|state| Ok(state.accounts.get(email).cloned()))
            .await
    }

    async fn find_or_create(
        &self,
        email: &str,
        defaults: &AccountDefaults,
    ) -> Result<Account, DbError> {
        self.shared
            .run(|state| {
                if let Some(existing) = state.accounts.get(email) {
                    return Ok(existing.clone());
                }
                state.next_account_id += 1;
                let account = Account {
                    id: state.next_account_id,
                    email: email.to_string(),
                    first_name: defaults.first_name.clone(),
                    address: defaults.address.clone(),
                    gender: defaults.gender.clone(),
                    role_id: PATIENT_ROLE.to_string(),
                    created_at: Utc::now(),
                };
                state.accounts.insert(email.to_string(), account.clone());
                Ok(account)
            })
            .await
    }
}

impl ReservationStore for MemoryReservationStore {
    type Slots = MemorySlotRegistry;
    type Bookings = MemoryBookingStore;
    type Accounts = MemoryAccountDirectory;

    fn slots(&self) -> &MemorySlotRegistry {
        &self.slots
    }

    fn bookings(&self) -> &MemoryBookingStore {
        &self.bookings
    }

    fn accounts(&self) -> &MemoryAccountDirectory {
        &self.accounts
    }

    async fn commit_new_booking(&self, booking: NewBooking) -> Result<CommitOutcome, DbError> {
        self.shared
            .run(|state| {
                let patient_id = booking.patient_id;
                if state.has_active_booking(patient_id, booking.slot.provider_id, booking.slot.date)
                {
                    return Err(DbError::UniqueViolation(format!(
                        "patient {} already holds an active booking with provider {} on {}",
                        patient_id, booking.slot.provider_id, booking.slot.date
                    )));
                }
                let slot = match state.claim(&booking.slot) {
                    CapacityClaim::Claimed(slot) => slot,
                    CapacityClaim::Full(_) => return Ok(CommitOutcome::SlotFull),
                    CapacityClaim::Missing => return Ok(CommitOutcome::SlotMissing),
                };
                let created = state.insert_booking(&booking)?;
                Ok(CommitOutcome::Committed {
                    booking: created,
                    slot,
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(slot: &str) -> SlotKey {
        SlotKey::new(1, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), slot)
    }

    fn defaults() -> AccountDefaults {
        AccountDefaults {
            first_name: "Ann".to_string(),
            address: "1 Main St".to_string(),
            gender: "F".to_string(),
        }
    }

    #[tokio::test]
    async fn test_commit_claims_capacity_and_inserts() {
        let store = MemoryReservationStore::new();
        store.slots().define(&key("T1"), 1).await.unwrap();
        let account = store
            .accounts()
            .find_or_create("a@x.io", &defaults())
            .await
            .unwrap();

        let outcome = store
            .commit_new_booking(NewBooking {
                patient_id: account.id,
                slot: key("T1"),
                token: "tok".to_string(),
            })
            .await
            .unwrap();
        let CommitOutcome::Committed { booking, slot } = outcome else {
            panic!("expected a committed booking, got {:?}", outcome);
        };
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(slot.current_number, 1);

        let second = store
            .commit_new_booking(NewBooking {
                patient_id: account.id + 1,
                slot: key("T1"),
                token: "tok2".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(second, CommitOutcome::SlotFull);
    }

    #[tokio::test]
    async fn test_duplicate_active_booking_leaves_counter_untouched() {
        let store = MemoryReservationStore::new();
        store.slots().define(&key("T1"), 5).await.unwrap();
        store.slots().define(&key("T2"), 5).await.unwrap();

        let first = NewBooking {
            patient_id: 9,
            slot: key("T1"),
            token: "a".to_string(),
        };
        store.commit_new_booking(first).await.unwrap();

        let second = NewBooking {
            patient_id: 9,
            slot: key("T2"),
            token: "b".to_string(),
        };
        let err = store.commit_new_booking(second).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation(_)));

        let t2 = store.slots().get(&key("T2")).await.unwrap().unwrap();
        assert_eq!(t2.current_number, 0);
    }

    #[tokio::test]
    async fn test_define_refuses_capacity_below_reserved() {
        let store = MemoryReservationStore::new();
        store.slots().define(&key("T1"), 2).await.unwrap();
        store.slots().increment_reserved(&key("T1")).await.unwrap();
        store.slots().increment_reserved(&key("T1")).await.unwrap();

        let err = store.slots().define(&key("T1"), 1).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidCapacity(_)));

        let raised = store.slots().define(&key("T1"), 4).await.unwrap();
        assert_eq!(raised.current_number, 2);
        assert_eq!(raised.max_number, 4);
    }

    #[tokio::test]
    async fn test_missing_slot_is_reported() {
        let store = MemoryReservationStore::new();
        let claim = store.slots().increment_reserved(&key("nope")).await.unwrap();
        assert_eq!(claim, CapacityClaim::Missing);
    }

    #[tokio::test]
    async fn test_transition_is_conditional() {
        let store = MemoryReservationStore::new();
        let booking = store
            .bookings()
            .insert(NewBooking {
                patient_id: 1,
                slot: key("T1"),
                token: "t".to_string(),
            })
            .await
            .unwrap();

        let confirmed = store
            .bookings()
            .transition(booking.id, &[BookingStatus::Pending], BookingStatus::Confirmed, None)
            .await
            .unwrap();
        assert_eq!(confirmed.map(|b| b.status), Some(BookingStatus::Confirmed));

        let again = store
            .bookings()
            .transition(booking.id, &[BookingStatus::Pending], BookingStatus::Confirmed, None)
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_operation() {
        let store = MemoryReservationStore::new();
        store.set_unavailable(true);
        let err = store.slots().get(&key("T1")).await.unwrap_err();
        assert!(matches!(err, DbError::ConnectionError(_)));
        assert_eq!(store.operation_count(), 1);

        let err = store.init_schema().await.unwrap_err();
        assert!(matches!(err, DbError::ConnectionError(_)));
    }
}
