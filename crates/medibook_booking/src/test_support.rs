use crate::coordinator::{CoordinatorSettings, ReservationCoordinator};
use crate::models::ReservationRequest;
use chrono::NaiveDate;
use medibook_common::services::{
    share_dispatcher, BookingNotification, BoxFuture, NotificationDispatcher, NotificationResult,
    SharedDispatcher,
};
use medibook_db::{MemoryReservationStore, ReservationStore, SlotKey, SlotRegistry};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PROVIDER: i64 = 7;

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

pub fn slot(time_slot: &str) -> SlotKey {
    SlotKey::new(PROVIDER, day(), time_slot)
}

pub fn request(email: &str, time_slot: &str) -> ReservationRequest {
    ReservationRequest {
        email: Some(email.to_string()),
        provider_id: Some(PROVIDER),
        date: Some("2024-05-01".to_string()),
        time_slot: Some(time_slot.to_string()),
        full_name: Some("Test Patient".to_string()),
        address: Some("1 Main St".to_string()),
        gender: Some("F".to_string()),
        time_string: Some("08:00 - 09:00".to_string()),
        provider_name: Some("Dr. Lee".to_string()),
        language: Some("en".to_string()),
    }
}

/// Keeps every notification it is asked to send
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    pub sent: Arc<Mutex<Vec<(String, BookingNotification)>>>,
}

impl RecordingDispatcher {
    pub fn sent(&self) -> Vec<(String, BookingNotification)> {
        self.sent.lock().unwrap().clone()
    }

    /// Spawned dispatches land asynchronously; wait until `count` arrived.
    pub async fn wait_for(&self, count: usize) -> Vec<(String, BookingNotification)> {
        for _ in 0..200 {
            if self.sent.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.sent()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    type Error = io::Error;

    fn send(
        &self,
        receiver: &str,
        context: BookingNotification,
    ) -> BoxFuture<'_, NotificationResult, Self::Error> {
        let receiver = receiver.to_string();
        Box::pin(async move {
            let id = format!("rec-{}", context.booking_id);
            self.sent.lock().unwrap().push((receiver, context));
            Ok(NotificationResult {
                id,
                status: "recorded".to_string(),
            })
        })
    }
}

/// Fails every send
#[derive(Clone, Default)]
pub struct FailingDispatcher;

impl NotificationDispatcher for FailingDispatcher {
    type Error = io::Error;

    fn send(
        &self,
        _receiver: &str,
        _context: BookingNotification,
    ) -> BoxFuture<'_, NotificationResult, Self::Error> {
        Box::pin(async { Err(io::Error::new(io::ErrorKind::Other, "relay unreachable")) })
    }
}

pub fn settings() -> CoordinatorSettings {
    CoordinatorSettings {
        lock_timeout: Duration::from_millis(500),
        frontend_url: "http://frontend.test".to_string(),
    }
}

pub fn coordinator(
    store: &Arc<MemoryReservationStore>,
    dispatcher: SharedDispatcher,
) -> ReservationCoordinator<MemoryReservationStore> {
    ReservationCoordinator::new(store.clone(), dispatcher, settings())
}

pub async fn store_with_slots(slots: &[(&str, i64)]) -> Arc<MemoryReservationStore> {
    let store = Arc::new(MemoryReservationStore::new());
    store.init_schema().await.unwrap();
    for (time_slot, capacity) in slots {
        store.slots().define(&slot(time_slot), *capacity).await.unwrap();
    }
    store
}

pub fn recording() -> (RecordingDispatcher, SharedDispatcher) {
    let recorder = RecordingDispatcher::default();
    (recorder.clone(), share_dispatcher(recorder))
}
