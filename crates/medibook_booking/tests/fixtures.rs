//! Test fixtures for booking API tests
//!
//! Builds routers over the in-memory store or an in-memory SQLite store and
//! records the notifications they send.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use medibook_booking::{routes, BookingState};
use medibook_common::services::{
    share_dispatcher, BookingNotification, BoxFuture, NotificationDispatcher, NotificationResult,
};
use medibook_config::{AppConfig, ReservationConfig};
use medibook_db::{
    DbClient, MemoryReservationStore, ReservationStore, SlotKey, SlotRegistry,
    SqlReservationStore,
};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

pub const PROVIDER: i64 = 3;
pub const DATE: &str = "2024-06-12";

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
}

pub fn slot(time_slot: &str) -> SlotKey {
    SlotKey::new(PROVIDER, day(), time_slot)
}

/// Creates a config with a short lock timeout for testing
pub fn create_test_config() -> Arc<AppConfig> {
    Arc::new(AppConfig {
        reservation: ReservationConfig {
            lock_timeout_ms: 2_000,
            frontend_url: "https://clinic.example".to_string(),
        },
        ..AppConfig::default()
    })
}

/// Records every notification instead of sending it
#[derive(Clone, Default)]
pub struct Outbox {
    sent: Arc<Mutex<Vec<(String, BookingNotification)>>>,
}

impl Outbox {
    pub fn sent(&self) -> Vec<(String, BookingNotification)> {
        self.sent.lock().unwrap().clone()
    }

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

impl NotificationDispatcher for Outbox {
    type Error = Infallible;

    fn send(
        &self,
        receiver: &str,
        context: BookingNotification,
    ) -> BoxFuture<'_, NotificationResult, Self::Error> {
        let receiver = receiver.to_string();
        Box::pin(async move {
            let id = format!("outbox-{}", context.booking_id);
            self.sent.lock().unwrap().push((receiver, context));
            Ok(NotificationResult {
                id,
                status: "queued".to_string(),
            })
        })
    }
}

pub struct TestApp<S> {
    pub router: Router,
    pub store: Arc<S>,
    pub outbox: Outbox,
}

fn build<S: ReservationStore>(store: Arc<S>) -> TestApp<S> {
    let outbox = Outbox::default();
    let state = BookingState::new(
        create_test_config(),
        store.clone(),
        share_dispatcher(outbox.clone()),
    );
    TestApp {
        router: routes(Arc::new(state)),
        store,
        outbox,
    }
}

async fn define_slots<S: ReservationStore>(store: &S, slots: &[(&str, i64)]) {
    store.init_schema().await.unwrap();
    for (time_slot, capacity) in slots {
        store.slots().define(&slot(time_slot), *capacity).await.unwrap();
    }
}

/// An app over the in-memory store with the given slots defined
pub async fn memory_app(slots: &[(&str, i64)]) -> TestApp<MemoryReservationStore> {
    let store = Arc::new(MemoryReservationStore::new());
    define_slots(store.as_ref(), slots).await;
    build(store)
}

/// An app over an in-memory SQLite database with the given slots defined
pub async fn sqlite_app(slots: &[(&str, i64)]) -> TestApp<SqlReservationStore> {
    let client = DbClient::from_url("sqlite::memory:").await.unwrap();
    let store = Arc::new(SqlReservationStore::new(client));
    define_slots(store.as_ref(), slots).await;
    build(store)
}

pub fn reservation_body(email: &str, time_slot: &str) -> Value {
    json!({
        "email": email,
        "doctorId": PROVIDER,
        "date": DATE,
        "timeType": time_slot,
        "fullName": "Test Patient",
        "address": "12 Harbour Road",
        "selectedGender": "M",
        "timeString": "09:00 - 10:00",
        "doctorName": "Dr. Okafor",
        "language": "en"
    })
}

/// Sends a request through the router and decodes the JSON body
pub async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

pub async fn reserve(router: &Router, email: &str, time_slot: &str) -> (StatusCode, Value) {
    call(
        router,
        Method::POST,
        "/bookings",
        Some(reservation_body(email, time_slot)),
    )
    .await
}

/// Pulls the token out of a confirmation link
pub fn token_from_link(link: &str) -> String {
    link.split("token=")
        .nth(1)
        .and_then(|rest| rest.split('&').next())
        .unwrap_or_default()
        .to_string()
}
