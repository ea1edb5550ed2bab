// --- File: crates/medibook_booking/src/routes.rs ---

use crate::handlers::{
    cancel_booking_handler, confirm_handler, define_slot_handler, get_booking_handler,
    list_slots_handler, provider_bookings_handler, reserve_handler, BookingState,
};
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use medibook_db::ReservationStore;
use std::sync::Arc;

/// Creates a router containing all booking routes, to be nested under `/api`.
pub fn routes<S: ReservationStore>(state: Arc<BookingState<S>>) -> Router {
    Router::new()
        .route("/bookings", post(reserve_handler::<S>))
        .route("/patient-book-appointment", post(reserve_handler::<S>))
        .route("/bookings/verify", post(confirm_handler::<S>))
        .route("/verify-book-appointment", post(confirm_handler::<S>))
        .route("/bookings/{id}", get(get_booking_handler::<S>))
        .route(
            "/admin/bookings/{id}/cancel",
            patch(cancel_booking_handler::<S>),
        )
        .route("/admin/slots", put(define_slot_handler::<S>))
        .route("/slots", get(list_slots_handler::<S>))
        .route(
            "/providers/{provider_id}/bookings",
            get(provider_bookings_handler::<S>),
        )
        .with_state(state)
}
