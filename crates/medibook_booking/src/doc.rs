// File: crates/medibook_booking/src/doc.rs

#![allow(dead_code)]
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::error::{Rejection, RejectionCode};
use crate::models::{
    BookingResponse, BookingView, DateQuery, DefineSlotRequest, ReservationRequest, SlotView,
    SlotsQuery, VerifyRequest,
};

#[utoipa::path(
    post,
    path = "/bookings",
    request_body(content = ReservationRequest, example = json!({
        "email": "ann@example.com",
        "provider_id": 7,
        "date": "2025-05-15",
        "time_slot": "T1",
        "full_name": "Ann Smith",
        "address": "1 Main St",
        "gender": "F",
        "time_string": "08:00 - 09:00, Thursday 15/05/2025",
        "provider_name": "Dr. Lee",
        "language": "en"
    })),
    responses(
        (status = 201, description = "Pending booking created", body = BookingResponse),
        (status = 200, description = "Cancelled booking restored to Pending", body = BookingResponse),
        (status = 400, description = "Missing or malformed field (VALIDATION_ERROR)"),
        (status = 404, description = "No such slot (SLOT_NOT_FOUND)"),
        (status = 409, description = "Slot full (SLOT_FULL) or requester already booked that day (DUPLICATE_BOOKING)"),
        (status = 503, description = "Contention timeout, safe to retry (CONTENTION_TIMEOUT)"),
        (status = 500, description = "Storage failure (STORAGE_ERROR)")
    ),
    tag = "Bookings"
)]
fn doc_reserve_handler() {}

#[utoipa::path(
    post,
    path = "/bookings/verify",
    request_body(content = VerifyRequest, example = json!({
        "token": "4b1f8c2e-1f0a-4c53-9d59-0d6f3e0e8a11",
        "provider_id": 7
    })),
    responses(
        (status = 200, description = "Booking confirmed", body = BookingResponse),
        (status = 400, description = "Missing token or provider (VALIDATION_ERROR)"),
        (status = 404, description = "Already confirmed or unknown (ALREADY_CONFIRMED_OR_UNKNOWN)")
    ),
    tag = "Bookings"
)]
fn doc_confirm_handler() {}

#[utoipa::path(
    get,
    path = "/bookings/{id}",
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 200, description = "The booking", body = BookingView),
        (status = 404, description = "Unknown booking (BOOKING_NOT_FOUND)")
    ),
    tag = "Bookings"
)]
fn doc_get_booking_handler() {}

#[utoipa::path(
    patch,
    path = "/admin/bookings/{id}/cancel",
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking cancelled", body = BookingResponse),
        (status = 404, description = "No active booking with that id (BOOKING_NOT_FOUND)")
    ),
    tag = "Admin"
)]
fn doc_cancel_booking_handler() {}

#[utoipa::path(
    put,
    path = "/admin/slots",
    request_body(content = DefineSlotRequest, example = json!({
        "provider_id": 7,
        "date": "2025-05-15",
        "time_slot": "T1",
        "max_number": 3
    })),
    responses(
        (status = 200, description = "Slot created or updated", body = SlotView),
        (status = 400, description = "Missing or malformed field (VALIDATION_ERROR)"),
        (status = 409, description = "Capacity below reserved count (INVALID_CAPACITY)")
    ),
    tag = "Admin"
)]
fn doc_define_slot_handler() {}

#[utoipa::path(
    get,
    path = "/slots",
    params(SlotsQuery),
    responses(
        (status = 200, description = "Slots of the provider on that day", body = [SlotView]),
        (status = 400, description = "Missing provider or date (VALIDATION_ERROR)")
    ),
    tag = "Bookings"
)]
fn doc_list_slots_handler() {}

#[utoipa::path(
    get,
    path = "/providers/{provider_id}/bookings",
    params(
        ("provider_id" = i64, Path, description = "Provider id"),
        DateQuery
    ),
    responses(
        (status = 200, description = "Bookings of the provider on that day", body = [BookingView]),
        (status = 400, description = "Missing or malformed date (VALIDATION_ERROR)")
    ),
    tag = "Admin"
)]
fn doc_provider_bookings_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_reserve_handler,
        doc_confirm_handler,
        doc_get_booking_handler,
        doc_cancel_booking_handler,
        doc_define_slot_handler,
        doc_list_slots_handler,
        doc_provider_bookings_handler
    ),
    components(
        schemas(
            ReservationRequest,
            VerifyRequest,
            DefineSlotRequest,
            BookingResponse,
            BookingView,
            SlotView,
            Rejection,
            RejectionCode
        )
    ),
    tags(
        (name = "Bookings", description = "Reservation and confirmation API"),
        (name = "Admin", description = "Schedule and booking administration")
    ),
    servers(
        (url = "/api", description = "MediBook API server")
    )
)]
pub struct BookingApiDoc;
