// --- File: crates/medibook_booking/src/handlers.rs ---
use crate::admin::BookingAdmin;
use crate::coordinator::{CoordinatorSettings, ReservationCoordinator, ReservationOutcome};
use crate::error::{BookingError, Rejection};
use crate::models::{
    BookingResponse, BookingView, DateQuery, DefineSlotRequest, ReservationRequest, SlotView,
    SlotsQuery, VerifyRequest,
};
use crate::verification::{VerificationOutcome, VerificationService};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
};
use medibook_common::services::SharedDispatcher;
use medibook_config::AppConfig;
use medibook_db::ReservationStore;
use std::sync::Arc;

// Shared state of the booking routes
pub struct BookingState<S> {
    pub config: Arc<AppConfig>,
    pub coordinator: ReservationCoordinator<S>,
    pub verification: VerificationService<S>,
    pub admin: BookingAdmin<S>,
}

impl<S: ReservationStore> BookingState<S> {
    pub fn new(config: Arc<AppConfig>, store: Arc<S>, dispatcher: SharedDispatcher) -> Self {
        let settings = CoordinatorSettings::from(&config.reservation);
        Self {
            coordinator: ReservationCoordinator::new(store.clone(), dispatcher, settings),
            verification: VerificationService::new(store.clone()),
            admin: BookingAdmin::new(store),
            config,
        }
    }
}

fn bad_json(rejection: JsonRejection) -> Rejection {
    Rejection::validation(rejection.body_text())
}

fn bad_query(rejection: QueryRejection) -> Rejection {
    Rejection::validation(rejection.body_text())
}

fn bad_path(rejection: PathRejection) -> Rejection {
    Rejection::validation(rejection.body_text())
}

/// Reserve a slot. 201 for a new booking, 200 when a cancelled one was restored.
pub async fn reserve_handler<S: ReservationStore>(
    State(state): State<Arc<BookingState<S>>>,
    payload: Result<Json<ReservationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingResponse>), BookingError> {
    let Json(request) = payload.map_err(bad_json)?;

    match state.coordinator.reserve(request).await? {
        ReservationOutcome::Created(booking) => Ok((
            StatusCode::CREATED,
            Json(BookingResponse::new(
                "Booking created, check your email to confirm it",
                &booking,
            )),
        )),
        ReservationOutcome::Restored(booking) => Ok((
            StatusCode::OK,
            Json(BookingResponse {
                restored: true,
                ..BookingResponse::new(
                    "Cancelled booking restored, check your email to confirm it",
                    &booking,
                )
            }),
        )),
        ReservationOutcome::Declined(rejection) => Err(rejection.into()),
    }
}

/// Confirm a Pending booking with its token.
pub async fn confirm_handler<S: ReservationStore>(
    State(state): State<Arc<BookingState<S>>>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<BookingResponse>, BookingError> {
    let Json(request) = payload.map_err(bad_json)?;

    match state.verification.confirm(request).await? {
        VerificationOutcome::Confirmed(booking) => Ok(Json(BookingResponse::new(
            "Appointment confirmed",
            &booking,
        ))),
        VerificationOutcome::Declined(rejection) => Err(rejection.into()),
    }
}

pub async fn get_booking_handler<S: ReservationStore>(
    State(state): State<Arc<BookingState<S>>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<BookingView>, BookingError> {
    let Path(id) = id.map_err(bad_path)?;
    let booking = state.admin.get_booking(id).await?;
    Ok(Json(BookingView::from(&booking)))
}

/// Cancel a booking. Capacity is kept for a later re-booking.
pub async fn cancel_booking_handler<S: ReservationStore>(
    State(state): State<Arc<BookingState<S>>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<BookingResponse>, BookingError> {
    let Path(id) = id.map_err(bad_path)?;
    let booking = state.admin.cancel(id).await?;
    Ok(Json(BookingResponse::new("Booking cancelled", &booking)))
}

/// Create a slot or change its capacity.
pub async fn define_slot_handler<S: ReservationStore>(
    State(state): State<Arc<BookingState<S>>>,
    payload: Result<Json<DefineSlotRequest>, JsonRejection>,
) -> Result<Json<SlotView>, BookingError> {
    let Json(request) = payload.map_err(bad_json)?;
    let (key, max_number) = request.validate()?;
    let slot = state.admin.define_slot(key, max_number).await?;
    Ok(Json(SlotView::from(&slot)))
}

pub async fn list_slots_handler<S: ReservationStore>(
    State(state): State<Arc<BookingState<S>>>,
    query: Result<Query<SlotsQuery>, QueryRejection>,
) -> Result<Json<Vec<SlotView>>, BookingError> {
    let Query(query) = query.map_err(bad_query)?;
    let provider_id = query
        .provider_id
        .ok_or_else(|| Rejection::missing("provider_id"))?;
    let date = DateQuery { date: query.date }.validate()?;

    let slots = state.admin.list_slots(provider_id, date).await?;
    Ok(Json(slots.iter().map(SlotView::from).collect()))
}

pub async fn provider_bookings_handler<S: ReservationStore>(
    State(state): State<Arc<BookingState<S>>>,
    provider_id: Result<Path<i64>, PathRejection>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Vec<BookingView>>, BookingError> {
    let Path(provider_id) = provider_id.map_err(bad_path)?;
    let Query(query) = query.map_err(bad_query)?;
    let date = query.validate()?;

    let bookings = state.admin.provider_bookings(provider_id, date).await?;
    Ok(Json(bookings.iter().map(BookingView::from).collect()))
}
