//! Request and response bodies of the booking API, and input validation

use crate::error::Rejection;
use chrono::{DateTime, NaiveDate, Utc};
use medibook_db::{AccountDefaults, Booking, Slot, SlotKey};
use serde::{Deserialize, Serialize};

/// Wire format of every date in the API
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Body of `POST /bookings`
///
/// Field aliases accept the camelCase names used by existing clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReservationRequest {
    pub email: Option<String>,
    #[serde(alias = "doctorId")]
    pub provider_id: Option<i64>,
    /// YYYY-MM-DD
    pub date: Option<String>,
    #[serde(alias = "timeType")]
    pub time_slot: Option<String>,
    #[serde(alias = "fullName")]
    pub full_name: Option<String>,
    pub address: Option<String>,
    #[serde(alias = "selectedGender")]
    pub gender: Option<String>,
    /// Human readable slot time, only used in the confirmation message
    #[serde(alias = "timeString")]
    pub time_string: Option<String>,
    #[serde(alias = "doctorName")]
    pub provider_name: Option<String>,
    pub language: Option<String>,
}

/// A reservation request with every required field present and parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidReservation {
    pub email: String,
    pub slot: SlotKey,
    pub full_name: String,
    pub address: String,
    pub gender: String,
    pub time_string: Option<String>,
    pub provider_name: Option<String>,
    pub language: Option<String>,
}

impl ValidReservation {
    pub fn account_defaults(&self) -> AccountDefaults {
        AccountDefaults {
            first_name: self.full_name.clone(),
            address: self.address.clone(),
            gender: self.gender.clone(),
        }
    }
}

fn required(value: Option<&str>, field: &str) -> Result<String, Rejection> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(Rejection::missing(field)),
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, Rejection> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| Rejection::validation(format!("Invalid date '{}', expected YYYY-MM-DD", raw)))
}

impl ReservationRequest {
    /// Check every required field; blank strings count as missing.
    pub fn validate(self) -> Result<ValidReservation, Rejection> {
        let email = required(self.email.as_deref(), "email")?;
        let provider_id = self.provider_id.ok_or_else(|| Rejection::missing("provider_id"))?;
        let date = parse_date(&required(self.date.as_deref(), "date")?)?;
        let time_slot = required(self.time_slot.as_deref(), "time_slot")?;
        let full_name = required(self.full_name.as_deref(), "full_name")?;
        let address = required(self.address.as_deref(), "address")?;
        let gender = required(self.gender.as_deref(), "gender")?;

        Ok(ValidReservation {
            email,
            slot: SlotKey::new(provider_id, date, time_slot),
            full_name,
            address,
            gender,
            time_string: optional(self.time_string),
            provider_name: optional(self.provider_name),
            language: optional(self.language),
        })
    }
}

/// Body of `POST /bookings/verify`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VerifyRequest {
    pub token: Option<String>,
    #[serde(alias = "doctorId")]
    pub provider_id: Option<i64>,
}

impl VerifyRequest {
    pub fn validate(self) -> Result<(i64, String), Rejection> {
        let token = required(self.token.as_deref(), "token")?;
        let provider_id = self.provider_id.ok_or_else(|| Rejection::missing("provider_id"))?;
        Ok((provider_id, token))
    }
}

/// Body of `PUT /admin/slots`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DefineSlotRequest {
    #[serde(alias = "doctorId")]
    pub provider_id: Option<i64>,
    pub date: Option<String>,
    #[serde(alias = "timeType")]
    pub time_slot: Option<String>,
    #[serde(alias = "maxNumber")]
    pub max_number: Option<i64>,
}

impl DefineSlotRequest {
    pub fn validate(self) -> Result<(SlotKey, i64), Rejection> {
        let provider_id = self.provider_id.ok_or_else(|| Rejection::missing("provider_id"))?;
        let date = parse_date(&required(self.date.as_deref(), "date")?)?;
        let time_slot = required(self.time_slot.as_deref(), "time_slot")?;
        let max_number = self.max_number.ok_or_else(|| Rejection::missing("max_number"))?;
        if max_number < 0 {
            return Err(Rejection::validation("max_number must not be negative"));
        }
        Ok((SlotKey::new(provider_id, date, time_slot), max_number))
    }
}

/// Query of `GET /slots`
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct SlotsQuery {
    pub provider_id: Option<i64>,
    /// YYYY-MM-DD
    pub date: Option<String>,
}

/// Query of `GET /providers/{provider_id}/bookings`
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct DateQuery {
    /// YYYY-MM-DD
    pub date: Option<String>,
}

impl DateQuery {
    pub fn validate(self) -> Result<NaiveDate, Rejection> {
        parse_date(&required(self.date.as_deref(), "date")?)
    }
}

/// A booking as returned to API clients. The verification token is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookingView {
    pub id: i64,
    pub patient_id: i64,
    pub provider_id: i64,
    pub date: String,
    pub time_slot: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Booking> for BookingView {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            patient_id: booking.patient_id,
            provider_id: booking.provider_id,
            date: booking.date.format(DATE_FORMAT).to_string(),
            time_slot: booking.time_slot.clone(),
            status: booking.status.as_str().to_string(),
            created_at: booking.created_at,
        }
    }
}

/// A slot with its counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SlotView {
    pub provider_id: i64,
    pub date: String,
    pub time_slot: String,
    pub max_number: i64,
    pub current_number: i64,
}

impl From<&Slot> for SlotView {
    fn from(slot: &Slot) -> Self {
        Self {
            provider_id: slot.key.provider_id,
            date: slot.key.date.format(DATE_FORMAT).to_string(),
            time_slot: slot.key.time_slot.clone(),
            max_number: slot.max_number,
            current_number: slot.current_number,
        }
    }
}

/// Success body of the reserve, confirm and cancel endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookingResponse {
    #[serde(rename = "errCode")]
    pub err_code: i32,
    pub message: String,
    pub booking: BookingView,
    /// `true` when a cancelled booking was re-activated instead of created
    #[serde(default)]
    pub restored: bool,
}

impl BookingResponse {
    pub fn new(message: impl Into<String>, booking: &Booking) -> Self {
        Self {
            err_code: 0,
            message: message.into(),
            booking: booking.into(),
            restored: false,
        }
    }
}
