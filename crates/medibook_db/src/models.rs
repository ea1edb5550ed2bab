//! Records held by the store

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role assigned to accounts created through self-service booking
pub const PATIENT_ROLE: &str = "R3";

/// Identity of a bookable slot: one provider, one day, one time label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    pub provider_id: i64,
    pub date: NaiveDate,
    pub time_slot: String,
}

impl SlotKey {
    pub fn new(provider_id: i64, date: NaiveDate, time_slot: impl Into<String>) -> Self {
        Self {
            provider_id,
            date,
            time_slot: time_slot.into(),
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.provider_id, self.date, self.time_slot)
    }
}

/// A capacity-limited slot and its reservation counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    #[serde(flatten)]
    pub key: SlotKey,
    pub max_number: i64,
    pub current_number: i64,
}

impl Slot {
    pub fn is_full(&self) -> bool {
        self.current_number >= self.max_number
    }
}

/// Lifecycle state of a booking
///
/// Stored as the variant name. The legacy codes `S1`, `S2` and `S4` are still
/// accepted when reading rows written by older deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    pub fn legacy_code(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "S1",
            BookingStatus::Confirmed => "S2",
            BookingStatus::Cancelled => "S4",
        }
    }

    /// Pending and confirmed bookings count against the one-booking-per-day rule.
    pub fn is_active(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised for a stored status literal that maps to no lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown booking status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" | "S1" => Ok(BookingStatus::Pending),
            "Confirmed" | "S2" => Ok(BookingStatus::Confirmed),
            "Cancelled" | "S4" => Ok(BookingStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A patient's claim on one unit of a slot's capacity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub patient_id: i64,
    pub provider_id: i64,
    pub date: NaiveDate,
    pub time_slot: String,
    pub status: BookingStatus,
    /// Opaque verification token sent in the confirmation link
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// Input for a booking committed together with its capacity claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub patient_id: i64,
    pub slot: SlotKey,
    pub token: String,
}

/// A registered person, keyed by email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub address: String,
    pub gender: String,
    pub role_id: String,
    pub created_at: DateTime<Utc>,
}

/// Profile fields used only when an account has to be created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountDefaults {
    pub first_name: String,
    pub address: String,
    pub gender: String,
}

/// Result of trying to take one unit of a slot's capacity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapacityClaim {
    /// The counter was incremented; carries the updated slot
    Claimed(Slot),
    /// The slot exists but has no capacity left
    Full(Slot),
    /// No slot is defined for the key
    Missing,
}

/// Result of the combined claim-and-insert used for new bookings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed { booking: Booking, slot: Slot },
    SlotFull,
    SlotMissing,
}
