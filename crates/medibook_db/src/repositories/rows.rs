//! Manual row mapping
//!
//! Dates and timestamps are stored as text because `DateTime<Utc>` has no
//! `Decode` impl for `sqlx::Any`.

use crate::error::DbError;
use crate::models::{Account, Booking, BookingStatus, Slot, SlotKey};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| DbError::Decode(format!("invalid date '{}': {}", raw, e)))
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DbError::Decode(format!("invalid timestamp '{}': {}", raw, e)))
}

pub(crate) fn slot_from_row(row: &AnyRow) -> Result<Slot, DbError> {
    let date: String = row.try_get("date")?;
    Ok(Slot {
        key: SlotKey {
            provider_id: row.try_get("provider_id")?,
            date: parse_date(&date)?,
            time_slot: row.try_get("time_slot")?,
        },
        max_number: row.try_get("max_number")?,
        current_number: row.try_get("current_number")?,
    })
}

pub(crate) fn booking_from_row(row: &AnyRow) -> Result<Booking, DbError> {
    let date: String = row.try_get("date")?;
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(Booking {
        id: row.try_get("id")?,
        patient_id: row.try_get("patient_id")?,
        provider_id: row.try_get("provider_id")?,
        date: parse_date(&date)?,
        time_slot: row.try_get("time_slot")?,
        status: status
            .parse::<BookingStatus>()
            .map_err(|e| DbError::Decode(e.to_string()))?,
        token: row.try_get("token")?,
        created_at: parse_timestamp(&created_at)?,
    })
}

pub(crate) fn account_from_row(row: &AnyRow) -> Result<Account, DbError> {
    let created_at: String = row.try_get("created_at")?;
    Ok(Account {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        address: row.try_get("address")?,
        gender: row.try_get("gender")?,
        role_id: row.try_get("role_id")?,
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Builds `IN ($n, ...)` for a status set, matching both the stored names and
/// the legacy codes. Returns the SQL fragment and the literals to bind in order.
pub(crate) fn status_filter(
    statuses: &[BookingStatus],
    first_placeholder: usize,
) -> (String, Vec<&'static str>) {
    let literals: Vec<&'static str> = statuses
        .iter()
        .flat_map(|s| [s.as_str(), s.legacy_code()])
        .collect();
    let placeholders: Vec<String> = (0..literals.len())
        .map(|i| format!("${}", first_placeholder + i))
        .collect();
    (format!("IN ({})", placeholders.join(", ")), literals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_numbers_placeholders() {
        let (sql, literals) = status_filter(&BookingStatus::ACTIVE, 4);
        assert_eq!(sql, "IN ($4, $5, $6, $7)");
        assert_eq!(literals, vec!["Pending", "S1", "Confirmed", "S2"]);
    }

    #[test]
    fn test_parse_date_rejects_other_formats() {
        assert!(parse_date("2024-05-01").is_ok());
        assert!(matches!(parse_date("01/05/2024"), Err(DbError::Decode(_))));
    }
}
