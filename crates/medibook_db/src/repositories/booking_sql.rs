//! SQL implementation of the booking store

use crate::error::DbError;
use crate::models::{Booking, BookingStatus, NewBooking};
use crate::repositories::booking::BookingStore;
use crate::repositories::{booking_from_row, status_filter};
use crate::DbClient;
use chrono::{NaiveDate, SecondsFormat, Utc};
use sqlx::AnyConnection;
use tracing::{debug, error, info};

pub(crate) const BOOKING_COLUMNS: &str =
    "id, patient_id, provider_id, date, time_slot, status, token, created_at";

/// SQL implementation of [`BookingStore`]
#[derive(Debug, Clone)]
pub struct SqlBookingStore {
    db_client: DbClient,
}

impl SqlBookingStore {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

/// Insert on an open connection or transaction
pub(crate) async fn insert_booking(
    conn: &mut AnyConnection,
    booking: &NewBooking,
) -> Result<Booking, DbError> {
    let query = format!(
        r#"
            INSERT INTO bookings (patient_id, provider_id, date, time_slot, status, token, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
        "#,
        BOOKING_COLUMNS
    );
    let row = sqlx::query(&query)
        .bind(booking.patient_id)
        .bind(booking.slot.provider_id)
        .bind(booking.slot.date.to_string())
        .bind(&booking.slot.time_slot)
        .bind(BookingStatus::Pending.as_str())
        .bind(&booking.token)
        .bind(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            error!("Failed to insert booking: {}", e);
            DbError::from(e)
        })?;

    booking_from_row(&row)
}

impl BookingStore for SqlBookingStore {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing booking schema");

        let statements = [
            r#"
                CREATE TABLE IF NOT EXISTS bookings (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    patient_id INTEGER NOT NULL REFERENCES accounts(id),
                    provider_id INTEGER NOT NULL,
                    date TEXT NOT NULL,
                    time_slot TEXT NOT NULL,
                    status TEXT NOT NULL,
                    token TEXT NOT NULL,
                    created_at TEXT NOT NULL
                )
            "#,
            // One active booking per patient, provider and day
            r#"
                CREATE UNIQUE INDEX IF NOT EXISTS bookings_one_active_per_day
                ON bookings (patient_id, provider_id, date)
                WHERE status IN ('Pending', 'Confirmed', 'S1', 'S2')
            "#,
            r#"
                CREATE INDEX IF NOT EXISTS bookings_by_token
                ON bookings (provider_id, token)
            "#,
        ];
        for statement in statements {
            self.db_client.execute(statement).await?;
        }

        info!("Booking schema initialized successfully");
        Ok(())
    }

    async fn insert(&self, booking: NewBooking) -> Result<Booking, DbError> {
        debug!(
            "Inserting booking for patient {} on slot {}",
            booking.patient_id, booking.slot
        );
        let mut conn = self.db_client.pool().acquire().await?;
        insert_booking(&mut conn, &booking).await
    }

    async fn get(&self, id: i64) -> Result<Option<Booking>, DbError> {
        let query = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await?;

        row.as_ref().map(booking_from_row).transpose()
    }

    async fn find_for_requester(
        &self,
        email: &str,
        provider_id: i64,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> Result<Option<Booking>, DbError> {
        debug!(
            "Finding booking for {} with provider {} on {}",
            email, provider_id, date
        );
        let (filter, literals) = status_filter(statuses, 4);
        let query = format!(
            r#"
                SELECT b.id, b.patient_id, b.provider_id, b.date, b.time_slot,
                       b.status, b.token, b.created_at
                FROM bookings b
                JOIN accounts a ON a.id = b.patient_id
                WHERE a.email = $1 AND b.provider_id = $2 AND b.date = $3
                  AND b.status {}
                ORDER BY b.id DESC
                LIMIT 1
            "#,
            filter
        );

        let mut q = sqlx::query(&query)
            .bind(email)
            .bind(provider_id)
            .bind(date.to_string());
        for literal in literals {
            q = q.bind(literal);
        }
        let row = q
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find booking for requester: {}", e);
                DbError::from(e)
            })?;

        row.as_ref().map(booking_from_row).transpose()
    }

    async fn find_by_token(
        &self,
        provider_id: i64,
        token: &str,
        status: BookingStatus,
    ) -> Result<Option<Booking>, DbError> {
        let (filter, literals) = status_filter(&[status], 3);
        let query = format!(
            "SELECT {} FROM bookings WHERE provider_id = $1 AND token = $2 AND status {} LIMIT 1",
            BOOKING_COLUMNS, filter
        );

        let mut q = sqlx::query(&query).bind(provider_id).bind(token);
        for literal in literals {
            q = q.bind(literal);
        }
        let row = q.fetch_optional(self.db_client.pool()).await?;

        row.as_ref().map(booking_from_row).transpose()
    }

    async fn transition(
        &self,
        id: i64,
        from: &[BookingStatus],
        to: BookingStatus,
        token: Option<&str>,
    ) -> Result<Option<Booking>, DbError> {
        debug!("Moving booking {} from {:?} to {}", id, from, to);
        let (token_set, first_status) = match token {
            Some(_) => (", token = $3", 4),
            None => ("", 3),
        };
        let (filter, literals) = status_filter(from, first_status);
        let query = format!(
            r#"
                UPDATE bookings
                SET status = $1{}
                WHERE id = $2 AND status {}
                RETURNING {}
            "#,
            token_set, filter, BOOKING_COLUMNS
        );

        let mut q = sqlx::query(&query).bind(to.as_str()).bind(id);
        if let Some(token) = token {
            q = q.bind(token);
        }
        for literal in literals {
            q = q.bind(literal);
        }
        let row = q
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to update booking {}: {}", id, e);
                DbError::from(e)
            })?;

        row.as_ref().map(booking_from_row).transpose()
    }

    async fn list_for_provider(
        &self,
        provider_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, DbError> {
        let query = format!(
            "SELECT {} FROM bookings WHERE provider_id = $1 AND date = $2 ORDER BY id",
            BOOKING_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(provider_id)
            .bind(date.to_string())
            .fetch_all(self.db_client.pool())
            .await?;

        rows.iter().map(booking_from_row).collect()
    }
}
