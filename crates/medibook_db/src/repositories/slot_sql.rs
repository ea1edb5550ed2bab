//! SQL implementation of the slot registry

use crate::error::DbError;
use crate::models::{CapacityClaim, Slot, SlotKey};
use crate::repositories::slot::SlotRegistry;
use crate::repositories::slot_from_row;
use crate::DbClient;
use chrono::NaiveDate;
use sqlx::AnyConnection;
use tracing::{debug, error, info};

const SLOT_COLUMNS: &str = "provider_id, date, time_slot, max_number, current_number";

/// SQL implementation of [`SlotRegistry`]
#[derive(Debug, Clone)]
pub struct SqlSlotRegistry {
    db_client: DbClient,
}

impl SqlSlotRegistry {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

pub(crate) async fn fetch_slot(
    conn: &mut AnyConnection,
    key: &SlotKey,
) -> Result<Option<Slot>, DbError> {
    let query = format!(
        "SELECT {} FROM slots WHERE provider_id = $1 AND date = $2 AND time_slot = $3",
        SLOT_COLUMNS
    );
    let row = sqlx::query(&query)
        .bind(key.provider_id)
        .bind(key.date.to_string())
        .bind(&key.time_slot)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(slot_from_row).transpose()
}

/// Conditional increment on an open connection or transaction
///
/// The `current_number < max_number` guard runs inside the UPDATE, so two
/// writers can never both take the last unit.
pub async fn claim_capacity(
    conn: &mut AnyConnection,
    key: &SlotKey,
) -> Result<CapacityClaim, DbError> {
    let claimed = sqlx::query(
        r#"
            UPDATE slots
            SET current_number = current_number + 1
            WHERE provider_id = $1 AND date = $2 AND time_slot = $3
              AND current_number < max_number
        "#,
    )
    .bind(key.provider_id)
    .bind(key.date.to_string())
    .bind(&key.time_slot)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        error!("Failed to claim capacity on slot {}: {}", key, e);
        DbError::from(e)
    })?
    .rows_affected();

    match fetch_slot(conn, key).await? {
        Some(slot) if claimed == 1 => Ok(CapacityClaim::Claimed(slot)),
        Some(slot) => Ok(CapacityClaim::Full(slot)),
        None => Ok(CapacityClaim::Missing),
    }
}

impl SlotRegistry for SqlSlotRegistry {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing slot schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS slots (
                provider_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                time_slot TEXT NOT NULL,
                max_number INTEGER NOT NULL CHECK (max_number >= 0),
                current_number INTEGER NOT NULL DEFAULT 0
                    CHECK (current_number >= 0 AND current_number <= max_number),
                PRIMARY KEY (provider_id, date, time_slot)
            )
        "#;
        self.db_client.execute(query).await?;

        info!("Slot schema initialized successfully");
        Ok(())
    }

    async fn get(&self, key: &SlotKey) -> Result<Option<Slot>, DbError> {
        let mut conn = self.db_client.pool().acquire().await?;
        fetch_slot(&mut conn, key).await
    }

    async fn define(&self, key: &SlotKey, max_number: i64) -> Result<Slot, DbError> {
        if max_number < 0 {
            return Err(DbError::InvalidCapacity(format!(
                "capacity must not be negative, got {}",
                max_number
            )));
        }
        debug!("Defining slot {} with capacity {}", key, max_number);

        let mut tx = self.db_client.begin().await?;
        sqlx::query(
            r#"
                INSERT INTO slots (provider_id, date, time_slot, max_number, current_number)
                VALUES ($1, $2, $3, $4, 0)
                ON CONFLICT (provider_id, date, time_slot)
                DO UPDATE SET max_number = excluded.max_number
                WHERE slots.current_number <= excluded.max_number
            "#,
        )
        .bind(key.provider_id)
        .bind(key.date.to_string())
        .bind(&key.time_slot)
        .bind(max_number)
        .execute(&mut *tx)
        .await?;

        let slot = fetch_slot(&mut tx, key)
            .await?
            .ok_or_else(|| DbError::Other(format!("slot {} vanished after upsert", key)))?;
        if slot.max_number != max_number {
            return Err(DbError::InvalidCapacity(format!(
                "slot {} already holds {} reservations",
                key, slot.current_number
            )));
        }
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        info!("Slot {} defined with capacity {}", key, max_number);
        Ok(slot)
    }

    async fn increment_reserved(&self, key: &SlotKey) -> Result<CapacityClaim, DbError> {
        let mut tx = self.db_client.begin().await?;
        let claim = claim_capacity(&mut tx, key).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        Ok(claim)
    }

    async fn list_for_provider(
        &self,
        provider_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Slot>, DbError> {
        let query = format!(
            "SELECT {} FROM slots WHERE provider_id = $1 AND date = $2 ORDER BY time_slot",
            SLOT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(provider_id)
            .bind(date.to_string())
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list slots for provider {}: {}", provider_id, e);
                DbError::from(e)
            })?;

        rows.iter().map(slot_from_row).collect()
    }
}
