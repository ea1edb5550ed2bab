//! SQL-backed reservation store

use crate::client::DbClient;
use crate::error::DbError;
use crate::models::{CapacityClaim, CommitOutcome, NewBooking};
use crate::repositories::booking_sql::insert_booking;
use crate::repositories::{claim_capacity, SqlAccountDirectory, SqlBookingStore, SqlSlotRegistry};
use crate::repository::{RepositoryFactory, ReservationStore};
use medibook_config::DatabaseConfig;
use tracing::{debug, info, warn};

/// [`ReservationStore`] over any SQLx-supported database
#[derive(Debug, Clone)]
pub struct SqlReservationStore {
    db_client: DbClient,
    slots: SqlSlotRegistry,
    bookings: SqlBookingStore,
    accounts: SqlAccountDirectory,
}

impl SqlReservationStore {
    pub fn new(db_client: DbClient) -> Self {
        Self {
            slots: SqlSlotRegistry::new(db_client.clone()),
            bookings: SqlBookingStore::new(db_client.clone()),
            accounts: SqlAccountDirectory::new(db_client.clone()),
            db_client,
        }
    }

    pub fn db_client(&self) -> &DbClient {
        &self.db_client
    }
}

impl ReservationStore for SqlReservationStore {
    type Slots = SqlSlotRegistry;
    type Bookings = SqlBookingStore;
    type Accounts = SqlAccountDirectory;

    fn slots(&self) -> &SqlSlotRegistry {
        &self.slots
    }

    fn bookings(&self) -> &SqlBookingStore {
        &self.bookings
    }

    fn accounts(&self) -> &SqlAccountDirectory {
        &self.accounts
    }

    async fn commit_new_booking(&self, booking: NewBooking) -> Result<CommitOutcome, DbError> {
        debug!(
            "Committing booking for patient {} on slot {}",
            booking.patient_id, booking.slot
        );
        // All statements run on the transaction's own connection; dropping `tx`
        // on an early return rolls the claim back.
        let mut tx = self.db_client.begin().await?;

        let slot = match claim_capacity(&mut tx, &booking.slot).await? {
            CapacityClaim::Claimed(slot) => slot,
            CapacityClaim::Full(_) => {
                debug!("Slot {} is full", booking.slot);
                return Ok(CommitOutcome::SlotFull);
            }
            CapacityClaim::Missing => {
                warn!("Slot {} is not defined", booking.slot);
                return Ok(CommitOutcome::SlotMissing);
            }
        };

        let created = insert_booking(&mut tx, &booking).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        info!(
            "Booking {} committed; slot {} at {}/{}",
            created.id, slot.key, slot.current_number, slot.max_number
        );
        Ok(CommitOutcome::Committed {
            booking: created,
            slot,
        })
    }
}

/// Builds a [`SqlReservationStore`] from the database configuration
#[derive(Debug, Clone)]
pub struct SqlStoreFactory {
    config: DatabaseConfig,
}

impl SqlStoreFactory {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

impl RepositoryFactory<SqlReservationStore> for SqlStoreFactory {
    async fn create_store(&self) -> Result<SqlReservationStore, DbError> {
        let db_client = DbClient::from_config(&self.config).await?;
        Ok(SqlReservationStore::new(db_client))
    }
}
