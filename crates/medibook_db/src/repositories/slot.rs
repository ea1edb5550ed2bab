//! Slot capacity registry

use crate::error::DbError;
use crate::models::{CapacityClaim, Slot, SlotKey};
use chrono::NaiveDate;
use std::future::Future;

/// Durable record of each slot's capacity and reservation counter
///
/// Implementations must keep `0 <= current_number <= max_number` for every slot,
/// whatever the interleaving of concurrent callers.
pub trait SlotRegistry: Send + Sync {
    /// Create the backing tables if they don't exist
    fn init_schema(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Read a slot by key
    fn get(&self, key: &SlotKey) -> impl Future<Output = Result<Option<Slot>, DbError>> + Send;

    /// Create a slot or change its capacity
    ///
    /// A new slot starts with `current_number = 0`. Lowering an existing slot's
    /// capacity below its reserved count fails with [`DbError::InvalidCapacity`].
    fn define(
        &self,
        key: &SlotKey,
        max_number: i64,
    ) -> impl Future<Output = Result<Slot, DbError>> + Send;

    /// Atomically take one unit of capacity, if any is left
    fn increment_reserved(
        &self,
        key: &SlotKey,
    ) -> impl Future<Output = Result<CapacityClaim, DbError>> + Send;

    /// All slots of a provider on a day, ordered by time label
    fn list_for_provider(
        &self,
        provider_id: i64,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Slot>, DbError>> + Send;
}
