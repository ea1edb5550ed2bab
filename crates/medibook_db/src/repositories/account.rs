//! Patient accounts

use crate::error::DbError;
use crate::models::{Account, AccountDefaults};
use std::future::Future;

/// Lookup and creation of accounts by email
pub trait AccountDirectory: Send + Sync {
    fn init_schema(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Account>, DbError>> + Send;

    /// Return the account for `email`, creating a patient account with `defaults`
    /// when none exists. An existing account is returned unchanged.
    fn find_or_create(
        &self,
        email: &str,
        defaults: &AccountDefaults,
    ) -> impl Future<Output = Result<Account, DbError>> + Send;
}
