//! SQL implementation of the account directory

use crate::error::DbError;
use crate::models::{Account, AccountDefaults, PATIENT_ROLE};
use crate::repositories::account::AccountDirectory;
use crate::repositories::account_from_row;
use crate::DbClient;
use chrono::{SecondsFormat, Utc};
use tracing::{debug, error, info};

const ACCOUNT_COLUMNS: &str = "id, email, first_name, address, gender, role_id, created_at";

/// SQL implementation of [`AccountDirectory`]
#[derive(Debug, Clone)]
pub struct SqlAccountDirectory {
    db_client: DbClient,
}

impl SqlAccountDirectory {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

impl AccountDirectory for SqlAccountDirectory {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing account schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                first_name TEXT NOT NULL,
                address TEXT NOT NULL,
                gender TEXT NOT NULL,
                role_id TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
        "#;
        self.db_client.execute(query).await?;

        info!("Account schema initialized successfully");
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DbError> {
        let query = format!("SELECT {} FROM accounts WHERE email = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to look up account {}: {}", email, e);
                DbError::from(e)
            })?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_or_create(
        &self,
        email: &str,
        defaults: &AccountDefaults,
    ) -> Result<Account, DbError> {
        if let Some(existing) = self.find_by_email(email).await? {
            return Ok(existing);
        }

        debug!("Creating patient account for {}", email);
        let query = format!(
            r#"
                INSERT INTO accounts (email, first_name, address, gender, role_id, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );
        let inserted = sqlx::query(&query)
            .bind(email)
            .bind(&defaults.first_name)
            .bind(&defaults.address)
            .bind(&defaults.gender)
            .bind(PATIENT_ROLE)
            .bind(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
            .fetch_one(self.db_client.pool())
            .await
            .map_err(DbError::from);

        match inserted {
            Ok(row) => {
                info!("Created patient account for {}", email);
                account_from_row(&row)
            }
            // Another request created it between the lookup and the insert
            Err(DbError::UniqueViolation(_)) => self
                .find_by_email(email)
                .await?
                .ok_or_else(|| DbError::Other(format!("account {} not found after conflict", email))),
            Err(e) => {
                error!("Failed to create account {}: {}", email, e);
                Err(e)
            }
        }
    }
}
