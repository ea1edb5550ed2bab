//! Database client for MediBook
//!
//! A thin wrapper over an SQLx `Any` pool. The schema relies on SQLite syntax
//! (`AUTOINCREMENT`, partial indexes, `ON CONFLICT`, `RETURNING`), so only
//! `sqlite:` URLs are accepted.

use crate::error::DbError;
use medibook_config::{AppConfig, DatabaseConfig};
use sqlx::pool::PoolOptions;
use sqlx::{Pool, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info};

/// Type alias for a database transaction
pub type DbTransaction<'a> = Transaction<'a, sqlx::Any>;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 3;

/// Database client for MediBook
#[derive(Debug, Clone)]
pub struct DbClient {
    /// The database connection pool
    pool: Pool<sqlx::Any>,
}

impl DbClient {
    /// Create a new database client from the application configuration
    ///
    /// # Errors
    ///
    /// Fails when the `database` section is missing or the pool cannot connect.
    pub async fn new(config: &AppConfig) -> Result<Self, DbError> {
        let db_config = config
            .database
            .as_ref()
            .ok_or_else(|| DbError::ConfigError("Database configuration is missing".to_string()))?;

        Self::from_config(db_config).await
    }

    /// Create a new database client from a database configuration
    ///
    /// Pool size and the connection acquire timeout come from the configuration,
    /// falling back to 5 connections and 3 seconds.
    pub async fn from_config(db_config: &DatabaseConfig) -> Result<Self, DbError> {
        if db_config.url.is_empty() {
            return Err(DbError::ConfigError("Database URL is empty".to_string()));
        }

        let max_connections = db_config
            .max_connections
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let acquire_timeout = Duration::from_secs(
            db_config
                .acquire_timeout_secs
                .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        );

        let pool = Self::create_pool(&db_config.url, max_connections, acquire_timeout).await?;
        Ok(Self { pool })
    }

    /// Create a new database client from a database URL with default pool settings
    pub async fn from_url(db_url: &str) -> Result<Self, DbError> {
        if db_url.is_empty() {
            return Err(DbError::UrlError("Database URL is empty".to_string()));
        }

        let pool = Self::create_pool(
            db_url,
            DEFAULT_MAX_CONNECTIONS,
            Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        )
        .await?;
        Ok(Self { pool })
    }

    async fn create_pool(
        db_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Pool<sqlx::Any>, DbError> {
        debug!(
            "Creating database pool with URL: {} (max_connections={}, acquire_timeout={:?})",
            db_url, max_connections, acquire_timeout
        );

        ensure_sqlite_url(db_url)?;
        sqlx::any::install_default_drivers();

        let mut pool_options = PoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout);

        if is_in_memory(db_url) {
            // Every connection to `sqlite::memory:` opens its own database, so the pool
            // must keep its single connection alive for the lifetime of the client.
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            pool_options = pool_options.idle_timeout(Duration::from_secs(600));
        }

        if let Some(db_path) = sqlite_file_path(db_url) {
            ensure_sqlite_file(db_path)?;
        }

        let connect_options = sqlx::any::AnyConnectOptions::from_str(db_url).map_err(|e| {
            error!("Invalid database URL {}: {}", db_url, e);
            DbError::UrlError(e.to_string())
        })?;

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                error!("Failed to create database pool: {}", e);
                DbError::PoolError(e.to_string())
            })?;

        info!("Database pool created successfully");
        Ok(pool)
    }

    /// Get the database connection pool
    pub fn pool(&self) -> &Pool<sqlx::Any> {
        &self.pool
    }

    /// Begin a transaction
    ///
    /// A pool that cannot hand out a connection within the acquire timeout yields
    /// [`DbError::Timeout`].
    pub async fn begin(&self) -> Result<DbTransaction<'static>, DbError> {
        self.pool.begin().await.map_err(|e| match e {
            sqlx::Error::PoolTimedOut => DbError::from(e),
            other => DbError::TransactionError(other.to_string()),
        })
    }

    /// Execute a statement that returns no rows, returning the number of rows affected
    pub async fn execute(&self, query: &str) -> Result<u64, DbError> {
        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(DbError::from)
    }

    /// Check if the database is healthy
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

impl std::fmt::Display for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DbClient")
    }
}

fn is_in_memory(db_url: &str) -> bool {
    db_url.starts_with("sqlite:") && db_url.contains(":memory:")
}

/// File path of an on-disk SQLite URL, handling both `sqlite:x.db` and `sqlite://x.db`.
fn sqlite_file_path(db_url: &str) -> Option<&str> {
    if !db_url.starts_with("sqlite:") || is_in_memory(db_url) {
        return None;
    }
    let path = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or(path);
    (!path.is_empty()).then_some(path)
}

// AnyConnectOptions has no create_if_missing, so the file is created up front.
fn ensure_sqlite_file(db_path: &str) -> Result<(), DbError> {
    let path = Path::new(db_path);
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            debug!("Creating directory for SQLite database: {:?}", dir);
            std::fs::create_dir_all(dir).map_err(|e| {
                error!("Failed to create directory for SQLite database: {}", e);
                DbError::PoolError(format!("Failed to create directory: {}", e))
            })?;
        }
    }

    if !path.exists() {
        debug!("Creating empty SQLite database file: {}", db_path);
        std::fs::File::create(path).map_err(|e| {
            error!("Failed to create SQLite database file: {}", e);
            DbError::PoolError(format!("Failed to create database file: {}", e))
        })?;
    }
    Ok(())
}

fn ensure_sqlite_url(db_url: &str) -> Result<(), DbError> {
    if db_url.starts_with("sqlite:") {
        return Ok(());
    }
    let scheme = db_url.split(':').next().unwrap_or_default();
    error!("Unsupported database scheme: {}", scheme);
    Err(DbError::UrlError(format!(
        "unsupported database scheme '{}', only sqlite: URLs are supported",
        scheme
    )))
}
