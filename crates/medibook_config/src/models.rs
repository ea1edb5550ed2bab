// --- File: crates/medibook_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite:data/medibook.db, loaded via MEDIBOOK__DATABASE__URL
    #[serde(default)]
    pub max_connections: Option<u32>,
    #[serde(default)]
    pub acquire_timeout_secs: Option<u64>,
}

// --- Reservation Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReservationConfig {
    /// Upper bound for waiting on a slot or requester lock.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// Base URL of the front end that serves the `verify-booking` page.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

fn default_lock_timeout_ms() -> u64 {
    5_000
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            frontend_url: default_frontend_url(),
        }
    }
}

// --- Notification Config ---
// Holds non-secret relay config. The API key is usually "secret_from_env".
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NotificationConfig {
    pub webhook_url: Option<String>, // None => confirmations are only logged
    pub sender: Option<String>,
    pub api_key: Option<String>, // Loaded from NOTIFICATIONS_API_KEY when marked secret_from_env
    pub timeout_secs: Option<u64>,
}

// --- Logging Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    pub level: Option<String>,     // trace | debug | info | warn | error
    pub directory: Option<String>, // daily rolling file output when set
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_notifications: bool,

    // --- Optional Sections ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>, // None => in-memory store
    #[serde(default)]
    pub reservation: ReservationConfig,
    #[serde(default)]
    pub notifications: Option<NotificationConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}
