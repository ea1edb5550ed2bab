// --- File: crates/medibook_common/src/lib.rs ---

pub mod error; // Error handling
pub mod features; // Runtime feature switches
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod routes; // Shared routes
pub mod services; // Service abstractions

pub use routes::routes;

pub use error::{config_error, internal_error, Context, HttpStatusCode, MedibookError};

pub use http::{client::create_client, IntoHttpResponse};

pub use logging::{init_from_config, init_with_level, log_error, log_result};

pub use features::{is_feature_enabled, is_notifications_enabled};

pub use services::{
    share_dispatcher, BookingNotification, BoxFuture, BoxedError, NotificationDispatcher,
    NotificationResult, SharedDispatcher,
};
