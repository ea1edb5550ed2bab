// --- File: crates/services/medibook_backend/src/service_factory.rs ---
//! Service factory implementation.
//!
//! Chooses the collaborators of the reservation core from the loaded
//! configuration.
use medibook_common::is_notifications_enabled;
use medibook_common::services::{share_dispatcher, SharedDispatcher};
use medibook_config::AppConfig;
use medibook_notify::{TracingDispatcher, WebhookDispatcher};
use std::sync::Arc;
use tracing::{info, warn};

/// Holds the services built at startup.
pub struct MedibookServiceFactory {
    dispatcher: SharedDispatcher,
    relay_enabled: bool,
}

impl MedibookServiceFactory {
    /// Create a new service factory.
    pub fn new(config: Arc<AppConfig>) -> Self {
        let relay = if is_notifications_enabled(&config) {
            info!("ℹ️ Initializing notification relay...");
            config
                .notifications
                .as_ref()
                .map(WebhookDispatcher::from_config)
                .and_then(|result| match result {
                    Ok(dispatcher) => Some(dispatcher),
                    Err(e) => {
                        warn!("⚠️ Notification relay unavailable, logging messages instead: {}", e);
                        None
                    }
                })
        } else {
            info!("ℹ️ Notifications disabled, confirmation links are logged");
            None
        };

        let relay_enabled = relay.is_some();
        let dispatcher = match relay {
            Some(dispatcher) => share_dispatcher(dispatcher),
            None => share_dispatcher(TracingDispatcher),
        };

        Self {
            dispatcher,
            relay_enabled,
        }
    }

    /// The dispatcher that delivers confirmation links.
    pub fn notification_dispatcher(&self) -> SharedDispatcher {
        self.dispatcher.clone()
    }

    /// Whether messages go to the configured relay rather than the log.
    pub fn relay_enabled(&self) -> bool {
        self.relay_enabled
    }
}
