//! Runtime feature switches.
//!
//! Integrations are enabled by a `use_*` flag in the config *and* the presence
//! of their config section.

use medibook_config::AppConfig;

/// A feature is on when its flag is set and its configuration is present.
pub fn is_feature_enabled<T>(use_feature: bool, feature_config: Option<&T>) -> bool {
    use_feature && feature_config.is_some()
}

/// Whether confirmation messages go out through the configured relay.
pub fn is_notifications_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(
        config.use_notifications,
        config
            .notifications
            .as_ref()
            .filter(|n| n.webhook_url.is_some()),
    )
}
