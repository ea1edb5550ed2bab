//! Confirmation delivery for MediBook bookings
//!
//! Two [`NotificationDispatcher`](medibook_common::NotificationDispatcher)
//! implementations: one that only logs, one that posts to an HTTP mail relay.

pub mod link;
pub mod service;
#[cfg(test)]
mod service_test;

pub use link::confirmation_link;
pub use service::{NotifyError, TracingDispatcher, WebhookDispatcher};
