// --- File: crates/medibook_common/src/services.rs ---
//! Service abstractions for external collaborators.
//!
//! The reservation core depends on these traits rather than on concrete
//! delivery mechanisms, so tests and deployments can plug in their own.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A wrapper error type that implements std::error::Error for Box<dyn std::error::Error + Send + Sync>
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

/// Outbound channel that tells a requester how to confirm a booking.
///
/// Delivery is best effort: callers only log the outcome.
pub trait NotificationDispatcher: Send + Sync {
    /// Error type returned by the dispatcher.
    type Error: StdError + Send + Sync + 'static;

    /// Deliver `context` to `receiver` (an email address for the shipped dispatchers).
    fn send(
        &self,
        receiver: &str,
        context: BookingNotification,
    ) -> BoxFuture<'_, NotificationResult, Self::Error>;
}

/// Shared handle to a dispatcher with its error type erased.
pub type SharedDispatcher = Arc<dyn NotificationDispatcher<Error = BoxedError>>;

/// Adapter that erases a dispatcher's concrete error type.
pub struct ErasedDispatcher<D>(pub D);

impl<D> NotificationDispatcher for ErasedDispatcher<D>
where
    D: NotificationDispatcher,
{
    type Error = BoxedError;

    fn send(
        &self,
        receiver: &str,
        context: BookingNotification,
    ) -> BoxFuture<'_, NotificationResult, Self::Error> {
        let inner = self.0.send(receiver, context);
        Box::pin(async move {
            inner
                .await
                .map_err(|err| BoxedError(Box::new(err) as Box<dyn StdError + Send + Sync>))
        })
    }
}

/// Wrap a concrete dispatcher into a [`SharedDispatcher`].
pub fn share_dispatcher<D>(dispatcher: D) -> SharedDispatcher
where
    D: NotificationDispatcher + 'static,
{
    Arc::new(ErasedDispatcher(dispatcher))
}

/// Everything a confirmation message needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingNotification {
    /// The booking the message is about.
    pub booking_id: i64,
    /// The requester's display name.
    pub patient_name: String,
    /// Human readable slot time, as supplied by the client.
    pub time: Option<String>,
    /// Provider display name, as supplied by the client.
    pub provider_name: Option<String>,
    /// Locale of the message, e.g. "en" or "vi".
    pub language: Option<String>,
    /// Link that confirms the booking (carries provider id and token).
    pub redirect_link: String,
    /// `true` when a cancelled booking was re-activated.
    pub restored: bool,
}

/// Represents the result of a notification operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    /// The ID of the notification, if the channel assigns one.
    pub id: String,
    /// The status of the notification.
    pub status: String,
}
