//! Notification Relay
//!
//! Turns one newly created notification document into at most one push
//! message. Delivery is best-effort: failures are logged and absorbed,
//! never retried and never surfaced to the caller.
use fcm_shared::{Message, PushProvider};
use std::sync::Arc;
use tracing::{error, info, Instrument};
use uuid::Uuid;

use crate::metrics;
use crate::models::{InvalidFieldError, NotificationEvent, RelayOutcome};

pub struct NotificationRelay {
    provider: Arc<dyn PushProvider>,
}

impl NotificationRelay {
    /// The provider is built once at startup and shared across invocations
    pub fn new(provider: Arc<dyn PushProvider>) -> Self {
        Self { provider }
    }

    /// Outbound message for an event, or `None` when it has no device token
    ///
    /// The token is checked first, so a document without one is skipped
    /// even if its other fields are malformed.
    pub fn build_message(event: &NotificationEvent) -> Result<Option<Message>, InvalidFieldError> {
        let Some(token) = event.fcm_token()? else {
            return Ok(None);
        };
        Ok(Some(Message::new(token, event.title()?, event.body()?)))
    }

    /// Handle one creation event. Always completes; the outcome says which path ran.
    pub async fn handle(&self, event: &NotificationEvent) -> RelayOutcome {
        let span = tracing::info_span!("relay_event", invocation_id = %Uuid::new_v4());

        let outcome = self.dispatch(event).instrument(span).await;
        metrics::record_outcome(&outcome);
        outcome
    }

    async fn dispatch(&self, event: &NotificationEvent) -> RelayOutcome {
        let message = match Self::build_message(event) {
            Ok(Some(message)) => message,
            Ok(None) => {
                info!("No device token on notification document, skipping");
                return RelayOutcome::Skipped;
            }
            Err(e) => {
                error!(error = %e, field = e.field, "Failed to send notification");
                return RelayOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        match self.provider.send(&message).await {
            Ok(result) => {
                info!(message_id = %result.message_id, "Notification sent successfully");
                RelayOutcome::Delivered {
                    message_id: result.message_id,
                }
            }
            Err(e) => {
                error!(
                    error = %e,
                    invalid_token = e.is_invalid_token(),
                    "Failed to send notification"
                );
                RelayOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}
