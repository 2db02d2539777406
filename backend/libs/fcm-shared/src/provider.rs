use async_trait::async_trait;

use crate::errors::FCMError;
use crate::models::{FCMSendResult, Message};

/// Trait for push notification providers
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Submits a single message to the provider
    ///
    /// # Returns
    /// The provider's message identifier on acceptance, `Err(FCMError)` otherwise
    async fn send(&self, message: &Message) -> Result<FCMSendResult, FCMError>;
}
