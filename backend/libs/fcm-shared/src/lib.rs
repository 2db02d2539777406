/// FCM Shared Library
///
/// This library provides a Firebase Cloud Messaging (FCM) client
/// for sending push notifications through the HTTP v1 API.
///
/// It handles:
/// - Loading Google service account keys
/// - OAuth2 token generation with caching and automatic refresh
/// - Single message delivery to a device token
/// - The `PushProvider` trait used to inject a messaging backend

pub mod client;
pub mod errors;
pub mod models;
pub mod provider;

pub use client::{FCMClient, DEFAULT_FCM_ENDPOINT};
pub use errors::FCMError;
pub use models::{FCMSendResult, Message, Notification, ServiceAccountKey};
pub use provider::PushProvider;
