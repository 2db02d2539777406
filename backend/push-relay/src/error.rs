use fcm_shared::FCMError;
use thiserror::Error;

/// Startup and configuration errors.
///
/// Event handling never produces one of these; only bootstrapping can fail.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Messaging client error: {0}")]
    Messaging(#[from] FCMError),
}

pub type Result<T> = std::result::Result<T, AppError>;
