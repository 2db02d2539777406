use thiserror::Error;

/// FCM Client Error Types
#[derive(Error, Debug)]
pub enum FCMError {
    #[error("Failed to load service account credentials: {0}")]
    CredentialsError(String),

    #[error("Failed to parse private key: {0}")]
    KeyParseError(String),

    #[error("Failed to encode JWT: {0}")]
    JwtEncodeError(String),

    #[error("Failed to get access token: {0}")]
    TokenError(String),

    #[error("Token request failed with status: {0}")]
    TokenRequestFailed(String),

    #[error("Failed to parse token response: {0}")]
    TokenParseError(String),

    #[error("FCM send request failed: {0}")]
    SendRequestError(String),

    #[error("Failed to parse FCM response: {0}")]
    ResponseParseError(String),

    #[error("FCM API error: {0} - {1}")]
    ApiError(String, String),

    #[error("Invalid device token: {0}")]
    InvalidToken(String),
}

impl FCMError {
    /// True when the provider rejected the registration token itself
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, FCMError::InvalidToken(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FCMError::ApiError("500 Internal Server Error".to_string(), "boom".to_string());
        assert_eq!(err.to_string(), "FCM API error: 500 Internal Server Error - boom");

        let err = FCMError::InvalidToken("UNREGISTERED".to_string());
        assert_eq!(err.to_string(), "Invalid device token: UNREGISTERED");
        assert!(err.is_invalid_token());
    }
}
