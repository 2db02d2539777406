use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::FCMError;

/// Google OAuth2 token endpoint used when the key file omits `token_uri`
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// FCM Send Result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FCMSendResult {
    /// Provider message name, e.g. `projects/p/messages/0:1500415314455276%31bd1c9631bd1c96`
    pub message_id: String,
}

/// Firebase Service Account Key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Parse a service account key from its JSON text
    pub fn from_json(json: &str) -> Result<Self, FCMError> {
        serde_json::from_str(json).map_err(|e| FCMError::CredentialsError(e.to_string()))
    }

    /// Read and parse a service account key file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FCMError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| FCMError::CredentialsError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

/// Outbound push message: `{ notification: { title, body }, token }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub notification: Notification,
    pub token: String,
}

impl Message {
    pub fn new(
        token: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            notification: Notification {
                title: title.into(),
                body: body.into(),
            },
            token: token.into(),
        }
    }
}

/// FCM Notification Payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// FCM v1 request envelope
#[derive(Debug, Serialize)]
pub struct FcmRequest<'a> {
    pub message: &'a Message,
}

/// OAuth2 Token Cache
#[derive(Debug, Clone)]
pub struct TokenCache {
    pub access_token: String,
    pub expires_at: i64,
}

/// JWT Claims for Google OAuth2
#[derive(Debug, Serialize)]
pub struct JwtClaims {
    pub iss: String,
    pub sub: String,
    pub scope: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

/// Google OAuth2 Token Response
#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: String,
}

/// FCM API Response
#[derive(Debug, Deserialize)]
pub struct FcmApiResponse {
    pub name: Option<String>,
}

/// Google API error body: `{"error": {...}}`
#[derive(Debug, Deserialize)]
pub struct FcmErrorEnvelope {
    pub error: FcmErrorResponse,
}

#[derive(Debug, Deserialize)]
pub struct FcmErrorResponse {
    pub code: Option<u16>,
    pub message: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub details: Vec<FcmErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct FcmErrorDetail {
    #[serde(rename = "@type")]
    pub type_url: Option<String>,
    #[serde(rename = "errorCode")]
    pub error_code: Option<String>,
}

impl FcmErrorResponse {
    /// FCM-specific error code from `details`, e.g. `UNREGISTERED`
    pub fn fcm_error_code(&self) -> Option<&str> {
        self.details
            .iter()
            .find_map(|detail| detail.error_code.as_deref())
    }
}
