use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::errors::FCMError;
use crate::models::*;
use crate::provider::PushProvider;

/// Production FCM API base URL
pub const DEFAULT_FCM_ENDPOINT: &str = "https://fcm.googleapis.com";

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Cached tokens are refreshed once less than this many seconds remain
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Firebase Cloud Messaging Client
///
/// Sends messages through the FCM HTTP v1 API. Manages OAuth2 token
/// generation and caching; one instance is meant to be built at startup
/// and shared by every invocation.
pub struct FCMClient {
    pub project_id: String,
    pub credentials: Arc<ServiceAccountKey>,
    endpoint: String,
    token_cache: Arc<Mutex<Option<TokenCache>>>,
    http_client: reqwest::Client,
}

impl FCMClient {
    /// Create new FCM client
    ///
    /// # Arguments
    /// * `project_id` - Firebase project ID
    /// * `credentials` - Service account key with OAuth2 credentials
    pub fn new(project_id: String, credentials: ServiceAccountKey) -> Self {
        Self {
            project_id,
            credentials: Arc::new(credentials),
            endpoint: DEFAULT_FCM_ENDPOINT.to_string(),
            token_cache: Arc::new(Mutex::new(None)),
            http_client: reqwest::Client::new(),
        }
    }

    /// Create a client for the project named in the key itself
    pub fn from_service_account(credentials: ServiceAccountKey) -> Self {
        Self::new(credentials.project_id.clone(), credentials)
    }

    /// Override the API base URL (emulators, tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies)
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `messages:send` URL for this project
    pub fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.endpoint, self.project_id
        )
    }

    /// Send a single message via FCM
    pub async fn send(&self, message: &Message) -> Result<FCMSendResult, FCMError> {
        let access_token = self.get_access_token().await?;

        let response = self
            .http_client
            .post(self.send_url())
            .bearer_auth(access_token)
            .json(&FcmRequest { message })
            .send()
            .await
            .map_err(|e| FCMError::SendRequestError(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::OK => {
                let fcm_response: FcmApiResponse = response
                    .json()
                    .await
                    .map_err(|e| FCMError::ResponseParseError(e.to_string()))?;

                let message_id = fcm_response.name.ok_or_else(|| {
                    FCMError::ResponseParseError("response has no message name".to_string())
                })?;

                debug!(message_id = %message_id, "FCM accepted message");
                Ok(FCMSendResult { message_id })
            }
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());

                Err(classify_error(status, &error_text))
            }
        }
    }

    /// Get access token from service account (with caching)
    ///
    /// The cache lock is held across a refresh so concurrent callers
    /// trigger at most one token exchange.
    pub async fn get_access_token(&self) -> Result<String, FCMError> {
        let mut cache = self.token_cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.expires_at > Utc::now().timestamp() + TOKEN_REFRESH_MARGIN_SECS {
                return Ok(cached.access_token.clone());
            }
        }

        let assertion = self.sign_assertion()?;

        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

        let response = self
            .http_client
            .post(&self.credentials.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| FCMError::TokenError(e.to_string()))?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "OAuth2 token exchange rejected");
            return Err(FCMError::TokenRequestFailed(response.status().to_string()));
        }

        let token_response: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| FCMError::TokenParseError(e.to_string()))?;

        *cache = Some(TokenCache {
            access_token: token_response.access_token.clone(),
            expires_at: Utc::now().timestamp() + token_response.expires_in,
        });

        Ok(token_response.access_token)
    }

    /// Build and sign the RS256 JWT exchanged for an access token
    fn sign_assertion(&self) -> Result<String, FCMError> {
        let now = Utc::now();
        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            sub: self.credentials.client_email.clone(),
            scope: FCM_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| FCMError::KeyParseError(e.to_string()))?;

        let mut header = Header::new(Algorithm::RS256);
        if !self.credentials.private_key_id.is_empty() {
            header.kid = Some(self.credentials.private_key_id.clone());
        }

        encode(&header, &claims, &encoding_key).map_err(|e| FCMError::JwtEncodeError(e.to_string()))
    }
}

#[async_trait::async_trait]
impl PushProvider for FCMClient {
    async fn send(&self, message: &Message) -> Result<FCMSendResult, FCMError> {
        FCMClient::send(self, message).await
    }
}

/// Map a non-200 FCM response onto an error
///
/// `UNREGISTERED`, and `INVALID_ARGUMENT` complaints about the registration
/// token, mean the token itself is unusable.
pub fn classify_error(status: reqwest::StatusCode, body: &str) -> FCMError {
    if let Ok(envelope) = serde_json::from_str::<FcmErrorEnvelope>(body) {
        let error = envelope.error;
        let message = error.message.clone().unwrap_or_default();

        match error.fcm_error_code() {
            Some("UNREGISTERED") => return FCMError::InvalidToken("UNREGISTERED".to_string()),
            Some("INVALID_ARGUMENT")
                if message.to_lowercase().contains("registration token") =>
            {
                return FCMError::InvalidToken(message)
            }
            _ => {}
        }

        return FCMError::ApiError(status.to_string(), message);
    }

    FCMError::ApiError(status.to_string(), body.to_string())
}
