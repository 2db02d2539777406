use fcm_shared::DEFAULT_FCM_ENDPOINT;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Collection watched for new notification documents
pub const DEFAULT_COLLECTION: &str = "notifications_dump";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub relay: RelayConfig,
    pub fcm: FcmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Only documents created directly under this collection are relayed
    pub collection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcmConfig {
    /// Path to the Google service account key file
    pub credentials_path: String,
    /// Overrides the key's own `project_id` when set
    pub project_id: Option<String>,
    pub endpoint: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup (the process environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let port = var("PORT", "8000")
            .parse::<u16>()
            .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {}", e)))?;

        let log_format = match var("LOG_FORMAT", "text").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "text" | "pretty" => LogFormat::Text,
            other => {
                return Err(AppError::Config(format!(
                    "LOG_FORMAT must be 'text' or 'json', got '{}'",
                    other
                )))
            }
        };

        let credentials_path = lookup("GOOGLE_APPLICATION_CREDENTIALS")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config("GOOGLE_APPLICATION_CREDENTIALS must be set".to_string())
            })?;

        Ok(Config {
            app: AppConfig {
                env: var("APP_ENV", "development"),
                port,
                log_format,
            },
            relay: RelayConfig {
                collection: var("RELAY_COLLECTION", DEFAULT_COLLECTION),
            },
            fcm: FcmConfig {
                credentials_path,
                project_id: lookup("FCM_PROJECT_ID").filter(|v| !v.trim().is_empty()),
                endpoint: var("FCM_ENDPOINT", DEFAULT_FCM_ENDPOINT),
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.app.port)
    }
}
