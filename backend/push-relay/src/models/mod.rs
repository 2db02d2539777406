/// Data types crossing the relay boundary
pub mod firestore;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use firestore::{decode_value, FirestoreDocument, FirestoreDocumentEvent};

/// Title used when the document carries none
pub const DEFAULT_TITLE: &str = "New Notification";

/// A title, body or token that is set but is not text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid notification payload: `{field}` must be a string, got {kind}")]
pub struct InvalidFieldError {
    pub field: &'static str,
    pub kind: &'static str,
}

/// Field set of a newly created notification document.
///
/// Fields are kept as raw JSON. `null`, `false`, `0` and empty strings
/// count as absent; any other value that is not a string is invalid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotificationEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, rename = "fcmToken", skip_serializing_if = "Option::is_none")]
    pub fcm_token: Option<Value>,
}

impl NotificationEvent {
    pub fn new(title: Option<&str>, body: Option<&str>, fcm_token: Option<&str>) -> Self {
        let text = |v: Option<&str>| v.map(|s| Value::String(s.to_string()));
        Self {
            title: text(title),
            body: text(body),
            fcm_token: text(fcm_token),
        }
    }

    /// Read the relevant fields out of a document's field map; other keys are ignored
    pub fn from_fields(fields: &serde_json::Map<String, Value>) -> Self {
        Self {
            title: fields.get("title").cloned(),
            body: fields.get("body").cloned(),
            fcm_token: fields.get("fcmToken").cloned(),
        }
    }

    pub fn title(&self) -> Result<&str, InvalidFieldError> {
        Ok(text_field("title", &self.title)?.unwrap_or(DEFAULT_TITLE))
    }

    pub fn body(&self) -> Result<&str, InvalidFieldError> {
        Ok(text_field("body", &self.body)?.unwrap_or(""))
    }

    /// `Ok(None)` when the document carries no token at all
    pub fn fcm_token(&self) -> Result<Option<&str>, InvalidFieldError> {
        text_field("fcmToken", &self.fcm_token)
    }
}

fn text_field<'a>(
    field: &'static str,
    value: &'a Option<Value>,
) -> Result<Option<&'a str>, InvalidFieldError> {
    let Some(value) = value else {
        return Ok(None);
    };

    match value {
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.as_str())),
        Value::Null | Value::Bool(false) => Ok(None),
        Value::Number(n) if n.as_f64() == Some(0.0) => Ok(None),
        other => Err(InvalidFieldError {
            field,
            kind: json_kind(other),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// What happened to a single event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RelayOutcome {
    /// No usable device token; nothing was sent
    Skipped,
    Delivered { message_id: String },
    /// The provider call failed; the failure was logged and absorbed
    Failed { error: String },
}

impl RelayOutcome {
    pub fn as_label(&self) -> &'static str {
        match self {
            RelayOutcome::Skipped => "skipped",
            RelayOutcome::Delivered { .. } => "delivered",
            RelayOutcome::Failed { .. } => "failed",
        }
    }
}
