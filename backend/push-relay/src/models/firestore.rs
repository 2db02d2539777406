//! Firestore document events in their JSON form.
//!
//! Documents arrive with typed values (`{"stringValue": "..."}`); they are
//! flattened into plain JSON before the relay sees them.

use serde::Deserialize;
use serde_json::{Map, Number, Value};

/// CloudEvents type of a Firestore document creation
pub const DOCUMENT_CREATED_TYPE: &str = "google.cloud.firestore.document.v1.created";

#[derive(Debug, Clone, Deserialize)]
pub struct FirestoreDocumentEvent {
    /// The document after the change; absent for deletions
    pub value: Option<FirestoreDocument>,
    /// Previous version; kept loose since creations may send `{}`
    #[serde(rename = "oldValue", default)]
    pub old_value: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirestoreDocument {
    /// `projects/{p}/databases/{db}/documents/{collection}/{id}`
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(rename = "createTime", default)]
    pub create_time: Option<String>,
    #[serde(rename = "updateTime", default)]
    pub update_time: Option<String>,
}

impl FirestoreDocumentEvent {
    /// A creation carries the new document and no previous version
    pub fn is_creation(&self) -> bool {
        let no_previous = match &self.old_value {
            None | Some(Value::Null) => true,
            Some(Value::Object(fields)) => fields.is_empty(),
            Some(_) => false,
        };
        self.value.is_some() && no_previous
    }
}

impl FirestoreDocument {
    /// Fields with Firestore type wrappers removed
    pub fn decoded_fields(&self) -> Map<String, Value> {
        decode_fields(&self.fields)
    }

    /// Document id if this document sits directly under `collection`
    pub fn id_in_collection(&self, collection: &str) -> Option<&str> {
        let relative = match self.name.split_once("/documents/") {
            Some((_, rest)) => rest,
            None => self.name.as_str(),
        };

        let mut segments = relative.split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(c), Some(id), None) if c == collection && !id.is_empty() => Some(id),
            _ => None,
        }
    }
}

fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

/// Convert one Firestore typed value into plain JSON.
///
/// Unrecognised shapes are passed through unchanged.
pub fn decode_value(value: &Value) -> Value {
    let Some(typed) = value.as_object() else {
        return value.clone();
    };
    let Some((kind, inner)) = typed.iter().next().filter(|_| typed.len() == 1) else {
        return value.clone();
    };

    match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" | "doubleValue" | "geoPointValue" => inner.clone(),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(|n| Value::Number(Number::from(n)))
                .unwrap_or_else(|_| inner.clone()),
            other => other.clone(),
        },
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default();
            Value::Object(fields)
        }
        "arrayValue" => {
            let values: Vec<Value> = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default();
            Value::Array(values)
        }
        _ => value.clone(),
    }
}
