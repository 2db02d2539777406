use crate::handlers::ApiResponse;
use crate::models::firestore::DOCUMENT_CREATED_TYPE;
use crate::models::{FirestoreDocumentEvent, NotificationEvent, RelayOutcome};
use crate::services::NotificationRelay;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// CloudEvents binary-mode header carrying the event type
const CE_TYPE_HEADER: &str = "ce-type";

/// Which documents the adapter forwards to the relay
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    pub collection: String,
}

impl TriggerConfig {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
        }
    }
}

/// Acknowledgement returned to the event source.
///
/// Every well-formed event is acknowledged with 200, including ignored
/// ones and failed deliveries.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventAck {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RelayOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl EventAck {
    fn handled(document_id: Option<String>, outcome: RelayOutcome) -> Self {
        Self {
            accepted: true,
            document_id,
            outcome: Some(outcome),
            reason: None,
        }
    }

    fn ignored(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            document_id: None,
            outcome: None,
            reason: Some(reason.into()),
        }
    }
}

/// Receive a Firestore document event
///
/// POST /events/firestore
pub async fn firestore_event(
    relay: web::Data<Arc<NotificationRelay>>,
    trigger: web::Data<TriggerConfig>,
    req: HttpRequest,
    event: web::Json<FirestoreDocumentEvent>,
) -> ActixResult<HttpResponse> {
    if let Some(ce_type) = req
        .headers()
        .get(CE_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        if ce_type != DOCUMENT_CREATED_TYPE {
            debug!(ce_type, "Ignoring non-creation event");
            return Ok(ack(EventAck::ignored(format!("unsupported event type {}", ce_type))));
        }
    }

    let event = event.into_inner();
    if !event.is_creation() {
        debug!("Ignoring event without a newly created document");
        return Ok(ack(EventAck::ignored("not a document creation")));
    }

    let Some(document) = event.value else {
        return Ok(ack(EventAck::ignored("not a document creation")));
    };

    let Some(document_id) = document.id_in_collection(&trigger.collection) else {
        debug!(document = %document.name, "Ignoring document outside watched collection");
        return Ok(ack(EventAck::ignored(format!(
            "document not in collection {}",
            trigger.collection
        ))));
    };
    let document_id = document_id.to_string();

    info!(document_id = %document_id, "Notification document created");

    let notification = NotificationEvent::from_fields(&document.decoded_fields());
    let outcome = relay.handle(&notification).await;

    Ok(ack(EventAck::handled(Some(document_id), outcome)))
}

/// Receive a notification document's fields directly
///
/// POST /events/notifications
pub async fn notification_event(
    relay: web::Data<Arc<NotificationRelay>>,
    event: web::Json<NotificationEvent>,
) -> ActixResult<HttpResponse> {
    let outcome = relay.handle(&event).await;
    Ok(ack(EventAck::handled(None, outcome)))
}

fn ack(body: EventAck) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(body))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/events")
            .route("/firestore", web::post().to(firestore_event))
            .route("/notifications", web::post().to(notification_event)),
    );
}
