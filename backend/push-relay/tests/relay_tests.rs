//! Tests for the notification relay core
//!
//! This test module covers:
//! - Token guard (skip without contacting the provider)
//! - Title/body defaulting
//! - Outbound message mapping
//! - Failure absorption and logging
//! - Falsy and malformed field values
//! - Independent concurrent invocations
use fcm_shared::{FCMError, FCMSendResult, Message, PushProvider};
use mockall::mock;
use push_relay::{NotificationEvent, NotificationRelay, RelayOutcome};
use serde_json::json;
use std::io::Write;
use std::sync::{Arc, Mutex};

mock! {
    pub Provider {}

    #[async_trait::async_trait]
    impl PushProvider for Provider {
        async fn send(&self, message: &Message) -> Result<FCMSendResult, FCMError>;
    }
}

fn delivered(id: &str) -> Result<FCMSendResult, FCMError> {
    Ok(FCMSendResult {
        message_id: id.to_string(),
    })
}

fn event(value: serde_json::Value) -> NotificationEvent {
    serde_json::from_value(value).expect("valid notification event")
}

/// Log sink shared with a test-local subscriber
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_token_present_sends_exactly_once() {
    let mut provider = MockProvider::new();
    provider
        .expect_send()
        .withf(|message| message.token == "device-token-1")
        .times(1)
        .returning(|_| delivered("projects/p/messages/1"));

    let relay = NotificationRelay::new(Arc::new(provider));
    let outcome = relay
        .handle(&event(json!({"title": "Hello", "body": "World", "fcmToken": "device-token-1"})))
        .await;

    assert_eq!(
        outcome,
        RelayOutcome::Delivered {
            message_id: "projects/p/messages/1".to_string()
        }
    );
}

#[tokio::test]
async fn test_missing_token_never_sends() {
    for payload in [
        json!({"title": "Hello", "body": "World"}),
        json!({"title": "Hello", "fcmToken": null}),
        json!({"title": "Hello", "fcmToken": ""}),
    ] {
        let mut provider = MockProvider::new();
        provider.expect_send().never();

        let relay = NotificationRelay::new(Arc::new(provider));
        assert_eq!(relay.handle(&event(payload)).await, RelayOutcome::Skipped);
    }
}

#[tokio::test]
async fn test_title_defaults_when_missing() {
    let mut provider = MockProvider::new();
    provider
        .expect_send()
        .withf(|message| message.notification.title == "New Notification")
        .times(1)
        .returning(|_| delivered("m1"));

    let relay = NotificationRelay::new(Arc::new(provider));
    relay
        .handle(&event(json!({"body": "World", "fcmToken": "abc"})))
        .await;
}

#[tokio::test]
async fn test_body_defaults_when_missing() {
    let mut provider = MockProvider::new();
    provider
        .expect_send()
        .withf(|message| message.notification.body.is_empty())
        .times(1)
        .returning(|_| delivered("m1"));

    let relay = NotificationRelay::new(Arc::new(provider));
    relay
        .handle(&event(json!({"title": "Hello", "fcmToken": "abc"})))
        .await;
}

#[tokio::test]
async fn test_mapping_is_deterministic() {
    let expected = Message::new("abc", "Hi", "There");

    let mut provider = MockProvider::new();
    let wanted = expected.clone();
    provider
        .expect_send()
        .withf(move |message| *message == wanted)
        .times(3)
        .returning(|_| delivered("m1"));

    let relay = NotificationRelay::new(Arc::new(provider));
    let input = event(json!({"title": "Hi", "body": "There", "fcmToken": "abc"}));
    for _ in 0..3 {
        relay.handle(&input).await;
    }

    assert_eq!(NotificationRelay::build_message(&input), Ok(Some(expected)));
}

#[tokio::test]
async fn test_send_failure_is_absorbed_and_logged() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut provider = MockProvider::new();
    provider.expect_send().times(1).returning(|_| {
        Err(FCMError::ApiError(
            "503 Service Unavailable".to_string(),
            "backend unavailable".to_string(),
        ))
    });

    let relay = NotificationRelay::new(Arc::new(provider));
    let outcome = relay.handle(&event(json!({"fcmToken": "abc"}))).await;

    match outcome {
        RelayOutcome::Failed { error } => assert!(error.contains("backend unavailable")),
        other => panic!("expected failure outcome, got {other:?}"),
    }

    let output = logs.contents();
    assert!(output.contains("Failed to send notification"));
    assert!(output.contains("backend unavailable"));
}

#[tokio::test]
async fn test_falsy_fields_fall_back_to_defaults() {
    let mut provider = MockProvider::new();
    provider
        .expect_send()
        .withf(|message| *message == Message::new("abc", "New Notification", ""))
        .times(1)
        .returning(|_| delivered("m1"));

    let relay = NotificationRelay::new(Arc::new(provider));
    let outcome = relay
        .handle(&event(json!({"title": 0, "body": false, "fcmToken": "abc"})))
        .await;

    assert_eq!(outcome.as_label(), "delivered");
}

#[tokio::test]
async fn test_falsy_non_string_token_is_skipped() {
    for token in [json!(0), json!(false)] {
        let mut provider = MockProvider::new();
        provider.expect_send().never();

        let relay = NotificationRelay::new(Arc::new(provider));
        let outcome = relay
            .handle(&event(json!({"title": "Hi", "fcmToken": token})))
            .await;
        assert_eq!(outcome, RelayOutcome::Skipped);
    }
}

#[tokio::test]
async fn test_non_string_fields_fail_without_sending() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    for payload in [
        json!({"title": 42, "fcmToken": "abc"}),
        json!({"body": ["a"], "fcmToken": "abc"}),
        json!({"title": "Hi", "fcmToken": 12345}),
    ] {
        let mut provider = MockProvider::new();
        provider.expect_send().never();

        let relay = NotificationRelay::new(Arc::new(provider));
        let outcome = relay.handle(&event(payload)).await;

        match outcome {
            RelayOutcome::Failed { error } => {
                assert!(error.starts_with("Invalid notification payload"))
            }
            other => panic!("expected failure outcome, got {other:?}"),
        }
    }

    let output = logs.contents();
    assert!(output.contains("ERROR"));
    assert!(output.contains("Failed to send notification"));
    assert!(!output.contains("No device token"));
}

#[tokio::test]
async fn test_missing_token_is_logged() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut provider = MockProvider::new();
    provider.expect_send().never();

    let relay = NotificationRelay::new(Arc::new(provider));
    relay.handle(&event(json!({"title": "Hi"}))).await;

    assert!(logs.contents().contains("No device token"));
}

#[tokio::test]
async fn test_concurrent_invocations_are_independent() {
    let mut provider = MockProvider::new();
    provider
        .expect_send()
        .times(8)
        .returning(|message| delivered(&format!("msg-{}", message.token)));

    let relay = Arc::new(NotificationRelay::new(Arc::new(provider)));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let relay = relay.clone();
            let token = format!("token-{}", i);
            tokio::spawn(async move {
                relay
                    .handle(&NotificationEvent::new(Some("Hi"), None, Some(token.as_str())))
                    .await
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let outcome = handle.await.unwrap();
        assert_eq!(
            outcome,
            RelayOutcome::Delivered {
                message_id: format!("msg-token-{}", i)
            }
        );
    }
}
