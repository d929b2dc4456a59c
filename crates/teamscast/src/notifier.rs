use serde_json::Value;
use thiserror::Error;

use crate::render;
use crate::render::DiagRef;
use crate::transport::{Transport, TransportResponse, WebhookTransport};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("missing webhook URL")]
    MissingWebhookUrl,

    #[error("missing payload")]
    MissingPayload,

    /// The outbound call itself failed (connect, TLS, ...).
    #[error("Failed to send notification to Microsoft Teams: {detail}")]
    Transport { detail: String },

    /// The call completed but the response was not an acceptance.
    #[error("Failed to send notification to Microsoft Teams: {detail}")]
    Rejected { detail: String },
}

/// Outcome of classifying a transport response.
#[derive(Debug)]
pub enum Delivery {
    Accepted { status: u16 },
    Rejected { response: DiagRef },
}

/// A response is accepted only on an HTTP-style 2xx status (200..=299).
/// Anything else, including a response with no status at all, is a rejection.
pub fn classify(response: &TransportResponse) -> Delivery {
    match response.status {
        Some(status) if (200..=299).contains(&status) => Delivery::Accepted { status },
        _ => Delivery::Rejected {
            response: response.body.clone(),
        },
    }
}

/// Sends prebuilt payloads to a Teams incoming webhook.
///
/// Stateless between calls; each `notify` performs exactly one outbound call
/// with no retries and no internal timeout.
pub struct Notifier {
    transport: Box<dyn Transport>,
}

impl Notifier {
    pub fn new() -> Self {
        Self {
            transport: Box::new(WebhookTransport::new()),
        }
    }

    /// Substitute the transport, e.g. a file sink or a test double.
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Deliver `payload` to the webhook at `url`.
    ///
    /// Fails fast on an empty URL or a null payload without touching the
    /// transport. Any failure message embeds a rendering of the response
    /// that stays safe on cyclic response graphs.
    pub async fn notify(&self, url: &str, payload: &Value) -> Result<(), NotifyError> {
        if url.trim().is_empty() {
            return Err(NotifyError::MissingWebhookUrl);
        }
        if payload.is_null() {
            return Err(NotifyError::MissingPayload);
        }

        let response = self
            .transport
            .post(url, payload)
            .await
            .map_err(|err| NotifyError::Transport {
                detail: render::render_error(&err),
            })?;

        match classify(&response) {
            Delivery::Accepted { status } => {
                tracing::debug!(status, "notification accepted");
                Ok(())
            }
            Delivery::Rejected { response } => Err(NotifyError::Rejected {
                detail: render::render(&response),
            }),
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{diag, DiagValue};
    use anyhow::Result;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::sync::Mutex;

    /// Test double recording every call; responds or fails per `Behavior`.
    struct FakeTransport {
        calls: Arc<AtomicUsize>,
        payloads: Arc<Mutex<Vec<Value>>>,
        behavior: Behavior,
    }

    enum Behavior {
        Respond { status: Option<u16>, body: DiagRef },
        Fail(String),
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn post(&self, _url: &str, payload: &Value) -> Result<TransportResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payloads.lock().unwrap().push(payload.clone());
            match &self.behavior {
                Behavior::Respond { status, body } => Ok(TransportResponse {
                    status: *status,
                    body: body.clone(),
                }),
                Behavior::Fail(message) => Err(anyhow::anyhow!(message.clone())),
            }
        }
    }

    fn fake(behavior: Behavior) -> (Notifier, Arc<AtomicUsize>, Arc<Mutex<Vec<Value>>>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let payloads = Arc::new(Mutex::new(Vec::new()));
        let notifier = Notifier::with_transport(Box::new(FakeTransport {
            calls: calls.clone(),
            payloads: payloads.clone(),
            behavior,
        }));
        (notifier, calls, payloads)
    }

    fn accepted_response(status: u16) -> Behavior {
        Behavior::Respond {
            status: Some(status),
            body: diag(DiagValue::Object(vec![(
                "status".to_string(),
                diag(DiagValue::Number(status.into())),
            )])),
        }
    }

    #[tokio::test]
    async fn sends_success_notification() {
        let (notifier, calls, payloads) = fake(accepted_response(202));
        let payload = serde_json::json!({"message": "x"});

        notifier.notify("url1", &payload).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(payloads.lock().unwrap().as_slice(), &[payload]);
    }

    #[tokio::test]
    async fn any_2xx_status_is_accepted() {
        for status in [200, 204, 299] {
            let (notifier, _, _) = fake(accepted_response(status));
            notifier
                .notify("url1", &serde_json::json!({"message": "x"}))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn missing_url_fails_before_transport() {
        let (notifier, calls, _) = fake(accepted_response(202));
        let err = notifier
            .notify("", &serde_json::json!({"message": "x"}))
            .await
            .unwrap_err();

        assert_matches!(err, NotifyError::MissingWebhookUrl);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_payload_fails_before_transport() {
        let (notifier, calls, _) = fake(accepted_response(202));
        let err = notifier.notify("url1", &Value::Null).await.unwrap_err();

        assert_matches!(err, NotifyError::MissingPayload);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_response_is_rejected() {
        let (notifier, calls, _) = fake(Behavior::Respond {
            status: None,
            body: diag(DiagValue::Object(vec![])),
        });
        let err = notifier
            .notify("url1", &serde_json::json!({"message": "x"}))
            .await
            .unwrap_err();

        assert_matches!(err, NotifyError::Rejected { .. });
        assert!(err
            .to_string()
            .starts_with("Failed to send notification to Microsoft Teams"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transport_failure_keeps_original_context() {
        let (notifier, _, _) = fake(Behavior::Fail("Webhook error".to_string()));
        let err = notifier
            .notify("url1", &serde_json::json!({"message": "x"}))
            .await
            .unwrap_err();

        assert_matches!(err, NotifyError::Transport { .. });
        let message = err.to_string();
        assert!(message.starts_with("Failed to send notification to Microsoft Teams"));
        assert!(message.contains("Webhook error"));
    }

    #[tokio::test]
    async fn circular_response_renders_without_serializer_failure() {
        // response -> socket -> _httpMessage -> response, the shape a raw
        // HTTP client error drags along.
        let response = diag(DiagValue::Object(vec![
            (
                "status".to_string(),
                diag(DiagValue::Number(400.into())),
            ),
            (
                "statusText".to_string(),
                diag(DiagValue::String("Bad Request".to_string())),
            ),
            (
                "headers".to_string(),
                diag(serde_json::json!({"content-type": "application/json"}).into()),
            ),
            (
                "data".to_string(),
                diag(serde_json::json!({"error": "Invalid payload"}).into()),
            ),
        ]));
        let socket = diag(DiagValue::Object(vec![(
            "_httpMessage".to_string(),
            response.clone(),
        )]));
        if let DiagValue::Object(fields) = &mut *response.lock().unwrap() {
            fields.push(("socket".to_string(), socket));
        }

        let (notifier, calls, payloads) = fake(Behavior::Respond {
            status: Some(400),
            body: response,
        });
        let payload = serde_json::json!({"message": "x"});
        let err = notifier.notify("url1", &payload).await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Failed to send notification to Microsoft Teams"));
        assert!(message.contains("\"status\": 400"));
        assert!(message.contains("\"statusText\": \"Bad Request\""));
        assert!(message.contains("[Circular]"));
        assert!(!message.contains("recursion"));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(payloads.lock().unwrap().as_slice(), &[payload]);
    }

    #[test]
    fn classify_boundary() {
        let body = diag(DiagValue::Object(vec![]));
        let accepted = TransportResponse {
            status: Some(200),
            body: body.clone(),
        };
        assert_matches!(classify(&accepted), Delivery::Accepted { status: 200 });

        let rejected = TransportResponse {
            status: Some(300),
            body: body.clone(),
        };
        assert_matches!(classify(&rejected), Delivery::Rejected { .. });

        let statusless = TransportResponse { status: None, body };
        assert_matches!(classify(&statusless), Delivery::Rejected { .. });
    }
}
