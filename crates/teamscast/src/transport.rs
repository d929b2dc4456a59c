use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::Endpoint;
use crate::render::{diag, DiagRef, DiagValue};

/// Raw delivery result. The status is optional because a webhook backend may
/// answer with nothing status-like at all; the body carries whatever
/// diagnostic material came back with the response.
pub struct TransportResponse {
    pub status: Option<u16>,
    pub body: DiagRef,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform exactly one outbound call delivering `payload` to `url`.
    async fn post(&self, url: &str, payload: &serde_json::Value) -> Result<TransportResponse>;
}

pub fn transport_from_endpoint(endpoint: &Endpoint) -> Box<dyn Transport> {
    match endpoint {
        Endpoint::Webhook { .. } => Box::new(WebhookTransport::new()),
        Endpoint::Mock { path } => Box::new(MockTransport { root: path.clone() }),
    }
}

/// HTTP transport for Teams incoming webhooks.
pub struct WebhookTransport {
    client: reqwest::Client,
}

impl WebhookTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for WebhookTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for WebhookTransport {
    async fn post(&self, url: &str, payload: &serde_json::Value) -> Result<TransportResponse> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .with_context(|| "Sending Teams webhook")?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        let text = response.text().await.unwrap_or_default();

        let mut fields = vec![
            (
                "status".to_string(),
                diag(DiagValue::Number(status.as_u16().into())),
            ),
            ("statusText".to_string(), diag(DiagValue::String(status_text))),
        ];
        // Keep the body JSON-shaped when the backend answered with JSON.
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(parsed) => fields.push(("body".to_string(), diag(parsed.into()))),
            Err(_) => {
                if !text.is_empty() {
                    fields.push(("body".to_string(), diag(DiagValue::String(text))));
                }
            }
        }

        Ok(TransportResponse {
            status: Some(status.as_u16()),
            body: diag(DiagValue::Object(fields)),
        })
    }
}

/// File-sink transport: each delivery is written as a pretty JSON file under
/// `root`, and reported as accepted with status 202.
pub struct MockTransport {
    pub root: PathBuf,
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(&self, url: &str, payload: &serde_json::Value) -> Result<TransportResponse> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Creating mock delivery dir {}", self.root.display()))?;

        let file_path = self
            .root
            .join(format!("{}-{}.json", sanitize(url), uuid::Uuid::new_v4()));
        let bytes = serde_json::to_vec_pretty(payload)?;
        tokio::fs::write(&file_path, &bytes)
            .await
            .with_context(|| format!("Writing mock delivery {}", file_path.display()))?;
        tracing::debug!(path = %file_path.display(), "mock delivery written");

        Ok(TransportResponse {
            status: Some(202),
            body: diag(DiagValue::Object(vec![(
                "status".to_string(),
                diag(DiagValue::Number(202.into())),
            )])),
        })
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}
