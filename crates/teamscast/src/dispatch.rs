use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::config::Endpoint;
use crate::notifier::Notifier;
use crate::transport::transport_from_endpoint;

/// A named hook to deliver to.
#[derive(Debug, Clone)]
pub struct Destination {
    pub name: String,
    pub endpoint: Endpoint,
}

#[derive(Debug, serde::Serialize)]
pub struct DeliveryReport {
    pub hook: String,
    pub ok: bool,
    pub error: Option<String>,
    pub duration_ms: u128,
}

/// Deliver one payload to every destination, bounded by `jobs` concurrent
/// sends. Each delivery is an independent notify call; failures are
/// collected per destination and never abort the batch.
pub async fn dispatch(
    payload: &serde_json::Value,
    destinations: Vec<Destination>,
    jobs: Option<usize>,
) -> Result<Vec<DeliveryReport>> {
    let limit = jobs.unwrap_or_else(|| num_cpus::get().max(2));
    let sem = Arc::new(Semaphore::new(limit));

    let mut handles = Vec::new();

    for dest in destinations {
        let permit = sem.clone().acquire_owned().await?;
        let payload = payload.clone();
        handles.push(tokio::spawn(async move {
            let _p = permit;
            let start = Instant::now();

            let notifier = Notifier::with_transport(transport_from_endpoint(&dest.endpoint));
            let target = match &dest.endpoint {
                Endpoint::Webhook { url } => url.clone(),
                // The mock sink files are named after the hook.
                Endpoint::Mock { .. } => dest.name.clone(),
            };

            let result = notifier.notify(&target, &payload).await;
            if let Err(ref err) = result {
                tracing::warn!(hook = %dest.name, "delivery failed: {err}");
            }

            DeliveryReport {
                hook: dest.name,
                ok: result.is_ok(),
                error: result.err().map(|e| e.to_string()),
                duration_ms: start.elapsed().as_millis(),
            }
        }));
    }

    let mut reports = Vec::new();
    for res in join_all(handles).await {
        reports.push(res?);
    }

    Ok(reports)
}
