use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::gateway::GatewayOutcome;
use super::repository::PaymentStore;
use super::service::PaymentService;

/// Asynchronous settlement notice from a processor, delivered out of band
/// after an attempt was left `processing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayEvent {
    pub intent_id: String,
    pub outcome: GatewayOutcome,
}

/// Single consumer that drains gateway callbacks into the payment service.
/// Every event lands in the same apply path as a synchronous confirmation,
/// so ordering and no-op rules hold regardless of how an outcome arrives.
pub struct CallbackPump {
    tx: mpsc::Sender<GatewayEvent>,
    worker: JoinHandle<()>,
}

impl CallbackPump {
    pub fn start<S>(service: Arc<PaymentService<S>>, capacity: usize) -> Self
    where
        S: PaymentStore + Send + Sync + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<GatewayEvent>(capacity);
        let worker = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let intent_id = event.intent_id.clone();
                if let Err(error) = service.ingest_event(event).await {
                    tracing::warn!(%intent_id, %error, "gateway callback was not applied");
                }
            }
        });
        Self { tx, worker }
    }

    pub fn sender(&self) -> mpsc::Sender<GatewayEvent> {
        self.tx.clone()
    }

    /// Close the intake and wait for queued callbacks to finish applying.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.worker.await;
    }
}
