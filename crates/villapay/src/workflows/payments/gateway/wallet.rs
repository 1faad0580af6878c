use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{GatewayAdapter, GatewayError, GatewayOutcome, InitiateRequest, PaymentIntent};
use crate::workflows::payments::domain::{GatewayCategory, MethodDetails};
use crate::workflows::payments::events::GatewayEvent;

struct WalletIntent {
    outcome: Option<GatewayOutcome>,
}

/// Sandbox e-wallet processor. The customer approves the charge inside the
/// wallet app, so `confirm` answers `Pending` until the processor calls back.
/// `resolve` synthesizes that callback.
pub struct WalletGateway {
    minimum: Decimal,
    intents: Arc<RwLock<HashMap<String, WalletIntent>>>,
    fail_next: Arc<RwLock<bool>>,
}

impl WalletGateway {
    pub fn new(minimum: Decimal) -> Self {
        Self {
            minimum,
            intents: Arc::new(RwLock::new(HashMap::new())),
            fail_next: Arc::new(RwLock::new(false)),
        }
    }

    /// Make the next gateway call fail with a transport error. The flag
    /// clears once consumed.
    pub async fn set_fail_next(&self, fail: bool) {
        *self.fail_next.write().await = fail;
    }

    async fn take_outage(&self) -> bool {
        let mut flag = self.fail_next.write().await;
        std::mem::take(&mut *flag)
    }

    /// Settle a pending intent the way the processor's webhook would. A
    /// resolved intent replays its stored event, mirroring duplicate webhook
    /// deliveries.
    pub async fn resolve(
        &self,
        intent_id: &str,
        approved: bool,
    ) -> Result<GatewayEvent, GatewayError> {
        let mut intents = self.intents.write().await;
        let intent = intents
            .get_mut(intent_id)
            .ok_or_else(|| GatewayError::UnknownIntent(intent_id.to_string()))?;

        let outcome = match &intent.outcome {
            Some(existing) => existing.clone(),
            None => {
                let outcome = if approved {
                    GatewayOutcome::Succeeded {
                        transaction_id: format!("wt_{}", Uuid::new_v4()),
                        receipt_url: None,
                    }
                } else {
                    GatewayOutcome::Failed {
                        transaction_id: None,
                        reason: "customer rejected the charge".to_string(),
                    }
                };
                intent.outcome = Some(outcome.clone());
                outcome
            }
        };

        Ok(GatewayEvent {
            intent_id: intent_id.to_string(),
            outcome,
        })
    }
}

#[async_trait]
impl GatewayAdapter for WalletGateway {
    fn category(&self) -> GatewayCategory {
        GatewayCategory::Wallet
    }

    fn minimum_amount(&self) -> Option<Decimal> {
        Some(self.minimum)
    }

    async fn initiate(&self, request: InitiateRequest) -> Result<PaymentIntent, GatewayError> {
        if self.take_outage().await {
            return Err(GatewayError::Transport(
                "wallet processor unreachable".to_string(),
            ));
        }

        if !matches!(request.details, MethodDetails::Wallet { .. }) {
            return Err(GatewayError::Transport(format!(
                "wallet gateway received {} details",
                request.details.category().label()
            )));
        }

        let intent_id = format!("wi_{}", Uuid::new_v4());
        self.intents
            .write()
            .await
            .insert(intent_id.clone(), WalletIntent { outcome: None });

        let redirect_url = format!("https://wallet.sandbox.test/checkout/{intent_id}");
        Ok(PaymentIntent {
            intent_id,
            redirect_url: Some(redirect_url),
        })
    }

    async fn confirm(&self, intent_id: &str) -> Result<GatewayOutcome, GatewayError> {
        if self.take_outage().await {
            return Err(GatewayError::Transport(
                "wallet processor unreachable".to_string(),
            ));
        }

        let intents = self.intents.read().await;
        let intent = intents
            .get(intent_id)
            .ok_or_else(|| GatewayError::UnknownIntent(intent_id.to_string()))?;

        match &intent.outcome {
            Some(outcome) => Ok(outcome.clone()),
            None => Ok(GatewayOutcome::Pending {
                transaction_id: None,
            }),
        }
    }
}
