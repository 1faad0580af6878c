use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{GatewayAdapter, GatewayError, GatewayOutcome, InitiateRequest, PaymentIntent};
use crate::workflows::payments::domain::{GatewayCategory, MethodDetails};
use crate::workflows::payments::events::GatewayEvent;

struct BankIntent {
    outcome: Option<GatewayOutcome>,
}

/// Sandbox bank transfer rail. Transfers clear out of band, so `confirm`
/// answers `Pending` until the bank reports settlement through `resolve`.
pub struct BankGateway {
    minimum: Decimal,
    intents: Arc<RwLock<HashMap<String, BankIntent>>>,
    fail_next: Arc<RwLock<bool>>,
}

impl BankGateway {
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

    /// Report a transfer as settled or bounced, as the bank's notification
    /// would. Resolved intents replay their stored event.
    pub async fn resolve(
        &self,
        intent_id: &str,
        settled: bool,
    ) -> Result<GatewayEvent, GatewayError> {
        let mut intents = self.intents.write().await;
        let intent = intents
            .get_mut(intent_id)
            .ok_or_else(|| GatewayError::UnknownIntent(intent_id.to_string()))?;

        let outcome = match &intent.outcome {
            Some(existing) => existing.clone(),
            None => {
                let outcome = if settled {
                    GatewayOutcome::Succeeded {
                        transaction_id: format!("bx_{}", Uuid::new_v4()),
                        receipt_url: None,
                    }
                } else {
                    GatewayOutcome::Failed {
                        transaction_id: None,
                        reason: "transfer was not received".to_string(),
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
impl GatewayAdapter for BankGateway {
    fn category(&self) -> GatewayCategory {
        GatewayCategory::BankTransfer
    }

    fn minimum_amount(&self) -> Option<Decimal> {
        Some(self.minimum)
    }

    async fn initiate(&self, request: InitiateRequest) -> Result<PaymentIntent, GatewayError> {
        if self.take_outage().await {
            return Err(GatewayError::Transport(
                "bank rail unreachable".to_string(),
            ));
        }

        if !matches!(request.details, MethodDetails::BankTransfer { .. }) {
            return Err(GatewayError::Transport(format!(
                "bank gateway received {} details",
                request.details.category().label()
            )));
        }

        let intent_id = format!("bt_{}", Uuid::new_v4());
        self.intents
            .write()
            .await
            .insert(intent_id.clone(), BankIntent { outcome: None });

        Ok(PaymentIntent {
            intent_id,
            redirect_url: None,
        })
    }

    async fn confirm(&self, intent_id: &str) -> Result<GatewayOutcome, GatewayError> {
        if self.take_outage().await {
            return Err(GatewayError::Transport(
                "bank rail unreachable".to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn transfer_request(amount: Decimal) -> InitiateRequest {
        InitiateRequest {
            reference: "pay_test".to_string(),
            amount,
            currency: "PHP".to_string(),
            details: MethodDetails::BankTransfer {
                bank_code: "BDO".to_string(),
                account_number: "001234567890".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn transfers_stay_pending_until_the_bank_reports() {
        let gateway = BankGateway::new(dec!(500));
        let intent = gateway
            .initiate(transfer_request(dec!(5000)))
            .await
            .expect("intent opens");
        assert!(intent.redirect_url.is_none());

        let outcome = gateway.confirm(&intent.intent_id).await.expect("confirms");
        assert!(matches!(outcome, GatewayOutcome::Pending { .. }));

        let event = gateway
            .resolve(&intent.intent_id, true)
            .await
            .expect("resolves");
        assert!(matches!(event.outcome, GatewayOutcome::Succeeded { .. }));
    }

    #[tokio::test]
    async fn bounced_transfer_resolves_to_failure() {
        let gateway = BankGateway::new(dec!(500));
        let intent = gateway
            .initiate(transfer_request(dec!(1500)))
            .await
            .expect("intent opens");

        let event = gateway
            .resolve(&intent.intent_id, false)
            .await
            .expect("resolves");
        match event.outcome {
            GatewayOutcome::Failed { reason, .. } => {
                assert_eq!(reason, "transfer was not received");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn mismatched_details_are_rejected() {
        let gateway = BankGateway::new(dec!(500));
        let mut request = transfer_request(dec!(1500));
        request.details = MethodDetails::Wallet {
            account: "09170000001".to_string(),
        };

        let error = gateway.initiate(request).await.expect_err("rejects");
        assert!(matches!(error, GatewayError::Transport(_)));
    }
}
