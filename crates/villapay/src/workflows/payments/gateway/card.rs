use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{GatewayAdapter, GatewayError, GatewayOutcome, InitiateRequest, PaymentIntent};
use crate::workflows::payments::domain::{GatewayCategory, MethodDetails};

/// Designated sandbox card number that always declines.
pub const DECLINING_CARD: &str = "4000000000000002";

struct CardIntent {
    card_number: String,
    outcome: Option<GatewayOutcome>,
}

/// Sandbox card processor. Confirmation is synchronous: the processor
/// answers succeeded or failed in the same call, and no minimum applies.
pub struct CardGateway {
    intents: Arc<RwLock<HashMap<String, CardIntent>>>,
    fail_next: Arc<RwLock<bool>>,
}

impl Default for CardGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl CardGateway {
    pub fn new() -> Self {
        Self {
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
}

#[async_trait]
impl GatewayAdapter for CardGateway {
    fn category(&self) -> GatewayCategory {
        GatewayCategory::Card
    }

    fn minimum_amount(&self) -> Option<Decimal> {
        None
    }

    async fn initiate(&self, request: InitiateRequest) -> Result<PaymentIntent, GatewayError> {
        if self.take_outage().await {
            return Err(GatewayError::Transport(
                "card processor unreachable".to_string(),
            ));
        }

        let card_number = match &request.details {
            MethodDetails::Card { card_number, .. } => card_number.clone(),
            other => {
                return Err(GatewayError::Transport(format!(
                    "card gateway received {} details",
                    other.category().label()
                )))
            }
        };

        let intent_id = format!("pi_card_{}", Uuid::new_v4());
        self.intents.write().await.insert(
            intent_id.clone(),
            CardIntent {
                card_number,
                outcome: None,
            },
        );

        Ok(PaymentIntent {
            intent_id,
            redirect_url: None,
        })
    }

    async fn confirm(&self, intent_id: &str) -> Result<GatewayOutcome, GatewayError> {
        if self.take_outage().await {
            return Err(GatewayError::Transport(
                "card processor unreachable".to_string(),
            ));
        }

        let mut intents = self.intents.write().await;
        let intent = intents
            .get_mut(intent_id)
            .ok_or_else(|| GatewayError::UnknownIntent(intent_id.to_string()))?;

        if let Some(outcome) = &intent.outcome {
            return Ok(outcome.clone());
        }

        let outcome = if intent.card_number == DECLINING_CARD {
            GatewayOutcome::Failed {
                transaction_id: None,
                reason: "card declined: insufficient funds".to_string(),
            }
        } else {
            let transaction_id = format!("ch_{}", Uuid::new_v4());
            let receipt_url = format!("https://cards.sandbox.test/receipts/{transaction_id}");
            GatewayOutcome::Succeeded {
                transaction_id,
                receipt_url: Some(receipt_url),
            }
        };

        intent.outcome = Some(outcome.clone());
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn card_request(card_number: &str, amount: Decimal) -> InitiateRequest {
        InitiateRequest {
            reference: "pay_test".to_string(),
            amount,
            currency: "PHP".to_string(),
            details: MethodDetails::Card {
                card_number: card_number.to_string(),
                expiry: "12/29".to_string(),
                holder: "J Dela Cruz".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn initiate_then_confirm_succeeds() {
        let gateway = CardGateway::new();
        let intent = gateway
            .initiate(card_request("4111111111111111", dec!(500)))
            .await
            .expect("intent opens");

        let outcome = gateway.confirm(&intent.intent_id).await.expect("confirms");
        match outcome {
            GatewayOutcome::Succeeded { transaction_id, .. } => {
                assert!(transaction_id.starts_with("ch_"));
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn designated_card_declines() {
        let gateway = CardGateway::new();
        let intent = gateway
            .initiate(card_request(DECLINING_CARD, dec!(500)))
            .await
            .expect("intent opens");

        let outcome = gateway.confirm(&intent.intent_id).await.expect("confirms");
        assert!(matches!(outcome, GatewayOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn confirm_replays_stored_outcome() {
        let gateway = CardGateway::new();
        let intent = gateway
            .initiate(card_request("4111111111111111", dec!(120)))
            .await
            .expect("intent opens");

        let first = gateway.confirm(&intent.intent_id).await.expect("confirms");
        let second = gateway.confirm(&intent.intent_id).await.expect("replays");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unknown_intent_is_an_error() {
        let gateway = CardGateway::new();
        let result = gateway.confirm("pi_card_missing").await;
        assert!(matches!(result, Err(GatewayError::UnknownIntent(_))));
    }

    #[tokio::test]
    async fn fail_next_surfaces_transport_error_once() {
        let gateway = CardGateway::new();
        gateway.set_fail_next(true).await;

        let first = gateway.initiate(card_request("4111111111111111", dec!(75))).await;
        assert!(matches!(first, Err(GatewayError::Transport(_))));

        let second = gateway.initiate(card_request("4111111111111111", dec!(75))).await;
        assert!(second.is_ok());
    }
}
