//! Payment processor adapters, one per gateway category.
//!
//! Every processor sits behind [`GatewayAdapter`]: `initiate` opens an intent
//! and `confirm` asks the processor to settle it. Card settles synchronously;
//! wallet and bank transfer may answer `Pending` and finish through an
//! out-of-band callback. The in-repo adapters are sandbox processors with
//! deterministic, detail-driven behavior.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::{GatewayCategory, MethodDetails};
use super::policy::PaymentPolicy;

mod bank;
mod card;
mod wallet;

pub use bank::BankGateway;
pub use card::{CardGateway, DECLINING_CARD};
pub use wallet::WalletGateway;

/// Charge request handed to an adapter when an attempt is created. Instrument
/// details travel only here; they are never persisted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct InitiateRequest {
    /// Engine-side reference (the attempt id), echoed for audit.
    pub reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub details: MethodDetails,
}

/// Processor-issued handle for a charge awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub intent_id: String,
    /// Checkout URL for categories that need customer approval out-of-band.
    pub redirect_url: Option<String>,
}

/// Result of asking a processor to settle an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GatewayOutcome {
    Succeeded {
        transaction_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receipt_url: Option<String>,
    },
    Failed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transaction_id: Option<String>,
        reason: String,
    },
    Pending {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transaction_id: Option<String>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway transport failure: {0}")]
    Transport(String),
    #[error("unknown payment intent '{0}'")]
    UnknownIntent(String),
}

/// Contract every payment processor integration satisfies.
#[async_trait]
pub trait GatewayAdapter: Send + Sync {
    fn category(&self) -> GatewayCategory;

    /// Documented smallest accepted amount, when the category has one.
    fn minimum_amount(&self) -> Option<Decimal>;

    async fn initiate(&self, request: InitiateRequest) -> Result<PaymentIntent, GatewayError>;

    /// Ask the processor to settle an intent. Confirming an intent that has
    /// already resolved returns the stored outcome unchanged.
    async fn confirm(&self, intent_id: &str) -> Result<GatewayOutcome, GatewayError>;
}

/// Adapter lookup keyed by category, built once at startup and injected.
#[derive(Default, Clone)]
pub struct GatewayRegistry {
    adapters: HashMap<GatewayCategory, Arc<dyn GatewayAdapter>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, adapter: Arc<dyn GatewayAdapter>) -> Self {
        self.adapters.insert(adapter.category(), adapter);
        self
    }

    pub fn adapter(&self, category: GatewayCategory) -> Option<Arc<dyn GatewayAdapter>> {
        self.adapters.get(&category).cloned()
    }

    /// The full sandbox set wired with the policy's documented minimums.
    pub fn sandbox(policy: &PaymentPolicy) -> Self {
        Self::new()
            .register(Arc::new(CardGateway::new()))
            .register(Arc::new(WalletGateway::new(policy.wallet_minimum)))
            .register(Arc::new(BankGateway::new(policy.bank_transfer_minimum)))
    }
}
