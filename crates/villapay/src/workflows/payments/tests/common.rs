use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::workflows::payments::domain::{
    AttemptId, AttemptStatus, Fee, FeeId, FeeKind, FeeStatus, GatewayCategory, MethodDetails,
    PaymentAttempt, PaymentRequest, PaymentTarget, Permit, PermitId, PermitStatus, Receipt,
    WorkerPass,
};
use crate::workflows::payments::gateway::{
    BankGateway, CardGateway, GatewayRegistry, WalletGateway, DECLINING_CARD,
};
use crate::workflows::payments::memory::InMemoryPaymentStore;
use crate::workflows::payments::policy::PaymentPolicy;
use crate::workflows::payments::repository::{PaymentStore, StoreError};
use crate::workflows::payments::service::PaymentService;
use crate::workflows::payments::{payments_router, GatewayEvent};

pub(super) fn days_ago(days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(days)
}

pub(super) fn monthly_fee(id: &str, amount: Decimal, due_date: NaiveDate) -> Fee {
    Fee {
        id: FeeId(id.to_string()),
        kind: FeeKind::Monthly,
        amount,
        due_date,
        status: FeeStatus::Unpaid,
        paid_amount: Decimal::ZERO,
        paid_at: None,
        payment_method: None,
        linked_permit_id: None,
    }
}

pub(super) fn approved_permit(id: &str, road_fee: Decimal) -> Permit {
    Permit {
        id: PermitId(id.to_string()),
        status: PermitStatus::Approved,
        road_fee_amount: Some(road_fee),
        road_fee_paid: false,
        road_fee_paid_at: None,
    }
}

pub(super) fn bare_permit(id: &str, status: PermitStatus) -> Permit {
    Permit {
        id: PermitId(id.to_string()),
        status,
        road_fee_amount: None,
        road_fee_paid: false,
        road_fee_paid_at: None,
    }
}

pub(super) fn card_details() -> MethodDetails {
    MethodDetails::Card {
        card_number: "4111111111111111".to_string(),
        expiry: "12/27".to_string(),
        holder: "Maria Santos".to_string(),
    }
}

pub(super) fn declining_card_details() -> MethodDetails {
    MethodDetails::Card {
        card_number: DECLINING_CARD.to_string(),
        expiry: "12/27".to_string(),
        holder: "Maria Santos".to_string(),
    }
}

pub(super) fn wallet_details() -> MethodDetails {
    MethodDetails::Wallet {
        account: "09171234567".to_string(),
    }
}

pub(super) fn bank_details() -> MethodDetails {
    MethodDetails::BankTransfer {
        bank_code: "BDO".to_string(),
        account_number: "001234567890".to_string(),
    }
}

pub(super) fn fee_request(fee_id: &str, amount: Decimal, method: MethodDetails) -> PaymentRequest {
    PaymentRequest {
        target: PaymentTarget::Fee(FeeId(fee_id.to_string())),
        amount,
        method,
    }
}

pub(super) fn permit_request(
    permit_id: &str,
    amount: Decimal,
    method: MethodDetails,
) -> PaymentRequest {
    PaymentRequest {
        target: PaymentTarget::Permit(PermitId(permit_id.to_string())),
        amount,
        method,
    }
}

pub(super) fn attempt_for(fee: &Fee, amount: Decimal) -> PaymentAttempt {
    PaymentAttempt {
        id: AttemptId(format!("pay_{}", fee.id.0)),
        target: PaymentTarget::Fee(fee.id.clone()),
        fee_id: fee.id.clone(),
        category: GatewayCategory::Card,
        status: AttemptStatus::Initiated,
        amount,
        intent_id: None,
        gateway_reference: None,
        failure_reason: None,
        redirect_url: None,
        prior_fee_status: fee.status,
        created_at: Utc::now(),
        resolved_at: None,
    }
}

/// Concrete adapter handles kept alongside the registry so tests can flip
/// outages and resolve pending intents.
pub(super) struct SandboxGateways {
    pub(super) card: Arc<CardGateway>,
    pub(super) wallet: Arc<WalletGateway>,
    pub(super) bank: Arc<BankGateway>,
}

pub(super) fn sandbox_gateways(policy: &PaymentPolicy) -> (GatewayRegistry, SandboxGateways) {
    let card = Arc::new(CardGateway::new());
    let wallet = Arc::new(WalletGateway::new(policy.wallet_minimum));
    let bank = Arc::new(BankGateway::new(policy.bank_transfer_minimum));
    let registry = GatewayRegistry::new()
        .register(card.clone())
        .register(wallet.clone())
        .register(bank.clone());
    (
        registry,
        SandboxGateways { card, wallet, bank },
    )
}

pub(super) fn build_service() -> (
    Arc<PaymentService<InMemoryPaymentStore>>,
    Arc<InMemoryPaymentStore>,
    SandboxGateways,
) {
    let policy = PaymentPolicy::default();
    let store = Arc::new(InMemoryPaymentStore::new());
    let (registry, gateways) = sandbox_gateways(&policy);
    let service = Arc::new(PaymentService::new(store.clone(), registry, policy));
    (service, store, gateways)
}

pub(super) fn payments_router_with_service(
    service: Arc<PaymentService<InMemoryPaymentStore>>,
) -> (axum::Router, mpsc::Receiver<GatewayEvent>) {
    let (tx, rx) = mpsc::channel(8);
    (payments_router(service, tx), rx)
}

pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("store offline".to_string()))
}

#[async_trait]
impl PaymentStore for UnavailableStore {
    async fn insert_fee(&self, _fee: Fee) -> Result<Fee, StoreError> {
        offline()
    }

    async fn fee(&self, _id: &FeeId) -> Result<Option<Fee>, StoreError> {
        offline()
    }

    async fn update_fee(&self, _fee: Fee) -> Result<(), StoreError> {
        offline()
    }

    async fn insert_permit(&self, _permit: Permit) -> Result<Permit, StoreError> {
        offline()
    }

    async fn permit(&self, _id: &PermitId) -> Result<Option<Permit>, StoreError> {
        offline()
    }

    async fn update_permit(&self, _permit: Permit) -> Result<(), StoreError> {
        offline()
    }

    async fn road_fee_for_permit(&self, _id: &PermitId) -> Result<Option<Fee>, StoreError> {
        offline()
    }

    async fn insert_worker_pass(&self, _pass: WorkerPass) -> Result<WorkerPass, StoreError> {
        offline()
    }

    async fn worker_passes_for_permit(
        &self,
        _id: &PermitId,
    ) -> Result<Vec<WorkerPass>, StoreError> {
        offline()
    }

    async fn begin_attempt(
        &self,
        _attempt: PaymentAttempt,
    ) -> Result<PaymentAttempt, StoreError> {
        offline()
    }

    async fn attempt(&self, _id: &AttemptId) -> Result<Option<PaymentAttempt>, StoreError> {
        offline()
    }

    async fn attempt_by_intent(
        &self,
        _intent_id: &str,
    ) -> Result<Option<PaymentAttempt>, StoreError> {
        offline()
    }

    async fn update_attempt(&self, _attempt: PaymentAttempt) -> Result<(), StoreError> {
        offline()
    }

    async fn insert_receipt(&self, _receipt: Receipt) -> Result<Receipt, StoreError> {
        offline()
    }

    async fn receipt_for_attempt(&self, _id: &AttemptId) -> Result<Option<Receipt>, StoreError> {
        offline()
    }
}

pub(super) async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn decimal_field(payload: &Value, key: &str) -> Decimal {
    payload
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("missing decimal field {key}"))
        .parse()
        .expect("decimal parses")
}
