use crate::infra::{deserialize_date, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use villapay::error::AppError;
use villapay::workflows::payments::{
    payments_router, Fee, FeeId, FeeKind, FeeStatus, GatewayEvent, PaymentService, PaymentStore,
    Permit, PermitId, PermitStatus,
};

/// Intake payload for seeding a fee obligation. Server-managed fields such as
/// the payment method and settlement timestamp are never accepted here.
#[derive(Debug, Deserialize)]
pub(crate) struct FeeIntakeRequest {
    pub(crate) fee_id: String,
    pub(crate) kind: FeeKind,
    pub(crate) amount: Decimal,
    #[serde(deserialize_with = "deserialize_date")]
    pub(crate) due_date: NaiveDate,
    #[serde(default)]
    pub(crate) status: Option<FeeStatus>,
    #[serde(default)]
    pub(crate) paid_amount: Option<Decimal>,
}

impl FeeIntakeRequest {
    fn into_fee(self) -> Fee {
        Fee {
            id: FeeId(self.fee_id),
            kind: self.kind,
            amount: self.amount,
            due_date: self.due_date,
            status: self.status.unwrap_or(FeeStatus::Unpaid),
            paid_amount: self.paid_amount.unwrap_or(Decimal::ZERO),
            paid_at: None,
            payment_method: None,
            linked_permit_id: None,
        }
    }
}

/// Intake payload for registering a construction permit. A road fee amount
/// makes the service create the companion fee record alongside.
#[derive(Debug, Deserialize)]
pub(crate) struct PermitIntakeRequest {
    pub(crate) permit_id: String,
    pub(crate) status: PermitStatus,
    #[serde(default)]
    pub(crate) road_fee_amount: Option<Decimal>,
    #[serde(default)]
    pub(crate) road_fee_paid: bool,
}

impl PermitIntakeRequest {
    fn into_permit(self) -> Permit {
        Permit {
            id: PermitId(self.permit_id),
            status: self.status,
            road_fee_amount: self.road_fee_amount,
            road_fee_paid: self.road_fee_paid,
            road_fee_paid_at: None,
        }
    }
}

pub(crate) fn with_payment_routes<S>(
    service: Arc<PaymentService<S>>,
    callbacks: mpsc::Sender<GatewayEvent>,
) -> axum::Router
where
    S: PaymentStore + 'static,
{
    payments_router(service.clone(), callbacks)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/fees", axum::routing::post(register_fee_endpoint::<S>))
        .route(
            "/api/v1/permits",
            axum::routing::post(register_permit_endpoint::<S>),
        )
        .layer(Extension(service))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        serde_json::json!({ "status": "ready" })
    } else {
        serde_json::json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn register_fee_endpoint<S>(
    Extension(service): Extension<Arc<PaymentService<S>>>,
    Json(payload): Json<FeeIntakeRequest>,
) -> Result<(StatusCode, Json<Fee>), AppError>
where
    S: PaymentStore + 'static,
{
    let fee = service.register_fee(payload.into_fee()).await?;
    Ok((StatusCode::CREATED, Json(fee)))
}

pub(crate) async fn register_permit_endpoint<S>(
    Extension(service): Extension<Arc<PaymentService<S>>>,
    Json(payload): Json<PermitIntakeRequest>,
) -> Result<(StatusCode, Json<Permit>), AppError>
where
    S: PaymentStore + 'static,
{
    let permit = service.register_permit(payload.into_permit()).await?;
    Ok((StatusCode::CREATED, Json(permit)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use villapay::workflows::payments::{
        GatewayRegistry, InMemoryPaymentStore, PaymentError, PaymentPolicy,
    };

    fn build_service() -> Arc<PaymentService<InMemoryPaymentStore>> {
        let policy = PaymentPolicy::default();
        let gateways = GatewayRegistry::sandbox(&policy);
        Arc::new(PaymentService::new(
            Arc::new(InMemoryPaymentStore::new()),
            gateways,
            policy,
        ))
    }

    fn fee_payload(amount: Decimal) -> FeeIntakeRequest {
        FeeIntakeRequest {
            fee_id: "fee-2024-001".to_string(),
            kind: FeeKind::Monthly,
            amount,
            due_date: NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date"),
            status: None,
            paid_amount: None,
        }
    }

    #[tokio::test]
    async fn register_fee_endpoint_seeds_an_unpaid_record() {
        let service = build_service();

        let (status, Json(fee)) =
            register_fee_endpoint::<InMemoryPaymentStore>(
                Extension(service.clone()),
                Json(fee_payload(dec!(1000))),
            )
            .await
            .expect("fee registers");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(fee.status, FeeStatus::Unpaid);
        assert_eq!(fee.paid_amount, dec!(0));

        let stored = service
            .fee(&FeeId("fee-2024-001".to_string()))
            .await
            .expect("fee loads");
        assert_eq!(stored.amount, dec!(1000));
    }

    #[tokio::test]
    async fn register_fee_endpoint_rejects_nonpositive_amounts() {
        let service = build_service();

        let error = register_fee_endpoint::<InMemoryPaymentStore>(
            Extension(service),
            Json(fee_payload(dec!(0))),
        )
        .await
        .expect_err("zero amount is refused");

        assert!(matches!(
            error,
            AppError::Payment(PaymentError::NonPositiveAmount)
        ));
    }

    #[tokio::test]
    async fn register_permit_endpoint_creates_the_companion_road_fee() {
        let service = build_service();
        let payload = PermitIntakeRequest {
            permit_id: "permit-2024-001".to_string(),
            status: PermitStatus::Approved,
            road_fee_amount: Some(dec!(500)),
            road_fee_paid: false,
        };

        let (status, Json(permit)) =
            register_permit_endpoint::<InMemoryPaymentStore>(Extension(service.clone()), Json(payload))
                .await
                .expect("permit registers");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(permit.status, PermitStatus::Approved);

        let dues = service
            .assess_dues(&FeeId("permit-2024-001-road".to_string()))
            .await
            .expect("companion fee exists");
        assert_eq!(dues.total_due, dec!(500));
    }
}
