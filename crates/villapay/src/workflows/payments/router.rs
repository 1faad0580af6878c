use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tokio::sync::mpsc;

use crate::error::payment_status;

use super::domain::{AttemptId, FeeId, PaymentRequest, PermitId, WorkerPassRequest};
use super::events::GatewayEvent;
use super::repository::PaymentStore;
use super::service::{PaymentError, PaymentService};

/// Shared state for the payment routes: the service itself plus the channel
/// that hands gateway callbacks to the ingest worker.
pub struct PaymentsState<S> {
    pub(crate) service: Arc<PaymentService<S>>,
    pub(crate) callbacks: mpsc::Sender<GatewayEvent>,
}

impl<S> Clone for PaymentsState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            callbacks: self.callbacks.clone(),
        }
    }
}

/// Router builder exposing HTTP endpoints for submissions, attempt state,
/// receipts, dues, callbacks, and worker passes.
pub fn payments_router<S>(
    service: Arc<PaymentService<S>>,
    callbacks: mpsc::Sender<GatewayEvent>,
) -> Router
where
    S: PaymentStore + 'static,
{
    let state = PaymentsState { service, callbacks };
    Router::new()
        .route("/api/v1/payments", post(submit_handler::<S>))
        .route("/api/v1/payments/callbacks", post(callback_handler::<S>))
        .route("/api/v1/payments/:attempt_id", get(status_handler::<S>))
        .route(
            "/api/v1/payments/:attempt_id/refresh",
            post(refresh_handler::<S>),
        )
        .route(
            "/api/v1/payments/:attempt_id/receipt",
            get(receipt_handler::<S>),
        )
        .route("/api/v1/fees/:fee_id/dues", get(dues_handler::<S>))
        .route(
            "/api/v1/permits/:permit_id/worker-passes",
            post(create_worker_pass_handler::<S>).get(list_worker_passes_handler::<S>),
        )
        .with_state(state)
}

pub(crate) async fn submit_handler<S>(
    State(state): State<PaymentsState<S>>,
    axum::Json(request): axum::Json<PaymentRequest>,
) -> Response
where
    S: PaymentStore + 'static,
{
    match state.service.submit(request).await {
        Ok(view) => (StatusCode::ACCEPTED, axum::Json(view)).into_response(),
        Err(error) => payment_error_response(error),
    }
}

pub(crate) async fn status_handler<S>(
    State(state): State<PaymentsState<S>>,
    Path(attempt_id): Path<String>,
) -> Response
where
    S: PaymentStore + 'static,
{
    let id = AttemptId(attempt_id);
    match state.service.attempt_status(&id).await {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => payment_error_response(error),
    }
}

pub(crate) async fn refresh_handler<S>(
    State(state): State<PaymentsState<S>>,
    Path(attempt_id): Path<String>,
) -> Response
where
    S: PaymentStore + 'static,
{
    let id = AttemptId(attempt_id);
    match state.service.refresh(&id).await {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => payment_error_response(error),
    }
}

/// Accepts processor callbacks and queues them for the ingest worker. The
/// response only acknowledges receipt; application happens asynchronously.
pub(crate) async fn callback_handler<S>(
    State(state): State<PaymentsState<S>>,
    axum::Json(event): axum::Json<GatewayEvent>,
) -> Response
where
    S: PaymentStore + 'static,
{
    match state.callbacks.send(event).await {
        Ok(()) => {
            let payload = json!({ "status": "accepted" });
            (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
        }
        Err(_) => {
            let payload = json!({ "error": "callback intake is not running" });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn receipt_handler<S>(
    State(state): State<PaymentsState<S>>,
    Path(attempt_id): Path<String>,
) -> Response
where
    S: PaymentStore + 'static,
{
    let id = AttemptId(attempt_id);
    match state.service.receipt(&id).await {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error) => payment_error_response(error),
    }
}

pub(crate) async fn dues_handler<S>(
    State(state): State<PaymentsState<S>>,
    Path(fee_id): Path<String>,
) -> Response
where
    S: PaymentStore + 'static,
{
    let id = FeeId(fee_id);
    match state.service.assess_dues(&id).await {
        Ok(assessment) => (StatusCode::OK, axum::Json(assessment)).into_response(),
        Err(error) => payment_error_response(error),
    }
}

pub(crate) async fn create_worker_pass_handler<S>(
    State(state): State<PaymentsState<S>>,
    Path(permit_id): Path<String>,
    axum::Json(request): axum::Json<WorkerPassRequest>,
) -> Response
where
    S: PaymentStore + 'static,
{
    let id = PermitId(permit_id);
    match state
        .service
        .schedule_worker_pass(&id, request.worker_name)
        .await
    {
        Ok(pass) => (StatusCode::CREATED, axum::Json(pass)).into_response(),
        Err(error) => payment_error_response(error),
    }
}

pub(crate) async fn list_worker_passes_handler<S>(
    State(state): State<PaymentsState<S>>,
    Path(permit_id): Path<String>,
) -> Response
where
    S: PaymentStore + 'static,
{
    let id = PermitId(permit_id);
    match state.service.worker_passes(&id).await {
        Ok(passes) => (StatusCode::OK, axum::Json(passes)).into_response(),
        Err(error) => payment_error_response(error),
    }
}

fn payment_error_response(error: PaymentError) -> Response {
    let status = payment_status(&error);
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
