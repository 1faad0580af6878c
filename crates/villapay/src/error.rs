use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::payments::repository::StoreError;
use crate::workflows::payments::service::PaymentError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Payment(PaymentError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Payment(err) => write!(f, "payment error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Payment(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Payment(err) => payment_status(err),
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Status classification for the payment error taxonomy. The workflow router
/// and the `AppError` response path both answer from this table so every
/// surface maps a given class the same way.
pub(crate) fn payment_status(error: &PaymentError) -> StatusCode {
    match error {
        PaymentError::UnknownFee(_)
        | PaymentError::UnknownPermit(_)
        | PaymentError::UnknownAttempt(_)
        | PaymentError::UnknownIntent(_)
        | PaymentError::ReceiptNotIssued(_) => StatusCode::NOT_FOUND,
        PaymentError::NonPositiveAmount
        | PaymentError::AmountExceedsOutstanding { .. }
        | PaymentError::BelowCategoryMinimum { .. }
        | PaymentError::InvalidDetails(_)
        | PaymentError::MissingRoadFee(_)
        | PaymentError::MissingIntent(_)
        | PaymentError::UnsupportedCategory(_)
        | PaymentError::Lifecycle(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PaymentError::PaymentInProgress => StatusCode::CONFLICT,
        PaymentError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        PaymentError::Gateway(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<PaymentError> for AppError {
    fn from(value: PaymentError) -> Self {
        Self::Payment(value)
    }
}
