use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_payment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use villapay::config::AppConfig;
use villapay::error::AppError;
use villapay::telemetry;
use villapay::workflows::payments::{
    CallbackPump, GatewayRegistry, InMemoryPaymentStore, PaymentPolicy, PaymentService,
};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let policy = PaymentPolicy::default();
    let gateways = GatewayRegistry::sandbox(&policy);
    let store = Arc::new(InMemoryPaymentStore::new());
    let payment_service = Arc::new(PaymentService::new(store, gateways, policy));
    let callback_pump = CallbackPump::start(payment_service.clone(), 64);

    let app = with_payment_routes(payment_service, callback_pump.sender())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "payment lifecycle engine ready");

    axum::serve(listener, app).await?;
    callback_pump.shutdown().await;
    Ok(())
}
