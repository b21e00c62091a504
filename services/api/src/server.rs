use crate::cli::ServeArgs;
use crate::infra::{seed_roster, AppState, LoggingNotificationSink};
use crate::routes::with_pulse_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use pulse_score::config::AppConfig;
use pulse_score::error::AppError;
use pulse_score::telemetry;
use pulse_score::workflows::pulse::{InMemoryPulseStore, PulseScoreService, UnitId};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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

    let store = InMemoryPulseStore::default();
    if let Some(unit) = args.seed_unit.take() {
        seed_roster(
            &store,
            &UnitId(unit),
            args.roster_size,
            args.contact.as_deref(),
        )?;
    }

    let scoring = config.scoring.clone();
    info!(
        min_participation = scoring.eligibility.min_participation_rate,
        min_score = scoring.eligibility.min_average_score,
        cooldown_months = scoring.eligibility.cooldown_months,
        zero_theme_policy = ?scoring.aggregation.zero_theme_policy,
        "scoring configuration loaded"
    );
    let pulse_service = Arc::new(PulseScoreService::new(
        Arc::new(store),
        Arc::new(LoggingNotificationSink::default()),
        scoring,
    ));

    let app = with_pulse_routes(pulse_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "pulse score service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
