//! Observability module for centralized metrics, tracing, and logging setup.
//!
//! This module provides:
//! - Metrics collection and Prometheus export
//! - Distributed tracing with OpenTelemetry
//! - Structured logging with configurable levels
//! - Health check endpoints for monitoring

pub mod health_checks;
pub mod metrics;
pub mod tracing_mod;

use anyhow::Result;
use sqlx::PgPool;

use crate::observability_config::ObservabilityConfig;

pub use self::metrics::{
    init_metrics_with_config, record_broadcast_metrics, record_db_metrics,
    record_health_check_metrics, record_request_metrics, record_startup_metrics,
    record_telegram_message, record_translation_metrics, record_words_fetched,
    start_metrics_server_with_health_checks, update_circuit_breaker_state,
};
pub use tracing_mod::{
    db_span, init_opentelemetry_tracing_with_config, init_tracing_with_config, scheduler_span,
    telegram_span,
};

/// Initialize the complete observability stack: logging, traces, metrics and
/// the metrics/health server. The readiness probe pings `db_pool` when given.
pub async fn init_observability_with_health_checks(
    config: &ObservabilityConfig,
    db_pool: Option<PgPool>,
) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    init_tracing_with_config(config)?;
    init_opentelemetry_tracing_with_config(config)?;

    if config.enable_metrics_export {
        let metrics_handle = init_metrics_with_config(config)?;
        start_metrics_server_with_health_checks(metrics_handle, config.metrics_port, db_pool)
            .await?;
    } else {
        tracing::info!("Metrics export disabled");
    }

    tracing::info!(
        environment = %config.environment,
        otlp_endpoint = ?config.otlp_endpoint,
        metrics_port = %config.metrics_port,
        "Observability stack initialized successfully"
    );
    Ok(())
}
