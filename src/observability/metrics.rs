//! Metrics collection and Prometheus export module.
//!
//! This module provides:
//! - Rate limiting and bearer authentication for the metrics endpoint
//! - Prometheus metrics server with liveness and readiness probes
//! - Recording functions for every metric the bot emits

use anyhow::Result;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use parking_lot::Mutex;
use sqlx::PgPool;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

use crate::observability_config::ObservabilityConfig;

/// Simple rate limiter for HTTP requests
#[derive(Debug)]
pub struct RateLimiter {
    requests: Mutex<HashMap<String, Vec<Instant>>>,
    max_requests: u32,
    window_secs: u64,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
            max_requests,
            window_secs,
        }
    }

    /// Check if request is allowed for the given IP
    pub fn is_allowed(&self, ip: &str) -> bool {
        let now = Instant::now();
        let window = Duration::from_secs(self.window_secs);

        let mut requests = self.requests.lock();
        // Forget clients whose whole window has expired
        requests.retain(|_, times| {
            times.retain(|&time| now.duration_since(time) < window);
            !times.is_empty()
        });

        let client_requests = requests.entry(ip.to_string()).or_default();
        if client_requests.len() >= self.max_requests as usize {
            return false;
        }

        client_requests.push(now);
        true
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.requests.lock().len()
    }
}

/// Check the bearer token; no token configured means open access
pub fn check_auth(headers: &hyper::HeaderMap, expected_token: Option<&str>) -> bool {
    let Some(expected) = expected_token else {
        return true;
    };

    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected)
}

/// Initialize metrics collection with Prometheus exporter and configuration
pub fn init_metrics_with_config(config: &ObservabilityConfig) -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    tracing::info!(
        metrics_enabled = %config.enable_metrics_export,
        "Metrics collection initialized"
    );
    Ok(handle)
}

fn text_response(status: hyper::StatusCode, body: impl Into<String>) -> hyper::Response<String> {
    let mut response = hyper::Response::new(body.into());
    *response.status_mut() = status;
    response
}

/// Start the metrics server with health checks
pub async fn start_metrics_server_with_health_checks(
    metrics_handle: PrometheusHandle,
    port: u16,
    db_pool: Option<PgPool>,
) -> Result<()> {
    // Localhost only unless explicitly configured
    let bind_all = std::env::var("METRICS_BIND_ALL_INTERFACES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    let addr = if bind_all {
        SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port)
    } else {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    };

    let auth_token: Option<Arc<str>> = std::env::var("METRICS_AUTH_TOKEN")
        .ok()
        .filter(|token| !token.is_empty())
        .map(Arc::from);

    // 10 requests per minute per IP
    let rate_limiter = Arc::new(RateLimiter::new(10, 60));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(bind_all = %bind_all, "Metrics server listening on {}", addr);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    let metrics_handle = metrics_handle.clone();
                    let db_pool = db_pool.clone();
                    let rate_limiter = rate_limiter.clone();
                    let auth_token = auth_token.clone();

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = hyper::service::service_fn(
                            move |req: hyper::Request<hyper::body::Incoming>| {
                                let metrics_handle = metrics_handle.clone();
                                let db_pool = db_pool.clone();
                                let rate_limiter = rate_limiter.clone();
                                let auth_token = auth_token.clone();
                                let peer_ip = peer_addr.ip().to_string();
                                async move {
                                    if !rate_limiter.is_allowed(&peer_ip) {
                                        return Ok::<_, std::convert::Infallible>(text_response(
                                            hyper::StatusCode::TOO_MANY_REQUESTS,
                                            "Rate limit exceeded",
                                        ));
                                    }

                                    if !check_auth(req.headers(), auth_token.as_deref()) {
                                        let mut response = text_response(
                                            hyper::StatusCode::UNAUTHORIZED,
                                            "Unauthorized",
                                        );
                                        response.headers_mut().insert(
                                            "www-authenticate",
                                            hyper::header::HeaderValue::from_static("Bearer"),
                                        );
                                        return Ok(response);
                                    }

                                    match (req.method(), req.uri().path()) {
                                        (&hyper::Method::GET, "/metrics") => {
                                            let mut response =
                                                hyper::Response::new(metrics_handle.render());
                                            response.headers_mut().insert(
                                                "content-type",
                                                hyper::header::HeaderValue::from_static(
                                                    "text/plain; version=0.0.4; charset=utf-8",
                                                ),
                                            );
                                            Ok(response)
                                        }
                                        (&hyper::Method::GET, "/health/live") => {
                                            Ok(text_response(hyper::StatusCode::OK, "OK"))
                                        }
                                        (&hyper::Method::GET, "/health/ready") => {
                                            match super::health_checks::perform_readiness_checks(
                                                db_pool.as_ref(),
                                            )
                                            .await
                                            {
                                                Ok(()) => {
                                                    Ok(text_response(hyper::StatusCode::OK, "OK"))
                                                }
                                                Err(e) => Ok(text_response(
                                                    hyper::StatusCode::SERVICE_UNAVAILABLE,
                                                    format!("NOT READY: {}", e),
                                                )),
                                            }
                                        }
                                        _ => Ok(text_response(
                                            hyper::StatusCode::NOT_FOUND,
                                            "Not Found",
                                        )),
                                    }
                                }
                            },
                        );

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await
                        {
                            crate::errors::error_logging::log_network_error(
                                &err,
                                "serve_http_connection",
                                Some(&peer_addr.to_string()),
                            );
                        }
                    });
                }
                Err(e) => {
                    crate::errors::error_logging::log_network_error(
                        &e,
                        "accept_tcp_connection",
                        Some(&addr.to_string()),
                    );
                }
            }
        }
    });

    Ok(())
}

/// Record database operation metrics
pub fn record_db_metrics(operation: &str, duration: Duration) {
    let operation = operation.to_string();
    metrics::counter!("db_operations_total", "operation" => operation).increment(1);
    metrics::histogram!("db_operation_duration_seconds").record(duration.as_secs_f64());
}

/// Record request metrics
pub fn record_request_metrics(method: &str, status: u16, duration: Duration) {
    let method = method.to_string();
    let status = status.to_string();
    metrics::counter!("requests_total", "method" => method, "status" => status).increment(1);
    metrics::histogram!("request_duration_seconds").record(duration.as_secs_f64());
}

/// Record health check metrics
pub fn record_health_check_metrics(check_type: &str, success: bool, duration: Duration) {
    let check_type = check_type.to_string();
    let result = if success { "success" } else { "failure" };
    metrics::counter!("health_checks_total", "type" => check_type.clone(), "result" => result)
        .increment(1);
    metrics::histogram!("health_check_duration_seconds", "type" => check_type.clone())
        .record(duration.as_secs_f64());
    metrics::gauge!("health_check_status", "type" => check_type).set(if success {
        1.0
    } else {
        0.0
    });
}

/// Update circuit breaker state metric
pub fn update_circuit_breaker_state(is_open: bool) {
    metrics::gauge!("translation_circuit_breaker_open").set(if is_open { 1.0 } else { 0.0 });
}

/// Record Telegram message processing metrics
pub fn record_telegram_message(message_type: &str) {
    let message_type = message_type.to_string();
    metrics::counter!("telegram_messages_total", "type" => message_type).increment(1);
}

/// Record where a translation came from ("static", "remote", "unavailable")
pub fn record_translation_metrics(source: &str) {
    let source = source.to_string();
    metrics::counter!("translations_total", "source" => source).increment(1);
}

/// Record a successful word fetch and which provider served it
pub fn record_words_fetched(provider: &str, count: usize) {
    let provider = provider.to_string();
    metrics::counter!("word_fetches_total", "provider" => provider.clone()).increment(1);
    metrics::histogram!("word_fetch_size", "provider" => provider).record(count as f64);
}

/// Record the outcome of one daily broadcast pass
pub fn record_broadcast_metrics(delivered: usize, failed: usize, skipped: usize) {
    metrics::counter!("daily_broadcasts_total").increment(1);
    metrics::counter!("daily_messages_total", "result" => "delivered").increment(delivered as u64);
    metrics::counter!("daily_messages_total", "result" => "failed").increment(failed as u64);
    metrics::counter!("daily_messages_total", "result" => "skipped").increment(skipped as u64);
}

/// Record application startup metrics
pub fn record_startup_metrics(duration: Duration) {
    metrics::histogram!("application_startup_duration_seconds").record(duration.as_secs_f64());
    metrics::counter!("application_starts_total").increment(1);
}
