//! # Prometheus Metrics
//!
//! Operational metrics for the wallet RPC server, scraped at `/metrics` on
//! the metrics port.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] prefixed with
//! `solace_wallet`.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use solace_wallet::rpc::methods::RpcMethod;
use solace_wallet::rpc::CallReport;

/// Label used for requests naming a method that does not exist.
const UNKNOWN_METHOD_LABEL: &str = "unknown";

/// Holds all Prometheus metric handles for the wallet RPC server.
#[derive(Clone)]
pub struct WalletMetrics {
    registry: Registry,
    /// JSON-RPC requests handled, by canonical method name.
    pub rpc_requests_total: IntCounterVec,
    /// JSON-RPC requests that failed, by error code.
    pub rpc_errors_total: IntCounterVec,
    /// Time spent in the worker per request.
    pub rpc_latency_seconds: Histogram,
    pub wallet_refresh_total: IntCounter,
    pub wallet_refresh_failures_total: IntCounter,
    /// Blockchain height as last seen by the wallet.
    pub wallet_height: IntGauge,
}

impl WalletMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("solace_wallet".into()), None)
            .expect("failed to create prometheus registry");

        let rpc_requests_total = IntCounterVec::new(
            Opts::new("rpc_requests_total", "Total JSON-RPC requests handled"),
            &["method"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(rpc_requests_total.clone()))
            .expect("metric registration");

        let rpc_errors_total = IntCounterVec::new(
            Opts::new("rpc_errors_total", "Total JSON-RPC requests answered with an error"),
            &["code"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(rpc_errors_total.clone()))
            .expect("metric registration");

        let rpc_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "rpc_latency_seconds",
                "Time the worker spent on one JSON-RPC request in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(rpc_latency_seconds.clone()))
            .expect("metric registration");

        let wallet_refresh_total =
            IntCounter::new("wallet_refresh_total", "Total periodic wallet refreshes attempted")
                .expect("metric creation");
        registry
            .register(Box::new(wallet_refresh_total.clone()))
            .expect("metric registration");

        let wallet_refresh_failures_total = IntCounter::new(
            "wallet_refresh_failures_total",
            "Total periodic wallet refreshes that failed",
        )
        .expect("metric creation");
        registry
            .register(Box::new(wallet_refresh_failures_total.clone()))
            .expect("metric registration");

        let wallet_height = IntGauge::new("wallet_height", "Blockchain height seen by the wallet")
            .expect("metric creation");
        registry
            .register(Box::new(wallet_height.clone()))
            .expect("metric registration");

        Self {
            registry,
            rpc_requests_total,
            rpc_errors_total,
            rpc_latency_seconds,
            wallet_refresh_total,
            wallet_refresh_failures_total,
            wallet_height,
        }
    }

    /// Records one handled request.
    pub fn observe_call(&self, report: &CallReport) {
        let method = if RpcMethod::ALL.iter().any(|m| m.name() == report.method) {
            report.method.as_str()
        } else {
            UNKNOWN_METHOD_LABEL
        };
        self.rpc_requests_total.with_label_values(&[method]).inc();
        if let Some(code) = report.error_code {
            self.rpc_errors_total
                .with_label_values(&[&code.to_string()])
                .inc();
        }
        self.rpc_latency_seconds.observe(report.elapsed_secs);
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for WalletMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers and the worker.
pub type SharedMetrics = Arc<WalletMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
