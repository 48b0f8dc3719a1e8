// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Prometheus metrics registry, served over an `axum` `/metrics` endpoint.
//!
//! Field/registration style mirrors the teacher's `monitoring::metrics`
//! exactly (one `IntCounter`/`IntGauge`/`Histogram` per concern, registered
//! by hand against a fresh `Registry`), renamed to the counters named in
//! the telemetry section of the expanded spec.

use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Metrics errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// A metric failed to construct or register against the registry.
    #[error("prometheus registration failed")]
    Prom,
}

/// Pulsar's metrics container.
#[derive(Clone)]
pub struct Metrics {
    /// Registry backing the `/metrics` endpoint.
    pub registry: Registry,
    /// Completed round phases, labeled by phase name.
    pub round_total: IntCounterVec,
    /// Winning commits to the ledger.
    pub commit_total: IntCounter,
    /// Rounds that failed to reach consensus.
    pub no_consensus_total: IntCounter,
    /// Envelopes that failed signature verification.
    pub verify_failed_total: IntCounter,
    /// Currently connected peers.
    pub peers_connected: IntGauge,
    /// Broadcast send latency, in milliseconds.
    pub broadcast_latency_ms: Histogram,
}

impl Metrics {
    /// Construct and register all metrics against a fresh registry.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let round_total = IntCounterVec::new(
            Opts::new("pulsar_round_total", "Completed round phases"),
            &["phase"],
        )
        .map_err(|_| MetricsError::Prom)?;
        let commit_total = IntCounter::new("pulsar_commit_total", "Winning commits to the ledger")
            .map_err(|_| MetricsError::Prom)?;
        let no_consensus_total = IntCounter::new(
            "pulsar_no_consensus_total",
            "Rounds that failed to reach consensus",
        )
        .map_err(|_| MetricsError::Prom)?;
        let verify_failed_total = IntCounter::new(
            "pulsar_verify_failed_total",
            "Envelopes that failed signature verification",
        )
        .map_err(|_| MetricsError::Prom)?;
        let peers_connected = IntGauge::new("pulsar_peers_connected", "Currently connected peers")
            .map_err(|_| MetricsError::Prom)?;
        let broadcast_latency_ms = Histogram::with_opts(HistogramOpts::new(
            "pulsar_broadcast_latency_ms",
            "Broadcast send latency in milliseconds",
        ))
        .map_err(|_| MetricsError::Prom)?;

        registry
            .register(Box::new(round_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(commit_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(no_consensus_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(verify_failed_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(peers_connected.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(broadcast_latency_ms.clone()))
            .map_err(|_| MetricsError::Prom)?;

        Ok(Self {
            registry,
            round_total,
            commit_total,
            no_consensus_total,
            verify_failed_total,
            peers_connected,
            broadcast_latency_ms,
        })
    }
}

async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<Arc<Metrics>>,
) -> String {
    let encoder = TextEncoder::new();
    let families = metrics.registry.gather();
    let mut buf = Vec::new();
    if let Err(err) = encoder.encode(&families, &mut buf) {
        error!(%err, "failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Serve the `/metrics` endpoint at `addr` forever.
pub async fn serve(addr: &str, metrics: Arc<Metrics>) -> std::io::Result<()> {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, "metrics endpoint listening");
    axum::serve(listener, app).await
}
