//! Prometheus Metrics Registry - Wallet Observability
//!
//! Registers and exposes Prometheus metrics on :9090 for Grafana
//! dashboards. Covers RPC probe latency, chain head heights, wallet
//! connection counts, and transaction lifecycle outcomes.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, IntGauge,
    Opts, Registry, TextEncoder,
};
use tokio::sync::broadcast;
use tracing::{info, instrument};

use crate::domain::network::{NetworkStatus, TxCounts};
use crate::domain::transaction::MonitoredTransaction;

/// Centralized Prometheus metrics for the wallet core.
///
/// All metrics follow the naming convention `wallet_core_*` and include
/// chain labels for multi-chain filtering.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// RPC probe round-trip latency histogram (milliseconds).
    pub probe_latency_ms: HistogramVec,
    /// Total RPC probes by outcome.
    pub probes_total: IntCounterVec,
    /// Last observed chain head per chain.
    pub block_height: GaugeVec,
    /// Network reachability per chain (1 = connected, 0 = down).
    pub network_up: GaugeVec,
    /// Wallet connections currently held.
    pub wallet_connections: IntGauge,
    /// Tracked transactions by lifecycle state.
    pub transactions: GaugeVec,
    /// Transactions that reached a terminal state.
    pub transactions_finished: IntCounterVec,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let probe_latency_ms = HistogramVec::new(
            HistogramOpts::new(
                "wallet_core_probe_latency_ms",
                "RPC health probe round-trip latency in milliseconds",
            )
            .buckets(vec![
                5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0,
            ]),
            &["chain"],
        )?;

        let probes_total = IntCounterVec::new(
            Opts::new("wallet_core_probes_total", "Total RPC health probes"),
            &["chain", "outcome"],
        )?;

        let block_height = GaugeVec::new(
            Opts::new(
                "wallet_core_block_height",
                "Last observed chain head (block number or slot)",
            ),
            &["chain"],
        )?;

        let network_up = GaugeVec::new(
            Opts::new(
                "wallet_core_network_up",
                "Network reachability (1=connected, 0=down)",
            ),
            &["chain"],
        )?;

        let wallet_connections = IntGauge::new(
            "wallet_core_connections",
            "Wallet connections currently held",
        )?;

        let transactions = GaugeVec::new(
            Opts::new(
                "wallet_core_transactions",
                "Tracked transactions by lifecycle state",
            ),
            &["status"],
        )?;

        let transactions_finished = IntCounterVec::new(
            Opts::new(
                "wallet_core_transactions_finished_total",
                "Transactions that reached a terminal state",
            ),
            &["chain", "status"],
        )?;

        // Register all metrics
        registry.register(Box::new(probe_latency_ms.clone()))?;
        registry.register(Box::new(probes_total.clone()))?;
        registry.register(Box::new(block_height.clone()))?;
        registry.register(Box::new(network_up.clone()))?;
        registry.register(Box::new(wallet_connections.clone()))?;
        registry.register(Box::new(transactions.clone()))?;
        registry.register(Box::new(transactions_finished.clone()))?;

        Ok(Self {
            registry,
            probe_latency_ms,
            probes_total,
            block_height,
            network_up,
            wallet_connections,
            transactions,
            transactions_finished,
        })
    }

    /// Record one network status snapshot.
    pub fn record_network(&self, status: &NetworkStatus) {
        let chain = status.chain_id.as_str();
        let outcome = if status.is_healthy() { "ok" } else { "error" };
        self.probes_total.with_label_values(&[chain, outcome]).inc();
        self.network_up
            .with_label_values(&[chain])
            .set(if status.is_healthy() { 1.0 } else { 0.0 });
        if let Some(latency) = status.latency_ms {
            self.probe_latency_ms
                .with_label_values(&[chain])
                .observe(latency as f64);
        }
        if let Some(height) = status.block_height {
            self.block_height
                .with_label_values(&[chain])
                .set(height as f64);
        }
    }

    /// Record one transaction update; counts terminal transitions.
    pub fn record_transaction(&self, tx: &MonitoredTransaction) {
        if tx.status.is_terminal() {
            self.transactions_finished
                .with_label_values(&[tx.chain_id.as_str(), &tx.status.to_string()])
                .inc();
        }
    }

    /// Refresh the per-state transaction gauges from a counts snapshot.
    pub fn set_transaction_counts(&self, counts: TxCounts) {
        self.transactions
            .with_label_values(&["pending"])
            .set(counts.pending as f64);
        self.transactions
            .with_label_values(&["confirmed"])
            .set(counts.confirmed as f64);
        self.transactions
            .with_label_values(&["failed"])
            .set(counts.failed as f64);
        self.transactions
            .with_label_values(&["dropped"])
            .set(counts.dropped as f64);
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let registry = metrics_self.registry.clone();
                async move {
                    let encoder = TextEncoder::new();
                    let metric_families = registry.gather();
                    let mut buffer = Vec::new();
                    encoder.encode(&metric_families, &mut buffer).unwrap();
                    String::from_utf8(buffer).unwrap_or_default()
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::TxStatus;

    #[test]
    fn test_record_network_updates_gauges() {
        let metrics = MetricsRegistry::new().unwrap();
        let status = NetworkStatus::connected("ethereum".to_string(), 19_000_000, 42);
        metrics.record_network(&status);

        assert!(
            (metrics.network_up.with_label_values(&["ethereum"]).get() - 1.0).abs()
                < f64::EPSILON
        );
        assert!(
            (metrics.block_height.with_label_values(&["ethereum"]).get()
                - 19_000_000.0)
                .abs()
                < f64::EPSILON
        );
        assert_eq!(
            metrics.probes_total.with_label_values(&["ethereum", "ok"]).get(),
            1
        );
    }

    #[test]
    fn test_terminal_transaction_counted_once() {
        let metrics = MetricsRegistry::new().unwrap();
        let mut tx = MonitoredTransaction::pending(
            "0xabc".to_string(),
            "polygon".to_string(),
            1,
        );
        metrics.record_transaction(&tx);
        assert_eq!(
            metrics
                .transactions_finished
                .with_label_values(&["polygon", "confirmed"])
                .get(),
            0
        );

        tx.status = TxStatus::Confirmed;
        metrics.record_transaction(&tx);
        assert_eq!(
            metrics
                .transactions_finished
                .with_label_values(&["polygon", "confirmed"])
                .get(),
            1
        );
    }
}
