//! Multichain Wallet Core — Entry Point
//!
//! Initializes configuration, logging, the chain catalog, session
//! persistence, and the connection/network/transaction monitors.
//! Runs until SIGINT/SIGTERM.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Build chain registry (builtin catalog + config overrides)
//! 4. Open the FileStore session store in the data directory
//! 5. Create HttpRpcClient (shared by both monitors)
//! 6. Create NetworkMonitor + TransactionMonitor
//! 7. Register unattended wallet providers from config
//! 8. Restore persisted sessions, then open configured sessions
//! 9. Spawn health server (/live /ready /status) + Prometheus metrics
//! 10. Spawn event logger + status publisher tasks
//! 11. Wait for SIGINT → graceful shutdown (stop monitors, keep sessions)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

mod adapters;
mod config;
mod domain;
mod ports;
mod usecases;

use adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use adapters::persistence::FileStore;
use adapters::providers::UnattendedProvider;
use adapters::rpc::HttpRpcClient;
use domain::chain::{ChainRegistry, builtin_catalog};
use domain::network::{NetworkHealth, StatusReport};
use ports::store::KeyValueStore;
use ports::wallet_provider::ProviderDirectory;
use usecases::connection_registry::ConnectionRegistry;
use usecases::network_monitor::NetworkMonitor;
use usecases::transaction_monitor::TransactionMonitor;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config = config::loader::load_config("config.toml")
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.app.log_level)
                }),
        )
        .json()
        .init();

    info!(
        name = %config.app.name,
        version = env!("CARGO_PKG_VERSION"),
        providers = config.providers.len(),
        startup_sessions = config.sessions.len(),
        "Starting multichain wallet core"
    );

    // ── 3. Shutdown + status report channels ────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let (status_tx, status_rx) = watch::channel(StatusReport::default());

    // ── 4. Chain catalog with config overrides ──────────────
    let mut catalog = builtin_catalog();
    for chain_override in &config.chains {
        if let Some(chain) = catalog.iter_mut().find(|c| c.id == chain_override.id) {
            chain_override.apply(chain);
            info!(chain = %chain.id, rpc = %chain.rpc_url, "Chain endpoint overridden");
        }
    }
    let chains = Arc::new(ChainRegistry::new(catalog));

    // ── 5. Open the session store ───────────────────────────
    let store = Arc::new(
        FileStore::new(&config.persistence.data_dir)
            .await
            .context("Failed to open session store")?,
    );

    // ── 6. JSON-RPC client shared by both monitors ──────────
    let rpc = Arc::new(
        HttpRpcClient::new(config.rpc.http_config())
            .context("Failed to create RPC client")?,
    );

    // ── 7. Network + transaction monitors ───────────────────
    let network = Arc::new(NetworkMonitor::new(
        Arc::clone(&rpc),
        config.network.poll_interval(),
        config.network.probe_timeout(),
    ));
    let transactions = Arc::new(TransactionMonitor::new(
        Arc::clone(&rpc),
        Arc::clone(&chains),
        config.transactions.monitor_options(),
    ));

    // ── 8. Register unattended wallet providers ─────────────
    let mut providers = ProviderDirectory::new();
    for provider_cfg in &config.providers {
        providers.register(
            provider_cfg.kind,
            Arc::new(UnattendedProvider::new(
                provider_cfg.accounts.clone(),
                provider_cfg.known_chains.iter().cloned(),
            )),
        );
        info!(
            provider = %provider_cfg.kind,
            accounts = provider_cfg.accounts.len(),
            "Wallet provider registered"
        );
    }

    // ── 9. Connection registry + session restore ────────────
    let registry = Arc::new(ConnectionRegistry::new(
        Arc::clone(&chains),
        providers,
        Arc::clone(&store),
        Arc::clone(&network),
    ));

    match registry.restore().await {
        Ok(0) => info!("No persisted sessions to restore"),
        Ok(count) => info!(count, "Persisted sessions restored"),
        Err(e) => warn!(error = %e, "Session restore failed, starting clean"),
    }

    // ── 10. Open sessions declared in config ────────────────
    for session in &config.sessions {
        if registry.is_connected(&session.chain).await {
            debug!(chain = %session.chain, "Session already restored, skipping");
            continue;
        }
        match registry.connect(&session.chain, session.provider).await {
            Ok(conn) => {
                info!(chain = %conn.chain_id, address = %conn.address, "Startup session opened");
            }
            Err(e) => warn!(chain = %session.chain, error = %e, "Startup session failed"),
        }
    }

    // ── 11. Spawn health + metrics servers ──────────────────
    let health_state = Arc::new(HealthState::new());
    let health_server = HealthServer::new(
        Arc::clone(&health_state),
        status_rx,
        config.metrics.health_port,
    );
    let health_shutdown = shutdown_tx.subscribe();
    let health_handle = tokio::spawn(async move {
        if let Err(e) = health_server.run(health_shutdown).await {
            error!(error = %e, "Health server failed");
        }
    });

    let metrics = if config.metrics.enabled {
        let metrics = Arc::new(
            MetricsRegistry::new().context("Failed to build metrics registry")?,
        );
        let serve_metrics = Arc::clone(&metrics);
        let bind_address = config.metrics.bind_address.clone();
        let metrics_shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = serve_metrics.serve(bind_address, metrics_shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        });
        Some(metrics)
    } else {
        None
    };

    // ── 12. Spawn event logger feeding metrics ──────────────
    let logger_metrics = metrics.clone();
    let mut network_events = network.subscribe();
    let mut tx_events = transactions.subscribe();
    let mut connection_events = registry.subscribe();
    let mut logger_shutdown = shutdown_tx.subscribe();
    let logger_handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = logger_shutdown.recv() => break,
                event = network_events.recv() => match event {
                    Ok(status) => {
                        if let Some(m) = &logger_metrics {
                            m.record_network(&status);
                        }
                        debug!(
                            chain = %status.chain_id,
                            health = %status.health,
                            block = status.block_height,
                            "Network status"
                        );
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Network event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                event = tx_events.recv() => match event {
                    Ok(tx) => {
                        if let Some(m) = &logger_metrics {
                            m.record_transaction(&tx);
                        }
                        info!(
                            tx = %tx.hash,
                            chain = %tx.chain_id,
                            status = %tx.status,
                            confirmations = tx.confirmations,
                            "Transaction update"
                        );
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Transaction event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                event = connection_events.recv() => match event {
                    Ok(event) => info!(?event, "Connection event"),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Connection event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    });

    // ── 13. Spawn status publisher ──────────────────────────
    let report_registry = Arc::clone(&registry);
    let report_network = Arc::clone(&network);
    let report_transactions = Arc::clone(&transactions);
    let report_store = Arc::clone(&store);
    let report_health = Arc::clone(&health_state);
    let report_metrics = metrics.clone();
    let report_interval = config.network.poll_interval();
    let mut report_shutdown = shutdown_tx.subscribe();
    let status_handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(report_interval);
        loop {
            tokio::select! {
                _ = report_shutdown.recv() => break,
                _ = ticker.tick() => {
                    let connections = report_registry.connections().await;
                    let networks = report_network.statuses().await;
                    let counts = report_transactions.counts().await;

                    report_health
                        .store_healthy
                        .store(report_store.is_healthy().await, Ordering::Relaxed);
                    // unhealthy only when every monitored network errors out
                    let networks_ok = networks.is_empty()
                        || networks.iter().any(|s| s.health != NetworkHealth::Error);
                    report_health.networks_healthy.store(networks_ok, Ordering::Relaxed);

                    if let Some(m) = &report_metrics {
                        m.wallet_connections.set(connections.len() as i64);
                        m.set_transaction_counts(counts);
                    }

                    let report = StatusReport {
                        connections: connections.len(),
                        active_chain: report_registry.active().await.map(|c| c.chain_id),
                        networks,
                        transactions: counts,
                        generated_at: Some(chrono::Utc::now()),
                    };
                    let _ = status_tx.send(report);
                }
            }
        }
    });

    info!("All tasks spawned, wallet core is running");

    // ── 14. Wait for SIGINT or SIGTERM ──────────────────────
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("SIGINT received, initiating graceful shutdown");
        }
    }

    // ── Graceful shutdown (stop monitors, keep sessions) ────

    // 1. Signal all tasks to stop
    let _ = shutdown_tx.send(());
    info!("Shutdown signal broadcast to all tasks");

    // 2. Mark not ready (readiness probe → 503)
    health_state.networks_healthy.store(false, Ordering::Relaxed);

    // 3. Stop monitors; the session set stays persisted for the next start
    transactions.stop_all().await;
    network.stop_all().await;
    info!("Monitors stopped, sessions remain persisted");

    // 4. Wait for background tasks (up to 5s each)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), logger_handle).await;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), status_handle).await;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), health_handle).await;

    info!("Shutdown complete");
    Ok(())
}
