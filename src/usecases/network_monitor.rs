//! Network Monitor Use Case - Per-Chain RPC Liveness Polling
//!
//! Runs one polling loop per monitored chain. Every tick issues a single
//! timeout-wrapped health probe (chain head + measured latency) and
//! publishes the resulting status snapshot; probe failures flip the status
//! to error and are retried next tick, never propagated. Loops are
//! independent tokio tasks, so a hanging endpoint on one chain cannot
//! delay another.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::domain::chain::{ChainDescriptor, ChainId};
use crate::domain::network::NetworkStatus;
use crate::ports::rpc_client::RpcClient;

/// Capacity of the status event channel; a slow subscriber lags, the
/// monitor never blocks.
const EVENT_CAPACITY: usize = 256;

/// Performs one liveness check against a chain's RPC endpoint.
pub struct HealthProber<R: RpcClient> {
  rpc: Arc<R>,
  /// Upper bound on a single probe round trip.
  probe_timeout: Duration,
}

impl<R: RpcClient> HealthProber<R> {
  /// Create a prober with the given per-probe timeout.
  pub fn new(rpc: Arc<R>, probe_timeout: Duration) -> Self {
    Self { rpc, probe_timeout }
  }

  /// Probe the chain head once, measuring round-trip latency.
  ///
  /// Never fails: transport errors and timeouts come back as an error
  /// status snapshot for the caller to publish.
  pub async fn probe(&self, chain: &ChainDescriptor) -> NetworkStatus {
    let started = Instant::now();
    let result = tokio::time::timeout(self.probe_timeout, self.rpc.block_height(chain)).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    match result {
      Ok(Ok(height)) => NetworkStatus::connected(chain.id.clone(), height, latency_ms),
      Ok(Err(e)) => {
        debug!(chain = %chain.id, error = %e, "Health probe failed");
        NetworkStatus::errored(chain.id.clone(), latency_ms, e.to_string())
      }
      Err(_) => {
        debug!(chain = %chain.id, timeout_ms = self.probe_timeout.as_millis() as u64, "Health probe timed out");
        NetworkStatus::errored(
          chain.id.clone(),
          latency_ms,
          format!("probe timed out after {} ms", self.probe_timeout.as_millis()),
        )
      }
    }
  }
}

/// Shared state between the monitor handle and its polling tasks.
struct MonitorInner<R: RpcClient> {
  prober: HealthProber<R>,
  /// Latest snapshot per monitored chain.
  statuses: RwLock<HashMap<ChainId, NetworkStatus>>,
  /// Every published snapshot, fanned out to subscribers.
  events: broadcast::Sender<NetworkStatus>,
  /// Poll cadence shared by all chains.
  poll_interval: Duration,
}

/// Supervises the per-chain polling loops.
pub struct NetworkMonitor<R: RpcClient> {
  inner: Arc<MonitorInner<R>>,
  /// Live polling tasks keyed by chain id.
  tasks: Mutex<HashMap<ChainId, JoinHandle<()>>>,
}

impl<R: RpcClient> NetworkMonitor<R> {
  /// Create a monitor polling every `poll_interval` with `probe_timeout`
  /// per probe.
  pub fn new(rpc: Arc<R>, poll_interval: Duration, probe_timeout: Duration) -> Self {
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    Self {
      inner: Arc::new(MonitorInner {
        prober: HealthProber::new(rpc, probe_timeout),
        statuses: RwLock::new(HashMap::new()),
        events,
        poll_interval,
      }),
      tasks: Mutex::new(HashMap::new()),
    }
  }

  /// Start polling a chain. Idempotent; returns false when the chain is
  /// already monitored.
  ///
  /// The first probe fires immediately; until it lands the published
  /// status is `Connecting`.
  #[instrument(skip(self, chain), fields(chain = %chain.id))]
  pub async fn start(&self, chain: ChainDescriptor) -> bool {
    let mut tasks = self.tasks.lock().await;
    if tasks.contains_key(&chain.id) {
      debug!(chain = %chain.id, "Already monitoring, start ignored");
      return false;
    }

    let initial = NetworkStatus::connecting(chain.id.clone());
    {
      let mut statuses = self.inner.statuses.write().await;
      statuses.insert(chain.id.clone(), initial.clone());
    }
    let _ = self.inner.events.send(initial);

    let inner = Arc::clone(&self.inner);
    let chain_id = chain.id.clone();
    let handle = tokio::spawn(async move {
      let mut ticker = tokio::time::interval(inner.poll_interval);
      loop {
        ticker.tick().await;
        let status = inner.prober.probe(&chain).await;
        {
          let mut statuses = inner.statuses.write().await;
          statuses.insert(chain.id.clone(), status.clone());
        }
        let _ = inner.events.send(status);
      }
    });

    tasks.insert(chain_id.clone(), handle);
    info!(chain = %chain_id, "Network monitoring started");
    true
  }

  /// Stop polling a chain and drop its status. Idempotent; returns false
  /// when the chain was not monitored.
  ///
  /// The loop task is awaited after abort, so no probe for the chain can
  /// land once this returns. Subscribers see a final disconnected event.
  #[instrument(skip(self))]
  pub async fn stop(&self, chain_id: &str) -> bool {
    let handle = {
      let mut tasks = self.tasks.lock().await;
      tasks.remove(chain_id)
    };
    let Some(handle) = handle else {
      debug!(chain = %chain_id, "Not monitored, stop ignored");
      return false;
    };

    handle.abort();
    let _ = handle.await;

    {
      let mut statuses = self.inner.statuses.write().await;
      statuses.remove(chain_id);
    }
    let _ = self
      .inner
      .events
      .send(NetworkStatus::disconnected(chain_id.to_string()));

    info!(chain = %chain_id, "Network monitoring stopped");
    true
  }

  /// Stop every polling loop (shutdown path).
  pub async fn stop_all(&self) {
    let chain_ids: Vec<ChainId> = {
      let tasks = self.tasks.lock().await;
      tasks.keys().cloned().collect()
    };
    for chain_id in chain_ids {
      self.stop(&chain_id).await;
    }
  }

  /// Latest status for a chain, if monitored.
  pub async fn status(&self, chain_id: &str) -> Option<NetworkStatus> {
    let statuses = self.inner.statuses.read().await;
    statuses.get(chain_id).cloned()
  }

  /// Latest status for every monitored chain, ordered by chain id.
  pub async fn statuses(&self) -> Vec<NetworkStatus> {
    let statuses = self.inner.statuses.read().await;
    let mut all: Vec<NetworkStatus> = statuses.values().cloned().collect();
    all.sort_by(|a, b| a.chain_id.cmp(&b.chain_id));
    all
  }

  /// Whether a polling loop is live for the chain.
  pub async fn is_monitoring(&self, chain_id: &str) -> bool {
    let tasks = self.tasks.lock().await;
    tasks.contains_key(chain_id)
  }

  /// Subscribe to every published status snapshot.
  pub fn subscribe(&self) -> broadcast::Receiver<NetworkStatus> {
    self.inner.events.subscribe()
  }
}

impl<R: RpcClient> Drop for NetworkMonitor<R> {
  fn drop(&mut self) {
    // Tasks hold Arc<MonitorInner>, not the monitor itself; abort what we
    // can reach synchronously so loops die with their supervisor.
    if let Ok(tasks) = self.tasks.try_lock() {
      for handle in tasks.values() {
        handle.abort();
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::chain::ChainRegistry;
  use crate::domain::error::RpcError;
  use crate::domain::network::NetworkHealth;
  use crate::domain::transaction::TxReceipt;
  use async_trait::async_trait;
  use std::sync::atomic::{AtomicU64, Ordering};

  /// RPC stub: rising head per call, with selectable failing chains.
  struct StubRpc {
    /// Calls served so far.
    calls: AtomicU64,
    /// Chains whose probes fail with a transport error.
    fail_chains: Vec<String>,
    /// When set, every call sleeps this long first.
    delay: Option<Duration>,
  }

  impl StubRpc {
    fn healthy() -> Self {
      Self { calls: AtomicU64::new(0), fail_chains: Vec::new(), delay: None }
    }

    fn failing_for(chain_id: &str) -> Self {
      Self {
        calls: AtomicU64::new(0),
        fail_chains: vec![chain_id.to_string()],
        delay: None,
      }
    }

    fn hanging(delay: Duration) -> Self {
      Self { calls: AtomicU64::new(0), fail_chains: Vec::new(), delay: Some(delay) }
    }
  }

  #[async_trait]
  impl RpcClient for StubRpc {
    async fn block_height(&self, chain: &ChainDescriptor) -> Result<u64, RpcError> {
      if let Some(delay) = self.delay {
        tokio::time::sleep(delay).await;
      }
      let n = self.calls.fetch_add(1, Ordering::SeqCst);
      if self.fail_chains.contains(&chain.id) {
        return Err(RpcError::Transport("connection refused".to_string()));
      }
      Ok(1000 + n)
    }

    async fn transaction_receipt(
      &self,
      _chain: &ChainDescriptor,
      _hash: &str,
    ) -> Result<Option<TxReceipt>, RpcError> {
      Ok(None)
    }
  }

  fn chain(id: &str) -> ChainDescriptor {
    ChainRegistry::builtin().lookup(id).unwrap().clone()
  }

  #[tokio::test]
  async fn test_probe_success_reports_height_and_latency() {
    let prober = HealthProber::new(Arc::new(StubRpc::healthy()), Duration::from_secs(1));
    let status = prober.probe(&chain("ethereum")).await;
    assert_eq!(status.health, NetworkHealth::Connected);
    assert_eq!(status.block_height, Some(1000));
    assert!(status.latency_ms.is_some());
  }

  #[tokio::test]
  async fn test_probe_error_reports_message() {
    let prober = HealthProber::new(
      Arc::new(StubRpc::failing_for("ethereum")),
      Duration::from_secs(1),
    );
    let status = prober.probe(&chain("ethereum")).await;
    assert_eq!(status.health, NetworkHealth::Error);
    assert!(status.error.as_deref().unwrap().contains("connection refused"));
    assert!(status.block_height.is_none());
  }

  #[tokio::test]
  async fn test_probe_timeout_reports_error() {
    let prober = HealthProber::new(
      Arc::new(StubRpc::hanging(Duration::from_secs(5))),
      Duration::from_millis(50),
    );
    let status = prober.probe(&chain("ethereum")).await;
    assert_eq!(status.health, NetworkHealth::Error);
    assert!(status.error.as_deref().unwrap().contains("timed out"));
  }

  #[tokio::test]
  async fn test_start_publishes_connecting_then_connected() {
    let monitor = NetworkMonitor::new(
      Arc::new(StubRpc::healthy()),
      Duration::from_millis(25),
      Duration::from_secs(1),
    );
    let mut events = monitor.subscribe();

    assert!(monitor.start(chain("ethereum")).await);
    let first = events.recv().await.unwrap();
    assert_eq!(first.health, NetworkHealth::Connecting);
    let second = events.recv().await.unwrap();
    assert_eq!(second.health, NetworkHealth::Connected);

    monitor.stop("ethereum").await;
  }

  #[tokio::test]
  async fn test_start_is_idempotent() {
    let monitor = NetworkMonitor::new(
      Arc::new(StubRpc::healthy()),
      Duration::from_millis(25),
      Duration::from_secs(1),
    );
    assert!(monitor.start(chain("ethereum")).await);
    assert!(!monitor.start(chain("ethereum")).await);
    monitor.stop_all().await;
  }

  #[tokio::test]
  async fn test_stop_removes_status_and_emits_disconnected() {
    let monitor = NetworkMonitor::new(
      Arc::new(StubRpc::healthy()),
      Duration::from_millis(25),
      Duration::from_secs(1),
    );
    monitor.start(chain("ethereum")).await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(monitor.status("ethereum").await.is_some());

    assert!(monitor.stop("ethereum").await);
    assert!(monitor.status("ethereum").await.is_none());
    assert!(!monitor.is_monitoring("ethereum").await);

    // stop again is a quiet no-op
    assert!(!monitor.stop("ethereum").await);
  }

  #[tokio::test]
  async fn test_erroring_chain_does_not_disturb_healthy_chain() {
    // one client, one monitor: polygon's endpoint is down, ethereum's is fine
    let monitor = NetworkMonitor::new(
      Arc::new(StubRpc::failing_for("polygon")),
      Duration::from_millis(25),
      Duration::from_secs(1),
    );

    monitor.start(chain("ethereum")).await;
    monitor.start(chain("polygon")).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let healthy = monitor.status("ethereum").await.unwrap();
    assert_eq!(healthy.health, NetworkHealth::Connected);
    let errored = monitor.status("polygon").await.unwrap();
    assert_eq!(errored.health, NetworkHealth::Error);
    assert!(monitor.is_monitoring("ethereum").await);

    monitor.stop_all().await;
  }
}
