//! Transaction Monitor Use Case - Receipt Polling to Terminal State
//!
//! Tracks submitted transactions until they confirm, fail, or exceed their
//! wall-clock deadline. Each tracked hash owns one tokio task that races a
//! poll ticker against the deadline; reaching any terminal state tears the
//! task down exactly once. Counts are derived from the tracked set on
//! read, never stored.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::domain::chain::{ChainDescriptor, ChainId, ChainRegistry, TxHash};
use crate::domain::error::WalletError;
use crate::domain::network::TxCounts;
use crate::domain::transaction::{MonitorOptions, MonitoredTransaction, TxStatus};
use crate::ports::rpc_client::RpcClient;

/// Capacity of the transaction event channel.
const EVENT_CAPACITY: usize = 256;

/// Shared state between the monitor handle and its polling tasks.
struct TxInner<R: RpcClient> {
  rpc: Arc<R>,
  chains: Arc<ChainRegistry>,
  /// Every tracked transaction, terminal ones included until removed.
  transactions: RwLock<HashMap<TxHash, MonitoredTransaction>>,
  /// Snapshot published on registration and every observable change.
  events: broadcast::Sender<MonitoredTransaction>,
}

/// Supervises per-transaction polling tasks.
pub struct TransactionMonitor<R: RpcClient> {
  inner: Arc<TxInner<R>>,
  /// Live poll tasks keyed by hash; tasks remove their own entry on exit.
  tasks: Arc<Mutex<HashMap<TxHash, JoinHandle<()>>>>,
  /// Options applied when the caller does not override them.
  defaults: MonitorOptions,
}

impl<R: RpcClient> TransactionMonitor<R> {
  /// Create a monitor resolving chains against `chains`.
  pub fn new(rpc: Arc<R>, chains: Arc<ChainRegistry>, defaults: MonitorOptions) -> Self {
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    Self {
      inner: Arc::new(TxInner {
        rpc,
        chains,
        transactions: RwLock::new(HashMap::new()),
        events,
      }),
      tasks: Arc::new(Mutex::new(HashMap::new())),
      defaults,
    }
  }

  /// Track a transaction with the monitor's default options.
  pub async fn start_monitoring(&self, chain_id: &str, hash: &str) -> Result<bool, WalletError> {
    self.start_monitoring_with(chain_id, hash, self.defaults).await
  }

  /// Track a transaction until terminal or deadline.
  ///
  /// Returns Ok(true) when a poll task was started and Ok(false) when the
  /// hash is already tracked and still pending (the original deadline
  /// stands). A hash in a terminal state is re-registered from scratch.
  #[instrument(skip(self, options), fields(chain = %chain_id, tx = %hash))]
  pub async fn start_monitoring_with(
    &self,
    chain_id: &str,
    hash: &str,
    options: MonitorOptions,
  ) -> Result<bool, WalletError> {
    let chain = self
      .inner
      .chains
      .lookup(chain_id)
      .cloned()
      .ok_or_else(|| WalletError::UnsupportedChain { chain_id: chain_id.to_string() })?;

    // Holding the task map through registration + spawn keeps a finishing
    // task's self-removal ordered after our insert.
    let mut tasks = self.tasks.lock().await;

    {
      let mut txs = self.inner.transactions.write().await;
      if let Some(existing) = txs.get(hash) {
        if !existing.status.is_terminal() {
          debug!(tx = %hash, "Already monitored, registration ignored");
          return Ok(false);
        }
        // terminal entry: restart fresh
        txs.remove(hash);
        if let Some(stale) = tasks.remove(hash) {
          stale.abort();
        }
      }

      let tx = MonitoredTransaction::pending(
        hash.to_string(),
        chain.id.clone(),
        options.required_confirmations,
      );
      txs.insert(hash.to_string(), tx.clone());
      let _ = self.inner.events.send(tx);
    }

    let inner = Arc::clone(&self.inner);
    let task_map = Arc::clone(&self.tasks);
    let hash_owned = hash.to_string();
    let handle = tokio::spawn(async move {
      run_poll_loop(inner, &chain, &hash_owned, options).await;
      let mut tasks = task_map.lock().await;
      tasks.remove(&hash_owned);
    });
    tasks.insert(hash.to_string(), handle);

    info!(
      tx = %hash,
      required = options.required_confirmations,
      timeout_secs = options.timeout.as_secs(),
      "Transaction monitoring started"
    );
    Ok(true)
  }

  /// Stop tracking a hash and forget it entirely. Idempotent; returns
  /// whether the hash was tracked.
  #[instrument(skip(self))]
  pub async fn remove_transaction(&self, hash: &str) -> bool {
    let handle = {
      let mut tasks = self.tasks.lock().await;
      tasks.remove(hash)
    };
    if let Some(handle) = handle {
      handle.abort();
      let _ = handle.await;
    }

    let removed = {
      let mut txs = self.inner.transactions.write().await;
      txs.remove(hash)
    };
    if removed.is_some() {
      info!(tx = %hash, "Transaction removed from monitor");
    }
    removed.is_some()
  }

  /// One out-of-cycle poll for every pending transaction.
  ///
  /// Recovery hook after a connectivity gap; deadlines are not extended.
  /// Returns the number of transactions polled.
  #[instrument(skip(self))]
  pub async fn recheck_pending(&self) -> usize {
    let pending: Vec<(TxHash, ChainId)> = {
      let txs = self.inner.transactions.read().await;
      txs
        .values()
        .filter(|tx| tx.status == TxStatus::Pending)
        .map(|tx| (tx.hash.clone(), tx.chain_id.clone()))
        .collect()
    };

    let mut checked = 0;
    for (hash, chain_id) in pending {
      let Some(chain) = self.inner.chains.lookup(&chain_id).cloned() else {
        warn!(tx = %hash, chain = %chain_id, "Chain missing from catalog, skipping recheck");
        continue;
      };
      poll_once(&self.inner, &chain, &hash).await;
      checked += 1;
    }
    if checked > 0 {
      info!(checked, "Out-of-cycle recheck complete");
    }
    checked
  }

  /// Current snapshot of one tracked transaction.
  pub async fn get(&self, hash: &str) -> Option<MonitoredTransaction> {
    let txs = self.inner.transactions.read().await;
    txs.get(hash).cloned()
  }

  /// Every tracked transaction, oldest first.
  pub async fn transactions(&self) -> Vec<MonitoredTransaction> {
    let txs = self.inner.transactions.read().await;
    let mut all: Vec<MonitoredTransaction> = txs.values().cloned().collect();
    all.sort_by(|a, b| {
      a.started_at
        .cmp(&b.started_at)
        .then_with(|| a.hash.cmp(&b.hash))
    });
    all
  }

  /// Tracked transactions partitioned by state, computed on read.
  pub async fn counts(&self) -> TxCounts {
    let txs = self.inner.transactions.read().await;
    let mut counts = TxCounts::default();
    for tx in txs.values() {
      match tx.status {
        TxStatus::Pending => counts.pending += 1,
        TxStatus::Confirmed => counts.confirmed += 1,
        TxStatus::Failed => counts.failed += 1,
        TxStatus::Dropped => counts.dropped += 1,
      }
    }
    counts
  }

  /// Whether a poll task is live for the hash.
  pub async fn is_watching(&self, hash: &str) -> bool {
    let tasks = self.tasks.lock().await;
    tasks.contains_key(hash)
  }

  /// Subscribe to transaction snapshots (registration + every change).
  pub fn subscribe(&self) -> broadcast::Receiver<MonitoredTransaction> {
    self.inner.events.subscribe()
  }

  /// Abort every poll task, keeping tracked entries (shutdown path).
  pub async fn stop_all(&self) {
    let mut tasks = self.tasks.lock().await;
    for (_, handle) in tasks.drain() {
      handle.abort();
    }
  }
}

impl<R: RpcClient> Drop for TransactionMonitor<R> {
  fn drop(&mut self) {
    if let Ok(tasks) = self.tasks.try_lock() {
      for handle in tasks.values() {
        handle.abort();
      }
    }
  }
}

/// Poll ticker racing the drop deadline; exits on any terminal state.
async fn run_poll_loop<R: RpcClient>(
  inner: Arc<TxInner<R>>,
  chain: &ChainDescriptor,
  hash: &str,
  options: MonitorOptions,
) {
  let deadline = Instant::now() + options.timeout;
  let mut ticker = tokio::time::interval(options.poll_interval);
  loop {
    tokio::select! {
      biased;
      () = tokio::time::sleep_until(deadline) => {
        drop_expired(&inner, hash, options.timeout.as_secs()).await;
        break;
      }
      _ = ticker.tick() => {
        if poll_once(&inner, chain, hash).await {
          break;
        }
      }
    }
  }
}

/// Fetch receipt + head once and fold them into the tracked entry.
///
/// Returns true when polling should stop (terminal state reached, or the
/// entry disappeared). RPC errors are transient: logged, retried next tick.
async fn poll_once<R: RpcClient>(inner: &TxInner<R>, chain: &ChainDescriptor, hash: &str) -> bool {
  let receipt = match inner.rpc.transaction_receipt(chain, hash).await {
    Ok(receipt) => receipt,
    Err(e) => {
      debug!(tx = %hash, error = %e, "Receipt poll failed, will retry");
      return false;
    }
  };
  let Some(receipt) = receipt else {
    // unmined; no head fetch needed this tick
    return false;
  };
  let head = match inner.rpc.block_height(chain).await {
    Ok(head) => head,
    Err(e) => {
      debug!(tx = %hash, error = %e, "Head poll failed, will retry");
      return false;
    }
  };

  let (changed, snapshot) = {
    let mut txs = inner.transactions.write().await;
    let Some(tx) = txs.get_mut(hash) else {
      // removed while we were polling
      return true;
    };
    let changed = tx.observe_receipt(head, Some(&receipt));
    (changed, tx.clone())
  };

  if changed {
    let _ = inner.events.send(snapshot.clone());
  }
  if snapshot.status.is_terminal() {
    info!(
      tx = %hash,
      status = %snapshot.status,
      confirmations = snapshot.confirmations,
      "Transaction reached terminal state"
    );
    return true;
  }
  false
}

/// Mark a still-pending transaction dropped after its deadline.
async fn drop_expired<R: RpcClient>(inner: &TxInner<R>, hash: &str, timeout_secs: u64) {
  let snapshot = {
    let mut txs = inner.transactions.write().await;
    let Some(tx) = txs.get_mut(hash) else {
      return;
    };
    if !tx.mark_dropped(&format!("confirmation timeout after {timeout_secs}s")) {
      return;
    }
    tx.clone()
  };
  warn!(tx = %snapshot.hash, chain = %snapshot.chain_id, "Transaction dropped on timeout");
  let _ = inner.events.send(snapshot);
}
