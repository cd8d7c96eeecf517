//! Transaction confirmation domain types.
//!
//! `MonitoredTransaction` is the per-transaction state machine driven by the
//! transaction monitor's polling loop: Pending until enough confirmations
//! accumulate, then Confirmed or Failed from the receipt outcome, or Dropped
//! when the deadline passes first. Terminal states are frozen; confirmation
//! counts never go backwards even when the reported chain head does.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::chain::{ChainId, TxHash};

/// Lifecycle state of a monitored transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// No receipt yet, or confirmations below the required count
    Pending,
    /// Receipt succeeded and confirmations reached the required count
    Confirmed,
    /// Receipt reverted and confirmations reached the required count
    Failed,
    /// Deadline passed while still pending
    Dropped,
}

impl TxStatus {
    /// Whether this state admits no further transitions.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Failed => write!(f, "failed"),
            Self::Dropped => write!(f, "dropped"),
        }
    }
}

/// Receipt fields the monitor needs, family-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Block (or slot) the transaction landed in
    pub block_number: u64,
    /// Execution outcome: true = succeeded, false = reverted
    pub success: bool,
    /// Gas consumed, where the chain reports it
    pub gas_used: Option<u64>,
}

/// Per-transaction monitoring knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorOptions {
    /// Confirmations needed before the outcome is accepted
    pub required_confirmations: u64,
    /// Wall-clock limit before the transaction is declared dropped
    pub timeout: std::time::Duration,
    /// Receipt poll cadence
    pub poll_interval: std::time::Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            required_confirmations: 1,
            timeout: std::time::Duration::from_secs(300),
            poll_interval: std::time::Duration::from_secs(3),
        }
    }
}

/// One tracked transaction and everything observed about it so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredTransaction {
    /// Transaction hash / signature
    pub hash: TxHash,
    /// Chain the transaction was submitted to
    pub chain_id: ChainId,
    /// Current lifecycle state
    pub status: TxStatus,
    /// Confirmations observed; non-decreasing while pending
    pub confirmations: u64,
    /// Confirmations needed before the outcome is accepted
    pub required_confirmations: u64,
    /// Block the receipt reported, once seen
    pub block_height: Option<u64>,
    /// Gas consumed, recorded at the terminal transition
    pub gas_used: Option<u64>,
    /// Failure / drop explanation
    pub error: Option<String>,
    /// When monitoring began
    pub started_at: DateTime<Utc>,
}

impl MonitoredTransaction {
    /// Registers a transaction as pending with nothing observed yet.
    pub fn pending(hash: TxHash, chain_id: ChainId, required_confirmations: u64) -> Self {
        Self {
            hash,
            chain_id,
            status: TxStatus::Pending,
            confirmations: 0,
            required_confirmations,
            block_height: None,
            gas_used: None,
            error: None,
            started_at: Utc::now(),
        }
    }

    /// Folds one poll observation into the state machine.
    ///
    /// `head` is the chain tip at poll time. Returns true when any
    /// observable field changed, so the caller knows to publish an event.
    /// Terminal transactions ignore every further observation.
    pub fn observe_receipt(&mut self, head: u64, receipt: Option<&TxReceipt>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        let Some(receipt) = receipt else {
            // not yet mined; nothing new to report
            return false;
        };

        // A head briefly behind the receipt block (lagging replica) must not
        // rewind the count.
        let observed = head.saturating_sub(receipt.block_number);
        let confirmations = self.confirmations.max(observed);

        let mut changed = false;
        if self.block_height != Some(receipt.block_number) {
            self.block_height = Some(receipt.block_number);
            changed = true;
        }
        if confirmations != self.confirmations {
            self.confirmations = confirmations;
            changed = true;
        }

        if confirmations >= self.required_confirmations {
            if receipt.success {
                self.status = TxStatus::Confirmed;
            } else {
                self.status = TxStatus::Failed;
                self.error = Some("execution reverted".to_string());
            }
            self.gas_used = receipt.gas_used;
            changed = true;
        }
        changed
    }

    /// Declares the transaction dropped (deadline passed).
    ///
    /// Only a pending transaction can be dropped; returns whether the
    /// transition happened.
    pub fn mark_dropped(&mut self, reason: &str) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TxStatus::Dropped;
        self.error = Some(reason.to_string());
        true
    }
}
