//! Property-Based Tests - Domain Layer Invariants
//!
//! Uses `proptest` to verify that the connection set and the transaction
//! state machine maintain their invariants across random op sequences.

use proptest::prelude::*;

use multichain_wallet_core::domain::chain::{
    ChainFilter, ChainRegistry, ProviderKind, builtin_catalog,
};
use multichain_wallet_core::domain::connection::{ConnectionSet, PersistedSessions, WalletConnection};
use multichain_wallet_core::domain::transaction::{MonitoredTransaction, TxReceipt, TxStatus};

// ── Connection Set Properties ───────────────────────────────

const CHAIN_POOL: &[&str] = &["ethereum", "polygon", "arbitrum", "sepolia", "solana"];

#[derive(Debug, Clone)]
enum SetOp {
    Insert(usize),
    Remove(usize),
    SetActive(usize),
}

fn op_strategy() -> impl Strategy<Value = SetOp> {
    prop_oneof![
        (0..CHAIN_POOL.len()).prop_map(SetOp::Insert),
        (0..CHAIN_POOL.len()).prop_map(SetOp::Remove),
        (0..CHAIN_POOL.len()).prop_map(SetOp::SetActive),
    ]
}

fn apply(set: &mut ConnectionSet, op: &SetOp) {
    match op {
        SetOp::Insert(i) => set.insert(WalletConnection::established(
            format!("0xaddr{i}"),
            CHAIN_POOL[*i].to_string(),
            ProviderKind::MetaMask,
        )),
        SetOp::Remove(i) => {
            set.remove(CHAIN_POOL[*i]);
        }
        SetOp::SetActive(i) => {
            set.set_active(CHAIN_POOL[*i]);
        }
    }
}

proptest! {
    /// The active pairing always references a member, and a non-empty set
    /// always has one.
    #[test]
    fn active_always_references_member(
        ops in proptest::collection::vec(op_strategy(), 1..40),
    ) {
        let mut set = ConnectionSet::new();
        for op in &ops {
            apply(&mut set, op);
            match set.active_chain() {
                Some(active) => prop_assert!(
                    set.contains(active),
                    "active {active} not in set after {op:?}"
                ),
                None => prop_assert!(
                    set.is_empty(),
                    "non-empty set lost its active pairing after {op:?}"
                ),
            }
        }
    }

    /// No chain ever holds more than one connection.
    #[test]
    fn at_most_one_connection_per_chain(
        ops in proptest::collection::vec(op_strategy(), 1..40),
    ) {
        let mut set = ConnectionSet::new();
        for op in &ops {
            apply(&mut set, op);
        }
        let ordered = set.iter_ordered();
        for chain_id in CHAIN_POOL {
            let count = ordered.iter().filter(|c| c.chain_id == *chain_id).count();
            prop_assert!(count <= 1, "{chain_id} held {count} connections");
        }
        prop_assert!(set.len() <= CHAIN_POOL.len());
    }

    /// Persisting and rebuilding preserves membership and the active
    /// pairing, and marks every survivor as restored.
    #[test]
    fn persisted_snapshot_survives_round_trip(
        ops in proptest::collection::vec(op_strategy(), 1..40),
    ) {
        let mut set = ConnectionSet::new();
        for op in &ops {
            apply(&mut set, op);
        }

        let json = serde_json::to_string(&set.to_persisted()).unwrap();
        let parsed: PersistedSessions = serde_json::from_str(&json).unwrap();
        let rebuilt = ConnectionSet::from_persisted(parsed);

        prop_assert_eq!(rebuilt.len(), set.len());
        prop_assert_eq!(rebuilt.active_chain(), set.active_chain());
        for conn in set.iter_ordered() {
            prop_assert!(rebuilt.contains(&conn.chain_id));
        }
        for conn in rebuilt.iter_ordered() {
            prop_assert!(conn.restored, "{} came back unrestored", conn.chain_id);
        }
    }
}

// ── Transaction State Machine Properties ────────────────────

proptest! {
    /// Confirmations never decrease, whatever heads the endpoint reports,
    /// and a terminal outcome implies the required count was reached.
    #[test]
    fn confirmations_never_regress(
        block in 0u64..1000,
        required in 1u64..20,
        success in any::<bool>(),
        heads in proptest::collection::vec(0u64..2000, 1..30),
    ) {
        let mut tx = MonitoredTransaction::pending(
            "0xprop".to_string(),
            "ethereum".to_string(),
            required,
        );
        let receipt = TxReceipt { block_number: block, success, gas_used: None };

        let mut prev = 0;
        for head in heads {
            tx.observe_receipt(head, Some(&receipt));
            prop_assert!(
                tx.confirmations >= prev,
                "confirmations regressed {prev} -> {}",
                tx.confirmations
            );
            prev = tx.confirmations;
        }

        if matches!(tx.status, TxStatus::Confirmed | TxStatus::Failed) {
            prop_assert!(tx.confirmations >= required);
            prop_assert_eq!(tx.status == TxStatus::Confirmed, success);
        }
    }

    /// Once terminal, no observation or drop changes anything.
    #[test]
    fn terminal_states_are_frozen(
        required in 1u64..5,
        success in any::<bool>(),
        later_heads in proptest::collection::vec(0u64..5000, 1..10),
    ) {
        let mut tx = MonitoredTransaction::pending(
            "0xprop".to_string(),
            "ethereum".to_string(),
            required,
        );
        let receipt = TxReceipt { block_number: 100, success, gas_used: Some(1) };
        tx.observe_receipt(100 + required, Some(&receipt));
        prop_assert!(tx.status.is_terminal());

        let frozen = tx.clone();
        let flipped = TxReceipt { block_number: 100, success: !success, gas_used: Some(2) };
        for head in later_heads {
            tx.observe_receipt(head, Some(&flipped));
            tx.mark_dropped("late timeout");
            prop_assert_eq!(&tx, &frozen);
        }
    }

    /// A head behind the receipt block reports zero confirmations instead
    /// of wrapping.
    #[test]
    fn head_behind_receipt_reports_zero(
        block in 1u64..1000,
        lag in 1u64..100,
        required in 1u64..10,
    ) {
        let head = block.saturating_sub(lag);
        let mut tx = MonitoredTransaction::pending(
            "0xprop".to_string(),
            "ethereum".to_string(),
            required,
        );
        tx.observe_receipt(
            head,
            Some(&TxReceipt { block_number: block, success: true, gas_used: None }),
        );
        prop_assert_eq!(tx.confirmations, 0);
        prop_assert_eq!(tx.status, TxStatus::Pending);
    }
}

// ── Chain Registry Properties ───────────────────────────────

proptest! {
    /// Duplicate catalog ids never shadow the original entry.
    #[test]
    fn registry_dedup_first_wins(
        extra in proptest::collection::vec(0usize..6, 0..10),
    ) {
        let mut catalog = builtin_catalog();
        let base_len = catalog.len();
        for i in extra {
            let mut dup = catalog[i % base_len].clone();
            dup.name = format!("Shadow {}", dup.name);
            catalog.push(dup);
        }

        let registry = ChainRegistry::new(catalog);
        prop_assert_eq!(registry.len(), base_len);
        for chain in registry.list(ChainFilter::All) {
            prop_assert!(!chain.name.starts_with("Shadow"));
        }
    }

    /// Wallet-facing hex ids round-trip back to the numeric chain id.
    #[test]
    fn evm_hex_id_round_trips(id in 1u64..100_000_000) {
        let mut chain = builtin_catalog().remove(0);
        chain.evm_chain_id = Some(id);
        let hex = chain.evm_chain_id_hex().unwrap();
        prop_assert!(hex.starts_with("0x"));
        prop_assert_eq!(u64::from_str_radix(&hex[2..], 16).unwrap(), id);
    }
}
