//! Registry Benchmarks — Hot-Path Performance Validation
//!
//! Benchmarks the domain functions that run on every poll tick and status
//! refresh: catalog lookups, confirmation folding, and session snapshots.
//!
//! Run with: cargo bench --bench registry_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use multichain_wallet_core::domain::chain::{ChainFilter, ChainRegistry, ProviderKind};
use multichain_wallet_core::domain::connection::{ConnectionSet, WalletConnection};
use multichain_wallet_core::domain::transaction::{MonitoredTransaction, TxReceipt};

const CHAINS: [&str; 5] = ["ethereum", "polygon", "arbitrum", "sepolia", "solana"];

/// Benchmark a catalog lookup for the last entry (worst case scan).
fn bench_catalog_lookup(c: &mut Criterion) {
    let registry = ChainRegistry::builtin();

    c.bench_function("catalog_lookup", |b| {
        b.iter(|| {
            let _chain = registry.lookup(black_box("solana-devnet"));
        });
    });
}

/// Benchmark the filtered catalog listing served to status consumers.
fn bench_catalog_list(c: &mut Criterion) {
    let registry = ChainRegistry::builtin();

    c.bench_function("catalog_list_mainnet", |b| {
        b.iter(|| {
            let _chains = registry.list(black_box(ChainFilter::Mainnet));
        });
    });
}

/// Benchmark folding head observations into one transaction until it
/// confirms twelve blocks deep.
fn bench_confirmation_fold(c: &mut Criterion) {
    let receipt = TxReceipt {
        block_number: 19_000_000,
        success: true,
        gas_used: Some(21_000),
    };

    c.bench_function("confirmation_fold_12_heads", |b| {
        b.iter(|| {
            let mut tx = MonitoredTransaction::pending(
                "0xbench".to_string(),
                "ethereum".to_string(),
                12,
            );
            for head in 19_000_000..19_000_013u64 {
                tx.observe_receipt(black_box(head), Some(&receipt));
            }
            tx
        });
    });
}

/// Benchmark connection set churn: fill, drop the active pairing.
fn bench_connection_churn(c: &mut Criterion) {
    c.bench_function("connection_set_churn", |b| {
        b.iter(|| {
            let mut set = ConnectionSet::new();
            for chain in CHAINS {
                set.insert(WalletConnection::established(
                    "0xbench".to_string(),
                    chain.to_string(),
                    ProviderKind::MetaMask,
                ));
            }
            set.remove(black_box("ethereum"));
            set
        });
    });
}

/// Benchmark serializing the persistence snapshot written on every
/// session mutation.
fn bench_snapshot_serialize(c: &mut Criterion) {
    let mut set = ConnectionSet::new();
    for chain in CHAINS {
        set.insert(WalletConnection::established(
            "0xbench".to_string(),
            chain.to_string(),
            ProviderKind::MetaMask,
        ));
    }
    let snapshot = set.to_persisted();

    c.bench_function("session_snapshot_to_json", |b| {
        b.iter(|| serde_json::to_string(black_box(&snapshot)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_catalog_lookup,
    bench_catalog_list,
    bench_confirmation_fold,
    bench_connection_churn,
    bench_snapshot_serialize,
);
criterion_main!(benches);
