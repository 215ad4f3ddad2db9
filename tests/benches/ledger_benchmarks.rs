//! # Asset Ledger Benchmarks
//!
//! | Operation | What dominates |
//! |-----------|----------------|
//! | create_unit | reservation checks + one guarded batch + recompute |
//! | transfer round trip | two guarded batches + two recomputes |
//! | recompute | full scan of one group's units |
//! | sync | pool creation/removal in one batch |

use asset_ledger::test_utils::{make_test_service, TestLedger};
use asset_ledger::{AssetLedgerApi, NewUnit, OwnerRef, RecomputeMode, TransferRequest};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shared_types::{GroupKey, TransferType};
use std::time::Duration;

fn stocked(count: u64) -> TestLedger {
    let (ledger, _) = make_test_service();
    if count > 0 {
        ledger
            .sync_admin_stock_units(&sims(), count, "bench", &"A1".into())
            .expect("stock");
    }
    ledger
}

fn sims() -> GroupKey {
    GroupKey::new("SIM card", "telecom")
}

fn bench_create_unit(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_unit");
    group.measurement_time(Duration::from_secs(5));

    let (ledger, _) = make_test_service();
    group.bench_function("admin_stock", |b| {
        b.iter(|| {
            ledger
                .create_unit(black_box(NewUnit::admin_stock("Mouse", "accessories")))
                .expect("create")
        })
    });

    let mut serial = 0u64;
    group.bench_function("serialized", |b| {
        b.iter(|| {
            serial += 1;
            ledger
                .create_unit(
                    NewUnit::admin_stock("Laptop", "computers").with_serial(format!("SN-{}", serial)),
                )
                .expect("create")
        })
    });
    group.finish();
}

fn bench_transfer_round_trip(c: &mut Criterion) {
    let (ledger, _) = make_test_service();
    let unit = ledger
        .create_unit(NewUnit::admin_stock("Mouse", "accessories"))
        .expect("create");

    c.bench_function("transfer_round_trip", |b| {
        b.iter(|| {
            for (from, to, kind) in [
                (OwnerRef::admin_stock(), OwnerRef::user("U1"), TransferType::RequestApproved),
                (OwnerRef::user("U1"), OwnerRef::admin_stock(), TransferType::ReturnCompleted),
            ] {
                ledger
                    .transfer_unit(TransferRequest::new(unit.id, from, to, kind, "A1"))
                    .expect("transfer");
            }
        })
    });
}

fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("recompute");
    for size in [10u64, 100, 1000] {
        let ledger = stocked(size);
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                ledger
                    .projector()
                    .recompute(black_box(&sims()), RecomputeMode::AutoDetect)
                    .expect("recompute")
            })
        });
    }
    group.finish();
}

fn bench_sync(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync");
    for size in [10u64, 100] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("grow_then_shrink", size), &size, |b, &size| {
            let ledger = stocked(0);
            b.iter(|| {
                ledger
                    .sync_admin_stock_units(&sims(), size, "bench", &"A1".into())
                    .expect("grow");
                ledger
                    .sync_admin_stock_units(&sims(), 0, "bench", &"A1".into())
                    .expect("shrink")
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_create_unit,
    bench_transfer_round_trip,
    bench_recompute,
    bench_sync
);
criterion_main!(benches);
