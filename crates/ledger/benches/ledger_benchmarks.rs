use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::Utc;
use stockledger_ledger::{
    Category, Ledger, LedgerPolicy, MatchPolicy, StockFields, StockFilter, Unit, Usage,
};

fn fields(n: usize) -> StockFields {
    StockFields {
        usage: if n % 2 == 0 { Usage::Internal } else { Usage::ForSale },
        category: match n % 3 {
            0 => Category::Food,
            1 => Category::Beverage,
            _ => Category::Other,
        },
        product: format!("Produto {}", n % 50),
        sub_product: String::new(),
        brand: format!("Marca {}", n % 7),
        commercial_name: format!("Item {n}"),
        quantity: 3.0,
        unit: Unit::Unit,
        total_value: 42.5,
    }
}

fn ledger_of(size: usize) -> Ledger {
    let mut ledger = Ledger::new(LedgerPolicy::default().with_match_policy(MatchPolicy::AlwaysNew));
    let now = Utc::now();
    for n in 0..size {
        ledger.submit(&fields(n), now).unwrap();
    }
    ledger
}

/// Strict-key submit cost grows with the ledger (linear match scan).
fn bench_submit_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_merge");

    for size in [100usize, 1_000, 10_000] {
        let base = ledger_of(size);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut ledger = Ledger::from_records(
                base.records().to_vec(),
                LedgerPolicy::default(),
            )
            .0;
            let purchase = fields(size - 1);
            b.iter(|| {
                black_box(ledger.submit(&purchase, Utc::now()).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_list_filtered(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_filtered");

    for size in [1_000usize, 10_000] {
        let ledger = ledger_of(size);
        let filter = StockFilter::new().category(Category::Beverage).search("marca 3");
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &ledger, |b, ledger| {
            b.iter(|| black_box(ledger.list(&filter).count()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_submit_merge, bench_list_filtered);
criterion_main!(benches);
