use criterion::{Criterion, criterion_group, criterion_main};
use orderdesk::engine::{AnchorField, reconcile};
use orderdesk::form::{FormField, OrderForm};
use orderdesk::prefill::PrefillPolicy;
use orderdesk::types::{Asset, OrderbookSnapshot, PriceLevel};
use std::hint::black_box;

// Benchmark for deriving notional from a quantity anchor
fn bench_reconcile_quantity_anchor(c: &mut Criterion) {
    c.bench_function("reconcile_quantity_anchor", |b| {
        b.iter(|| {
            black_box(reconcile(
                black_box("65432.10"),
                black_box("0.125"),
                black_box(""),
                AnchorField::Quantity,
            ))
        })
    });
}

// Benchmark for deriving quantity from a notional anchor
fn bench_reconcile_notional_anchor(c: &mut Criterion) {
    c.bench_function("reconcile_notional_anchor", |b| {
        b.iter(|| {
            black_box(reconcile(
                black_box("65432.10"),
                black_box(""),
                black_box("10000"),
                AnchorField::Notional,
            ))
        })
    });
}

// Benchmark for a burst of keystrokes going through the form observer
fn bench_form_typing(c: &mut Criterion) {
    c.bench_function("form_typing_burst", |b| {
        b.iter_with_setup(
            || OrderForm::new(Asset::new("BTC"), PrefillPolicy::PrefillOnly),
            |mut form| {
                form.edit(FormField::Price, "65432.1");
                for text in ["0", "0.", "0.1", "0.12", "0.125"] {
                    form.edit(FormField::Quantity, text);
                }
                black_box(form);
            },
        )
    });
}

// Benchmark for decoding a 100-level snapshot
fn bench_snapshot_decode(c: &mut Criterion) {
    let snapshot = OrderbookSnapshot {
        asset: Asset::new("BTC"),
        bids: (0..100)
            .map(|i| PriceLevel {
                price: 65_000.0 - i as f64,
                quantity: 0.5 + i as f64 / 100.0,
            })
            .collect(),
        asks: (0..100)
            .map(|i| PriceLevel {
                price: 65_001.0 + i as f64,
                quantity: 0.5 + i as f64 / 100.0,
            })
            .collect(),
    };
    let json = serde_json::to_string(&snapshot).unwrap();

    c.bench_function("snapshot_decode_100_levels", |b| {
        b.iter(|| {
            let decoded: OrderbookSnapshot = serde_json::from_str(black_box(&json)).unwrap();
            black_box(decoded.is_well_ordered())
        })
    });
}

criterion_group!(
    benches,
    bench_reconcile_quantity_anchor,
    bench_reconcile_notional_anchor,
    bench_form_typing,
    bench_snapshot_decode
);
criterion_main!(benches);
