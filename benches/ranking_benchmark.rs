//! Benchmarks for ranking and order book aggregation

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use spread_exporter::parser::{InstrumentSnapshot, OrderBookSnapshot, PriceLevel};
use spread_exporter::{aggregate, select};
use std::collections::HashMap;

fn create_instruments(count: usize) -> Vec<InstrumentSnapshot> {
    (0..count)
        .map(|i| {
            let quote = if i % 4 == 0 { "USDT" } else { "BTC" };
            let mut fields = HashMap::new();
            fields.insert(
                "volume".to_string(),
                serde_json::Value::String(format!("{}.{}", (i * 7919) % 100_000, i % 100)),
            );
            fields.insert("count".to_string(), serde_json::json!((i * 104_729) % 50_000));
            InstrumentSnapshot {
                name: format!("SYM{}{}", i, quote),
                fields,
            }
        })
        .collect()
}

fn create_book(levels: usize) -> OrderBookSnapshot {
    let level = |i: usize, base: i64| PriceLevel {
        price: Decimal::new(base * 100 + i as i64, 2),
        quantity: Decimal::new(150 + i as i64, 2),
    };

    OrderBookSnapshot {
        symbol: "ETHBTC".to_string(),
        last_update_id: 1000,
        bids: (0..levels).map(|i| level(i, 500)).collect(),
        asks: (0..levels).map(|i| level(i, 501)).collect(),
    }
}

fn benchmark_select(c: &mut Criterion) {
    let instruments = create_instruments(2000);

    c.bench_function("select_top5_by_volume_2000", |b| {
        b.iter(|| select(black_box(&instruments), "btc", "volume", 5))
    });

    c.bench_function("select_top5_by_count_2000", |b| {
        b.iter(|| select(black_box(&instruments), "usdt", "count", 5))
    });
}

fn benchmark_aggregate(c: &mut Criterion) {
    let book = create_book(200);

    c.bench_function("aggregate_200_levels", |b| {
        b.iter(|| black_box(aggregate(black_box(&book)).unwrap()))
    });
}

criterion_group!(benches, benchmark_select, benchmark_aggregate);
criterion_main!(benches);
