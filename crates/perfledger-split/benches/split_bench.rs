//! Split driver performance benchmarks.
//!
//! Run with: cargo bench -p perfledger-split

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{Days, NaiveDate};
use perfledger_core::{Amount, Cost, Directive, Open, Posting, Price, Transaction};
use perfledger_split::{
    build_price_map_with_fallback, compute_split, value_balance_tree, AccountPatterns, Accounts,
    Category, Interval, SplitOptions,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Generate a ledger that contributes, buys, pays dividends and sells,
/// with a weekly price for every fund.
fn generate_ledger(num_transactions: usize) -> Vec<Directive> {
    let mut directives = Vec::new();
    for account in [
        "Assets:Account:Cash",
        "Assets:Account:Fund",
        "Assets:Bank",
        "Income:Dividends",
        "Income:Gains",
        "Expenses:Fees",
    ] {
        directives.push(Directive::Open(Open::new(date(2020, 1, 1), account)));
    }

    let start = date(2020, 1, 1);
    for i in 0..num_transactions {
        let on = start + Days::new(i as u64);
        let fund = format!("FUND{}", i % 5);
        let txn = Transaction::new(on, format!("Transaction {i}"));
        let txn = match i % 4 {
            0 => txn
                .with_posting(Posting::new("Assets:Account:Cash", Amount::new(dec!(100), "USD")))
                .with_posting(Posting::new("Assets:Bank", Amount::new(dec!(-100), "USD"))),
            1 => txn
                .with_posting(
                    Posting::new("Assets:Account:Fund", Amount::new(dec!(2), fund.as_str()))
                        .with_cost(Cost::new(dec!(40), "USD")),
                )
                .with_posting(Posting::new("Assets:Account:Cash", Amount::new(dec!(-80), "USD"))),
            2 => txn
                .with_posting(Posting::new("Assets:Account:Cash", Amount::new(dec!(3), "USD")))
                .with_posting(Posting::new("Income:Dividends", Amount::new(dec!(-3), "USD"))),
            _ => txn
                .with_posting(
                    Posting::new("Assets:Account:Fund", Amount::new(dec!(-1), fund.as_str()))
                        .with_cost(Cost::new(dec!(40), "USD")),
                )
                .with_posting(Posting::new("Assets:Account:Cash", Amount::new(dec!(44), "USD")))
                .with_posting(Posting::new("Expenses:Fees", Amount::new(dec!(1), "USD")))
                .with_posting(Posting::new("Income:Gains", Amount::new(dec!(-5), "USD"))),
        };
        directives.push(Directive::Transaction(txn));

        if i % 7 == 0 {
            directives.push(Directive::Price(Price::new(
                on,
                fund.as_str(),
                Amount::new(dec!(40) + Decimal::from(i % 13), "USD"),
            )));
        }
    }
    directives
}

fn accounts(directives: &[Directive]) -> Accounts {
    Accounts::from_directives(directives, &AccountPatterns::with_value(["^Assets:Account"]))
        .unwrap()
}

fn bench_compute_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_split");

    for size in [100, 1000, 10000] {
        let directives = generate_ledger(size);
        let accounts = accounts(&directives);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("whole", size), &directives, |b, directives| {
            b.iter(|| {
                compute_split(
                    black_box(directives),
                    &accounts,
                    &Category::ALL,
                    &SplitOptions::default(),
                )
            });
        });

        let monthly = SplitOptions::default().with_interval(Interval::Month);
        group.bench_with_input(BenchmarkId::new("monthly", size), &directives, |b, directives| {
            b.iter(|| compute_split(black_box(directives), &accounts, &Category::ALL, &monthly));
        });
    }

    group.finish();
}

fn bench_price_fallback(c: &mut Criterion) {
    let mut group = c.benchmark_group("price_fallback");

    for size in [1000, 10000] {
        let directives = generate_ledger(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &directives, |b, directives| {
            b.iter(|| build_price_map_with_fallback(black_box(directives)));
        });
    }

    group.finish();
}

fn bench_value_tree(c: &mut Criterion) {
    let directives = generate_ledger(10000);
    let accounts = accounts(&directives);

    c.bench_function("value_balance_tree_10000", |b| {
        b.iter(|| value_balance_tree(black_box(&directives), &accounts, None));
    });
}

criterion_group!(
    benches,
    bench_compute_split,
    bench_price_fallback,
    bench_value_tree
);
criterion_main!(benches);
