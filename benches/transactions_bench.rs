use criterion::{Criterion, criterion_group, criterion_main};
use rust_decimal::Decimal;
use std::hint::black_box;
use tempfile::tempdir;
use tokio::runtime::Runtime;

use finance_tracker_server::database::{Db, init_db};
use finance_tracker_server::insights::summarize;
use finance_tracker_server::models::{CreateTransactionPayload, Transaction, TransactionKind};
use finance_tracker_server::transactions::{
    insert_transaction, list_transactions, transactions_in_range,
};

// Benchmark constants
const BENCH_BASE_TIMESTAMP: i64 = 1700000000;
const BENCH_TRANSACTION_COUNT: usize = 1000;

async fn setup_benchmark_environment() -> (Db, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let data_path = temp_dir.path().to_str().unwrap().to_string();
    let db = init_db(&data_path).await.unwrap();
    (db, temp_dir)
}

fn benchmark_payload(i: usize) -> CreateTransactionPayload {
    CreateTransactionPayload {
        title: format!("category_{}", i % 10),
        amount: Decimal::new(1000 + (i % 100) as i64 * 25, 2),
        kind: if i % 7 == 0 {
            TransactionKind::Income
        } else {
            TransactionKind::Expense
        },
        occurred_at: Some(BENCH_BASE_TIMESTAMP + i as i64),
    }
}

async fn create_benchmark_transactions(db: &Db, count: usize) {
    for i in 0..count {
        insert_transaction(db, &benchmark_payload(i)).await.unwrap();
    }
}

async fn benchmark_list_all(db: &Db) {
    let transactions = list_transactions(db, 0, i64::MAX / 2, 500).await.unwrap();
    black_box(transactions.len());
}

async fn benchmark_time_range_query(db: &Db) {
    let transactions = transactions_in_range(
        db,
        BENCH_BASE_TIMESTAMP + 100,
        BENCH_BASE_TIMESTAMP + 500,
    )
    .await
    .unwrap();
    black_box(transactions.len());
}

fn criterion_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    // Setup benchmark data once
    let (db, _temp_dir) = rt.block_on(setup_benchmark_environment());
    rt.block_on(create_benchmark_transactions(&db, BENCH_TRANSACTION_COUNT));

    c.bench_function("list_transactions", |b| {
        b.to_async(&rt).iter(|| benchmark_list_all(&db))
    });

    c.bench_function("time_range_query", |b| {
        b.to_async(&rt).iter(|| benchmark_time_range_query(&db))
    });

    let in_memory: Vec<Transaction> = (0..BENCH_TRANSACTION_COUNT * 10)
        .map(|i| {
            let payload = benchmark_payload(i);
            Transaction {
                id: i.to_string(),
                title: payload.title,
                amount: payload.amount,
                kind: payload.kind,
                occurred_at: payload.occurred_at.unwrap_or(BENCH_BASE_TIMESTAMP),
            }
        })
        .collect();

    c.bench_function("summarize_10k", |b| {
        b.iter(|| summarize(black_box(&in_memory), 0, i64::MAX))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
