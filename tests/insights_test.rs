/*!
 * Insights Tests
 *
 * Unit tests for the spending aggregator plus route tests for /api/insights.
 */

mod common;

use common::*;
use finance_tracker_server::constants::BALANCED_ADVISORY;
use finance_tracker_server::insights::{percentage_of, summarize};
use finance_tracker_server::models::{Transaction, TransactionKind};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn expense(title: &str, amount: Decimal, occurred_at: i64) -> Transaction {
    Transaction {
        id: format!("{}-{}", title, occurred_at),
        title: title.to_string(),
        amount,
        kind: TransactionKind::Expense,
        occurred_at,
    }
}

#[test]
fn totals_match_the_sum_of_amounts() {
    let transactions = vec![
        expense("Food", dec!(12.10), 10),
        expense("Rent", dec!(800), 20),
        expense("Food", dec!(7.90), 30),
        expense("Transport", dec!(0.01), 40),
    ];

    let summary = summarize(&transactions, 0, 100);

    let input_sum: Decimal = transactions.iter().map(|t| t.amount).sum();
    let category_sum: Decimal = summary.totals.iter().map(|(_, sum)| sum).sum();
    assert_eq!(summary.total, input_sum);
    assert_eq!(category_sum, summary.total);
    assert_eq!(summary.totals.get("Food"), Some(dec!(20.00)));
}

#[test]
fn empty_input_is_balanced() {
    let summary = summarize(&[], 0, 100);

    assert_eq!(summary.total, Decimal::ZERO);
    assert!(summary.totals.is_empty());
    assert_eq!(summary.messages, vec![BALANCED_ADVISORY.to_string()]);
}

#[test]
fn zero_total_never_divides() {
    let transactions = vec![expense("Free sample", Decimal::ZERO, 10)];

    let summary = summarize(&transactions, 0, 100);

    assert_eq!(summary.total, Decimal::ZERO);
    assert_eq!(summary.totals.get("Free sample"), Some(Decimal::ZERO));
    assert_eq!(summary.messages, vec![BALANCED_ADVISORY.to_string()]);
    assert_eq!(percentage_of(dec!(5), Decimal::ZERO), None);
}

#[test]
fn every_category_above_threshold_is_reported_in_first_seen_order() {
    let transactions = vec![expense("Food", dec!(40), 10), expense("Rent", dec!(60), 20)];

    let summary = summarize(&transactions, 0, 100);

    assert_eq!(summary.total, dec!(100));
    assert_eq!(summary.totals.get("Food"), Some(dec!(40)));
    assert_eq!(summary.totals.get("Rent"), Some(dec!(60)));
    assert_eq!(
        summary.messages,
        vec![
            "You spent 40% on Food — consider reducing this to save more.".to_string(),
            "You spent 60% on Rent — consider reducing this to save more.".to_string(),
        ]
    );
}

#[test]
fn advisory_order_follows_insertion_not_magnitude() {
    let transactions = vec![
        expense("Small", dec!(35), 10),
        expense("Big", dec!(65), 20),
    ];

    let summary = summarize(&transactions, 0, 100);

    assert!(summary.messages[0].contains("on Small"));
    assert!(summary.messages[1].contains("on Big"));
}

#[test]
fn threshold_is_strictly_greater_than_thirty() {
    // 30 / 100 = 30% exactly: no advisory for A
    let transactions = vec![
        expense("A", dec!(30), 1),
        expense("B", dec!(25), 2),
        expense("C", dec!(25), 3),
        expense("D", dec!(20), 4),
    ];

    let summary = summarize(&transactions, 0, 100);

    assert_eq!(summary.messages, vec![BALANCED_ADVISORY.to_string()]);
}

#[test]
fn half_percent_rounds_away_from_zero() {
    // 30.5% rounds to 31 and triggers; 69.5% rounds to 70
    assert_eq!(percentage_of(dec!(30.5), dec!(100)), Some(31));
    assert_eq!(percentage_of(dec!(30.4), dec!(100)), Some(30));

    let transactions = vec![expense("Edge", dec!(30.5), 1), expense("Rest", dec!(69.5), 2)];
    let summary = summarize(&transactions, 0, 100);

    assert_eq!(
        summary.messages,
        vec![
            "You spent 31% on Edge — consider reducing this to save more.".to_string(),
            "You spent 70% on Rest — consider reducing this to save more.".to_string(),
        ]
    );
}

#[test]
fn range_filter_is_inclusive() {
    let transactions = vec![
        expense("Before", dec!(1000), 9),
        expense("Start", dec!(10), 10),
        expense("End", dec!(10), 20),
        expense("After", dec!(1000), 21),
    ];

    let summary = summarize(&transactions, 10, 20);

    assert_eq!(summary.total, dec!(20));
    assert_eq!(summary.totals.len(), 2);
    assert_eq!(summary.totals.get("Before"), None);
    assert_eq!(summary.totals.get("After"), None);
}

#[test]
fn summary_serializes_totals_in_insertion_order() {
    let transactions = vec![
        expense("Zebra", dec!(10), 1),
        expense("Apple", dec!(10), 2),
        expense("Mango", dec!(10), 3),
    ];

    let json = serde_json::to_string(&summarize(&transactions, 0, 10)).unwrap();

    let zebra = json.find("\"Zebra\"").unwrap();
    let apple = json.find("\"Apple\"").unwrap();
    let mango = json.find("\"Mango\"").unwrap();
    assert!(zebra < apple && apple < mango);
}

#[tokio::test]
async fn insights_route_uses_expenses_in_range() {
    let (router, db, _temp_dir) = setup_test_app(None).await;

    create_test_transaction(&db, "Food", dec!(40), TransactionKind::Expense, TEST_BASE_TIMESTAMP)
        .await;
    create_test_transaction(&db, "Rent", dec!(60), TransactionKind::Expense, TEST_BASE_TIMESTAMP + 10)
        .await;
    create_test_transaction(&db, "Salary", dec!(5000), TransactionKind::Income, TEST_BASE_TIMESTAMP + 20)
        .await;
    create_test_transaction(&db, "Later", dec!(900), TransactionKind::Expense, TEST_BASE_TIMESTAMP + 500)
        .await;

    let uri = format!(
        "/api/insights?from={}&to={}",
        TEST_BASE_TIMESTAMP,
        TEST_BASE_TIMESTAMP + 100
    );
    let (status, body) = send_json(&router, "GET", &uri, None).await;

    assert_eq!(status, 200);
    assert_eq!(body["total"].as_f64(), Some(100.0));
    assert_eq!(body["totals"]["Food"].as_f64(), Some(40.0));
    assert_eq!(body["totals"]["Rent"].as_f64(), Some(60.0));
    assert!(body["totals"].get("Salary").is_none());
    assert_eq!(body["messages"].as_array().map(|m| m.len()), Some(2));
}

#[tokio::test]
async fn insights_route_defaults_to_all_time() {
    let (router, db, _temp_dir) = setup_test_app(None).await;

    create_test_transaction(&db, "Food", dec!(10), TransactionKind::Expense, 0).await;
    create_test_transaction(&db, "Books", dec!(10), TransactionKind::Expense, TEST_BASE_TIMESTAMP)
        .await;
    create_test_transaction(&db, "Games", dec!(10), TransactionKind::Expense, TEST_BASE_TIMESTAMP)
        .await;
    create_test_transaction(&db, "Music", dec!(10), TransactionKind::Expense, TEST_BASE_TIMESTAMP)
        .await;

    let (status, body) = send_json(&router, "GET", "/api/insights", None).await;

    assert_eq!(status, 200);
    assert_eq!(body["total"].as_f64(), Some(40.0));
    assert_eq!(body["messages"][0], BALANCED_ADVISORY);
}

#[tokio::test]
async fn insights_route_rejects_inverted_range() {
    let (router, _db, _temp_dir) = setup_test_app(None).await;

    let (status, body) = send_json(&router, "GET", "/api/insights?from=100&to=10", None).await;

    assert_eq!(status, 400);
    assert!(body["error"].is_string());
}

#[test]
fn extreme_amounts_saturate_instead_of_overflowing() {
    let transactions = vec![
        expense("Yacht", Decimal::MAX, 10),
        expense("Island", Decimal::MAX, 20),
    ];

    let summary = summarize(&transactions, 0, 100);

    assert_eq!(summary.total, Decimal::MAX);
    assert_eq!(summary.totals.get("Yacht"), Some(Decimal::MAX));
    assert_eq!(summary.messages.len(), 2);
    assert_eq!(percentage_of(Decimal::MAX, Decimal::MAX), Some(100));
}
