#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use finance_tracker_server::assistant::{AssistantError, TextSummarizer};
use finance_tracker_server::database::{Db, init_db};
use finance_tracker_server::models::{CreateTransactionPayload, Transaction, TransactionKind};
use finance_tracker_server::transactions::insert_transaction;
use finance_tracker_server::{AppState, app};
use rust_decimal::Decimal;
use std::sync::Arc;
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;

pub const TEST_BASE_TIMESTAMP: i64 = 1700000000; // Nov 14, 2023 22:13:20 UTC
pub const TEST_TIME_INCREMENT: i64 = 100;

/// Creates an isolated database in a temporary directory. The directory lives
/// as long as the returned `TempDir`.
pub async fn setup_test_environment() -> (Db, TempDir) {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let data_path = temp_dir
        .path()
        .to_str()
        .expect("Failed to convert path to string")
        .to_string();

    let db = init_db(&data_path)
        .await
        .unwrap_or_else(|e| panic!("Failed to initialize database at {}: {}", data_path, e));

    (db, temp_dir)
}

pub async fn create_test_transaction(
    db: &Db,
    title: &str,
    amount: Decimal,
    kind: TransactionKind,
    timestamp: i64,
) -> Transaction {
    let payload = CreateTransactionPayload {
        title: title.to_string(),
        amount,
        kind,
        occurred_at: Some(timestamp),
    };
    insert_transaction(db, &payload)
        .await
        .unwrap_or_else(|e| panic!("Failed to insert test transaction '{}': {}", title, e))
}

pub struct FixedSummarizer(pub Result<String, String>);

#[async_trait]
impl TextSummarizer for FixedSummarizer {
    async fn summarize(&self, _prompt: &str) -> Result<String, AssistantError> {
        self.0.clone().map_err(AssistantError::Api)
    }
}

pub async fn setup_test_app(summarizer: Option<Arc<dyn TextSummarizer>>) -> (Router, Db, TempDir) {
    let (db, temp_dir) = setup_test_environment().await;
    let router = app(AppState::new(db.clone(), summarizer));
    (router, db, temp_dir)
}

/// Sends one request through the router and decodes the JSON body (Null when empty or not JSON).
pub async fn send_json(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Router failed to respond");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

    (status, value)
}
