use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::AppState;
use crate::constants::*;
use crate::database::Db;
use crate::error::ApiError;
use crate::models::{
    CreateTransactionPayload, DeletedResponse, ListTransactionsQuery, Transaction,
    TransactionKind, UpdateTransactionPayload,
};
use crate::utils::{
    db_error_with_context, now_timestamp, parse_stored_decimal, validate_positive_amount,
    validate_string_length, validate_time_range, validate_transactions_limit,
};

const SELECT_COLUMNS: &str = "SELECT id, title, amount, kind, occurred_at FROM transactions";

pub fn validate_transaction_title(title: &str) -> Result<(), ApiError> {
    validate_string_length(title, "Transaction title", MAX_TITLE_LENGTH)
}

pub fn validate_transaction_amount(amount: Decimal) -> Result<(), ApiError> {
    validate_positive_amount(amount, "Transaction amount")
}

pub fn extract_transaction_from_row(row: libsql::Row) -> Result<Transaction, ApiError> {
    let id: String = row
        .get(0)
        .map_err(|e| db_error_with_context(&format!("failed to get transaction id: {}", e)))?;
    let title: String = row
        .get(1)
        .map_err(|e| db_error_with_context(&format!("failed to get transaction title: {}", e)))?;
    let amount: String = row
        .get(2)
        .map_err(|e| db_error_with_context(&format!("failed to get transaction amount: {}", e)))?;
    let kind: String = row
        .get(3)
        .map_err(|e| db_error_with_context(&format!("failed to get transaction kind: {}", e)))?;
    let occurred_at: i64 = row.get(4).map_err(|e| {
        db_error_with_context(&format!("failed to get transaction timestamp: {}", e))
    })?;

    let kind = TransactionKind::parse(&kind)
        .ok_or_else(|| db_error_with_context(&format!("unknown transaction kind '{}'", kind)))?;

    Ok(Transaction {
        id,
        title,
        amount: parse_stored_decimal(&amount, "amount")?,
        kind,
        occurred_at,
    })
}

pub async fn insert_transaction(
    db: &Db,
    payload: &CreateTransactionPayload,
) -> Result<Transaction, ApiError> {
    validate_transaction_title(&payload.title)?;
    validate_transaction_amount(payload.amount)?;

    let transaction = Transaction {
        id: Uuid::new_v4().to_string(),
        title: payload.title.trim().to_string(),
        amount: payload.amount,
        kind: payload.kind,
        occurred_at: payload.occurred_at.unwrap_or_else(now_timestamp),
    };

    let conn = db.write().await;
    conn.execute(
        "INSERT INTO transactions (id, title, amount, kind, occurred_at) VALUES (?, ?, ?, ?, ?)",
        (
            transaction.id.as_str(),
            transaction.title.as_str(),
            transaction.amount.to_string(),
            transaction.kind.as_str(),
            transaction.occurred_at,
        ),
    )
    .await
    .map_err(|e| db_error_with_context(&format!("failed to create transaction: {}", e)))?;

    tracing::debug!(id = %transaction.id, kind = %transaction.kind, "transaction created");
    Ok(transaction)
}

/// Returns transactions with `from <= occurred_at <= to`, newest first.
pub async fn list_transactions(
    db: &Db,
    from: i64,
    to: i64,
    limit: u32,
) -> Result<Vec<Transaction>, ApiError> {
    let conn = db.read().await;
    let query = format!(
        "{} WHERE occurred_at BETWEEN ? AND ? ORDER BY occurred_at DESC, rowid DESC LIMIT ?",
        SELECT_COLUMNS
    );
    let mut rows = conn
        .query(&query, (from, to, limit))
        .await
        .map_err(|e| db_error_with_context(&format!("failed to query transactions: {}", e)))?;

    let mut transactions = Vec::new();
    while let Some(row) = rows.next().await? {
        transactions.push(extract_transaction_from_row(row)?);
    }
    Ok(transactions)
}

/// Unbounded range query used by the insights endpoint.
pub async fn transactions_in_range(
    db: &Db,
    from: i64,
    to: i64,
) -> Result<Vec<Transaction>, ApiError> {
    let conn = db.read().await;
    let query = format!(
        "{} WHERE occurred_at BETWEEN ? AND ? ORDER BY occurred_at ASC, rowid ASC",
        SELECT_COLUMNS
    );
    let mut rows = conn
        .query(&query, (from, to))
        .await
        .map_err(|e| db_error_with_context(&format!("failed to query transactions: {}", e)))?;

    let mut transactions = Vec::new();
    while let Some(row) = rows.next().await? {
        transactions.push(extract_transaction_from_row(row)?);
    }
    Ok(transactions)
}

pub async fn count_transactions(db: &Db) -> Result<u64, ApiError> {
    let conn = db.read().await;
    let mut rows = conn.query("SELECT COUNT(*) FROM transactions", ()).await?;
    match rows.next().await? {
        Some(row) => row
            .get::<i64>(0)
            .map(|count| count.max(0) as u64)
            .map_err(|e| db_error_with_context(&format!("failed to get count value: {}", e))),
        None => Ok(0),
    }
}

pub async fn find_transaction(db: &Db, id: &str) -> Result<Option<Transaction>, ApiError> {
    let conn = db.read().await;
    let query = format!("{} WHERE id = ?", SELECT_COLUMNS);
    let mut rows = conn.query(&query, [id]).await?;
    match rows.next().await? {
        Some(row) => Ok(Some(extract_transaction_from_row(row)?)),
        None => Ok(None),
    }
}

pub async fn update_transaction(
    db: &Db,
    id: &str,
    payload: &UpdateTransactionPayload,
) -> Result<Transaction, ApiError> {
    if payload.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one field must be provided for update".to_string(),
        ));
    }
    if let Some(title) = &payload.title {
        validate_transaction_title(title)?;
    }
    if let Some(amount) = payload.amount {
        validate_transaction_amount(amount)?;
    }

    // Read and write under one lock so concurrent updates cannot interleave.
    let conn = db.write().await;
    let query = format!("{} WHERE id = ?", SELECT_COLUMNS);
    let mut rows = conn.query(&query, [id]).await?;
    let existing = match rows.next().await? {
        Some(row) => extract_transaction_from_row(row)?,
        None => return Err(ApiError::NotFound(ERR_TRANSACTION_NOT_FOUND.to_string())),
    };
    drop(rows);

    let updated = payload.apply_to(&existing);
    let affected = conn
        .execute(
            "UPDATE transactions SET title = ?, amount = ?, kind = ?, occurred_at = ? WHERE id = ?",
            (
                updated.title.as_str(),
                updated.amount.to_string(),
                updated.kind.as_str(),
                updated.occurred_at,
                id,
            ),
        )
        .await
        .map_err(|e| db_error_with_context(&format!("failed to update transaction: {}", e)))?;

    if affected == 0 {
        return Err(ApiError::NotFound(ERR_TRANSACTION_NOT_FOUND.to_string()));
    }
    Ok(updated)
}

pub async fn delete_transaction(db: &Db, id: &str) -> Result<(), ApiError> {
    let conn = db.write().await;
    let affected = conn
        .execute("DELETE FROM transactions WHERE id = ?", [id])
        .await
        .map_err(|e| db_error_with_context(&format!("failed to delete transaction: {}", e)))?;

    if affected == 0 {
        return Err(ApiError::NotFound(ERR_TRANSACTION_NOT_FOUND.to_string()));
    }
    Ok(())
}

pub async fn create_transaction_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateTransactionPayload>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let transaction = insert_transaction(&state.db, &payload).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn list_transactions_handler(
    State(state): State<AppState>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let limit = validate_transactions_limit(query.limit)?;
    // Without bounds every record is listed, future-dated ones included.
    let from = query.from.unwrap_or(i64::MIN);
    let to = query.to.unwrap_or(i64::MAX);
    validate_time_range(from, to)?;

    let transactions = list_transactions(&state.db, from, to, limit).await?;
    Ok(Json(transactions))
}

pub async fn get_transaction_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, ApiError> {
    find_transaction(&state.db, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(ERR_TRANSACTION_NOT_FOUND.to_string()))
}

pub async fn update_transaction_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTransactionPayload>,
) -> Result<Json<Transaction>, ApiError> {
    let transaction = update_transaction(&state.db, &id, &payload).await?;
    Ok(Json(transaction))
}

pub async fn delete_transaction_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    delete_transaction(&state.db, &id).await?;
    Ok(Json(DeletedResponse { id }))
}
