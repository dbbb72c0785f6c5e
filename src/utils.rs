use rust_decimal::Decimal;
use std::str::FromStr;

use crate::constants::*;
use crate::error::ApiError;

pub fn now_timestamp() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

pub fn db_error_with_context(context: &str) -> ApiError {
    ApiError::Database(context.to_string())
}

pub fn validate_string_length(
    value: &str,
    field_name: &str,
    max_length: usize,
) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "{} cannot be empty",
            field_name
        )));
    }
    if value.len() > max_length {
        return Err(ApiError::BadRequest(format!(
            "{} must be less than {} characters",
            field_name, max_length
        )));
    }
    Ok(())
}

/// Rejects zero, negative and out-of-range amounts. Direction lives in the transaction kind.
pub fn validate_positive_amount(amount: Decimal, field_name: &str) -> Result<(), ApiError> {
    if amount <= Decimal::ZERO {
        return Err(ApiError::BadRequest(format!(
            "{} must be greater than zero",
            field_name
        )));
    }
    if amount > Decimal::from(MAX_AMOUNT) {
        return Err(ApiError::BadRequest(format!(
            "{} cannot exceed {}",
            field_name, MAX_AMOUNT
        )));
    }
    Ok(())
}

pub fn validate_time_range(from: i64, to: i64) -> Result<(), ApiError> {
    if from > to {
        return Err(ApiError::BadRequest(
            "Range start must not be after range end".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_limit(limit: Option<u32>, default: u32) -> Result<u32, ApiError> {
    match limit {
        Some(0) => Err(ApiError::BadRequest(
            "Limit must be greater than 0".to_string(),
        )),
        Some(l) if l > MAX_LIMIT => Err(ApiError::BadRequest(format!(
            "Limit cannot exceed {}",
            MAX_LIMIT
        ))),
        Some(l) => Ok(l),
        None => Ok(default),
    }
}

pub fn validate_transactions_limit(limit: Option<u32>) -> Result<u32, ApiError> {
    validate_limit(limit, DEFAULT_TRANSACTIONS_LIMIT)
}

/// Amounts are persisted as decimal text so stored values stay exact.
pub fn parse_stored_decimal(raw: &str, column: &str) -> Result<Decimal, ApiError> {
    Decimal::from_str(raw)
        .map_err(|_| db_error_with_context(&format!("invalid decimal in column {}", column)))
}
