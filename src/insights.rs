use axum::{
    Json,
    extract::{Query, State},
};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::AppState;
use crate::constants::{ADVISORY_THRESHOLD_PCT, BALANCED_ADVISORY};
use crate::error::ApiError;
use crate::models::{InsightsQuery, Transaction, TransactionKind};
use crate::transactions::transactions_in_range;
use crate::utils::{now_timestamp, validate_time_range};

/// Per-category sums kept in first-seen order.
///
/// Serialized as a JSON object whose keys follow that same order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTotals(Vec<(String, Decimal)>);

impl CategoryTotals {
    pub fn add(&mut self, category: &str, amount: Decimal) {
        match self.0.iter_mut().find(|(name, _)| name == category) {
            Some((_, sum)) => *sum = sum.saturating_add(amount),
            None => self.0.push((category.to_string(), amount)),
        }
    }

    pub fn get(&self, category: &str) -> Option<Decimal> {
        self.0
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, sum)| *sum)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.0.iter().map(|(name, sum)| (name.as_str(), *sum))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for CategoryTotals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, sum) in &self.0 {
            map.serialize_entry(name, sum)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Summary {
    pub total: Decimal,
    pub totals: CategoryTotals,
    pub messages: Vec<String>,
}

pub fn advisory_message(pct: i64, category: &str) -> String {
    format!(
        "You spent {}% on {} — consider reducing this to save more.",
        pct, category
    )
}

/// Share of `total` taken by `amount`, as a whole percentage rounded half away from zero.
///
/// Returns `None` when `total` is zero.
pub fn percentage_of(amount: Decimal, total: Decimal) -> Option<i64> {
    if total.is_zero() {
        return None;
    }
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(total))
        .or_else(|| {
            amount
                .checked_div(total)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        })?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Totals the transactions whose timestamp falls in `[from, to]`, grouped by title,
/// and derives the advisory messages for categories above the threshold.
pub fn summarize(transactions: &[Transaction], from: i64, to: i64) -> Summary {
    let mut total = Decimal::ZERO;
    let mut totals = CategoryTotals::default();

    for transaction in transactions
        .iter()
        .filter(|t| t.occurred_at >= from && t.occurred_at <= to)
    {
        total = total.saturating_add(transaction.amount);
        totals.add(&transaction.title, transaction.amount);
    }

    let mut messages: Vec<String> = totals
        .iter()
        .filter_map(|(category, sum)| {
            percentage_of(sum, total)
                .filter(|pct| *pct > ADVISORY_THRESHOLD_PCT)
                .map(|pct| advisory_message(pct, category))
        })
        .collect();

    if messages.is_empty() {
        messages.push(BALANCED_ADVISORY.to_string());
    }

    Summary {
        total,
        totals,
        messages,
    }
}

pub async fn get_insights_handler(
    State(state): State<AppState>,
    Query(query): Query<InsightsQuery>,
) -> Result<Json<Summary>, ApiError> {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or_else(now_timestamp);
    validate_time_range(from, to)?;

    let expenses: Vec<Transaction> = transactions_in_range(&state.db, from, to)
        .await?
        .into_iter()
        .filter(|t| t.kind == TransactionKind::Expense)
        .collect();

    let summary = summarize(&expenses, from, to);
    tracing::debug!(
        from,
        to,
        categories = summary.totals.len(),
        "insights computed"
    );
    Ok(Json(summary))
}
