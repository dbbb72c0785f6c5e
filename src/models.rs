use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "income" => Some(TransactionKind::Income),
            "expense" => Some(TransactionKind::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single income or expense entry. `amount` is always a non-negative magnitude.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub title: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(rename = "date")]
    pub occurred_at: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateTransactionPayload {
    pub title: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(rename = "date", default, skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateTransactionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    #[serde(rename = "date", default, skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<i64>,
}

impl UpdateTransactionPayload {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.amount.is_none()
            && self.kind.is_none()
            && self.occurred_at.is_none()
    }

    /// Applies the provided fields over `transaction`, leaving the rest untouched.
    pub fn apply_to(&self, transaction: &Transaction) -> Transaction {
        Transaction {
            id: transaction.id.clone(),
            title: self
                .title
                .as_deref()
                .map(|t| t.trim().to_string())
                .unwrap_or_else(|| transaction.title.clone()),
            amount: self.amount.unwrap_or(transaction.amount),
            kind: self.kind.unwrap_or(transaction.kind),
            occurred_at: self.occurred_at.unwrap_or(transaction.occurred_at),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct ListTransactionsQuery {
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub limit: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
pub struct InsightsQuery {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Goal {
    pub id: String,
    pub name: String,
    #[serde(rename = "target")]
    pub target_amount: Decimal,
    pub deadline: i64,
    pub completed: bool,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateGoalPayload {
    pub name: String,
    pub target: Decimal,
    pub deadline: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateGoalPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateGoalPayload {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.target.is_none()
            && self.deadline.is_none()
            && self.completed.is_none()
    }

    pub fn apply_to(&self, goal: &Goal) -> Goal {
        Goal {
            id: goal.id.clone(),
            name: self
                .name
                .as_deref()
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| goal.name.clone()),
            target_amount: self.target.unwrap_or(goal.target_amount),
            deadline: self.deadline.unwrap_or(goal.deadline),
            completed: self.completed.unwrap_or(goal.completed),
            created_at: goal.created_at,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct GoalPlanQuery {
    #[serde(rename = "monthlySaving")]
    pub monthly_saving: Decimal,
    pub now: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Note {
    pub id: String,
    pub text: String,
    #[serde(rename = "date")]
    pub created_at: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateNotePayload {
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeletedResponse {
    pub id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AiSummaryRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AiSummaryResponse {
    pub result: String,
}
