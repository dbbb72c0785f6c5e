use rust_decimal::Decimal;
use serde::Serialize;

use crate::constants::{DAYS_PER_MONTH, SECONDS_PER_DAY};
use crate::models::Goal;

/// Derived savings plan for a goal. Never persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalPlan {
    pub months_remaining: i64,
    pub required_monthly_amount: Decimal,
    pub achievable: bool,
    pub overdue: bool,
}

/// Whole 30-day months left until `deadline`, rounded up and never below one.
pub fn months_remaining(deadline: i64, now: i64) -> i64 {
    let seconds_per_month = SECONDS_PER_DAY * DAYS_PER_MONTH;
    let remaining = deadline.saturating_sub(now);
    if remaining <= 0 {
        return 1;
    }
    let months = remaining / seconds_per_month
        + i64::from(remaining % seconds_per_month != 0);
    months.max(1)
}

pub fn evaluate(goal: &Goal, monthly_saving: Decimal, now: i64) -> GoalPlan {
    let months = months_remaining(goal.deadline, now);
    let required_monthly_amount = goal.target_amount / Decimal::from(months);

    GoalPlan {
        months_remaining: months,
        required_monthly_amount,
        achievable: goal.target_amount > Decimal::ZERO
            && monthly_saving >= required_monthly_amount,
        overdue: goal.deadline < now,
    }
}
