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
use crate::models::{CreateGoalPayload, DeletedResponse, Goal, GoalPlanQuery, UpdateGoalPayload};
use crate::planner::{GoalPlan, evaluate};
use crate::utils::{
    db_error_with_context, now_timestamp, parse_stored_decimal, validate_positive_amount,
    validate_string_length,
};

const SELECT_COLUMNS: &str =
    "SELECT id, name, target_amount, deadline, completed, created_at FROM goals";

pub fn validate_goal_name(name: &str) -> Result<(), ApiError> {
    validate_string_length(name, "Goal name", MAX_GOAL_NAME_LENGTH)
}

pub fn validate_goal_target(target: Decimal) -> Result<(), ApiError> {
    validate_positive_amount(target, "Goal target")
}

pub fn extract_goal_from_row(row: libsql::Row) -> Result<Goal, ApiError> {
    let id: String = row
        .get(0)
        .map_err(|_| db_error_with_context("invalid goal data"))?;
    let name: String = row
        .get(1)
        .map_err(|_| db_error_with_context("invalid goal data"))?;
    let target_amount: String = row
        .get(2)
        .map_err(|_| db_error_with_context("invalid goal data"))?;
    let deadline: i64 = row
        .get(3)
        .map_err(|_| db_error_with_context("invalid goal data"))?;
    let completed: i64 = row
        .get(4)
        .map_err(|_| db_error_with_context("invalid goal data"))?;
    let created_at: i64 = row
        .get(5)
        .map_err(|_| db_error_with_context("invalid goal data"))?;

    Ok(Goal {
        id,
        name,
        target_amount: parse_stored_decimal(&target_amount, "target_amount")?,
        deadline,
        completed: completed != 0,
        created_at,
    })
}

pub async fn insert_goal(db: &Db, payload: &CreateGoalPayload) -> Result<Goal, ApiError> {
    validate_goal_name(&payload.name)?;
    validate_goal_target(payload.target)?;

    let goal = Goal {
        id: Uuid::new_v4().to_string(),
        name: payload.name.trim().to_string(),
        target_amount: payload.target,
        deadline: payload.deadline,
        completed: false,
        created_at: now_timestamp(),
    };

    let conn = db.write().await;
    conn.execute(
        "INSERT INTO goals (id, name, target_amount, deadline, completed, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        (
            goal.id.as_str(),
            goal.name.as_str(),
            goal.target_amount.to_string(),
            goal.deadline,
            0i64,
            goal.created_at,
        ),
    )
    .await
    .map_err(|_| db_error_with_context("goal creation failed"))?;

    tracing::debug!(id = %goal.id, "goal created");
    Ok(goal)
}

pub async fn list_goals(db: &Db) -> Result<Vec<Goal>, ApiError> {
    let conn = db.read().await;
    let query = format!("{} ORDER BY created_at DESC, rowid DESC", SELECT_COLUMNS);
    let mut rows = conn
        .query(&query, ())
        .await
        .map_err(|_| db_error_with_context("failed to query goals"))?;

    let mut goals = Vec::new();
    while let Some(row) = rows.next().await? {
        goals.push(extract_goal_from_row(row)?);
    }
    Ok(goals)
}

pub async fn find_goal(db: &Db, id: &str) -> Result<Option<Goal>, ApiError> {
    let conn = db.read().await;
    let query = format!("{} WHERE id = ?", SELECT_COLUMNS);
    let mut rows = conn.query(&query, [id]).await?;
    match rows.next().await? {
        Some(row) => Ok(Some(extract_goal_from_row(row)?)),
        None => Ok(None),
    }
}

pub async fn update_goal(db: &Db, id: &str, payload: &UpdateGoalPayload) -> Result<Goal, ApiError> {
    if payload.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one field must be provided for update".to_string(),
        ));
    }
    if let Some(name) = &payload.name {
        validate_goal_name(name)?;
    }
    if let Some(target) = payload.target {
        validate_goal_target(target)?;
    }

    let conn = db.write().await;
    let query = format!("{} WHERE id = ?", SELECT_COLUMNS);
    let mut rows = conn.query(&query, [id]).await?;
    let existing = match rows.next().await? {
        Some(row) => extract_goal_from_row(row)?,
        None => return Err(ApiError::NotFound(ERR_GOAL_NOT_FOUND.to_string())),
    };
    drop(rows);

    let updated = payload.apply_to(&existing);
    let affected = conn
        .execute(
            "UPDATE goals SET name = ?, target_amount = ?, deadline = ?, completed = ? WHERE id = ?",
            (
                updated.name.as_str(),
                updated.target_amount.to_string(),
                updated.deadline,
                updated.completed as i64,
                id,
            ),
        )
        .await
        .map_err(|_| db_error_with_context("goal update failed"))?;

    if affected == 0 {
        return Err(ApiError::NotFound(ERR_GOAL_NOT_FOUND.to_string()));
    }
    Ok(updated)
}

pub async fn complete_goal(db: &Db, id: &str) -> Result<Goal, ApiError> {
    let payload = UpdateGoalPayload {
        completed: Some(true),
        ..Default::default()
    };
    update_goal(db, id, &payload).await
}

pub async fn delete_goal(db: &Db, id: &str) -> Result<(), ApiError> {
    let conn = db.write().await;
    let affected = conn
        .execute("DELETE FROM goals WHERE id = ?", [id])
        .await
        .map_err(|_| db_error_with_context("goal deletion failed"))?;

    if affected == 0 {
        return Err(ApiError::NotFound(ERR_GOAL_NOT_FOUND.to_string()));
    }
    Ok(())
}

pub async fn list_goals_handler(State(state): State<AppState>) -> Result<Json<Vec<Goal>>, ApiError> {
    Ok(Json(list_goals(&state.db).await?))
}

pub async fn create_goal_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateGoalPayload>,
) -> Result<(StatusCode, Json<Goal>), ApiError> {
    let goal = insert_goal(&state.db, &payload).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

/// Handles both PUT and PATCH; fields left out of the body keep their value.
pub async fn update_goal_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateGoalPayload>,
) -> Result<Json<Goal>, ApiError> {
    Ok(Json(update_goal(&state.db, &id, &payload).await?))
}

pub async fn complete_goal_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Goal>, ApiError> {
    Ok(Json(complete_goal(&state.db, &id).await?))
}

pub async fn delete_goal_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    delete_goal(&state.db, &id).await?;
    Ok(Json(DeletedResponse { id }))
}

pub async fn goal_plan_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<GoalPlanQuery>,
) -> Result<Json<GoalPlan>, ApiError> {
    if query.monthly_saving < Decimal::ZERO {
        return Err(ApiError::BadRequest(
            "Monthly saving cannot be negative".to_string(),
        ));
    }

    let goal = find_goal(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(ERR_GOAL_NOT_FOUND.to_string()))?;
    let now = query.now.unwrap_or_else(now_timestamp);

    Ok(Json(evaluate(&goal, query.monthly_saving, now)))
}
