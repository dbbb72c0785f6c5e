//! Client-side session state mirrored from a [`RecordStore`].
//!
//! Every mutation goes to the store first. Creates that fail are still kept
//! locally under a `local-` id so user input is never dropped; updates and
//! deletes that fail follow the configured [`FailurePolicy`]. Records with a
//! `local-` id are edited and deleted in place without a store call. Mutations
//! on the same entity id are serialized in submission order.

mod http;
mod store;

pub use http::HttpRecordStore;
pub use store::{RecordStore, SyncError};

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::constants::*;
use crate::insights::{Summary, summarize};
use crate::models::{
    CreateGoalPayload, CreateNotePayload, CreateTransactionPayload, Goal, Note, Transaction,
    TransactionKind, UpdateGoalPayload, UpdateTransactionPayload,
};
use crate::planner::{GoalPlan, evaluate};
use crate::utils::now_timestamp;

pub type NewTransaction = CreateTransactionPayload;

/// What to do with local state when an update or delete fails in transit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Leave local state untouched and report the error.
    #[default]
    FailClosed,
    /// Apply the mutation locally anyway and report the error.
    ApplyLocally,
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub request_timeout: Duration,
    /// Extra attempts for idempotent calls (lists and deletes).
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(DEFAULT_SYNC_TIMEOUT_MS),
            max_retries: DEFAULT_SYNC_MAX_RETRIES,
            retry_backoff: Duration::from_millis(DEFAULT_SYNC_BACKOFF_MS),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Read-only copy of the session lists, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSnapshot {
    pub transactions: Vec<Transaction>,
    pub goals: Vec<Goal>,
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub money_left: Decimal,
}

trait Identified {
    fn entity_id(&self) -> &str;
}

impl Identified for Transaction {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

impl Identified for Goal {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

impl Identified for Note {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

fn replace_entry<T: Identified>(list: &mut [T], item: T) {
    if let Some(slot) = list.iter_mut().find(|e| e.entity_id() == item.entity_id()) {
        *slot = item;
    }
}

fn remove_entry<T: Identified>(list: &mut Vec<T>, id: &str) {
    list.retain(|e| e.entity_id() != id);
}

/// Drops a record that only exists locally. The store never saw it.
fn remove_unsaved<T: Identified>(
    list: &mut Vec<T>,
    id: &str,
    missing: &str,
) -> Result<(), SyncError> {
    let before = list.len();
    remove_entry(list, id);
    if list.len() == before {
        return Err(SyncError::NotFound(missing.to_string()));
    }
    Ok(())
}

pub fn local_id() -> String {
    format!("{}{}", LOCAL_ID_PREFIX, Uuid::new_v4())
}

pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

fn require_text(value: &str, field_name: &str) -> Result<(), SyncError> {
    if value.trim().is_empty() {
        return Err(SyncError::Validation(format!("{} cannot be empty", field_name)));
    }
    Ok(())
}

fn require_positive(value: Decimal, field_name: &str) -> Result<(), SyncError> {
    if value <= Decimal::ZERO {
        return Err(SyncError::Validation(format!(
            "{} must be greater than zero",
            field_name
        )));
    }
    if value > Decimal::from(MAX_AMOUNT) {
        return Err(SyncError::Validation(format!(
            "{} cannot exceed {}",
            field_name, MAX_AMOUNT
        )));
    }
    Ok(())
}

type EntityLocks = Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

/// Held for the duration of one mutation. Removes the map entry once no
/// other caller is holding or waiting on it.
struct EntityGuard<'a> {
    locks: &'a EntityLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for EntityGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

pub struct SyncLayer {
    store: Arc<dyn RecordStore>,
    options: SyncOptions,
    state: RwLock<SyncSnapshot>,
    entity_locks: EntityLocks,
}

impl SyncLayer {
    pub fn new(store: Arc<dyn RecordStore>, options: SyncOptions) -> Self {
        Self {
            store,
            options,
            state: RwLock::new(SyncSnapshot::default()),
            entity_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub async fn snapshot(&self) -> SyncSnapshot {
        self.state.read().await.clone()
    }

    pub async fn transactions(&self) -> Vec<Transaction> {
        self.state.read().await.transactions.clone()
    }

    pub async fn goals(&self) -> Vec<Goal> {
        self.state.read().await.goals.clone()
    }

    pub async fn notes(&self) -> Vec<Note> {
        self.state.read().await.notes.clone()
    }

    /// Income, expense and the remaining balance (clamped at zero) for `budget`.
    pub async fn totals(&self, budget: Decimal) -> Totals {
        let state = self.state.read().await;
        let (total_income, total_expense) = state.transactions.iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(income, expense), t| match t.kind {
                TransactionKind::Income => (income.saturating_add(t.amount), expense),
                TransactionKind::Expense => (income, expense.saturating_add(t.amount)),
            },
        );

        Totals {
            total_income,
            total_expense,
            money_left: budget
                .saturating_add(total_income)
                .saturating_sub(total_expense)
                .max(Decimal::ZERO),
        }
    }

    /// Spending insights over the local expense list.
    pub async fn insights(&self, from: i64, to: i64) -> Summary {
        let state = self.state.read().await;
        let expenses: Vec<Transaction> = state
            .transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::Expense)
            .cloned()
            .collect();
        summarize(&expenses, from, to)
    }

    pub async fn goal_plans(&self, monthly_saving: Decimal, now: i64) -> Vec<(Goal, GoalPlan)> {
        let state = self.state.read().await;
        state
            .goals
            .iter()
            .map(|goal| (goal.clone(), evaluate(goal, monthly_saving, now)))
            .collect()
    }

    /// Fetches all three collections concurrently. Each list that loads replaces
    /// the local copy; the first failure, if any, is returned.
    pub async fn load(&self) -> Result<(), SyncError> {
        let (transactions, goals, notes) = tokio::join!(
            self.retrying(|| self.store.list_transactions(), false),
            self.retrying(|| self.store.list_goals(), false),
            self.retrying(|| self.store.list_notes(), false),
        );

        let mut first_error = None;
        let mut state = self.state.write().await;

        match transactions {
            Ok(list) => state.transactions = list,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load transactions");
                first_error.get_or_insert(e);
            }
        }
        match goals {
            Ok(list) => state.goals = list,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load goals");
                first_error.get_or_insert(e);
            }
        }
        match notes {
            Ok(list) => state.notes = list,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load notes");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub async fn add_transaction(&self, input: NewTransaction) -> Result<Transaction, SyncError> {
        require_text(&input.title, "Transaction title")?;
        require_positive(input.amount, "Transaction amount")?;

        let payload = CreateTransactionPayload {
            title: input.title.trim().to_string(),
            ..input
        };

        match self.call(self.store.create_transaction(&payload)).await {
            Ok(saved) => {
                self.state.write().await.transactions.insert(0, saved.clone());
                Ok(saved)
            }
            Err(e @ SyncError::Validation(_)) => Err(e),
            Err(e) => {
                let local = Transaction {
                    id: local_id(),
                    title: payload.title,
                    amount: payload.amount,
                    kind: payload.kind,
                    occurred_at: payload.occurred_at.unwrap_or_else(now_timestamp),
                };
                tracing::warn!(error = %e, id = %local.id, "keeping unsaved transaction locally");
                self.state.write().await.transactions.insert(0, local);
                Err(e)
            }
        }
    }

    pub async fn update_transaction(
        &self,
        id: &str,
        patch: UpdateTransactionPayload,
    ) -> Result<Transaction, SyncError> {
        if patch.is_empty() {
            return Err(SyncError::Validation(
                "At least one field must be provided for update".to_string(),
            ));
        }
        if let Some(title) = &patch.title {
            require_text(title, "Transaction title")?;
        }
        if let Some(amount) = patch.amount {
            require_positive(amount, "Transaction amount")?;
        }

        let _guard = self.lock_entity("transaction", id).await;
        if is_local_id(id) {
            let mut state = self.state.write().await;
            return match state.transactions.iter_mut().find(|t| t.id == id) {
                Some(existing) => {
                    *existing = patch.apply_to(existing);
                    Ok(existing.clone())
                }
                None => Err(SyncError::NotFound(ERR_TRANSACTION_NOT_FOUND.to_string())),
            };
        }
        match self.call(self.store.update_transaction(id, &patch)).await {
            Ok(updated) => {
                replace_entry(&mut self.state.write().await.transactions, updated.clone());
                Ok(updated)
            }
            Err(e) => {
                if self.applies_locally(&e) {
                    let mut state = self.state.write().await;
                    if let Some(existing) = state.transactions.iter_mut().find(|t| t.id == id) {
                        *existing = patch.apply_to(existing);
                    }
                }
                Err(e)
            }
        }
    }

    pub async fn delete_transaction(&self, id: &str) -> Result<(), SyncError> {
        let _guard = self.lock_entity("transaction", id).await;
        if is_local_id(id) {
            let mut state = self.state.write().await;
            return remove_unsaved(&mut state.transactions, id, ERR_TRANSACTION_NOT_FOUND);
        }
        let result = self
            .retrying(|| self.store.delete_transaction(id), true)
            .await;
        self.finish_delete(result, |state| remove_entry(&mut state.transactions, id))
            .await
    }

    pub async fn add_goal(&self, input: CreateGoalPayload) -> Result<Goal, SyncError> {
        require_text(&input.name, "Goal name")?;
        require_positive(input.target, "Goal target")?;

        let payload = CreateGoalPayload {
            name: input.name.trim().to_string(),
            ..input
        };

        match self.call(self.store.create_goal(&payload)).await {
            Ok(saved) => {
                self.state.write().await.goals.insert(0, saved.clone());
                Ok(saved)
            }
            Err(e @ SyncError::Validation(_)) => Err(e),
            Err(e) => {
                let local = Goal {
                    id: local_id(),
                    name: payload.name,
                    target_amount: payload.target,
                    deadline: payload.deadline,
                    completed: false,
                    created_at: now_timestamp(),
                };
                tracing::warn!(error = %e, id = %local.id, "keeping unsaved goal locally");
                self.state.write().await.goals.insert(0, local);
                Err(e)
            }
        }
    }

    pub async fn update_goal(&self, id: &str, patch: UpdateGoalPayload) -> Result<Goal, SyncError> {
        if patch.is_empty() {
            return Err(SyncError::Validation(
                "At least one field must be provided for update".to_string(),
            ));
        }
        if let Some(name) = &patch.name {
            require_text(name, "Goal name")?;
        }
        if let Some(target) = patch.target {
            require_positive(target, "Goal target")?;
        }

        let _guard = self.lock_entity("goal", id).await;
        if is_local_id(id) {
            return self.update_unsaved_goal(id, &patch).await;
        }
        let result = self.call(self.store.update_goal(id, &patch)).await;
        self.finish_goal_update(id, &patch, result).await
    }

    pub async fn complete_goal(&self, id: &str) -> Result<Goal, SyncError> {
        let patch = UpdateGoalPayload {
            completed: Some(true),
            ..Default::default()
        };

        let _guard = self.lock_entity("goal", id).await;
        if is_local_id(id) {
            return self.update_unsaved_goal(id, &patch).await;
        }
        let result = self.call(self.store.complete_goal(id)).await;
        self.finish_goal_update(id, &patch, result).await
    }

    pub async fn delete_goal(&self, id: &str) -> Result<(), SyncError> {
        let _guard = self.lock_entity("goal", id).await;
        if is_local_id(id) {
            let mut state = self.state.write().await;
            return remove_unsaved(&mut state.goals, id, ERR_GOAL_NOT_FOUND);
        }
        let result = self.retrying(|| self.store.delete_goal(id), true).await;
        self.finish_delete(result, |state| remove_entry(&mut state.goals, id))
            .await
    }

    pub async fn add_note(&self, text: &str) -> Result<Note, SyncError> {
        require_text(text, "Note text")?;

        let payload = CreateNotePayload {
            text: text.trim().to_string(),
        };

        match self.call(self.store.create_note(&payload)).await {
            Ok(saved) => {
                self.state.write().await.notes.insert(0, saved.clone());
                Ok(saved)
            }
            Err(e @ SyncError::Validation(_)) => Err(e),
            Err(e) => {
                let local = Note {
                    id: local_id(),
                    text: payload.text,
                    created_at: now_timestamp(),
                };
                tracing::warn!(error = %e, id = %local.id, "keeping unsaved note locally");
                self.state.write().await.notes.insert(0, local);
                Err(e)
            }
        }
    }

    pub async fn delete_note(&self, id: &str) -> Result<(), SyncError> {
        let _guard = self.lock_entity("note", id).await;
        if is_local_id(id) {
            let mut state = self.state.write().await;
            return remove_unsaved(&mut state.notes, id, ERR_NOTE_NOT_FOUND);
        }
        let result = self.retrying(|| self.store.delete_note(id), true).await;
        self.finish_delete(result, |state| remove_entry(&mut state.notes, id))
            .await
    }

    async fn update_unsaved_goal(
        &self,
        id: &str,
        patch: &UpdateGoalPayload,
    ) -> Result<Goal, SyncError> {
        let mut state = self.state.write().await;
        match state.goals.iter_mut().find(|g| g.id == id) {
            Some(existing) => {
                *existing = patch.apply_to(existing);
                Ok(existing.clone())
            }
            None => Err(SyncError::NotFound(ERR_GOAL_NOT_FOUND.to_string())),
        }
    }

    async fn finish_goal_update(
        &self,
        id: &str,
        patch: &UpdateGoalPayload,
        result: Result<Goal, SyncError>,
    ) -> Result<Goal, SyncError> {
        match result {
            Ok(updated) => {
                replace_entry(&mut self.state.write().await.goals, updated.clone());
                Ok(updated)
            }
            Err(e) => {
                if self.applies_locally(&e) {
                    let mut state = self.state.write().await;
                    if let Some(existing) = state.goals.iter_mut().find(|g| g.id == id) {
                        *existing = patch.apply_to(existing);
                    }
                }
                Err(e)
            }
        }
    }

    async fn finish_delete<F>(&self, result: Result<(), SyncError>, remove: F) -> Result<(), SyncError>
    where
        F: FnOnce(&mut SyncSnapshot),
    {
        match result {
            Ok(()) => {
                remove(&mut *self.state.write().await);
                Ok(())
            }
            Err(e) => {
                if self.applies_locally(&e) {
                    remove(&mut *self.state.write().await);
                }
                Err(e)
            }
        }
    }

    /// Only transport-level failures are eligible for the local fallback.
    fn applies_locally(&self, err: &SyncError) -> bool {
        err.is_retryable() && self.options.failure_policy == FailurePolicy::ApplyLocally
    }

    /// Waits for any in-flight mutation on the same entity. Waiters are served FIFO.
    async fn lock_entity(&self, kind: &str, id: &str) -> EntityGuard<'_> {
        let key = format!("{}:{}", kind, id);
        let lock = {
            let mut locks = self
                .entity_locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        EntityGuard {
            locks: &self.entity_locks,
            key,
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Number of entities with a mutation in flight or queued.
    pub fn locked_entities(&self) -> usize {
        self.entity_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    async fn call<T, F>(&self, request: F) -> Result<T, SyncError>
    where
        F: Future<Output = Result<T, SyncError>>,
    {
        match tokio::time::timeout(self.options.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout),
        }
    }

    /// Retries idempotent requests with exponential backoff. With `missing_ok`,
    /// a `NotFound` after a failed attempt counts as success since the earlier
    /// attempt may have been applied.
    async fn retrying<T, F, Fut>(&self, mut request: F, missing_ok: bool) -> Result<T, SyncError>
    where
        T: Default,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let mut attempt = 0;
        loop {
            match self.call(request()).await {
                Err(SyncError::NotFound(_)) if missing_ok && attempt > 0 => return Ok(T::default()),
                Err(e) if e.is_retryable() && attempt < self.options.max_retries => {
                    let delay = self.options.retry_backoff * 2u32.saturating_pow(attempt);
                    tracing::debug!(error = %e, attempt, ?delay, "retrying store request");
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}
