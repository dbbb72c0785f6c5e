use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    CreateGoalPayload, CreateNotePayload, CreateTransactionPayload, Goal, Note, Transaction,
    UpdateGoalPayload, UpdateTransactionPayload,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// Input rejected before (or by) the store. Never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,
}

impl SyncError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Transport(_) | SyncError::Timeout)
    }
}

/// Remote persistence boundary the sync layer talks to.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_transactions(&self) -> Result<Vec<Transaction>, SyncError>;
    async fn create_transaction(
        &self,
        payload: &CreateTransactionPayload,
    ) -> Result<Transaction, SyncError>;
    async fn update_transaction(
        &self,
        id: &str,
        patch: &UpdateTransactionPayload,
    ) -> Result<Transaction, SyncError>;
    async fn delete_transaction(&self, id: &str) -> Result<(), SyncError>;

    async fn list_goals(&self) -> Result<Vec<Goal>, SyncError>;
    async fn create_goal(&self, payload: &CreateGoalPayload) -> Result<Goal, SyncError>;
    async fn update_goal(&self, id: &str, patch: &UpdateGoalPayload) -> Result<Goal, SyncError>;
    async fn complete_goal(&self, id: &str) -> Result<Goal, SyncError>;
    async fn delete_goal(&self, id: &str) -> Result<(), SyncError>;

    async fn list_notes(&self) -> Result<Vec<Note>, SyncError>;
    async fn create_note(&self, payload: &CreateNotePayload) -> Result<Note, SyncError>;
    async fn delete_note(&self, id: &str) -> Result<(), SyncError>;
}
