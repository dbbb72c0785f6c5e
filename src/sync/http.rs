//! [`RecordStore`] backed by the REST API served by this crate.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use super::store::{RecordStore, SyncError};
use crate::models::{
    CreateGoalPayload, CreateNotePayload, CreateTransactionPayload, DeletedResponse, Goal, Note,
    Transaction, UpdateGoalPayload, UpdateTransactionPayload,
};

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct HttpRecordStore {
    client: Client,
    base_url: String,
}

impl HttpRecordStore {
    /// `base_url` points at the API root, e.g. `http://localhost:3000/api`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SyncError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if status.is_success() {
            return response.json::<T>().await.map_err(transport_error);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| status.to_string());

        Err(match status {
            StatusCode::NOT_FOUND => SyncError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                SyncError::Validation(message)
            }
            _ => SyncError::Transport(format!("{}: {}", status, message)),
        })
    }
}

fn transport_error(err: reqwest::Error) -> SyncError {
    if err.is_timeout() {
        SyncError::Timeout
    } else {
        SyncError::Transport(err.to_string())
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn list_transactions(&self) -> Result<Vec<Transaction>, SyncError> {
        self.send(self.client.get(self.url("/expenses"))).await
    }

    async fn create_transaction(
        &self,
        payload: &CreateTransactionPayload,
    ) -> Result<Transaction, SyncError> {
        self.send(self.client.post(self.url("/expenses")).json(payload))
            .await
    }

    async fn update_transaction(
        &self,
        id: &str,
        patch: &UpdateTransactionPayload,
    ) -> Result<Transaction, SyncError> {
        self.send(
            self.client
                .put(self.url(&format!("/expenses/{}", id)))
                .json(patch),
        )
        .await
    }

    async fn delete_transaction(&self, id: &str) -> Result<(), SyncError> {
        let _: DeletedResponse = self
            .send(self.client.delete(self.url(&format!("/expenses/{}", id))))
            .await?;
        Ok(())
    }

    async fn list_goals(&self) -> Result<Vec<Goal>, SyncError> {
        self.send(self.client.get(self.url("/goals"))).await
    }

    async fn create_goal(&self, payload: &CreateGoalPayload) -> Result<Goal, SyncError> {
        self.send(self.client.post(self.url("/goals")).json(payload))
            .await
    }

    async fn update_goal(&self, id: &str, patch: &UpdateGoalPayload) -> Result<Goal, SyncError> {
        self.send(
            self.client
                .patch(self.url(&format!("/goals/{}", id)))
                .json(patch),
        )
        .await
    }

    async fn complete_goal(&self, id: &str) -> Result<Goal, SyncError> {
        self.send(
            self.client
                .patch(self.url(&format!("/goals/{}/complete", id))),
        )
        .await
    }

    async fn delete_goal(&self, id: &str) -> Result<(), SyncError> {
        let _: DeletedResponse = self
            .send(self.client.delete(self.url(&format!("/goals/{}", id))))
            .await?;
        Ok(())
    }

    async fn list_notes(&self) -> Result<Vec<Note>, SyncError> {
        self.send(self.client.get(self.url("/notes"))).await
    }

    async fn create_note(&self, payload: &CreateNotePayload) -> Result<Note, SyncError> {
        self.send(self.client.post(self.url("/notes")).json(payload))
            .await
    }

    async fn delete_note(&self, id: &str) -> Result<(), SyncError> {
        let _: DeletedResponse = self
            .send(self.client.delete(self.url(&format!("/notes/{}", id))))
            .await?;
        Ok(())
    }
}
