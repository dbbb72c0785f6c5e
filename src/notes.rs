use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::AppState;
use crate::constants::*;
use crate::database::Db;
use crate::error::ApiError;
use crate::models::{CreateNotePayload, DeletedResponse, Note};
use crate::utils::{db_error_with_context, now_timestamp, validate_string_length};

pub fn extract_note_from_row(row: libsql::Row) -> Result<Note, ApiError> {
    let id: String = row
        .get(0)
        .map_err(|_| db_error_with_context("invalid note data"))?;
    let text: String = row
        .get(1)
        .map_err(|_| db_error_with_context("invalid note data"))?;
    let created_at: i64 = row
        .get(2)
        .map_err(|_| db_error_with_context("invalid note data"))?;

    Ok(Note {
        id,
        text,
        created_at,
    })
}

pub async fn insert_note(db: &Db, payload: &CreateNotePayload) -> Result<Note, ApiError> {
    validate_string_length(&payload.text, "Note text", MAX_NOTE_LENGTH)?;

    let note = Note {
        id: Uuid::new_v4().to_string(),
        text: payload.text.trim().to_string(),
        created_at: now_timestamp(),
    };

    let conn = db.write().await;
    conn.execute(
        "INSERT INTO notes (id, text, created_at) VALUES (?, ?, ?)",
        (note.id.as_str(), note.text.as_str(), note.created_at),
    )
    .await
    .map_err(|_| db_error_with_context("note creation failed"))?;

    Ok(note)
}

pub async fn list_notes(db: &Db) -> Result<Vec<Note>, ApiError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, text, created_at FROM notes ORDER BY created_at DESC, rowid DESC",
            (),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query notes"))?;

    let mut notes = Vec::new();
    while let Some(row) = rows.next().await? {
        notes.push(extract_note_from_row(row)?);
    }
    Ok(notes)
}

pub async fn delete_note(db: &Db, id: &str) -> Result<(), ApiError> {
    let conn = db.write().await;
    let affected = conn
        .execute("DELETE FROM notes WHERE id = ?", [id])
        .await
        .map_err(|_| db_error_with_context("note deletion failed"))?;

    if affected == 0 {
        return Err(ApiError::NotFound(ERR_NOTE_NOT_FOUND.to_string()));
    }
    Ok(())
}

pub async fn list_notes_handler(State(state): State<AppState>) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(list_notes(&state.db).await?))
}

pub async fn create_note_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateNotePayload>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let note = insert_note(&state.db, &payload).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn delete_note_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    delete_note(&state.db, &id).await?;
    Ok(Json(DeletedResponse { id }))
}
