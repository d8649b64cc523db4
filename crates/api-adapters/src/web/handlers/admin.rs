//! Admin CRUD endpoints. The create form is multipart so it can carry a
//! thumbnail and screenshots alongside the text fields.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use domains::{AppDraft, AppItem, Attachment};
use services::admin::admin_token;
use tracing::debug;

use crate::web::error::ApiError;
use crate::web::extract::CurrentSession;
use crate::web::state::AppState;

/// Upper bound for the whole multipart body.
pub const UPLOAD_LIMIT_BYTES: usize = 64 * 1024 * 1024;

pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AppItem>), ApiError> {
    // refuse before buffering the upload
    admin_token(&session)?;
    let (draft, attachments) = read_form(multipart).await?;
    match state.admin.create(&session, draft, attachments).await {
        Ok(item) => {
            state.metrics.record("admin", "created");
            Ok((StatusCode::CREATED, Json(item)))
        }
        Err(e) => {
            state.metrics.record("admin", "error");
            Err(e.into())
        }
    }
}

pub async fn edit(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Json(draft): Json<AppDraft>,
) -> Result<Json<AppItem>, ApiError> {
    match state.admin.edit(&session, &id, draft).await {
        Ok(item) => {
            state.metrics.record("admin", "updated");
            Ok(Json(item))
        }
        Err(e) => {
            state.metrics.record("admin", "error");
            Err(e.into())
        }
    }
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<AppItem>, ApiError> {
    Ok(Json(state.admin.get(&session, &id).await?))
}

async fn read_form(mut multipart: Multipart) -> Result<(AppDraft, Vec<Attachment>), ApiError> {
    let mut draft = AppDraft::default();
    let mut attachments = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field
                .content_type()
                .and_then(|ct| ct.parse().ok())
                .unwrap_or_else(|| mime_guess::from_path(&file_name).first_or_octet_stream());
            let data: Bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            if data.is_empty() {
                // browsers send an empty part for an untouched file input
                continue;
            }
            attachments.push(Attachment {
                field: name,
                file_name,
                content_type,
                data,
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        apply_text_field(&mut draft, &name, value)?;
    }

    Ok((draft, attachments))
}

fn apply_text_field(draft: &mut AppDraft, name: &str, value: String) -> Result<(), ApiError> {
    let optional = |value: String| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    };

    match name {
        "title" => draft.title = value,
        "description" => draft.description = value,
        "category" => draft.category = value,
        "platform" => draft.platform = value,
        "isPaid" => draft.is_paid = matches!(value.trim(), "true" | "on" | "1"),
        "price" => {
            draft.price = optional(value)
                .map(|v| v.parse::<f64>())
                .transpose()
                .map_err(|_| ApiError::BadRequest("price must be a number".into()))?
        }
        "size" => draft.size = optional(value),
        "tags" => {
            draft.tags = value
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect()
        }
        "gameMode" => draft.game_mode = optional(value),
        "releaseYear" => {
            draft.release_year = optional(value)
                .map(|v| v.parse::<i32>())
                .transpose()
                .map_err(|_| ApiError::BadRequest("releaseYear must be a year".into()))?
        }
        "downloadLink" => draft.download_link = optional(value),
        other => debug!(field = other, "ignoring unknown admin form field"),
    }
    Ok(())
}
