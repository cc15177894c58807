//! Label HTTP handlers.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use notekeep_core::{
    CreateLabelRequest, LabelDetail, LabelWithCount, ModifiedCount, ObjectId, UpdateLabelRequest,
};

use super::label_id;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;

type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Body of the bulk attach/detach routes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelNotesRequest {
    pub note_ids: Option<Vec<ObjectId>>,
}

impl LabelNotesRequest {
    fn into_ids(self) -> Result<Vec<ObjectId>, ApiError> {
        self.note_ids
            .ok_or_else(|| ApiError::BadRequest("Please provide an array of note IDs".to_string()))
    }
}

/// List the caller's labels.
///
/// Returns labels sorted by name, each with the number of notes carrying it.
pub async fn list_labels(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<LabelWithCount>> {
    let labels = state.labels.list(user.id).await?;
    Ok(ApiResponse::list(labels))
}

/// Get one label together with its notes.
pub async fn get_label(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<LabelDetail> {
    let Path(id) = id?;
    let detail = state.labels.get(label_id(&id)?, user.id).await?;
    Ok(ApiResponse::ok(detail))
}

pub async fn create_label(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<CreateLabelRequest>, JsonRejection>,
) -> ApiResult<LabelWithCount> {
    let Json(req) = body?;
    let label = state.labels.create(user.id, req).await?;
    Ok(ApiResponse::created(label))
}

pub async fn update_label(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<UpdateLabelRequest>, JsonRejection>,
) -> ApiResult<LabelWithCount> {
    let Path(id) = id?;
    let id = label_id(&id)?;
    let Json(req) = body?;
    let label = state.labels.update(id, user.id, req).await?;
    Ok(ApiResponse::ok(label))
}

/// Delete a label. Every note carrying it loses the reference first.
pub async fn delete_label(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Empty> {
    let Path(id) = id?;
    state.labels.delete(label_id(&id)?, user.id).await?;
    Ok(ApiResponse::ok(Empty {}))
}

pub async fn add_label_to_notes(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<LabelNotesRequest>, JsonRejection>,
) -> ApiResult<ModifiedCount> {
    let Path(id) = id?;
    let id = label_id(&id)?;
    let Json(req) = body?;
    let note_ids = req.into_ids()?;
    let result = state.labels.add_to_notes(id, user.id, &note_ids).await?;
    Ok(ApiResponse::ok(result))
}

pub async fn remove_label_from_notes(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<LabelNotesRequest>, JsonRejection>,
) -> ApiResult<ModifiedCount> {
    let Path(id) = id?;
    let id = label_id(&id)?;
    let Json(req) = body?;
    let note_ids = req.into_ids()?;
    let result = state.labels.remove_from_notes(id, user.id, &note_ids).await?;
    Ok(ApiResponse::ok(result))
}
