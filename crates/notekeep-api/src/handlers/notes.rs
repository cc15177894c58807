//! Note HTTP handlers.
//!
//! All routes require a bearer token; the caller's id is the owner for every
//! operation.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;

use notekeep_core::{
    CreateNoteRequest, ListNotesParams, ListNotesRequest, NoteView, ReorderRequest,
    UpdateNoteRequest,
};

use super::note_id;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;

type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// List the caller's notes.
///
/// # Query Parameters
/// - `isArchived`, `isPinned`: `true` or `false`
/// - `labels`: comma-separated label ids, any of which must be present
/// - `search`: words matched against title and description
/// - `sortBy`: comma-separated fields, `-` prefix for descending
pub async fn list_notes(
    State(state): State<AppState>,
    user: AuthUser,
    params: Result<Query<ListNotesParams>, QueryRejection>,
) -> ApiResult<Vec<NoteView>> {
    let Query(params) = params?;
    let req = ListNotesRequest::from_params(&params)?;
    let notes = state.notes.list(user.id, &req).await?;
    Ok(ApiResponse::list(notes))
}

pub async fn get_note(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<NoteView> {
    let Path(id) = id?;
    let note = state.notes.get(note_id(&id)?, user.id).await?;
    Ok(ApiResponse::ok(note))
}

pub async fn create_note(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> ApiResult<NoteView> {
    let Json(req) = body?;
    let note = state.notes.create(user.id, req).await?;
    Ok(ApiResponse::created(note))
}

pub async fn update_note(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<UpdateNoteRequest>, JsonRejection>,
) -> ApiResult<NoteView> {
    let Path(id) = id?;
    let id = note_id(&id)?;
    let Json(req) = body?;
    let note = state.notes.update(id, user.id, req).await?;
    Ok(ApiResponse::ok(note))
}

pub async fn delete_note(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Empty> {
    let Path(id) = id?;
    state.notes.delete(note_id(&id)?, user.id).await?;
    Ok(ApiResponse::ok(Empty {}))
}

/// Move one note to `newOrder`, shifting the notes in between.
pub async fn reorder_notes(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<ReorderRequest>, JsonRejection>,
) -> ApiResult<NoteView> {
    let Json(req) = body?;
    let note = state.notes.reorder(user.id, req).await?;
    Ok(ApiResponse::ok(note))
}

pub async fn toggle_pin(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<NoteView> {
    let Path(id) = id?;
    let note = state.notes.toggle_pin(note_id(&id)?, user.id).await?;
    Ok(ApiResponse::ok(note))
}

pub async fn toggle_archive(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<NoteView> {
    let Path(id) = id?;
    let note = state.notes.toggle_archive(note_id(&id)?, user.id).await?;
    Ok(ApiResponse::ok(note))
}
