/**
 * Media Folder Routes
 * Folder tree management: create, rename/reparent, delete-with-reassignment
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::core::hierarchy;
use crate::db::{models::MediaFolder, AppState};
use crate::error::ApiError;
use crate::routes::{deserialize_some, SuccessResponse};

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderListResponse {
    pub items: Vec<MediaFolder>,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub name: String,
    pub parent_id: Option<Uuid>,
}

/// `parentId` is presence-sensitive: absent leaves the parent alone,
/// explicit null moves the folder to the root.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFolderRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub parent_id: Option<Option<Uuid>>,
}

/// GET /api/folders - List all folders (the whole forest)
pub async fn list_folders(
    State(state): State<AppState>,
) -> Result<Json<FolderListResponse>, ApiError> {
    let items = sqlx::query_as::<_, MediaFolder>(
        "SELECT id, name, parent_id FROM media_folders ORDER BY name",
    )
    .fetch_all(&state.pool)
    .await?;

    let total = items.len() as i64;
    Ok(Json(FolderListResponse { items, total }))
}

/// POST /api/folders - Create folder under an existing (or no) parent
pub async fn create_folder(
    State(state): State<AppState>,
    Json(payload): Json<CreateFolderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }

    let folder = hierarchy::create_folder(&state.pool, &payload.name, payload.parent_id).await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

/// PATCH /api/folders/:id - Rename and/or reparent a folder
pub async fn update_folder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFolderRequest>,
) -> Result<Json<MediaFolder>, ApiError> {
    if let Some(name) = payload.name.as_deref() {
        if name.trim().is_empty() {
            return Err(ApiError::BadRequest("Name must not be empty".to_string()));
        }
    }

    let folder =
        hierarchy::rename_or_reparent(&state.pool, id, payload.name, payload.parent_id).await?;
    Ok(Json(folder))
}

/// DELETE /api/folders/:id - Delete folder, reassigning its media to the
/// folder's own parent. Blocked while child folders exist.
pub async fn delete_folder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    hierarchy::delete_folder(&state.pool, id).await?;
    Ok(Json(SuccessResponse { success: true }))
}
