/**
 * Media Routes
 * CRUD API endpoints for media library records. Binary storage and
 * resizing live elsewhere; these rows are metadata plus a weak folder
 * reference.
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::core::hierarchy;
use crate::db::{models::Media, AppState};
use crate::error::ApiError;
use crate::routes::{clamp_pagination, default_page, default_page_size, deserialize_some, SuccessResponse};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    pub folder_id: Option<Uuid>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaListResponse {
    pub items: Vec<Media>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMediaRequest {
    pub filename: String,
    pub url: String,
    pub alt_text: Option<String>,
    pub mime_type: Option<String>,
    pub folder_id: Option<Uuid>,
}

/// `folderId` is presence-sensitive: explicit null detaches the media from
/// any folder.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMediaRequest {
    pub filename: Option<String>,
    pub alt_text: Option<String>,
    pub mime_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub folder_id: Option<Option<Uuid>>,
}

const SELECT_COLUMNS: &str = "id, filename, url, alt_text, mime_type, folder_id, created_at";

/// GET /api/media - List media, optionally filtered by folder
pub async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<MediaListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, page_size, offset) = clamp_pagination(query.page, query.page_size);

    let (items, total) = if let Some(folder_id) = query.folder_id {
        let items = sqlx::query_as::<_, Media>(&format!(
            "SELECT {SELECT_COLUMNS} FROM media WHERE folder_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(folder_id)
        .bind(page_size)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM media WHERE folder_id = $1")
            .bind(folder_id)
            .fetch_one(&state.pool)
            .await?;
        (items, total)
    } else {
        let items = sqlx::query_as::<_, Media>(&format!(
            "SELECT {SELECT_COLUMNS} FROM media ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page_size)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM media")
            .fetch_one(&state.pool)
            .await?;
        (items, total)
    };

    Ok(Json(MediaListResponse {
        items,
        page,
        page_size,
        total,
    }))
}

/// GET /api/media/:id - Get single media record
pub async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Media>, ApiError> {
    let media =
        sqlx::query_as::<_, Media>(&format!("SELECT {SELECT_COLUMNS} FROM media WHERE id = $1"))
            .bind(id)
            .fetch_optional(&state.pool)
            .await?
            .ok_or(ApiError::NotFound)?;
    Ok(Json(media))
}

/// POST /api/media - Create media record; the folder must exist
pub async fn create_media(
    State(state): State<AppState>,
    Json(payload): Json<CreateMediaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.filename.trim().is_empty() {
        return Err(ApiError::BadRequest("Filename is required".to_string()));
    }

    let mut conn = state.pool.acquire().await?;
    hierarchy::validate_parent(&mut conn, payload.folder_id).await?;

    let media = sqlx::query_as::<_, Media>(&format!(
        "INSERT INTO media (filename, url, alt_text, mime_type, folder_id) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(&payload.filename)
    .bind(&payload.url)
    .bind(&payload.alt_text)
    .bind(&payload.mime_type)
    .bind(payload.folder_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok((StatusCode::CREATED, Json(media)))
}

/// PATCH /api/media/:id - Update media metadata / move between folders
pub async fn update_media(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMediaRequest>,
) -> Result<Json<Media>, ApiError> {
    let mut conn = state.pool.acquire().await?;

    let existing =
        sqlx::query_as::<_, Media>(&format!("SELECT {SELECT_COLUMNS} FROM media WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(ApiError::NotFound)?;

    if let Some(folder_id) = payload.folder_id {
        hierarchy::validate_parent(&mut conn, folder_id).await?;
    }

    let filename = payload.filename.unwrap_or(existing.filename);
    let alt_text = payload.alt_text.or(existing.alt_text);
    let mime_type = payload.mime_type.or(existing.mime_type);
    let folder_id = payload.folder_id.unwrap_or(existing.folder_id);

    let media = sqlx::query_as::<_, Media>(&format!(
        "UPDATE media SET filename = $1, alt_text = $2, mime_type = $3, folder_id = $4 \
         WHERE id = $5 \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(&filename)
    .bind(&alt_text)
    .bind(&mime_type)
    .bind(folder_id)
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Json(media))
}

/// DELETE /api/media/:id - Delete media record
pub async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let result = sqlx::query("DELETE FROM media WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Json(SuccessResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_null_folder_detaches() {
        let req: UpdateMediaRequest = serde_json::from_str(r#"{"folderId":null}"#).unwrap();
        assert_eq!(req.folder_id, Some(None));
    }

    #[test]
    fn test_update_request_absent_folder_untouched() {
        let req: UpdateMediaRequest = serde_json::from_str(r#"{"filename":"a.png"}"#).unwrap();
        assert!(req.folder_id.is_none());
    }
}
