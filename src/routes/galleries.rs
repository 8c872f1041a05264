/**
 * Gallery Routes
 * Image galleries: an ordered sequence of weak references to media rows
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{
    models::{GalleryImage, ImageGallery},
    AppState,
};
use crate::error::ApiError;
use crate::routes::{validate_slug, SuccessResponse};

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryListResponse {
    pub items: Vec<ImageGallery>,
    pub total: i64,
}

/// Gallery plus its ordered images.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryDetailResponse {
    #[serde(flatten)]
    pub gallery: ImageGallery,
    pub images: Vec<GalleryImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGalleryRequest {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGalleryRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddImageRequest {
    pub media_id: Uuid,
    pub sort_order: Option<i32>,
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateImageRequest {
    pub sort_order: Option<i32>,
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub items: Vec<ReorderItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderItem {
    pub id: Uuid,
    pub sort_order: i32,
}

const GALLERY_COLUMNS: &str = "id, title, slug, description, created_at, updated_at";
const IMAGE_COLUMNS: &str = "id, gallery_id, media_id, sort_order, caption";

async fn fetch_gallery(state: &AppState, id: Uuid) -> Result<ImageGallery, ApiError> {
    sqlx::query_as::<_, ImageGallery>(&format!(
        "SELECT {GALLERY_COLUMNS} FROM image_galleries WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(ApiError::NotFound)
}

/// GET /api/galleries - List galleries
pub async fn list_galleries(
    State(state): State<AppState>,
) -> Result<Json<GalleryListResponse>, ApiError> {
    let items = sqlx::query_as::<_, ImageGallery>(&format!(
        "SELECT {GALLERY_COLUMNS} FROM image_galleries ORDER BY created_at DESC"
    ))
    .fetch_all(&state.pool)
    .await?;

    let total = items.len() as i64;
    Ok(Json(GalleryListResponse { items, total }))
}

/// GET /api/galleries/:id - Gallery with its images in sort order
pub async fn get_gallery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GalleryDetailResponse>, ApiError> {
    let gallery = fetch_gallery(&state, id).await?;

    let images = sqlx::query_as::<_, GalleryImage>(&format!(
        "SELECT {IMAGE_COLUMNS} FROM gallery_images WHERE gallery_id = $1 \
         ORDER BY sort_order, id"
    ))
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(GalleryDetailResponse { gallery, images }))
}

/// POST /api/galleries - Create gallery
pub async fn create_gallery(
    State(state): State<AppState>,
    Json(payload): Json<CreateGalleryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    validate_slug(&payload.slug)?;

    let gallery = sqlx::query_as::<_, ImageGallery>(&format!(
        "INSERT INTO image_galleries (title, slug, description) \
         VALUES ($1, $2, $3) \
         RETURNING {GALLERY_COLUMNS}"
    ))
    .bind(&payload.title)
    .bind(&payload.slug)
    .bind(&payload.description)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(gallery)))
}

/// PATCH /api/galleries/:id - Update gallery (only supplied fields change)
pub async fn update_gallery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGalleryRequest>,
) -> Result<Json<ImageGallery>, ApiError> {
    let existing = fetch_gallery(&state, id).await?;

    let title = payload.title.unwrap_or(existing.title);
    let description = payload.description.or(existing.description);

    let gallery = sqlx::query_as::<_, ImageGallery>(&format!(
        "UPDATE image_galleries SET title = $1, description = $2, updated_at = now() \
         WHERE id = $3 \
         RETURNING {GALLERY_COLUMNS}"
    ))
    .bind(&title)
    .bind(&description)
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(gallery))
}

/// DELETE /api/galleries/:id - Delete gallery (its image rows go with it)
pub async fn delete_gallery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let result = sqlx::query("DELETE FROM image_galleries WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/galleries/:id/images - Add an image; the media row must exist
pub async fn add_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddImageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    fetch_gallery(&state, id).await?;

    let (media_exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM media WHERE id = $1)")
            .bind(payload.media_id)
            .fetch_one(&state.pool)
            .await?;
    if !media_exists {
        return Err(ApiError::ReferenceNotFound("media"));
    }

    // Default to the end of the sequence.
    let sort_order = match payload.sort_order {
        Some(order) => order,
        None => {
            let (max,): (Option<i32>,) = sqlx::query_as(
                "SELECT MAX(sort_order) FROM gallery_images WHERE gallery_id = $1",
            )
            .bind(id)
            .fetch_one(&state.pool)
            .await?;
            max.map_or(0, |m| m + 1)
        }
    };

    let image = sqlx::query_as::<_, GalleryImage>(&format!(
        "INSERT INTO gallery_images (gallery_id, media_id, sort_order, caption) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {IMAGE_COLUMNS}"
    ))
    .bind(id)
    .bind(payload.media_id)
    .bind(sort_order)
    .bind(&payload.caption)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(image)))
}

/// PATCH /api/galleries/:id/images/:image_id - Update caption/position
pub async fn update_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateImageRequest>,
) -> Result<Json<GalleryImage>, ApiError> {
    let existing = sqlx::query_as::<_, GalleryImage>(&format!(
        "SELECT {IMAGE_COLUMNS} FROM gallery_images WHERE id = $1 AND gallery_id = $2"
    ))
    .bind(image_id)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(ApiError::NotFound)?;

    let sort_order = payload.sort_order.unwrap_or(existing.sort_order);
    let caption = payload.caption.or(existing.caption);

    let image = sqlx::query_as::<_, GalleryImage>(&format!(
        "UPDATE gallery_images SET sort_order = $1, caption = $2 \
         WHERE id = $3 \
         RETURNING {IMAGE_COLUMNS}"
    ))
    .bind(sort_order)
    .bind(&caption)
    .bind(image_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(image))
}

/// DELETE /api/galleries/:id/images/:image_id - Remove image from gallery
pub async fn remove_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let result = sqlx::query("DELETE FROM gallery_images WHERE id = $1 AND gallery_id = $2")
        .bind(image_id)
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/galleries/:id/reorder - Bulk reorder.
///
/// NOT atomic across items: each row is updated in turn, and an error
/// partway through leaves earlier items updated. Callers must re-read
/// state before retrying after a reorder error.
pub async fn reorder_images(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReorderRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    fetch_gallery(&state, id).await?;

    for item in &payload.items {
        let result = sqlx::query(
            "UPDATE gallery_images SET sort_order = $1 WHERE id = $2 AND gallery_id = $3",
        )
        .bind(item.sort_order)
        .bind(item.id)
        .bind(id)
        .execute(&state.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
    }

    Ok(Json(SuccessResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reorder_request_parses_items() {
        let id = Uuid::new_v4();
        let body = format!(r#"{{"items":[{{"id":"{id}","sortOrder":3}}]}}"#);
        let req: ReorderRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(req.items.len(), 1);
        assert_eq!(req.items[0].sort_order, 3);
    }

    #[test]
    fn test_add_image_request_defaults() {
        let id = Uuid::new_v4();
        let body = format!(r#"{{"mediaId":"{id}"}}"#);
        let req: AddImageRequest = serde_json::from_str(&body).unwrap();
        assert!(req.sort_order.is_none());
        assert!(req.caption.is_none());
    }
}
