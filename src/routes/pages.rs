/**
 * Static Page Routes
 * CRUD API endpoints for static pages, including the single-homepage rule
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::core::{content_kind::ContentKind, lifecycle, singleton};
use crate::db::{
    models::{ContentStatus, StaticPage},
    AppState,
};
use crate::error::ApiError;
use crate::routes::{
    clamp_pagination, default_page, default_page_size, sanitize_html, validate_slug,
    SuccessResponse,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    pub status: Option<String>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageListResponse {
    pub items: Vec<StaticPage>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePageRequest {
    pub title: String,
    pub slug: String,
    pub content_html: Option<String>,
    pub status: Option<String>,
    pub is_homepage: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePageRequest {
    pub title: Option<String>,
    pub content_html: Option<String>,
    pub status: Option<String>,
    pub is_homepage: Option<bool>,
}

const SELECT_COLUMNS: &str =
    "id, title, slug, content_html, status, is_homepage, created_at, updated_at";

/// GET /api/pages - List static pages with pagination
pub async fn list_pages(
    State(state): State<AppState>,
    Query(query): Query<PageListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, page_size, offset) = clamp_pagination(query.page, query.page_size);

    let status = query
        .status
        .as_deref()
        .map(ContentStatus::parse)
        .transpose()?;

    let (items, total) = if let Some(status) = status {
        let items = sqlx::query_as::<_, StaticPage>(&format!(
            "SELECT {SELECT_COLUMNS} FROM static_pages WHERE status = $1 \
             ORDER BY title LIMIT $2 OFFSET $3"
        ))
        .bind(status.as_str())
        .bind(page_size)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;
        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM static_pages WHERE status = $1")
                .bind(status.as_str())
                .fetch_one(&state.pool)
                .await?;
        (items, total)
    } else {
        let items = sqlx::query_as::<_, StaticPage>(&format!(
            "SELECT {SELECT_COLUMNS} FROM static_pages ORDER BY title LIMIT $1 OFFSET $2"
        ))
        .bind(page_size)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM static_pages")
            .fetch_one(&state.pool)
            .await?;
        (items, total)
    };

    Ok(Json(PageListResponse {
        items,
        page,
        page_size,
        total,
    }))
}

/// GET /api/pages/:slug - Get single page by slug
pub async fn get_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<StaticPage>, ApiError> {
    validate_slug(&slug)?;

    let page = sqlx::query_as::<_, StaticPage>(&format!(
        "SELECT {SELECT_COLUMNS} FROM static_pages WHERE slug = $1"
    ))
    .bind(&slug)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(ApiError::NotFound)?;

    Ok(Json(page))
}

/// POST /api/pages - Create page. `isHomepage: true` demotes any previous
/// homepage inside the same transaction.
pub async fn create_page(
    State(state): State<AppState>,
    Json(payload): Json<CreatePageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    validate_slug(&payload.slug)?;

    let status = payload
        .status
        .as_deref()
        .map(ContentStatus::parse)
        .transpose()?
        .unwrap_or(ContentStatus::Draft);
    let content_html = payload.content_html.map(|h| sanitize_html(&h));
    let is_homepage = payload.is_homepage.unwrap_or(false);

    let mut tx = state.pool.begin().await?;

    let page = sqlx::query_as::<_, StaticPage>(&format!(
        "INSERT INTO static_pages (title, slug, content_html, status, is_homepage) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(&payload.title)
    .bind(&payload.slug)
    .bind(&content_html)
    .bind(status.as_str())
    .bind(is_homepage)
    .fetch_one(&mut *tx)
    .await?;

    if is_homepage {
        singleton::demote_others(&mut tx, singleton::ExclusiveFlag::Homepage, page.id).await?;
    }

    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(page)))
}

/// PATCH /api/pages/:slug - Update page (only supplied fields change)
pub async fn update_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<UpdatePageRequest>,
) -> Result<Json<StaticPage>, ApiError> {
    validate_slug(&slug)?;

    let mut tx = state.pool.begin().await?;

    let existing = sqlx::query_as::<_, StaticPage>(&format!(
        "SELECT {SELECT_COLUMNS} FROM static_pages WHERE slug = $1"
    ))
    .bind(&slug)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ApiError::NotFound)?;

    let status = match payload.status.as_deref() {
        Some(s) => ContentStatus::parse(s)?.as_str().to_string(),
        None => existing.status,
    };
    let title = payload.title.unwrap_or(existing.title);
    let content_html = payload
        .content_html
        .map(|h| sanitize_html(&h))
        .or(existing.content_html);
    let is_homepage = payload.is_homepage.unwrap_or(existing.is_homepage);

    // Demoting competitors only happens when the flag is being set true;
    // clearing it never promotes anyone else.
    if payload.is_homepage == Some(true) {
        singleton::demote_others(&mut tx, singleton::ExclusiveFlag::Homepage, existing.id).await?;
    }

    let page = sqlx::query_as::<_, StaticPage>(&format!(
        "UPDATE static_pages \
         SET title = $1, content_html = $2, status = $3, is_homepage = $4, updated_at = now() \
         WHERE id = $5 \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(&title)
    .bind(&content_html)
    .bind(&status)
    .bind(is_homepage)
    .bind(existing.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Json(page))
}

/// DELETE /api/pages/:slug - Delete page and its SEO/social records
pub async fn delete_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    validate_slug(&slug)?;

    let row: Option<(uuid::Uuid,)> = sqlx::query_as("SELECT id FROM static_pages WHERE slug = $1")
        .bind(&slug)
        .fetch_optional(&state.pool)
        .await?;
    let (id,) = row.ok_or(ApiError::NotFound)?;

    lifecycle::delete_content_item(&state.pool, ContentKind::StaticPage, id).await?;

    Ok(Json(SuccessResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_homepage_defaults_absent() {
        let req: CreatePageRequest =
            serde_json::from_str(r#"{"title":"About","slug":"about"}"#).unwrap();
        assert!(req.is_homepage.is_none());
    }

    #[test]
    fn test_update_request_parses_homepage_flag() {
        let req: UpdatePageRequest = serde_json::from_str(r#"{"isHomepage":true}"#).unwrap();
        assert_eq!(req.is_homepage, Some(true));
    }
}
