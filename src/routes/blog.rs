/**
 * Blog Routes
 * CRUD API endpoints for blog posts
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::core::{content_kind::ContentKind, lifecycle};
use crate::db::{
    models::{BlogPost, ContentStatus},
    AppState,
};
use crate::error::ApiError;
use crate::routes::{
    clamp_pagination, default_page, default_page_size, sanitize_html, validate_slug,
    SuccessResponse,
};

/// Query parameters for GET /api/blog (list)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    pub status: Option<String>,
}

/// Response for GET /api/blog (list)
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListResponse {
    pub items: Vec<BlogPost>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

/// Request body for POST /api/blog (create)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogRequest {
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content_md: Option<String>,
    pub content_html: Option<String>,
    pub status: Option<String>,
}

/// Request body for PATCH /api/blog/:slug (update)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogRequest {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content_md: Option<String>,
    pub content_html: Option<String>,
    pub status: Option<String>,
}

const SELECT_COLUMNS: &str =
    "id, title, slug, summary, content_md, content_html, status, created_at, updated_at";

/// GET /api/blog - List blog posts with pagination
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, page_size, offset) = clamp_pagination(query.page, query.page_size);

    let status = query
        .status
        .as_deref()
        .map(ContentStatus::parse)
        .transpose()?;

    let (items, total) = if let Some(status) = status {
        let items = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {SELECT_COLUMNS} FROM blog_posts WHERE status = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(status.as_str())
        .bind(page_size)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM blog_posts WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&state.pool)
            .await?;
        (items, total)
    } else {
        let items = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {SELECT_COLUMNS} FROM blog_posts \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page_size)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM blog_posts")
            .fetch_one(&state.pool)
            .await?;
        (items, total)
    };

    Ok(Json(BlogListResponse {
        items,
        page,
        page_size,
        total,
    }))
}

/// GET /api/blog/:slug - Get single blog post by slug
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    validate_slug(&slug)?;

    let post = sqlx::query_as::<_, BlogPost>(&format!(
        "SELECT {SELECT_COLUMNS} FROM blog_posts WHERE slug = $1"
    ))
    .bind(&slug)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(ApiError::NotFound)?;

    Ok(Json(post))
}

/// POST /api/blog - Create new blog post
pub async fn create_post(
    State(state): State<AppState>,
    Json(payload): Json<CreateBlogRequest>,
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

    let post = sqlx::query_as::<_, BlogPost>(&format!(
        "INSERT INTO blog_posts (title, slug, summary, content_md, content_html, status) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(&payload.title)
    .bind(&payload.slug)
    .bind(&payload.summary)
    .bind(&payload.content_md)
    .bind(&content_html)
    .bind(status.as_str())
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// PATCH /api/blog/:slug - Update blog post (only supplied fields change)
pub async fn update_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<UpdateBlogRequest>,
) -> Result<Json<BlogPost>, ApiError> {
    validate_slug(&slug)?;

    let existing = sqlx::query_as::<_, BlogPost>(&format!(
        "SELECT {SELECT_COLUMNS} FROM blog_posts WHERE slug = $1"
    ))
    .bind(&slug)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(ApiError::NotFound)?;

    let status = match payload.status.as_deref() {
        Some(s) => ContentStatus::parse(s)?.as_str().to_string(),
        None => existing.status,
    };
    let title = payload.title.unwrap_or(existing.title);
    let summary = payload.summary.or(existing.summary);
    let content_md = payload.content_md.or(existing.content_md);
    let content_html = payload
        .content_html
        .map(|h| sanitize_html(&h))
        .or(existing.content_html);

    let post = sqlx::query_as::<_, BlogPost>(&format!(
        "UPDATE blog_posts \
         SET title = $1, summary = $2, content_md = $3, content_html = $4, status = $5, \
             updated_at = now() \
         WHERE slug = $6 \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(&title)
    .bind(&summary)
    .bind(&content_md)
    .bind(&content_html)
    .bind(&status)
    .bind(&slug)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(post))
}

/// DELETE /api/blog/:slug - Delete blog post and its SEO/social records
pub async fn delete_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    validate_slug(&slug)?;

    let row: Option<(uuid::Uuid,)> = sqlx::query_as("SELECT id FROM blog_posts WHERE slug = $1")
        .bind(&slug)
        .fetch_optional(&state.pool)
        .await?;
    let (id,) = row.ok_or(ApiError::NotFound)?;

    lifecycle::delete_content_item(&state.pool, ContentKind::BlogPost, id).await?;

    Ok(Json(SuccessResponse { success: true }))
}
