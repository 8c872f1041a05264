/**
 * Project Routes
 * CRUD API endpoints for portfolio projects
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
    models::{ContentStatus, Project},
    AppState,
};
use crate::error::ApiError;
use crate::routes::{
    clamp_pagination, default_page, default_page_size, validate_slug, SuccessResponse,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    pub status: Option<String>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListResponse {
    pub items: Vec<Project>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    pub project_url: Option<String>,
    pub repo_url: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tech_stack: Option<Vec<String>>,
    pub project_url: Option<String>,
    pub repo_url: Option<String>,
    pub status: Option<String>,
}

const SELECT_COLUMNS: &str = "id, title, slug, description, tech_stack, project_url, repo_url, \
                              status, created_at, updated_at";

/// GET /api/projects - List projects with pagination
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, page_size, offset) = clamp_pagination(query.page, query.page_size);

    let status = query
        .status
        .as_deref()
        .map(ContentStatus::parse)
        .transpose()?;

    let (items, total) = if let Some(status) = status {
        let items = sqlx::query_as::<_, Project>(&format!(
            "SELECT {SELECT_COLUMNS} FROM projects WHERE status = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(status.as_str())
        .bind(page_size)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&state.pool)
            .await?;
        (items, total)
    } else {
        let items = sqlx::query_as::<_, Project>(&format!(
            "SELECT {SELECT_COLUMNS} FROM projects ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page_size)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
            .fetch_one(&state.pool)
            .await?;
        (items, total)
    };

    Ok(Json(ProjectListResponse {
        items,
        page,
        page_size,
        total,
    }))
}

/// GET /api/projects/:slug - Get single project by slug
pub async fn get_project(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Project>, ApiError> {
    validate_slug(&slug)?;

    let project = sqlx::query_as::<_, Project>(&format!(
        "SELECT {SELECT_COLUMNS} FROM projects WHERE slug = $1"
    ))
    .bind(&slug)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(ApiError::NotFound)?;

    Ok(Json(project))
}

/// POST /api/projects - Create new project
pub async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<CreateProjectRequest>,
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

    let project = sqlx::query_as::<_, Project>(&format!(
        "INSERT INTO projects (title, slug, description, tech_stack, project_url, repo_url, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(&payload.title)
    .bind(&payload.slug)
    .bind(&payload.description)
    .bind(&payload.tech_stack)
    .bind(&payload.project_url)
    .bind(&payload.repo_url)
    .bind(status.as_str())
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

/// PATCH /api/projects/:slug - Update project (only supplied fields change)
pub async fn update_project(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    validate_slug(&slug)?;

    let existing = sqlx::query_as::<_, Project>(&format!(
        "SELECT {SELECT_COLUMNS} FROM projects WHERE slug = $1"
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
    let description = payload.description.or(existing.description);
    let tech_stack = payload.tech_stack.unwrap_or(existing.tech_stack);
    let project_url = payload.project_url.or(existing.project_url);
    let repo_url = payload.repo_url.or(existing.repo_url);

    let project = sqlx::query_as::<_, Project>(&format!(
        "UPDATE projects \
         SET title = $1, description = $2, tech_stack = $3, project_url = $4, repo_url = $5, \
             status = $6, updated_at = now() \
         WHERE slug = $7 \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(&title)
    .bind(&description)
    .bind(&tech_stack)
    .bind(&project_url)
    .bind(&repo_url)
    .bind(&status)
    .bind(&slug)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(project))
}

/// DELETE /api/projects/:slug - Delete project and its SEO/social records
pub async fn delete_project(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    validate_slug(&slug)?;

    let row: Option<(uuid::Uuid,)> = sqlx::query_as("SELECT id FROM projects WHERE slug = $1")
        .bind(&slug)
        .fetch_optional(&state.pool)
        .await?;
    let (id,) = row.ok_or(ApiError::NotFound)?;

    lifecycle::delete_content_item(&state.pool, ContentKind::Project, id).await?;

    Ok(Json(SuccessResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_tech_stack_defaults_empty() {
        let req: CreateProjectRequest =
            serde_json::from_str(r#"{"title":"CMS","slug":"cms"}"#).unwrap();
        assert!(req.tech_stack.is_empty());
    }

    #[test]
    fn test_update_request_parses_tech_stack() {
        let req: UpdateProjectRequest =
            serde_json::from_str(r#"{"techStack":["rust","axum"]}"#).unwrap();
        assert_eq!(req.tech_stack.unwrap(), vec!["rust", "axum"]);
    }
}
