/**
 * Timeline Routes
 * Career/education timeline entries with date-consistency and
 * single-current-entry rules
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::core::singleton::{demote_others, ExclusiveFlag};
use crate::core::timeline::{
    resolve_effective, validate, EntryType, StoredTimeline, TimelinePatch,
};
use crate::db::{models::TimelineEntry, AppState};
use crate::error::ApiError;
use crate::routes::{deserialize_some, SuccessResponse};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineListQuery {
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineListResponse {
    pub items: Vec<TimelineEntry>,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimelineRequest {
    pub entry_type: String,
    pub title: String,
    pub organization: Option<String>,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: Option<bool>,
    pub sort_order: Option<i32>,
}

/// `endDate` is presence-sensitive: absent keeps the stored value,
/// explicit null clears it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTimelineRequest {
    pub entry_type: Option<String>,
    pub title: Option<String>,
    pub organization: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub end_date: Option<Option<NaiveDate>>,
    pub is_current: Option<bool>,
    pub sort_order: Option<i32>,
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

const SELECT_COLUMNS: &str = "id, entry_type, title, organization, description, start_date, \
                              end_date, is_current, sort_order, created_at, updated_at";

/// GET /api/timeline - List entries, optionally filtered by type
pub async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<TimelineListQuery>,
) -> Result<Json<TimelineListResponse>, ApiError> {
    let entry_type = query
        .entry_type
        .as_deref()
        .map(EntryType::parse)
        .transpose()?;

    let items = if let Some(entry_type) = entry_type {
        sqlx::query_as::<_, TimelineEntry>(&format!(
            "SELECT {SELECT_COLUMNS} FROM timeline_entries WHERE entry_type = $1 \
             ORDER BY sort_order, start_date DESC"
        ))
        .bind(entry_type.as_str())
        .fetch_all(&state.pool)
        .await?
    } else {
        sqlx::query_as::<_, TimelineEntry>(&format!(
            "SELECT {SELECT_COLUMNS} FROM timeline_entries \
             ORDER BY entry_type, sort_order, start_date DESC"
        ))
        .fetch_all(&state.pool)
        .await?
    };

    let total = items.len() as i64;
    Ok(Json(TimelineListResponse { items, total }))
}

/// POST /api/timeline - Create entry. Date rules are validated before the
/// insert; a current entry demotes competitors of the same type in the
/// same transaction.
pub async fn create_entry(
    State(state): State<AppState>,
    Json(payload): Json<CreateTimelineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entry_type = EntryType::parse(&payload.entry_type)?;
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    let is_current = payload.is_current.unwrap_or(false);
    validate(&crate::core::timeline::EffectiveTimeline {
        start_date: payload.start_date,
        end_date: payload.end_date,
        is_current,
    })?;

    let mut tx = state.pool.begin().await?;

    let entry = sqlx::query_as::<_, TimelineEntry>(&format!(
        "INSERT INTO timeline_entries \
            (entry_type, title, organization, description, start_date, end_date, is_current, \
             sort_order) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(entry_type.as_str())
    .bind(&payload.title)
    .bind(&payload.organization)
    .bind(&payload.description)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(is_current)
    .bind(payload.sort_order.unwrap_or(0))
    .fetch_one(&mut *tx)
    .await?;

    if is_current {
        demote_others(&mut tx, ExclusiveFlag::TimelineCurrent(entry_type), entry.id).await?;
    }

    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PATCH /api/timeline/:id - Update entry. The effective state (stored row
/// merged with the request) is validated as a whole before anything is
/// persisted.
pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTimelineRequest>,
) -> Result<Json<TimelineEntry>, ApiError> {
    let mut tx = state.pool.begin().await?;

    let existing = sqlx::query_as::<_, TimelineEntry>(&format!(
        "SELECT {SELECT_COLUMNS} FROM timeline_entries WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ApiError::NotFound)?;

    let entry_type = match payload.entry_type.as_deref() {
        Some(t) => EntryType::parse(t)?,
        None => EntryType::parse(&existing.entry_type)?,
    };

    let stored = StoredTimeline {
        start_date: existing.start_date,
        end_date: existing.end_date,
        is_current: existing.is_current,
    };
    let patch = TimelinePatch {
        start_date: payload.start_date,
        end_date: payload.end_date,
        is_current: payload.is_current,
    };
    let effective = resolve_effective(&stored, &patch);
    validate(&effective)?;

    // Demotion keys off the effective state, not the payload: a row that is
    // already current can enter a new partition via an entry_type change
    // alone, and that partition's current entry must still be demoted.
    if effective.is_current {
        demote_others(&mut tx, ExclusiveFlag::TimelineCurrent(entry_type), id).await?;
    }

    let title = payload.title.unwrap_or(existing.title);
    let organization = payload.organization.or(existing.organization);
    let description = payload.description.or(existing.description);
    let sort_order = payload.sort_order.unwrap_or(existing.sort_order);

    let entry = sqlx::query_as::<_, TimelineEntry>(&format!(
        "UPDATE timeline_entries \
         SET entry_type = $1, title = $2, organization = $3, description = $4, start_date = $5, \
             end_date = $6, is_current = $7, sort_order = $8, updated_at = now() \
         WHERE id = $9 \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(entry_type.as_str())
    .bind(&title)
    .bind(&organization)
    .bind(&description)
    .bind(effective.start_date)
    .bind(effective.end_date)
    .bind(effective.is_current)
    .bind(sort_order)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Json(entry))
}

/// DELETE /api/timeline/:id - Delete entry (no cascade)
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let result = sqlx::query("DELETE FROM timeline_entries WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/timeline/reorder - Bulk reorder.
///
/// NOT atomic across items: an error partway through leaves earlier items
/// updated. Callers must re-read state before retrying.
pub async fn reorder_entries(
    State(state): State<AppState>,
    Json(payload): Json<ReorderRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    for item in &payload.items {
        let result = sqlx::query(
            "UPDATE timeline_entries SET sort_order = $1, updated_at = now() WHERE id = $2",
        )
        .bind(item.sort_order)
        .bind(item.id)
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
    fn test_create_request_requires_start_date() {
        let result: Result<CreateTimelineRequest, _> =
            serde_json::from_str(r#"{"entryType":"career","title":"Engineer"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_update_request_distinguishes_cleared_end_date() {
        let req: UpdateTimelineRequest = serde_json::from_str(r#"{"endDate":null}"#).unwrap();
        assert_eq!(req.end_date, Some(None));

        let req: UpdateTimelineRequest = serde_json::from_str("{}").unwrap();
        assert!(req.end_date.is_none());
    }

    #[test]
    fn test_update_request_parses_dates() {
        let req: UpdateTimelineRequest =
            serde_json::from_str(r#"{"startDate":"2024-01-01","endDate":"2024-06-30"}"#).unwrap();
        assert_eq!(
            req.start_date,
            Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
        assert_eq!(
            req.end_date,
            Some(Some(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()))
        );
    }
}
