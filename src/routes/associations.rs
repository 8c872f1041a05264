/**
 * Association Routes
 * SEO metadata and social-sharing settings, keyed to their owning content
 * item by (content_type, content_id), plus share-URL generation
 */
use axum::{
    extract::{Path, Query, State},
    Json,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{assoc, content_kind::ContentKind};
use crate::db::{
    models::{SeoMetadata, SocialSharingSettings},
    AppState,
};
use crate::error::ApiError;
use crate::routes::SuccessResponse;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertSeoRequest {
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub canonical_url: Option<String>,
    pub no_index: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertSocialRequest {
    pub share_title: Option<String>,
    pub share_description: Option<String>,
    pub share_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShareLinksQuery {
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    pub platform: &'static str,
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLinksResponse {
    pub title: String,
    pub links: Vec<ShareLink>,
}

use crate::core::assoc::{SEO_COLUMNS, SOCIAL_COLUMNS};

fn parse_owner(content_type: &str) -> Result<ContentKind, ApiError> {
    ContentKind::parse(content_type)
}

// ============================================================================
// SEO metadata
// ============================================================================

/// GET /api/seo/:content_type/:content_id
pub async fn get_seo(
    State(state): State<AppState>,
    Path((content_type, content_id)): Path<(String, Uuid)>,
) -> Result<Json<SeoMetadata>, ApiError> {
    let kind = parse_owner(&content_type)?;

    let mut conn = state.pool.acquire().await?;
    let seo = assoc::seo_by_owner(&mut conn, kind, content_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(seo))
}

/// PUT /api/seo/:content_type/:content_id - Create or update. The owner
/// must exist; at most one record per owner, enforced here rather than by
/// a storage constraint.
pub async fn upsert_seo(
    State(state): State<AppState>,
    Path((content_type, content_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpsertSeoRequest>,
) -> Result<Json<SeoMetadata>, ApiError> {
    let kind = parse_owner(&content_type)?;

    let mut tx = state.pool.begin().await?;
    assoc::assert_owner_exists(&mut tx, kind, content_id).await?;

    let existing = assoc::seo_by_owner(&mut tx, kind, content_id).await?;

    let seo = match existing {
        Some(existing) => {
            let meta_title = payload.meta_title.or(existing.meta_title);
            let meta_description = payload.meta_description.or(existing.meta_description);
            let canonical_url = payload.canonical_url.or(existing.canonical_url);
            let no_index = payload.no_index.unwrap_or(existing.no_index);

            sqlx::query_as::<_, SeoMetadata>(&format!(
                "UPDATE seo_metadata \
                 SET meta_title = $1, meta_description = $2, canonical_url = $3, no_index = $4, \
                     updated_at = now() \
                 WHERE id = $5 \
                 RETURNING {SEO_COLUMNS}"
            ))
            .bind(&meta_title)
            .bind(&meta_description)
            .bind(&canonical_url)
            .bind(no_index)
            .bind(existing.id)
            .fetch_one(&mut *tx)
            .await?
        }
        None => {
            sqlx::query_as::<_, SeoMetadata>(&format!(
                "INSERT INTO seo_metadata \
                    (content_type, content_id, meta_title, meta_description, canonical_url, \
                     no_index) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 RETURNING {SEO_COLUMNS}"
            ))
            .bind(kind.as_str())
            .bind(content_id)
            .bind(&payload.meta_title)
            .bind(&payload.meta_description)
            .bind(&payload.canonical_url)
            .bind(payload.no_index.unwrap_or(false))
            .fetch_one(&mut *tx)
            .await?
        }
    };

    tx.commit().await?;
    Ok(Json(seo))
}

/// DELETE /api/seo/:content_type/:content_id
pub async fn delete_seo(
    State(state): State<AppState>,
    Path((content_type, content_id)): Path<(String, Uuid)>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let kind = parse_owner(&content_type)?;

    let result =
        sqlx::query("DELETE FROM seo_metadata WHERE content_type = $1 AND content_id = $2")
            .bind(kind.as_str())
            .bind(content_id)
            .execute(&state.pool)
            .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================================
// Social-sharing settings
// ============================================================================

/// GET /api/social/:content_type/:content_id
pub async fn get_social(
    State(state): State<AppState>,
    Path((content_type, content_id)): Path<(String, Uuid)>,
) -> Result<Json<SocialSharingSettings>, ApiError> {
    let kind = parse_owner(&content_type)?;

    let mut conn = state.pool.acquire().await?;
    let settings = assoc::social_by_owner(&mut conn, kind, content_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(settings))
}

/// PUT /api/social/:content_type/:content_id - Create or update,
/// owner-gated and at-most-one per owner like SEO metadata.
pub async fn upsert_social(
    State(state): State<AppState>,
    Path((content_type, content_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpsertSocialRequest>,
) -> Result<Json<SocialSharingSettings>, ApiError> {
    let kind = parse_owner(&content_type)?;

    let mut tx = state.pool.begin().await?;
    assoc::assert_owner_exists(&mut tx, kind, content_id).await?;

    let existing = assoc::social_by_owner(&mut tx, kind, content_id).await?;

    let settings = match existing {
        Some(existing) => {
            let share_title = payload.share_title.or(existing.share_title);
            let share_description = payload.share_description.or(existing.share_description);
            let share_image_url = payload.share_image_url.or(existing.share_image_url);

            sqlx::query_as::<_, SocialSharingSettings>(&format!(
                "UPDATE social_sharing_settings \
                 SET share_title = $1, share_description = $2, share_image_url = $3, \
                     updated_at = now() \
                 WHERE id = $4 \
                 RETURNING {SOCIAL_COLUMNS}"
            ))
            .bind(&share_title)
            .bind(&share_description)
            .bind(&share_image_url)
            .bind(existing.id)
            .fetch_one(&mut *tx)
            .await?
        }
        None => {
            sqlx::query_as::<_, SocialSharingSettings>(&format!(
                "INSERT INTO social_sharing_settings \
                    (content_type, content_id, share_title, share_description, share_image_url) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING {SOCIAL_COLUMNS}"
            ))
            .bind(kind.as_str())
            .bind(content_id)
            .bind(&payload.share_title)
            .bind(&payload.share_description)
            .bind(&payload.share_image_url)
            .fetch_one(&mut *tx)
            .await?
        }
    };

    tx.commit().await?;
    Ok(Json(settings))
}

/// DELETE /api/social/:content_type/:content_id
pub async fn delete_social(
    State(state): State<AppState>,
    Path((content_type, content_id)): Path<(String, Uuid)>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let kind = parse_owner(&content_type)?;

    let result = sqlx::query(
        "DELETE FROM social_sharing_settings WHERE content_type = $1 AND content_id = $2",
    )
    .bind(kind.as_str())
    .bind(content_id)
    .execute(&state.pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================================
// Share-URL generation (pure formatting)
// ============================================================================

fn encode(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

/// Platform share-intent URLs for a page. Stateless string formatting.
pub fn build_share_links(title: &str, page_url: &str) -> Vec<ShareLink> {
    let title_enc = encode(title);
    let url_enc = encode(page_url);
    vec![
        ShareLink {
            platform: "x",
            url: format!("https://twitter.com/intent/tweet?text={title_enc}&url={url_enc}"),
        },
        ShareLink {
            platform: "facebook",
            url: format!("https://www.facebook.com/sharer/sharer.php?u={url_enc}"),
        },
        ShareLink {
            platform: "linkedin",
            url: format!("https://www.linkedin.com/sharing/share-offsite/?url={url_enc}"),
        },
        ShareLink {
            platform: "reddit",
            url: format!("https://www.reddit.com/submit?url={url_enc}&title={title_enc}"),
        },
        ShareLink {
            platform: "email",
            url: format!("mailto:?subject={title_enc}&body={url_enc}"),
        },
    ]
}

/// GET /api/social/:content_type/:content_id/links?url=...
///
/// Title comes from the sharing settings' override when set, else from the
/// owning content item. A vanished owner is a 404, not a broken link set.
pub async fn share_links(
    State(state): State<AppState>,
    Path((content_type, content_id)): Path<(String, Uuid)>,
    Query(query): Query<ShareLinksQuery>,
) -> Result<Json<ShareLinksResponse>, ApiError> {
    let kind = parse_owner(&content_type)?;

    let mut conn = state.pool.acquire().await?;

    let owner_title = assoc::resolve_owner_title(&mut conn, kind, content_id)
        .await?
        .ok_or(ApiError::OwnerNotFound)?;

    let settings = assoc::social_by_owner(&mut conn, kind, content_id).await?;

    let title = settings
        .and_then(|s| s.share_title)
        .unwrap_or(owner_title);

    let links = build_share_links(&title, &query.url);
    Ok(Json(ShareLinksResponse { title, links }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_links_cover_all_platforms() {
        let links = build_share_links("Hello", "https://example.com/p");
        let platforms: Vec<_> = links.iter().map(|l| l.platform).collect();
        assert_eq!(platforms, vec!["x", "facebook", "linkedin", "reddit", "email"]);
    }

    #[test]
    fn test_share_links_percent_encode_parameters() {
        let links = build_share_links("Hello, World & Friends", "https://example.com/a?b=c");
        let tweet = &links[0].url;
        assert!(tweet.contains("Hello%2C%20World%20%26%20Friends"));
        assert!(tweet.contains("https%3A%2F%2Fexample%2Ecom%2Fa%3Fb%3Dc"));
        assert!(!tweet.contains("Hello, World"));
    }

    #[test]
    fn test_facebook_link_only_carries_url() {
        let links = build_share_links("Title", "https://example.com");
        let facebook = links.iter().find(|l| l.platform == "facebook").unwrap();
        assert!(!facebook.url.contains("Title"));
    }
}
