//! Database models - structs representing database tables (used by sqlx/serde).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;

/// Content lifecycle state shared by blog posts, pages, and projects.
/// Stored as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    Published,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "draft" => Ok(ContentStatus::Draft),
            "published" => Ok(ContentStatus::Published),
            "archived" => Ok(ContentStatus::Archived),
            other => Err(ApiError::BadRequest(format!("invalid status: {other}"))),
        }
    }
}

/// Blog post model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content_md: Option<String>,
    pub content_html: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Static page model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticPage {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content_html: Option<String>,
    pub status: String,
    pub is_homepage: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub tech_stack: Vec<String>,
    pub project_url: Option<String>,
    pub repo_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Media folder model. Folders form a forest via nullable parent pointers.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFolder {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
}

/// Media metadata record. The folder reference is weak: deleting a folder
/// reassigns its media, never deletes it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: Uuid,
    pub filename: String,
    pub url: String,
    pub alt_text: Option<String>,
    pub mime_type: Option<String>,
    pub folder_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Image gallery model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageGallery {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ordered gallery member; a weak reference to a media row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub id: Uuid,
    pub gallery_id: Uuid,
    pub media_id: Uuid,
    pub sort_order: i32,
    pub caption: Option<String>,
}

/// Career/education timeline entry model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub id: Uuid,
    pub entry_type: String,
    pub title: String,
    pub organization: Option<String>,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// SEO metadata, keyed to its owner by (content_type, content_id).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoMetadata {
    pub id: Uuid,
    pub content_type: String,
    pub content_id: Uuid,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub canonical_url: Option<String>,
    pub no_index: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Social-sharing settings, keyed like SEO metadata.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialSharingSettings {
    pub id: Uuid,
    pub content_type: String,
    pub content_id: Uuid,
    pub share_title: Option<String>,
    pub share_description: Option<String>,
    pub share_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            ContentStatus::Draft,
            ContentStatus::Published,
            ContentStatus::Archived,
        ] {
            assert_eq!(ContentStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_status_rejects_unknown() {
        assert!(ContentStatus::parse("live").is_err());
        assert!(ContentStatus::parse("").is_err());
    }

    #[test]
    fn test_models_serialize_camel_case() {
        let folder = MediaFolder {
            id: Uuid::new_v4(),
            name: "screenshots".to_string(),
            parent_id: None,
        };
        let json = serde_json::to_string(&folder).unwrap();
        assert!(json.contains("parentId"));
    }
}
