//! Polymorphic association index.
//!
//! SEO metadata and social-sharing settings carry no storage-level foreign
//! key to their owner; validity is checked here at write time and cleanup
//! happens by explicit cascade when the owner is deleted.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::core::content_kind::ContentKind;
use crate::db::models::{SeoMetadata, SocialSharingSettings};
use crate::error::ApiError;

/// Every table whose rows are owned through a `(content_type, content_id)`
/// pair. A content-item delete must sweep all of them.
pub const ASSOCIATION_TABLES: [&str; 2] = ["seo_metadata", "social_sharing_settings"];

pub const SEO_COLUMNS: &str = "id, content_type, content_id, meta_title, meta_description, \
                               canonical_url, no_index, created_at, updated_at";
pub const SOCIAL_COLUMNS: &str = "id, content_type, content_id, share_title, share_description, \
                                  share_image_url, created_at, updated_at";

/// Check whether the owning content item exists in its dispatched table.
pub async fn owner_exists(
    conn: &mut PgConnection,
    kind: ContentKind,
    content_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", kind.table());
    let (exists,): (bool,) = sqlx::query_as(&sql).bind(content_id).fetch_one(conn).await?;
    Ok(exists)
}

/// Gate for association writes: the owner must exist before any association
/// row is created.
pub async fn assert_owner_exists(
    conn: &mut PgConnection,
    kind: ContentKind,
    content_id: Uuid,
) -> Result<(), ApiError> {
    if owner_exists(conn, kind, content_id).await? {
        Ok(())
    } else {
        Err(ApiError::OwnerNotFound)
    }
}

/// SEO metadata keyed to the owner, if any. Absence is a normal outcome.
pub async fn seo_by_owner(
    conn: &mut PgConnection,
    kind: ContentKind,
    content_id: Uuid,
) -> Result<Option<SeoMetadata>, sqlx::Error> {
    sqlx::query_as::<_, SeoMetadata>(&format!(
        "SELECT {SEO_COLUMNS} FROM seo_metadata WHERE content_type = $1 AND content_id = $2"
    ))
    .bind(kind.as_str())
    .bind(content_id)
    .fetch_optional(conn)
    .await
}

/// Social-sharing settings keyed to the owner, if any.
pub async fn social_by_owner(
    conn: &mut PgConnection,
    kind: ContentKind,
    content_id: Uuid,
) -> Result<Option<SocialSharingSettings>, sqlx::Error> {
    sqlx::query_as::<_, SocialSharingSettings>(&format!(
        "SELECT {SOCIAL_COLUMNS} FROM social_sharing_settings \
         WHERE content_type = $1 AND content_id = $2"
    ))
    .bind(kind.as_str())
    .bind(content_id)
    .fetch_optional(conn)
    .await
}

/// Display title of the owning content item, for share-URL generation.
/// Absent owner is a normal outcome, not an error.
pub async fn resolve_owner_title(
    conn: &mut PgConnection,
    kind: ContentKind,
    content_id: Uuid,
) -> Result<Option<String>, sqlx::Error> {
    let sql = format!("SELECT title FROM {} WHERE id = $1", kind.table());
    let row: Option<(String,)> = sqlx::query_as(&sql).bind(content_id).fetch_optional(conn).await?;
    Ok(row.map(|(title,)| title))
}

/// Remove every association (of every kind) keyed to the owner. Idempotent:
/// deleting when none exist is a no-op.
pub async fn cascade_delete(
    conn: &mut PgConnection,
    kind: ContentKind,
    content_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let mut removed = 0;
    for table in ASSOCIATION_TABLES {
        let sql = format!(
            "DELETE FROM {} WHERE content_type = $1 AND content_id = $2",
            table
        );
        let result = sqlx::query(&sql)
            .bind(kind.as_str())
            .bind(content_id)
            .execute(&mut *conn)
            .await?;
        removed += result.rows_affected();
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_association_table_is_swept() {
        assert!(ASSOCIATION_TABLES.contains(&"seo_metadata"));
        assert!(ASSOCIATION_TABLES.contains(&"social_sharing_settings"));
        assert_eq!(ASSOCIATION_TABLES.len(), 2);
    }

    #[test]
    fn test_owner_lookup_dispatches_per_kind() {
        // The dispatch table is the single source of the owning table name.
        for kind in ContentKind::ALL {
            let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", kind.table());
            assert!(sql.contains(kind.table()));
        }
    }
}
