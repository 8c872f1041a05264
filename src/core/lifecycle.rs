//! Content lifecycle coordination.
//!
//! Deleting a content item must fan out: every polymorphic association
//! keyed to it goes first, then the content row itself, all inside one
//! transaction. The association tables carry no storage-level foreign key,
//! so the ordering is enforced here rather than by the schema.

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::assoc;
use crate::core::content_kind::ContentKind;
use crate::error::ApiError;

/// Delete a content item and everything keyed to it, all-or-nothing.
///
/// Fails with `NotFound` when the item does not exist. Any failure after
/// that rolls back the whole transaction, so no association rows are left
/// deleted under a surviving parent.
pub async fn delete_content_item(
    pool: &PgPool,
    kind: ContentKind,
    id: Uuid,
) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;

    if !assoc::owner_exists(&mut tx, kind, id).await? {
        return Err(ApiError::NotFound);
    }

    let cascaded = assoc::cascade_delete(&mut tx, kind, id).await?;

    let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
    sqlx::query(&sql).bind(id).execute(&mut *tx).await?;

    tx.commit().await?;

    tracing::info!(
        content_type = kind.as_str(),
        content_id = %id,
        cascaded_associations = cascaded,
        "content item deleted"
    );
    Ok(())
}
