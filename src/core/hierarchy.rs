//! Media folder hierarchy guard.
//!
//! Folders form a forest via nullable parent pointers. Writes are checked
//! here: parents must exist, the parent-pointer graph must stay acyclic,
//! and deleting a folder reassigns its media to the folder's own parent
//! instead of deleting it. The cycle check walks the full ancestor chain,
//! not just the direct self-parent case.

use std::collections::{HashMap, HashSet};

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::db::models::MediaFolder;
use crate::error::ApiError;

/// A node may never be its own parent.
pub fn validate_no_self_parent(id: Uuid, parent_id: Option<Uuid>) -> Result<(), ApiError> {
    if parent_id == Some(id) {
        return Err(ApiError::InvalidHierarchy);
    }
    Ok(())
}

/// Would pointing `id` at `new_parent` close a cycle? Walks the ancestor
/// chain from `new_parent` upward; a visited set bounds the walk even if
/// the stored graph is already corrupt.
pub fn creates_cycle(
    parents: &HashMap<Uuid, Option<Uuid>>,
    id: Uuid,
    new_parent: Uuid,
) -> bool {
    let mut visited = HashSet::new();
    let mut cursor = Some(new_parent);
    while let Some(current) = cursor {
        if current == id {
            return true;
        }
        if !visited.insert(current) {
            return false;
        }
        cursor = parents.get(&current).copied().flatten();
    }
    false
}

/// Non-null parents must reference an existing folder.
pub async fn validate_parent(
    conn: &mut PgConnection,
    parent_id: Option<Uuid>,
) -> Result<(), ApiError> {
    let Some(parent_id) = parent_id else {
        return Ok(());
    };
    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM media_folders WHERE id = $1)")
            .bind(parent_id)
            .fetch_one(conn)
            .await?;
    if exists {
        Ok(())
    } else {
        Err(ApiError::ReferenceNotFound("parent folder"))
    }
}

async fn parent_map(conn: &mut PgConnection) -> Result<HashMap<Uuid, Option<Uuid>>, sqlx::Error> {
    let rows: Vec<(Uuid, Option<Uuid>)> =
        sqlx::query_as("SELECT id, parent_id FROM media_folders")
            .fetch_all(conn)
            .await?;
    Ok(rows.into_iter().collect())
}

/// Full reparent validation: self-parent, parent existence, ancestor cycle.
pub async fn validate_reparent(
    conn: &mut PgConnection,
    id: Uuid,
    new_parent: Option<Uuid>,
) -> Result<(), ApiError> {
    validate_no_self_parent(id, new_parent)?;
    validate_parent(conn, new_parent).await?;
    if let Some(new_parent) = new_parent {
        let parents = parent_map(conn).await?;
        if creates_cycle(&parents, id, new_parent) {
            return Err(ApiError::InvalidHierarchy);
        }
    }
    Ok(())
}

/// Parent validation happens before insertion; no folder is created if the
/// parent is invalid.
pub async fn create_folder(
    pool: &PgPool,
    name: &str,
    parent_id: Option<Uuid>,
) -> Result<MediaFolder, ApiError> {
    let mut conn = pool.acquire().await?;
    validate_parent(&mut conn, parent_id).await?;
    let folder = sqlx::query_as::<_, MediaFolder>(
        r#"
        INSERT INTO media_folders (name, parent_id)
        VALUES ($1, $2)
        RETURNING id, name, parent_id
        "#,
    )
    .bind(name)
    .bind(parent_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(folder)
}

/// Only supplied fields change: `new_parent` as `Some(None)` moves the
/// folder to the root, `None` leaves the parent untouched.
pub async fn rename_or_reparent(
    pool: &PgPool,
    id: Uuid,
    new_name: Option<String>,
    new_parent: Option<Option<Uuid>>,
) -> Result<MediaFolder, ApiError> {
    let mut conn = pool.acquire().await?;

    let existing = sqlx::query_as::<_, MediaFolder>(
        "SELECT id, name, parent_id FROM media_folders WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(ApiError::NotFound)?;

    if let Some(new_parent) = new_parent {
        validate_reparent(&mut conn, id, new_parent).await?;
    }

    let name = new_name.unwrap_or(existing.name);
    let parent_id = new_parent.unwrap_or(existing.parent_id);

    let folder = sqlx::query_as::<_, MediaFolder>(
        r#"
        UPDATE media_folders SET name = $1, parent_id = $2
        WHERE id = $3
        RETURNING id, name, parent_id
        "#,
    )
    .bind(&name)
    .bind(parent_id)
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(folder)
}

/// Delete a folder, reassigning its media to the folder's own parent.
///
/// Child folders block deletion outright (no recursive delete). The media
/// reassignment and the row deletion share one transaction, so a failure
/// in either leaves the folder intact.
pub async fn delete_folder(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;

    let folder = sqlx::query_as::<_, MediaFolder>(
        "SELECT id, name, parent_id FROM media_folders WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ApiError::NotFound)?;

    let (child_count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM media_folders WHERE parent_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
    if child_count > 0 {
        return Err(ApiError::NonEmptyHierarchy);
    }

    let reassigned = sqlx::query("UPDATE media SET folder_id = $1 WHERE folder_id = $2")
        .bind(folder.parent_id)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM media_folders WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        folder_id = %id,
        reassigned,
        new_parent = ?folder.parent_id,
        "folder deleted, media reassigned"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder_ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_self_parent_is_rejected() {
        let id = Uuid::new_v4();
        let err = validate_no_self_parent(id, Some(id)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidHierarchy));
    }

    #[test]
    fn test_root_and_distinct_parents_are_accepted() {
        let id = Uuid::new_v4();
        assert!(validate_no_self_parent(id, None).is_ok());
        assert!(validate_no_self_parent(id, Some(Uuid::new_v4())).is_ok());
    }

    #[test]
    fn test_direct_cycle_is_detected() {
        let ids = folder_ids(2);
        // b's parent is a; reparenting a under b closes a -> b -> a.
        let parents: HashMap<_, _> =
            [(ids[0], None), (ids[1], Some(ids[0]))].into_iter().collect();
        assert!(creates_cycle(&parents, ids[0], ids[1]));
    }

    #[test]
    fn test_deep_cycle_is_detected() {
        let ids = folder_ids(3);
        // a -> b -> c chain; reparenting a under c closes the loop.
        let parents: HashMap<_, _> = [
            (ids[0], None),
            (ids[1], Some(ids[0])),
            (ids[2], Some(ids[1])),
        ]
        .into_iter()
        .collect();
        assert!(creates_cycle(&parents, ids[0], ids[2]));
    }

    #[test]
    fn test_valid_reparent_is_not_a_cycle() {
        let ids = folder_ids(3);
        // Two siblings under a root; moving one sibling under the other is fine.
        let parents: HashMap<_, _> = [
            (ids[0], None),
            (ids[1], Some(ids[0])),
            (ids[2], Some(ids[0])),
        ]
        .into_iter()
        .collect();
        assert!(!creates_cycle(&parents, ids[1], ids[2]));
    }

    #[test]
    fn test_walk_terminates_on_corrupt_graph() {
        let ids = folder_ids(3);
        // b and c already point at each other; the visited set must stop
        // the walk instead of looping forever.
        let parents: HashMap<_, _> = [
            (ids[1], Some(ids[2])),
            (ids[2], Some(ids[1])),
        ]
        .into_iter()
        .collect();
        assert!(!creates_cycle(&parents, ids[0], ids[1]));
    }

    #[test]
    fn test_unknown_parent_ends_the_walk() {
        let parents = HashMap::new();
        assert!(!creates_cycle(&parents, Uuid::new_v4(), Uuid::new_v4()));
    }
}
