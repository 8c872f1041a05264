//! Singleton invariant enforcement.
//!
//! Some boolean flags are exclusive within a partition: at most one
//! timeline entry per entry_type may be current, and at most one static
//! page may be the homepage. Setting the flag true on one row demotes every
//! competitor in the same partition, inside the caller's transaction, so an
//! abort leaves no partial demotion behind.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::core::timeline::EntryType;

/// An exclusivity flag together with its partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusiveFlag {
    /// `timeline_entries.is_current`, partitioned by entry_type.
    TimelineCurrent(EntryType),
    /// `static_pages.is_homepage`, partition is the whole table.
    Homepage,
}

impl ExclusiveFlag {
    pub fn table(&self) -> &'static str {
        match self {
            ExclusiveFlag::TimelineCurrent(_) => "timeline_entries",
            ExclusiveFlag::Homepage => "static_pages",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            ExclusiveFlag::TimelineCurrent(_) => "is_current",
            ExclusiveFlag::Homepage => "is_homepage",
        }
    }
}

/// Clear the flag on every other row sharing the partition with `keep_id`.
///
/// The caller sets the flag true on `keep_id` afterwards, in the same
/// transaction. Zero demoted competitors is not an error. Setting a flag to
/// false never calls this.
pub async fn demote_others(
    conn: &mut PgConnection,
    flag: ExclusiveFlag,
    keep_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = match flag {
        ExclusiveFlag::TimelineCurrent(entry_type) => {
            sqlx::query(
                "UPDATE timeline_entries SET is_current = false \
                 WHERE entry_type = $1 AND is_current = true AND id <> $2",
            )
            .bind(entry_type.as_str())
            .bind(keep_id)
            .execute(conn)
            .await?
        }
        ExclusiveFlag::Homepage => {
            sqlx::query(
                "UPDATE static_pages SET is_homepage = false \
                 WHERE is_homepage = true AND id <> $1",
            )
            .bind(keep_id)
            .execute(conn)
            .await?
        }
    };

    let demoted = result.rows_affected();
    if demoted > 0 {
        tracing::debug!(
            table = flag.table(),
            column = flag.column(),
            demoted,
            "demoted competing rows"
        );
    }
    Ok(demoted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_flag_targets_is_current() {
        let flag = ExclusiveFlag::TimelineCurrent(EntryType::Career);
        assert_eq!(flag.table(), "timeline_entries");
        assert_eq!(flag.column(), "is_current");
    }

    #[test]
    fn test_homepage_flag_targets_is_homepage() {
        assert_eq!(ExclusiveFlag::Homepage.table(), "static_pages");
        assert_eq!(ExclusiveFlag::Homepage.column(), "is_homepage");
    }

    #[test]
    fn test_partitions_are_distinct_per_entry_type() {
        // Career and education partitions must never demote each other.
        let career = ExclusiveFlag::TimelineCurrent(EntryType::Career);
        let education = ExclusiveFlag::TimelineCurrent(EntryType::Education);
        assert_ne!(career, education);
    }
}
