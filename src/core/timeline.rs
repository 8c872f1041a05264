//! Timeline consistency rule.
//!
//! A proposed timeline state is the merge of the stored row and the
//! requested changes; it is validated as a whole before anything is
//! persisted. `end_date` distinguishes "not supplied" from "explicitly
//! cleared", hence the optional-of-optional.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Career,
    Education,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Career => "career",
            EntryType::Education => "education",
        }
    }

    pub fn parse(tag: &str) -> Result<Self, ApiError> {
        match tag {
            "career" => Ok(EntryType::Career),
            "education" => Ok(EntryType::Education),
            other => Err(ApiError::BadRequest(format!(
                "invalid entry type: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The invariant-bearing fields of a stored row.
#[derive(Debug, Clone, Copy)]
pub struct StoredTimeline {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
}

/// Requested changes. `None` means "leave the stored value"; for
/// `end_date`, `Some(None)` means "clear it".
#[derive(Debug, Clone, Copy, Default)]
pub struct TimelinePatch {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub is_current: Option<bool>,
}

/// The merged state that will be persisted if validation passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveTimeline {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
}

pub fn resolve_effective(stored: &StoredTimeline, patch: &TimelinePatch) -> EffectiveTimeline {
    EffectiveTimeline {
        start_date: patch.start_date.unwrap_or(stored.start_date),
        end_date: patch.end_date.unwrap_or(stored.end_date),
        is_current: patch.is_current.unwrap_or(stored.is_current),
    }
}

/// Date ordering and the current/end-date exclusion rule. Runs strictly
/// before persistence; on failure no row is modified.
pub fn validate(effective: &EffectiveTimeline) -> Result<(), ApiError> {
    if let Some(end) = effective.end_date {
        if effective.start_date > end {
            return Err(ApiError::InvalidDateRange);
        }
        if effective.is_current {
            return Err(ApiError::CurrentEntryHasEndDate);
        }
    }
    Ok(())
}
