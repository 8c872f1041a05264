/**
 * Routes Module
 * API route handlers
 */

pub mod associations;
pub mod blog;
pub mod folders;
pub mod galleries;
pub mod health;
pub mod media;
pub mod pages;
pub mod projects;
pub mod timeline;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;

lazy_static::lazy_static! {
    /// Valid slug pattern: lowercase letters, numbers, and hyphens
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

pub fn validate_slug(slug: &str) -> Result<(), ApiError> {
    if SLUG_REGEX.is_match(slug) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "Slug must contain only lowercase letters, numbers, and hyphens".to_string(),
        ))
    }
}

/// Sanitize HTML content using ammonia
pub fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

/// Success response (for delete)
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

pub fn default_page() -> i64 {
    1
}

pub fn default_page_size() -> i64 {
    10
}

/// Clamp pagination to sane bounds (page >= 1, 1 <= page_size <= 100).
pub fn clamp_pagination(page: i64, page_size: i64) -> (i64, i64, i64) {
    let page_size = page_size.clamp(1, 100);
    let page = page.max(1);
    let offset = (page - 1) * page_size;
    (page, page_size, offset)
}

/// Field-presence deserializer: wraps a present value (including an
/// explicit null) in `Some`, so `Option<Option<T>>` distinguishes "absent"
/// from "set to null".
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_slugs() {
        assert!(validate_slug("hello-world").is_ok());
        assert!(validate_slug("post-2024").is_ok());
        assert!(validate_slug("a").is_ok());
    }

    #[test]
    fn test_invalid_slugs() {
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Hello-World").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("trailing-").is_err());
        assert!(validate_slug("under_score").is_err());
        assert!(validate_slug("with space").is_err());
    }

    #[test]
    fn test_pagination_clamping() {
        assert_eq!(clamp_pagination(1, 10), (1, 10, 0));
        assert_eq!(clamp_pagination(0, 500), (1, 100, 0));
        assert_eq!(clamp_pagination(-3, 0), (1, 1, 0));
        assert_eq!(clamp_pagination(3, 20), (3, 20, 40));
    }

    #[test]
    fn test_deserialize_some_distinguishes_null_from_absent() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "deserialize_some")]
            end_date: Option<Option<String>>,
        }

        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert!(absent.end_date.is_none());

        let null: Patch = serde_json::from_str(r#"{"end_date":null}"#).unwrap();
        assert_eq!(null.end_date, Some(None));

        let set: Patch = serde_json::from_str(r#"{"end_date":"2024-01-01"}"#).unwrap();
        assert_eq!(set.end_date, Some(Some("2024-01-01".to_string())));
    }
}
