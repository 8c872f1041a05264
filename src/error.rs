//! API error taxonomy shared by all handlers and core logic.
//!
//! Every validation failure is raised before any mutation; multi-step
//! sequences run inside one transaction so a mid-sequence failure rolls
//! back every step.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Target row absent.
    #[error("not found")]
    NotFound,

    /// The content item a polymorphic association points at is absent.
    #[error("owning content item not found")]
    OwnerNotFound,

    /// A referenced row (e.g. a parent folder or media row) is absent.
    #[error("referenced {0} does not exist")]
    ReferenceNotFound(&'static str),

    /// Unrecognized polymorphic content-type tag.
    #[error("invalid content type: {0}")]
    InvalidContentType(String),

    /// A folder may never be (or become) its own ancestor.
    #[error("invalid folder hierarchy")]
    InvalidHierarchy,

    /// Folder deletion is blocked while child folders exist.
    #[error("folder has child folders")]
    NonEmptyHierarchy,

    /// end_date precedes start_date.
    #[error("start date must not be after end date")]
    InvalidDateRange,

    /// A current timeline entry must have no end date.
    #[error("a current entry cannot have an end date")]
    CurrentEntryHasEndDate,

    /// Storage-level uniqueness violation on a slug column.
    #[error("slug already exists")]
    DuplicateSlug,

    /// An association of this kind already exists for the owner.
    #[error("association already exists for this content item")]
    DuplicateAssociation,

    /// Request-shape problems the transport layer could not catch.
    #[error("{0}")]
    BadRequest(String),

    #[error("database error")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        // Postgres 23505 = unique_violation; the only unique indexes in the
        // schema are slug columns, so surface it as DuplicateSlug.
        if let sqlx::Error::Database(ref db) = e {
            if db.code().as_deref() == Some("23505") {
                return ApiError::DuplicateSlug;
            }
        }
        ApiError::Database(e)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound | ApiError::OwnerNotFound | ApiError::ReferenceNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::InvalidContentType(_)
            | ApiError::InvalidHierarchy
            | ApiError::InvalidDateRange
            | ApiError::CurrentEntryHasEndDate
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NonEmptyHierarchy
            | ApiError::DuplicateSlug
            | ApiError::DuplicateAssociation => StatusCode::CONFLICT,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            ApiError::NonEmptyHierarchy => {
                Some("Delete or move child folders first".to_string())
            }
            ApiError::InvalidContentType(_) => {
                Some("Valid content types: blog_post, static_page, project".to_string())
            }
            _ => None,
        }
    }
}

/// Error response body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if let ApiError::Database(ref e) = self {
            tracing::error!(error = %e, "database error");
        }
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
            message: self.detail(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_family_maps_to_404() {
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::OwnerNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::ReferenceNotFound("folder").status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_validation_family_maps_to_400() {
        assert_eq!(
            ApiError::InvalidDateRange.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::CurrentEntryHasEndDate.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidHierarchy.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidContentType("page".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_conflict_family_maps_to_409() {
        assert_eq!(
            ApiError::NonEmptyHierarchy.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::DuplicateSlug.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::DuplicateAssociation.status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_error_body_skips_absent_message() {
        let body = ErrorResponse {
            error: "not found".to_string(),
            message: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"error":"not found"}"#);
    }

    #[test]
    fn test_reference_not_found_names_the_reference() {
        let e = ApiError::ReferenceNotFound("parent folder");
        assert_eq!(e.to_string(), "referenced parent folder does not exist");
    }
}
