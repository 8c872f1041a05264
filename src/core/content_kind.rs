//! Polymorphic content-type tag.
//!
//! SEO metadata and social-sharing settings identify their owner by a
//! `(content_type, content_id)` pair instead of a foreign key. The tag is a
//! closed enum with a dispatch table to the owning table, so the mapping
//! lives in exactly one place.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    BlogPost,
    StaticPage,
    Project,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [
        ContentKind::BlogPost,
        ContentKind::StaticPage,
        ContentKind::Project,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::BlogPost => "blog_post",
            ContentKind::StaticPage => "static_page",
            ContentKind::Project => "project",
        }
    }

    /// Table holding rows of this kind. Always a static string, so it is
    /// safe to splice into SQL.
    pub fn table(&self) -> &'static str {
        match self {
            ContentKind::BlogPost => "blog_posts",
            ContentKind::StaticPage => "static_pages",
            ContentKind::Project => "projects",
        }
    }

    pub fn parse(tag: &str) -> Result<Self, ApiError> {
        match tag {
            "blog_post" => Ok(ContentKind::BlogPost),
            "static_page" => Ok(ContentKind::StaticPage),
            "project" => Ok(ContentKind::Project),
            other => Err(ApiError::InvalidContentType(other.to_string())),
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tags() {
        assert_eq!(ContentKind::parse("blog_post").unwrap(), ContentKind::BlogPost);
        assert_eq!(
            ContentKind::parse("static_page").unwrap(),
            ContentKind::StaticPage
        );
        assert_eq!(ContentKind::parse("project").unwrap(), ContentKind::Project);
    }

    #[test]
    fn test_parse_rejects_unknown_tag() {
        let err = ContentKind::parse("gallery").unwrap_err();
        assert!(matches!(err, ApiError::InvalidContentType(t) if t == "gallery"));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!(ContentKind::parse("BlogPost").is_err());
        assert!(ContentKind::parse("").is_err());
    }

    #[test]
    fn test_dispatch_table_targets() {
        assert_eq!(ContentKind::BlogPost.table(), "blog_posts");
        assert_eq!(ContentKind::StaticPage.table(), "static_pages");
        assert_eq!(ContentKind::Project.table(), "projects");
    }

    #[test]
    fn test_tag_round_trip() {
        for kind in ContentKind::ALL {
            assert_eq!(ContentKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&ContentKind::StaticPage).unwrap();
        assert_eq!(json, r#""static_page""#);
    }
}
