use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::models::user::UserSummary;
use crate::schema::posts;

pub const MAX_POST_CONTENT_CHARS: usize = 2000;

#[derive(Debug, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub id: i32,
    pub author_id: i32,
    pub content: String,
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub author_id: i32,
    pub content: String,
    pub media_url: Option<String>,
}

/// Partial update; the author is immutable after creation.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = posts)]
pub struct UpdatePost {
    pub content: Option<String>,
    pub media_url: Option<String>,
}

impl UpdatePost {
    pub fn is_noop(&self) -> bool {
        self.content.is_none() && self.media_url.is_none()
    }
}

/// Post decorated for a viewer: author info plus the derived counts and
/// like flag, none of which are stored.
#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: i32,
    pub content: String,
    pub author: UserSummary,
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub is_liked_by_viewer: bool,
}

/// Content bounds are measured in characters to match the store's check
/// constraint.
pub fn validate_post_content(content: &str) -> Result<(), ApiError> {
    let chars = content.chars().count();
    if chars == 0 {
        return Err(ApiError::Validation(
            "post content must not be empty".to_string(),
        ));
    }
    if chars > MAX_POST_CONTENT_CHARS {
        return Err(ApiError::Validation(format!(
            "post content must be at most {} characters",
            MAX_POST_CONTENT_CHARS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_content() {
        assert!(matches!(
            validate_post_content(""),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn rejects_overlong_content() {
        let long = "x".repeat(MAX_POST_CONTENT_CHARS + 1);
        assert!(matches!(
            validate_post_content(&long),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn accepts_content_at_the_boundary() {
        let max = "x".repeat(MAX_POST_CONTENT_CHARS);
        assert!(validate_post_content(&max).is_ok());
        assert!(validate_post_content("x").is_ok());
    }

    #[test]
    fn bounds_are_measured_in_characters_not_bytes() {
        // 2000 multi-byte characters is still within bounds
        let content = "茶".repeat(MAX_POST_CONTENT_CHARS);
        assert!(validate_post_content(&content).is_ok());
    }
}
