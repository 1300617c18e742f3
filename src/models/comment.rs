use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::models::user::UserSummary;
use crate::schema::comments;

pub const MAX_COMMENT_CONTENT_CHARS: usize = 500;

#[derive(Debug, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub post_id: i32,
    pub author_id: i32,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: i32,
    pub post_id: i32,
    pub content: String,
    pub author: UserSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn validate_comment_content(content: &str) -> Result<(), ApiError> {
    let chars = content.chars().count();
    if chars == 0 {
        return Err(ApiError::Validation(
            "comment content must not be empty".to_string(),
        ));
    }
    if chars > MAX_COMMENT_CONTENT_CHARS {
        return Err(ApiError::Validation(format!(
            "comment content must be at most {} characters",
            MAX_COMMENT_CONTENT_CHARS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_bounds() {
        assert!(matches!(
            validate_comment_content(""),
            Err(ApiError::Validation(_))
        ));
        let long = "y".repeat(MAX_COMMENT_CONTENT_CHARS + 1);
        assert!(matches!(
            validate_comment_content(&long),
            Err(ApiError::Validation(_))
        ));
        let max = "y".repeat(MAX_COMMENT_CONTENT_CHARS);
        assert!(validate_comment_content(&max).is_ok());
    }
}
