// Copyright (c) Teacup Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::schema::{profiles, users};

pub const MAX_USERNAME_CHARS: usize = 150;

#[derive(Debug, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub date_joined: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl UpdateUser {
    pub fn is_noop(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.email.is_none()
    }
}

#[derive(Debug, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Profile {
    pub id: i32,
    pub user_id: i32,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub user_id: i32,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = profiles)]
pub struct UpdateProfile {
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
}

impl UpdateProfile {
    pub fn is_noop(&self) -> bool {
        self.bio.is_none()
            && self.avatar_url.is_none()
            && self.website.is_none()
            && self.location.is_none()
    }
}

/// Compact user representation embedded in posts, comments, like and
/// follow listings.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
}

/// Full user detail with profile and social graph counts. The counts are
/// recomputed from the store on every read.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub date_joined: DateTime<Utc>,
    pub profile: ProfileView,
    pub followers_count: i64,
    pub following_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl UserView {
    pub fn new(user: User, profile: Profile, followers_count: i64, following_count: i64) -> Self {
        UserView {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            date_joined: user.date_joined,
            profile: ProfileView {
                bio: profile.bio,
                avatar_url: profile.avatar_url,
                website: profile.website,
                location: profile.location,
                updated_at: profile.updated_at,
            },
            followers_count,
            following_count,
        }
    }
}

/// Validate a handle for user creation. The store's unique index is the
/// authoritative duplicate guard; this only covers shape.
pub fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::Validation("username must not be empty".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(ApiError::Validation(format!(
            "username must be at most {} characters",
            MAX_USERNAME_CHARS
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(ApiError::Validation(
            "username must not contain whitespace".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_username() {
        assert!(matches!(
            validate_username(""),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn rejects_whitespace_username() {
        assert!(matches!(
            validate_username("tea cup"),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn rejects_overlong_username() {
        let long = "a".repeat(MAX_USERNAME_CHARS + 1);
        assert!(matches!(
            validate_username(&long),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn accepts_reasonable_username() {
        assert!(validate_username("earl_grey.42").is_ok());
    }

    #[test]
    fn update_user_noop_detection() {
        assert!(UpdateUser::default().is_noop());
        let changes = UpdateUser {
            first_name: Some("Ada".to_string()),
            ..Default::default()
        };
        assert!(!changes.is_noop());
    }
}
