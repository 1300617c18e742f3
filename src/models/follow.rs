// Copyright (c) Teacup Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::user::UserSummary;
use crate::schema::follows;

/// A follow edge. Uniqueness per ordered pair and the no-self-follow rule
/// are enforced by the store in addition to the handler checks.
#[derive(Debug, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = follows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Follow {
    pub id: i32,
    pub follower_id: i32,
    pub followed_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = follows)]
pub struct NewFollow {
    pub follower_id: i32,
    pub followed_id: i32,
}

/// DTO for follower/following listings with profile details.
#[derive(Debug, Serialize)]
pub struct FollowDetail {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub followed_at: DateTime<Utc>,
}

impl FollowDetail {
    pub fn from_summary(user: UserSummary, followed_at: DateTime<Utc>) -> Self {
        FollowDetail {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            avatar_url: user.avatar_url,
            followed_at,
        }
    }
}
