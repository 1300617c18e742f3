// Copyright (c) Teacup Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::user::UserSummary;
use crate::schema::likes;

/// A like row. The store enforces at most one per (user, post) pair.
#[derive(Debug, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Like {
    pub id: i32,
    pub user_id: i32,
    pub post_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub user_id: i32,
    pub post_id: i32,
}

/// DTO for listing the users who liked a post.
#[derive(Debug, Serialize)]
pub struct LikeDetail {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub liked_at: DateTime<Utc>,
}

impl LikeDetail {
    pub fn from_summary(user: UserSummary, liked_at: DateTime<Utc>) -> Self {
        LikeDetail {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            avatar_url: user.avatar_url,
            liked_at,
        }
    }
}
