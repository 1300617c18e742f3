// Copyright (c) Teacup Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use scoped_futures::ScopedFutureExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::api::auth::Viewer;
use crate::api::handlers::{PageParams, Pagination};
use crate::api::presenter;
use crate::db::{self, DbConnection, DbPool};
use crate::error::ApiError;
use crate::feed::query::escape_like;
use crate::models::follow::{FollowDetail, NewFollow};
use crate::models::user::{
    validate_username, NewProfile, NewUser, Profile, ProfileView, UpdateProfile, UpdateUser, User,
    UserView,
};
use crate::schema::{follows, profiles, users};

#[derive(Debug, Deserialize)]
pub struct UserListParams {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// List users, optionally filtered by a case-insensitive substring over
/// handle, names and bio.
pub async fn list_users(
    State(pool): State<DbPool>,
    Query(params): Query<UserListParams>,
) -> Result<Json<Value>, ApiError> {
    let page = PageParams {
        page: params.page,
        page_size: params.page_size,
    };
    let pattern = params
        .search
        .as_deref()
        .map(|term| format!("%{}%", escape_like(term)));

    let mut conn = db::conn(&pool).await?;

    let mut count_query = users::table.left_join(profiles::table).count().into_boxed();
    if let Some(pattern) = &pattern {
        count_query = count_query.filter(
            users::username
                .ilike(pattern.clone())
                .or(users::first_name.ilike(pattern.clone()))
                .or(users::last_name.ilike(pattern.clone()))
                .or(profiles::bio.ilike(pattern.clone())),
        );
    }
    let total = count_query.get_result::<i64>(&mut conn).await?;

    let mut page_query = users::table
        .left_join(profiles::table)
        .select((
            users::id,
            users::username,
            users::first_name,
            users::last_name,
            profiles::avatar_url.nullable(),
        ))
        .into_boxed();
    if let Some(pattern) = &pattern {
        page_query = page_query.filter(
            users::username
                .ilike(pattern.clone())
                .or(users::first_name.ilike(pattern.clone()))
                .or(users::last_name.ilike(pattern.clone()))
                .or(profiles::bio.ilike(pattern.clone())),
        );
    }
    let rows: Vec<(i32, String, String, String, Option<String>)> = page_query
        .order(users::username.asc())
        .limit(page.page_size())
        .offset(page.offset())
        .load(&mut conn)
        .await?;

    let listed: Vec<Value> = rows
        .into_iter()
        .map(|(id, username, first_name, last_name, avatar_url)| {
            json!({
                "id": id,
                "username": username,
                "first_name": first_name,
                "last_name": last_name,
                "avatar_url": avatar_url,
            })
        })
        .collect();

    Ok(Json(json!({
        "users": listed,
        "pagination": Pagination::new(total, page.page(), page.page_size()),
    })))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: Option<String>,
}

/// Create a user together with their empty profile in one transaction.
pub async fn create_user(
    State(pool): State<DbPool>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    validate_username(&request.username)?;

    let mut conn = db::conn(&pool).await?;

    // Fast-path duplicate check; the unique index on username remains the
    // authoritative guard under races.
    let taken = users::table
        .filter(users::username.eq(&request.username))
        .count()
        .get_result::<i64>(&mut conn)
        .await?;
    if taken > 0 {
        return Err(ApiError::Duplicate(format!(
            "username {} is already taken",
            request.username
        )));
    }

    let new_user = NewUser {
        username: request.username,
        first_name: request.first_name,
        last_name: request.last_name,
        email: request.email,
    };

    let (user, profile) = conn
        .transaction::<_, ApiError, _>(|conn| {
            async move {
                let user: User = diesel::insert_into(users::table)
                    .values(&new_user)
                    .returning(User::as_returning())
                    .get_result(conn)
                    .await?;

                let profile: Profile = diesel::insert_into(profiles::table)
                    .values(&NewProfile {
                        user_id: user.id,
                        ..Default::default()
                    })
                    .returning(Profile::as_returning())
                    .get_result(conn)
                    .await?;

                Ok((user, profile))
            }
            .scope_boxed()
        })
        .await?;

    info!("created user {} ({})", user.id, user.username);
    Ok((
        StatusCode::CREATED,
        Json(UserView::new(user, profile, 0, 0)),
    ))
}

/// Get a user with profile and social graph counts.
pub async fn get_user(
    State(pool): State<DbPool>,
    Path(user_id): Path<i32>,
) -> Result<Json<UserView>, ApiError> {
    let mut conn = db::conn(&pool).await?;
    let (user, profile) = load_user(&mut conn, user_id).await?;

    let followers_count = follows::table
        .filter(follows::followed_id.eq(user_id))
        .count()
        .get_result::<i64>(&mut conn)
        .await?;
    let following_count = follows::table
        .filter(follows::follower_id.eq(user_id))
        .count()
        .get_result::<i64>(&mut conn)
        .await?;

    Ok(Json(UserView::new(
        user,
        profile,
        followers_count,
        following_count,
    )))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// Update account fields. Only the user themself may do this; the handle
/// is immutable.
pub async fn update_user(
    State(pool): State<DbPool>,
    Viewer(viewer): Viewer,
    Path(user_id): Path<i32>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserView>, ApiError> {
    let mut conn = db::conn(&pool).await?;
    let (user, profile) = load_user(&mut conn, user_id).await?;

    if viewer != user.id {
        return Err(ApiError::Forbidden(
            "you can only update your own account".to_string(),
        ));
    }

    let changes = UpdateUser {
        first_name: request.first_name,
        last_name: request.last_name,
        email: request.email,
    };

    let user = if changes.is_noop() {
        user
    } else {
        diesel::update(users::table.find(user_id))
            .set(&changes)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await?
    };

    let followers_count = follows::table
        .filter(follows::followed_id.eq(user_id))
        .count()
        .get_result::<i64>(&mut conn)
        .await?;
    let following_count = follows::table
        .filter(follows::follower_id.eq(user_id))
        .count()
        .get_result::<i64>(&mut conn)
        .await?;

    Ok(Json(UserView::new(
        user,
        profile,
        followers_count,
        following_count,
    )))
}

/// Delete an account. Posts, comments, likes and follow edges cascade at
/// the store.
pub async fn delete_user(
    State(pool): State<DbPool>,
    Viewer(viewer): Viewer,
    Path(user_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db::conn(&pool).await?;
    let (user, _) = load_user(&mut conn, user_id).await?;

    if viewer != user.id {
        return Err(ApiError::Forbidden(
            "you can only delete your own account".to_string(),
        ));
    }

    diesel::delete(users::table.find(user_id))
        .execute(&mut conn)
        .await?;

    info!("deleted user {} ({})", user.id, user.username);
    Ok(Json(json!({ "message": "account deleted" })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
}

/// Partial profile update, owner only.
pub async fn update_profile(
    State(pool): State<DbPool>,
    Viewer(viewer): Viewer,
    Path(user_id): Path<i32>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileView>, ApiError> {
    let mut conn = db::conn(&pool).await?;
    let (user, profile) = load_user(&mut conn, user_id).await?;

    if viewer != user.id {
        return Err(ApiError::Forbidden(
            "you can only update your own profile".to_string(),
        ));
    }

    let changes = UpdateProfile {
        bio: request.bio,
        avatar_url: request.avatar_url,
        website: request.website,
        location: request.location,
    };

    let profile = if changes.is_noop() {
        profile
    } else {
        diesel::update(profiles::table.filter(profiles::user_id.eq(user_id)))
            .set(&changes)
            .returning(Profile::as_returning())
            .get_result(&mut conn)
            .await?
    };

    Ok(Json(ProfileView {
        bio: profile.bio,
        avatar_url: profile.avatar_url,
        website: profile.website,
        location: profile.location,
        updated_at: profile.updated_at,
    }))
}

/// Follow a user. Self-follow is a validation error; an existing edge is
/// a duplicate. The store's constraints back both rules under races.
pub async fn follow_user(
    State(pool): State<DbPool>,
    Viewer(viewer): Viewer,
    Path(target_id): Path<i32>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if viewer == target_id {
        return Err(ApiError::Validation(
            "you cannot follow yourself".to_string(),
        ));
    }

    let mut conn = db::conn(&pool).await?;
    let (target, _) = load_user(&mut conn, target_id).await?;

    let existing = follows::table
        .filter(follows::follower_id.eq(viewer))
        .filter(follows::followed_id.eq(target_id))
        .count()
        .get_result::<i64>(&mut conn)
        .await?;
    if existing > 0 {
        return Err(ApiError::Duplicate(
            "you are already following this user".to_string(),
        ));
    }

    diesel::insert_into(follows::table)
        .values(&NewFollow {
            follower_id: viewer,
            followed_id: target_id,
        })
        .execute(&mut conn)
        .await?;

    debug!("user {} followed user {}", viewer, target_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("you are now following {}", target.username)
        })),
    ))
}

/// Unfollow a user; the edge must exist.
pub async fn unfollow_user(
    State(pool): State<DbPool>,
    Viewer(viewer): Viewer,
    Path(target_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db::conn(&pool).await?;
    let (target, _) = load_user(&mut conn, target_id).await?;

    let deleted = diesel::delete(
        follows::table
            .filter(follows::follower_id.eq(viewer))
            .filter(follows::followed_id.eq(target_id)),
    )
    .execute(&mut conn)
    .await?;

    if deleted == 0 {
        return Err(ApiError::NotFound(
            "you are not following this user".to_string(),
        ));
    }

    debug!("user {} unfollowed user {}", viewer, target_id);
    Ok(Json(json!({
        "message": format!("you have unfollowed {}", target.username)
    })))
}

/// List the users following this user, newest edge first.
pub async fn get_followers(
    State(pool): State<DbPool>,
    Path(user_id): Path<i32>,
    Query(page): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db::conn(&pool).await?;
    load_user(&mut conn, user_id).await?;

    let total = follows::table
        .filter(follows::followed_id.eq(user_id))
        .count()
        .get_result::<i64>(&mut conn)
        .await?;

    let edges: Vec<(i32, chrono::DateTime<chrono::Utc>)> = follows::table
        .filter(follows::followed_id.eq(user_id))
        .order(follows::created_at.desc())
        .limit(page.page_size())
        .offset(page.offset())
        .select((follows::follower_id, follows::created_at))
        .load(&mut conn)
        .await?;

    let details = follow_details(&mut conn, edges).await?;
    Ok(Json(json!({
        "users": details,
        "pagination": Pagination::new(total, page.page(), page.page_size()),
    })))
}

/// List the users this user follows, newest edge first.
pub async fn get_following(
    State(pool): State<DbPool>,
    Path(user_id): Path<i32>,
    Query(page): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db::conn(&pool).await?;
    load_user(&mut conn, user_id).await?;

    let total = follows::table
        .filter(follows::follower_id.eq(user_id))
        .count()
        .get_result::<i64>(&mut conn)
        .await?;

    let edges: Vec<(i32, chrono::DateTime<chrono::Utc>)> = follows::table
        .filter(follows::follower_id.eq(user_id))
        .order(follows::created_at.desc())
        .limit(page.page_size())
        .offset(page.offset())
        .select((follows::followed_id, follows::created_at))
        .load(&mut conn)
        .await?;

    let details = follow_details(&mut conn, edges).await?;
    Ok(Json(json!({
        "users": details,
        "pagination": Pagination::new(total, page.page(), page.page_size()),
    })))
}

/// Load a user and their profile, or a typed not-found.
async fn load_user(conn: &mut DbConnection, user_id: i32) -> Result<(User, Profile), ApiError> {
    let user = users::table
        .find(user_id)
        .select(User::as_select())
        .first::<User>(conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", user_id)))?;

    let profile = profiles::table
        .filter(profiles::user_id.eq(user_id))
        .select(Profile::as_select())
        .first::<Profile>(conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound(format!("profile for user {} not found", user_id)))?;

    Ok((user, profile))
}

/// Resolve follow edges into detail DTOs, preserving edge order.
async fn follow_details(
    conn: &mut DbConnection,
    edges: Vec<(i32, chrono::DateTime<chrono::Utc>)>,
) -> Result<Vec<FollowDetail>, ApiError> {
    let ids: Vec<i32> = edges.iter().map(|(id, _)| *id).collect();
    let summaries = presenter::user_summaries(conn, &ids).await?;

    Ok(edges
        .into_iter()
        .filter_map(|(id, followed_at)| {
            summaries
                .get(&id)
                .cloned()
                .map(|summary| FollowDetail::from_summary(summary, followed_at))
        })
        .collect())
}
