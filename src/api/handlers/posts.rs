// Copyright (c) Teacup Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::api::auth::{MaybeViewer, Viewer};
use crate::api::handlers::{PageParams, Pagination};
use crate::api::presenter;
use crate::db::{self, DbConnection, DbPool};
use crate::error::ApiError;
use crate::feed::query::escape_like;
use crate::models::comment::{validate_comment_content, Comment, CommentView, NewComment};
use crate::models::like::{LikeDetail, NewLike};
use crate::models::post::{validate_post_content, NewPost, Post, PostView, UpdatePost};
use crate::schema::{comments, likes, posts, users};

#[derive(Debug, Deserialize)]
pub struct PostListParams {
    pub author: Option<i32>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// List posts with optional author filter, search and sort override.
pub async fn list_posts(
    State(pool): State<DbPool>,
    MaybeViewer(viewer): MaybeViewer,
    Query(params): Query<PostListParams>,
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

    let mut count_query = posts::table.inner_join(users::table).count().into_boxed();
    if let Some(author) = params.author {
        count_query = count_query.filter(posts::author_id.eq(author));
    }
    if let Some(pattern) = &pattern {
        count_query = count_query.filter(
            posts::content
                .ilike(pattern.clone())
                .or(users::username.ilike(pattern.clone())),
        );
    }
    let total = count_query.get_result::<i64>(&mut conn).await?;

    let mut page_query = posts::table
        .inner_join(users::table)
        .select(Post::as_select())
        .into_boxed();
    if let Some(author) = params.author {
        page_query = page_query.filter(posts::author_id.eq(author));
    }
    if let Some(pattern) = &pattern {
        page_query = page_query.filter(
            posts::content
                .ilike(pattern.clone())
                .or(users::username.ilike(pattern.clone())),
        );
    }
    page_query = match params.ordering.as_deref() {
        None | Some("-created_at") => {
            page_query.order((posts::created_at.desc(), posts::id.desc()))
        }
        Some("created_at") => page_query.order((posts::created_at.asc(), posts::id.asc())),
        Some("-updated_at") => page_query.order(posts::updated_at.desc()),
        Some("updated_at") => page_query.order(posts::updated_at.asc()),
        Some(other) => {
            return Err(ApiError::Validation(format!(
                "unsupported ordering: {}",
                other
            )))
        }
    };

    let rows = page_query
        .limit(page.page_size())
        .offset(page.offset())
        .load::<Post>(&mut conn)
        .await?;

    let listed = presenter::present_posts(&mut conn, rows, viewer).await?;
    Ok(Json(json!({
        "posts": listed,
        "pagination": Pagination::new(total, page.page(), page.page_size()),
    })))
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    pub media_url: Option<String>,
}

/// Create a post authored by the viewer.
pub async fn create_post(
    State(pool): State<DbPool>,
    Viewer(viewer): Viewer,
    Json(request): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    validate_post_content(&request.content)?;

    let mut conn = db::conn(&pool).await?;
    let post: Post = diesel::insert_into(posts::table)
        .values(&NewPost {
            author_id: viewer,
            content: request.content,
            media_url: request.media_url,
        })
        .returning(Post::as_returning())
        .get_result(&mut conn)
        .await?;

    info!("user {} created post {}", viewer, post.id);
    let view = presenter::present_post(&mut conn, post, Some(viewer)).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Get a single decorated post.
pub async fn get_post(
    State(pool): State<DbPool>,
    MaybeViewer(viewer): MaybeViewer,
    Path(post_id): Path<i32>,
) -> Result<Json<PostView>, ApiError> {
    let mut conn = db::conn(&pool).await?;
    let post = load_post(&mut conn, post_id).await?;
    let view = presenter::present_post(&mut conn, post, viewer).await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub content: Option<String>,
    pub media_url: Option<String>,
}

/// Update a post. Only the author may do this; authorship never changes.
pub async fn update_post(
    State(pool): State<DbPool>,
    Viewer(viewer): Viewer,
    Path(post_id): Path<i32>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<PostView>, ApiError> {
    let mut conn = db::conn(&pool).await?;
    let post = load_post(&mut conn, post_id).await?;

    if post.author_id != viewer {
        return Err(ApiError::Forbidden(
            "you can only update your own posts".to_string(),
        ));
    }

    if let Some(content) = &request.content {
        validate_post_content(content)?;
    }

    let changes = UpdatePost {
        content: request.content,
        media_url: request.media_url,
    };

    let post = if changes.is_noop() {
        post
    } else {
        diesel::update(posts::table.find(post_id))
            .set(&changes)
            .returning(Post::as_returning())
            .get_result::<Post>(&mut conn)
            .await?
    };

    let view = presenter::present_post(&mut conn, post, Some(viewer)).await?;
    Ok(Json(view))
}

/// Delete a post, author only. Comments and likes cascade at the store.
pub async fn delete_post(
    State(pool): State<DbPool>,
    Viewer(viewer): Viewer,
    Path(post_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db::conn(&pool).await?;
    let post = load_post(&mut conn, post_id).await?;

    if post.author_id != viewer {
        return Err(ApiError::Forbidden(
            "you can only delete your own posts".to_string(),
        ));
    }

    diesel::delete(posts::table.find(post_id))
        .execute(&mut conn)
        .await?;

    info!("user {} deleted post {}", viewer, post_id);
    Ok(Json(json!({ "message": "post deleted" })))
}

/// Like a post. A second like for the same pair is a duplicate, surfaced
/// to the caller rather than swallowed.
pub async fn like_post(
    State(pool): State<DbPool>,
    Viewer(viewer): Viewer,
    Path(post_id): Path<i32>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut conn = db::conn(&pool).await?;
    load_post(&mut conn, post_id).await?;

    // Fast path; the unique constraint on (user_id, post_id) is the
    // authoritative guard under concurrent double-submits.
    let existing = likes::table
        .filter(likes::user_id.eq(viewer))
        .filter(likes::post_id.eq(post_id))
        .count()
        .get_result::<i64>(&mut conn)
        .await?;
    if existing > 0 {
        return Err(ApiError::Duplicate(
            "you have already liked this post".to_string(),
        ));
    }

    diesel::insert_into(likes::table)
        .values(&NewLike {
            user_id: viewer,
            post_id,
        })
        .execute(&mut conn)
        .await?;

    debug!("user {} liked post {}", viewer, post_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "post liked" })),
    ))
}

/// Remove the viewer's like; it must exist.
pub async fn unlike_post(
    State(pool): State<DbPool>,
    Viewer(viewer): Viewer,
    Path(post_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db::conn(&pool).await?;
    load_post(&mut conn, post_id).await?;

    let deleted = diesel::delete(
        likes::table
            .filter(likes::user_id.eq(viewer))
            .filter(likes::post_id.eq(post_id)),
    )
    .execute(&mut conn)
    .await?;

    if deleted == 0 {
        return Err(ApiError::NotFound(
            "you have not liked this post".to_string(),
        ));
    }

    debug!("user {} unliked post {}", viewer, post_id);
    Ok(Json(json!({ "message": "post unliked" })))
}

/// List the users who liked a post, newest like first.
pub async fn get_likes(
    State(pool): State<DbPool>,
    Path(post_id): Path<i32>,
    Query(page): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db::conn(&pool).await?;
    load_post(&mut conn, post_id).await?;

    let total = likes::table
        .filter(likes::post_id.eq(post_id))
        .count()
        .get_result::<i64>(&mut conn)
        .await?;

    let rows: Vec<(i32, chrono::DateTime<chrono::Utc>)> = likes::table
        .filter(likes::post_id.eq(post_id))
        .order(likes::created_at.desc())
        .limit(page.page_size())
        .offset(page.offset())
        .select((likes::user_id, likes::created_at))
        .load(&mut conn)
        .await?;

    let ids: Vec<i32> = rows.iter().map(|(id, _)| *id).collect();
    let summaries = presenter::user_summaries(&mut conn, &ids).await?;
    let listed: Vec<LikeDetail> = rows
        .into_iter()
        .filter_map(|(id, liked_at)| {
            summaries
                .get(&id)
                .cloned()
                .map(|summary| LikeDetail::from_summary(summary, liked_at))
        })
        .collect();

    Ok(Json(json!({
        "users": listed,
        "pagination": Pagination::new(total, page.page(), page.page_size()),
    })))
}

/// List a post's comments, oldest first.
pub async fn get_comments(
    State(pool): State<DbPool>,
    Path(post_id): Path<i32>,
    Query(page): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db::conn(&pool).await?;
    load_post(&mut conn, post_id).await?;

    let total = comments::table
        .filter(comments::post_id.eq(post_id))
        .count()
        .get_result::<i64>(&mut conn)
        .await?;

    let rows = comments::table
        .filter(comments::post_id.eq(post_id))
        .order(comments::created_at.asc())
        .limit(page.page_size())
        .offset(page.offset())
        .select(Comment::as_select())
        .load::<Comment>(&mut conn)
        .await?;

    let listed = presenter::present_comments(&mut conn, rows).await?;
    Ok(Json(json!({
        "comments": listed,
        "pagination": Pagination::new(total, page.page(), page.page_size()),
    })))
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

/// Comment on a post.
pub async fn add_comment(
    State(pool): State<DbPool>,
    Viewer(viewer): Viewer,
    Path(post_id): Path<i32>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentView>), ApiError> {
    validate_comment_content(&request.content)?;

    let mut conn = db::conn(&pool).await?;
    load_post(&mut conn, post_id).await?;

    let comment: Comment = diesel::insert_into(comments::table)
        .values(&NewComment {
            post_id,
            author_id: viewer,
            content: request.content,
        })
        .returning(Comment::as_returning())
        .get_result(&mut conn)
        .await?;

    debug!("user {} commented on post {}", viewer, post_id);
    let view = presenter::present_comment(&mut conn, comment).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Load a post row or a typed not-found.
pub(crate) async fn load_post(conn: &mut DbConnection, post_id: i32) -> Result<Post, ApiError> {
    posts::table
        .find(post_id)
        .select(Post::as_select())
        .first::<Post>(conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound(format!("post {} not found", post_id)))
}
