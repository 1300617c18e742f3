// Copyright (c) Teacup Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, State};
use axum::Json;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::api::auth::Viewer;
use crate::api::presenter;
use crate::db::{self, DbConnection, DbPool};
use crate::error::ApiError;
use crate::models::comment::{validate_comment_content, Comment, CommentView};
use crate::schema::comments;

/// Get a single comment.
pub async fn get_comment(
    State(pool): State<DbPool>,
    Path(comment_id): Path<i32>,
) -> Result<Json<CommentView>, ApiError> {
    let mut conn = db::conn(&pool).await?;
    let comment = load_comment(&mut conn, comment_id).await?;
    let view = presenter::present_comment(&mut conn, comment).await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// Update a comment's content, author only.
pub async fn update_comment(
    State(pool): State<DbPool>,
    Viewer(viewer): Viewer,
    Path(comment_id): Path<i32>,
    Json(request): Json<UpdateCommentRequest>,
) -> Result<Json<CommentView>, ApiError> {
    validate_comment_content(&request.content)?;

    let mut conn = db::conn(&pool).await?;
    let comment = load_comment(&mut conn, comment_id).await?;

    if comment.author_id != viewer {
        return Err(ApiError::Forbidden(
            "you can only update your own comments".to_string(),
        ));
    }

    let comment: Comment = diesel::update(comments::table.find(comment_id))
        .set(comments::content.eq(request.content))
        .returning(Comment::as_returning())
        .get_result(&mut conn)
        .await?;

    let view = presenter::present_comment(&mut conn, comment).await?;
    Ok(Json(view))
}

/// Delete a comment, author only.
pub async fn delete_comment(
    State(pool): State<DbPool>,
    Viewer(viewer): Viewer,
    Path(comment_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db::conn(&pool).await?;
    let comment = load_comment(&mut conn, comment_id).await?;

    if comment.author_id != viewer {
        return Err(ApiError::Forbidden(
            "you can only delete your own comments".to_string(),
        ));
    }

    diesel::delete(comments::table.find(comment_id))
        .execute(&mut conn)
        .await?;

    debug!("user {} deleted comment {}", viewer, comment_id);
    Ok(Json(json!({ "message": "comment deleted" })))
}

async fn load_comment(conn: &mut DbConnection, comment_id: i32) -> Result<Comment, ApiError> {
    comments::table
        .find(comment_id)
        .select(Comment::as_select())
        .first::<Comment>(conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound(format!("comment {} not found", comment_id)))
}
