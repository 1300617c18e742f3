// Copyright (c) Teacup Team
// SPDX-License-Identifier: Apache-2.0

//! Decorates rows from the store into the transfer objects the API
//! returns. Derived fields are recomputed on every read; nothing is
//! cached in process.

use std::collections::{HashMap, HashSet};

use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::DbConnection;
use crate::error::ApiError;
use crate::models::comment::{Comment, CommentView};
use crate::models::post::{Post, PostView};
use crate::models::user::UserSummary;
use crate::schema::{comments, likes, profiles, users};

/// Batch-load compact user info (with avatar) for the given user ids.
pub async fn user_summaries(
    conn: &mut DbConnection,
    ids: &[i32],
) -> Result<HashMap<i32, UserSummary>, ApiError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, String, String, String, Option<String>)> = users::table
        .left_join(profiles::table)
        .filter(users::id.eq_any(ids))
        .select((
            users::id,
            users::username,
            users::first_name,
            users::last_name,
            profiles::avatar_url.nullable(),
        ))
        .load(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, username, first_name, last_name, avatar_url)| {
            (
                id,
                UserSummary {
                    id,
                    username,
                    first_name,
                    last_name,
                    avatar_url,
                },
            )
        })
        .collect())
}

/// Decorate posts with author info and the per-viewer derived fields.
/// Counts are aggregated in one query per relation rather than per post.
pub async fn present_posts(
    conn: &mut DbConnection,
    posts: Vec<Post>,
    viewer: Option<i32>,
) -> Result<Vec<PostView>, ApiError> {
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let post_ids: Vec<i32> = posts.iter().map(|p| p.id).collect();
    let author_ids: Vec<i32> = posts.iter().map(|p| p.author_id).collect();

    let authors = user_summaries(conn, &author_ids).await?;

    let like_counts: HashMap<i32, i64> = likes::table
        .filter(likes::post_id.eq_any(&post_ids))
        .group_by(likes::post_id)
        .select((likes::post_id, count_star()))
        .load::<(i32, i64)>(conn)
        .await?
        .into_iter()
        .collect();

    let comment_counts: HashMap<i32, i64> = comments::table
        .filter(comments::post_id.eq_any(&post_ids))
        .group_by(comments::post_id)
        .select((comments::post_id, count_star()))
        .load::<(i32, i64)>(conn)
        .await?
        .into_iter()
        .collect();

    let liked_by_viewer: HashSet<i32> = match viewer {
        Some(viewer) => likes::table
            .filter(likes::post_id.eq_any(&post_ids))
            .filter(likes::user_id.eq(viewer))
            .select(likes::post_id)
            .load::<i32>(conn)
            .await?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    // Authors are guaranteed by the foreign key; a post whose author
    // vanished mid-request is dropped rather than served half-built.
    Ok(posts
        .into_iter()
        .filter_map(|post| {
            let author = authors.get(&post.author_id).cloned()?;
            Some(PostView {
                id: post.id,
                content: post.content,
                author,
                media_url: post.media_url,
                created_at: post.created_at,
                updated_at: post.updated_at,
                likes_count: like_counts.get(&post.id).copied().unwrap_or(0),
                comments_count: comment_counts.get(&post.id).copied().unwrap_or(0),
                is_liked_by_viewer: liked_by_viewer.contains(&post.id),
            })
        })
        .collect())
}

/// Decorate a single post.
pub async fn present_post(
    conn: &mut DbConnection,
    post: Post,
    viewer: Option<i32>,
) -> Result<PostView, ApiError> {
    let post_id = post.id;
    present_posts(conn, vec![post], viewer)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound(format!("post {} not found", post_id)))
}

/// Decorate comments with their author info.
pub async fn present_comments(
    conn: &mut DbConnection,
    comments: Vec<Comment>,
) -> Result<Vec<CommentView>, ApiError> {
    if comments.is_empty() {
        return Ok(Vec::new());
    }

    let author_ids: Vec<i32> = comments.iter().map(|c| c.author_id).collect();
    let authors = user_summaries(conn, &author_ids).await?;

    Ok(comments
        .into_iter()
        .filter_map(|comment| {
            let author = authors.get(&comment.author_id).cloned()?;
            Some(CommentView {
                id: comment.id,
                post_id: comment.post_id,
                content: comment.content,
                author,
                created_at: comment.created_at,
                updated_at: comment.updated_at,
            })
        })
        .collect())
}

/// Decorate a single comment.
pub async fn present_comment(
    conn: &mut DbConnection,
    comment: Comment,
) -> Result<CommentView, ApiError> {
    let comment_id = comment.id;
    present_comments(conn, vec![comment])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound(format!("comment {} not found", comment_id)))
}
