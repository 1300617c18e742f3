// Copyright (c) Teacup Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::api::auth::{MaybeViewer, Viewer};
use crate::api::handlers::{metrics, PageParams, Pagination};
use crate::api::presenter;
use crate::db::{self, DbPool};
use crate::error::ApiError;
use crate::feed::{query as feed_query, FeedMode, FeedQuery, SortOrder};

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl FeedParams {
    fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Personalized feed: posts from accounts the viewer follows, plus the
/// viewer's own.
pub async fn my_feed(
    State(pool): State<DbPool>,
    Viewer(viewer): Viewer,
    Query(params): Query<FeedParams>,
) -> Result<Json<Value>, ApiError> {
    feed_page(&pool, FeedMode::Personalized, Some(viewer), params).await
}

/// Discovery feed: posts from every author.
pub async fn discover(
    State(pool): State<DbPool>,
    MaybeViewer(viewer): MaybeViewer,
    Query(params): Query<FeedParams>,
) -> Result<Json<Value>, ApiError> {
    feed_page(&pool, FeedMode::Discovery, viewer, params).await
}

/// Trending feed: most-liked posts created within the trailing window.
pub async fn trending(
    State(pool): State<DbPool>,
    MaybeViewer(viewer): MaybeViewer,
    Query(params): Query<FeedParams>,
) -> Result<Json<Value>, ApiError> {
    feed_page(&pool, FeedMode::Trending, viewer, params).await
}

async fn feed_page(
    pool: &DbPool,
    mode: FeedMode,
    viewer: Option<i32>,
    params: FeedParams,
) -> Result<Json<Value>, ApiError> {
    metrics::FEED_REQUESTS.with_label_values(&[mode.as_str()]).inc();
    debug!("serving {} feed for viewer {:?}", mode.as_str(), viewer);

    // Trending defines its own deterministic order; the override is
    // ignored there rather than rejected.
    let sort = match (mode, params.ordering.as_deref()) {
        (FeedMode::Trending, _) | (_, None) => None,
        (_, Some(raw)) => Some(SortOrder::parse(raw).ok_or_else(|| {
            ApiError::Validation(format!("unsupported ordering: {}", raw))
        })?),
    };

    let page = params.page_params();
    let mut conn = db::conn(pool).await?;

    let plan = feed_query::build_plan(&mut conn, mode, viewer, sort, Utc::now()).await?;
    let query = FeedQuery {
        search: params.search,
        page: page.page(),
        page_size: page.page_size(),
    };
    let (posts, total) = feed_query::run(&mut conn, &plan, &query).await?;
    let posts = presenter::present_posts(&mut conn, posts, viewer).await?;

    Ok(Json(json!({
        "posts": posts,
        "pagination": Pagination::new(total, page.page(), page.page_size()),
    })))
}
