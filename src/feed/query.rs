// Copyright (c) Teacup Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::db::DbConnection;
use crate::error::ApiError;
use crate::feed::graph;
use crate::feed::ranking::{self, FeedMode, FeedOrder, RankingSpec, SortOrder};
use crate::models::post::Post;
use crate::schema::{posts, users};

/// Filters shared by every feed mode.
#[derive(Debug)]
pub struct FeedQuery {
    pub search: Option<String>,
    pub page: i64,
    pub page_size: i64,
}

/// A fully resolved feed: candidate authors, window and order.
#[derive(Debug)]
pub struct FeedPlan {
    /// `None` means every author is eligible.
    pub authors: Option<Vec<i32>>,
    pub since: Option<DateTime<Utc>>,
    pub order: FeedOrder,
}

/// Resolve mode and viewer into a concrete plan. Personalized mode
/// requires an authenticated viewer and consults the social graph; the
/// other modes consider every author.
pub async fn build_plan(
    conn: &mut DbConnection,
    mode: FeedMode,
    viewer: Option<i32>,
    sort: Option<SortOrder>,
    now: DateTime<Utc>,
) -> Result<FeedPlan, ApiError> {
    let authors = match mode {
        FeedMode::Personalized => {
            let viewer = viewer.ok_or_else(|| {
                ApiError::Unauthorized(
                    "authentication required for the personalized feed".to_string(),
                )
            })?;
            let following = graph::following_of(conn, viewer).await?;
            Some(graph::candidate_authors(viewer, following))
        }
        FeedMode::Discovery | FeedMode::Trending => None,
    };

    let RankingSpec { since, order } = ranking::ranking_for(mode, sort, now);
    Ok(FeedPlan {
        authors,
        since,
        order,
    })
}

/// Run the plan against the store, returning one page of posts and the
/// total number of matches.
pub async fn run(
    conn: &mut DbConnection,
    plan: &FeedPlan,
    query: &FeedQuery,
) -> Result<(Vec<Post>, i64), ApiError> {
    debug!(
        "running feed query: authors={:?}, since={:?}, order={:?}, page={}",
        plan.authors.as_ref().map(Vec::len),
        plan.since,
        plan.order,
        query.page
    );

    let pattern = query
        .search
        .as_deref()
        .map(|term| format!("%{}%", escape_like(term)));

    // Boxed queries cannot be cloned, so the filters are applied twice:
    // once for the total count, once for the page itself.
    let mut count_query = posts::table.inner_join(users::table).count().into_boxed();
    if let Some(authors) = &plan.authors {
        count_query = count_query.filter(posts::author_id.eq_any(authors));
    }
    if let Some(since) = plan.since {
        count_query = count_query.filter(posts::created_at.ge(since));
    }
    if let Some(pattern) = &pattern {
        count_query = count_query.filter(
            posts::content
                .ilike(pattern.clone())
                .or(users::username.ilike(pattern.clone())),
        );
    }
    let total = count_query.get_result::<i64>(conn).await?;

    let mut page_query = posts::table
        .inner_join(users::table)
        .select(Post::as_select())
        .into_boxed();
    if let Some(authors) = &plan.authors {
        page_query = page_query.filter(posts::author_id.eq_any(authors));
    }
    if let Some(since) = plan.since {
        page_query = page_query.filter(posts::created_at.ge(since));
    }
    if let Some(pattern) = &pattern {
        page_query = page_query.filter(
            posts::content
                .ilike(pattern.clone())
                .or(users::username.ilike(pattern.clone())),
        );
    }

    page_query = match plan.order {
        FeedOrder::NewestFirst => page_query.order((posts::created_at.desc(), posts::id.desc())),
        FeedOrder::OldestFirst => page_query.order((posts::created_at.asc(), posts::id.asc())),
        FeedOrder::MostLikedThenNewest => page_query.order((
            all_time_like_count().desc(),
            posts::created_at.desc(),
        )),
    };

    let page = page_query
        .limit(query.page_size)
        .offset((query.page - 1) * query.page_size)
        .load::<Post>(conn)
        .await?;

    Ok((page, total))
}

/// All-time like count as a correlated subquery. Trending windows the
/// post's age only; likes are counted unconditionally.
fn all_time_like_count() -> diesel::expression::SqlLiteral<BigInt> {
    sql::<BigInt>("(SELECT COUNT(*) FROM likes WHERE likes.post_id = posts.id)")
}

/// Escape LIKE metacharacters so a search term matches literally.
pub fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn plain_terms_pass_through() {
        assert_eq!(escape_like("earl grey"), "earl grey");
    }
}
