// Copyright (c) Teacup Team
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::DbConnection;
use crate::error::ApiError;
use crate::schema::follows;

/// Resolve the set of accounts a viewer follows. Empty when the viewer
/// follows nobody; store failures propagate unrecovered.
pub async fn following_of(conn: &mut DbConnection, viewer: i32) -> Result<Vec<i32>, ApiError> {
    let ids = follows::table
        .filter(follows::follower_id.eq(viewer))
        .select(follows::followed_id)
        .load::<i32>(conn)
        .await?;
    Ok(ids)
}

/// Candidate author set for the personalized feed: everyone the viewer
/// follows plus the viewer themself.
pub fn candidate_authors(viewer: i32, mut following: Vec<i32>) -> Vec<i32> {
    if !following.contains(&viewer) {
        following.push(viewer);
    }
    following
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_include_the_viewer() {
        let candidates = candidate_authors(1, vec![2, 3]);
        assert!(candidates.contains(&1));
        assert!(candidates.contains(&2));
        assert!(candidates.contains(&3));
        assert_eq!(candidates.len(), 3);
    }

    #[test]
    fn viewer_with_no_follows_sees_only_themself() {
        assert_eq!(candidate_authors(7, Vec::new()), vec![7]);
    }

    #[test]
    fn viewer_already_in_following_is_not_duplicated() {
        // The store forbids self-follow edges, but the union stays correct
        // even if one slips in.
        assert_eq!(candidate_authors(1, vec![1, 2]), vec![1, 2]);
    }
}
