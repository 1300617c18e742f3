// Copyright (c) Teacup Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Duration, Utc};

/// Trailing window that bounds post age in trending mode.
pub const TRENDING_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    Personalized,
    Discovery,
    Trending,
}

impl FeedMode {
    /// Label used for metrics and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedMode::Personalized => "personalized",
            FeedMode::Discovery => "discovery",
            FeedMode::Trending => "trending",
        }
    }
}

/// Caller-supplied sort override, parsed from the `ordering` query
/// parameter. A `-` prefix means descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    CreatedAtDesc,
    CreatedAtAsc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<SortOrder> {
        match raw {
            "-created_at" => Some(SortOrder::CreatedAtDesc),
            "created_at" => Some(SortOrder::CreatedAtAsc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOrder {
    /// Creation time descending, post id as the deterministic tie-break.
    NewestFirst,
    OldestFirst,
    /// All-time like count descending, then creation time descending.
    MostLikedThenNewest,
}

/// Window filter and ordering for one feed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingSpec {
    pub since: Option<DateTime<Utc>>,
    pub order: FeedOrder,
}

/// Pure ranking policy: maps a feed mode (and any caller sort override)
/// to the window and order for that mode.
///
/// Trending defines its own deterministic order and ignores overrides.
/// Its like count is all-time; only the post's age is windowed.
pub fn ranking_for(mode: FeedMode, sort: Option<SortOrder>, now: DateTime<Utc>) -> RankingSpec {
    match mode {
        FeedMode::Trending => RankingSpec {
            since: Some(now - Duration::days(TRENDING_WINDOW_DAYS)),
            order: FeedOrder::MostLikedThenNewest,
        },
        FeedMode::Personalized | FeedMode::Discovery => RankingSpec {
            since: None,
            order: match sort.unwrap_or(SortOrder::CreatedAtDesc) {
                SortOrder::CreatedAtDesc => FeedOrder::NewestFirst,
                SortOrder::CreatedAtAsc => FeedOrder::OldestFirst,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order_is_newest_first() {
        let now = Utc::now();
        for mode in [FeedMode::Personalized, FeedMode::Discovery] {
            let spec = ranking_for(mode, None, now);
            assert_eq!(spec.order, FeedOrder::NewestFirst);
            assert_eq!(spec.since, None);
        }
    }

    #[test]
    fn sort_override_applies_to_personalized_and_discovery() {
        let now = Utc::now();
        let spec = ranking_for(FeedMode::Discovery, Some(SortOrder::CreatedAtAsc), now);
        assert_eq!(spec.order, FeedOrder::OldestFirst);
        let spec = ranking_for(FeedMode::Personalized, Some(SortOrder::CreatedAtAsc), now);
        assert_eq!(spec.order, FeedOrder::OldestFirst);
    }

    #[test_log::test]
    fn trending_ignores_sort_override() {
        let now = Utc::now();
        let spec = ranking_for(FeedMode::Trending, Some(SortOrder::CreatedAtAsc), now);
        assert_eq!(spec.order, FeedOrder::MostLikedThenNewest);
    }

    #[test_log::test]
    fn trending_windows_post_age_to_seven_days() {
        let now = Utc::now();
        let spec = ranking_for(FeedMode::Trending, None, now);
        assert_eq!(spec.since, Some(now - Duration::days(7)));
    }

    #[test]
    fn sort_order_parsing() {
        assert_eq!(SortOrder::parse("-created_at"), Some(SortOrder::CreatedAtDesc));
        assert_eq!(SortOrder::parse("created_at"), Some(SortOrder::CreatedAtAsc));
        assert_eq!(SortOrder::parse("likes"), None);
        assert_eq!(SortOrder::parse(""), None);
    }
}
