//! Feed composition and ranking.
//!
//! Selecting which posts to surface for a viewer splits into three parts:
//! the social graph reader resolves who the viewer follows, the ranking
//! policy is a pure mapping from feed mode to window and order, and the
//! query builder turns the resolved plan into store queries.

pub mod graph;
pub mod query;
pub mod ranking;

pub use query::{FeedPlan, FeedQuery};
pub use ranking::{FeedMode, FeedOrder, RankingSpec, SortOrder};
