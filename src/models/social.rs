use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{Item, MediaType, ProfileSummary, WatchStatus};

/// Emoji → count for a single user-item
pub type ReactionCounts = BTreeMap<String, i64>;

/// Aggregated reaction count row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ReactionCount {
    pub user_item_id: i64,
    pub emoji: String,
    pub count: i64,
}

/// Aggregated comment count row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CommentCount {
    pub user_item_id: i64,
    pub count: i64,
}

/// Groups flat reaction counts by user-item
pub fn group_reactions(counts: Vec<ReactionCount>) -> BTreeMap<i64, ReactionCounts> {
    let mut grouped: BTreeMap<i64, ReactionCounts> = BTreeMap::new();
    for c in counts {
        *grouped
            .entry(c.user_item_id)
            .or_default()
            .entry(c.emoji)
            .or_insert(0) += c.count;
    }
    grouped
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub user_item_id: i64,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub profile: Option<ProfileSummary>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub user_item_id: i64,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            user_item_id: row.user_item_id,
            user_id: row.user_id,
            content: row.content,
            created_at: row.created_at,
            profile: ProfileSummary::from_columns(row.username, row.avatar_url),
        }
    }
}

/// A rated/reviewed user-item shown on a title page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: i64,
    pub user_id: Uuid,
    pub rating: Option<i16>,
    pub review: Option<String>,
    pub favorite: bool,
    pub updated_at: DateTime<Utc>,
    pub profile: Option<ProfileSummary>,
    #[serde(default)]
    pub reactions: ReactionCounts,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ReviewRow {
    pub id: i64,
    pub user_id: Uuid,
    pub rating: Option<i16>,
    pub review: Option<String>,
    pub favorite: bool,
    pub updated_at: DateTime<Utc>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            rating: row.rating,
            review: row.review,
            favorite: row.favorite,
            updated_at: row.updated_at,
            profile: ProfileSummary::from_columns(row.username, row.avatar_url),
            reactions: ReactionCounts::new(),
            comments: Vec::new(),
        }
    }
}

/// One activity row of the public feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub status: Option<WatchStatus>,
    pub favorite: bool,
    pub rating: Option<i16>,
    pub review: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub item: Item,
    pub profile: Option<ProfileSummary>,
    #[serde(default)]
    pub reactions: ReactionCounts,
    #[serde(default)]
    pub comment_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub struct FeedRow {
    pub id: i64,
    pub user_id: Uuid,
    pub status: Option<WatchStatus>,
    pub favorite: bool,
    pub rating: Option<i16>,
    pub review: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub item_id: i64,
    pub tmdb_id: Option<i64>,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub genres: Option<Vec<i32>>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<FeedRow> for FeedEntry {
    fn from(row: FeedRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            status: row.status,
            favorite: row.favorite,
            rating: row.rating,
            review: row.review,
            updated_at: row.updated_at,
            item: Item {
                id: row.item_id,
                tmdb_id: row.tmdb_id,
                media_type: row.media_type,
                title: row.title,
                poster_path: row.poster_path,
                release_date: row.release_date,
                genres: row.genres,
            },
            profile: ProfileSummary::from_columns(row.username, row.avatar_url),
            reactions: ReactionCounts::new(),
            comment_count: 0,
        }
    }
}

/// A page of the feed plus the cursor for the next one
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedPage {
    pub items: Vec<FeedEntry>,
    pub next_cursor: Option<DateTime<Utc>>,
}
