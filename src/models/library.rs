use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Item, MediaType, WatchStatus};

/// Highest rating a user can give
pub const MAX_RATING: i16 = 10;

/// One user's relationship to one catalog item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct UserItem {
    pub id: i64,
    pub user_id: Uuid,
    pub item_id: i64,
    pub status: Option<WatchStatus>,
    pub favorite: bool,
    pub rating: Option<i16>,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial write applied by an upsert
///
/// Outer `None` leaves the stored value untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserItemPatch {
    pub status: Option<Option<WatchStatus>>,
    pub favorite: Option<bool>,
    pub rating: Option<Option<i16>>,
    pub review: Option<Option<String>>,
}

impl UserItemPatch {
    pub fn status(status: Option<WatchStatus>) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn favorite(favorite: bool) -> Self {
        Self {
            favorite: Some(favorite),
            ..Default::default()
        }
    }

    pub fn review(rating: Option<i16>, review: Option<String>) -> Self {
        Self {
            rating: Some(rating),
            review: Some(review),
            ..Default::default()
        }
    }

    /// Applies the patch on top of an existing row, as the upsert does
    pub fn apply(&self, row: &mut UserItem) {
        if let Some(status) = self.status {
            row.status = status;
        }
        if let Some(favorite) = self.favorite {
            row.favorite = favorite;
        }
        if let Some(rating) = self.rating {
            row.rating = rating;
        }
        if let Some(review) = &self.review {
            row.review = review.clone();
        }
    }
}

/// Library tab selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryFilter {
    #[default]
    All,
    Watchlist,
    Completed,
    Favorites,
}

impl LibraryFilter {
    pub fn matches(&self, row: &UserItem) -> bool {
        match self {
            LibraryFilter::All => true,
            LibraryFilter::Watchlist => row.status == Some(WatchStatus::Watchlist),
            LibraryFilter::Completed => row.status == Some(WatchStatus::Completed),
            LibraryFilter::Favorites => row.favorite,
        }
    }
}

/// A library row with its catalog item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryEntry {
    pub id: i64,
    pub status: Option<WatchStatus>,
    pub favorite: bool,
    pub rating: Option<i16>,
    pub review: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub item: Item,
}

/// Flat join row behind [`LibraryEntry`]
#[derive(Debug, sqlx::FromRow)]
pub struct LibraryRow {
    pub id: i64,
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
}

impl From<LibraryRow> for LibraryEntry {
    fn from(row: LibraryRow) -> Self {
        Self {
            id: row.id,
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
        }
    }
}

/// The caller's own state for a title page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleState {
    pub item_id: i64,
    pub user_item_id: Option<i64>,
    pub in_watchlist: bool,
    pub status: Option<WatchStatus>,
    pub favorite: bool,
    pub rating: Option<i16>,
    pub review: Option<String>,
}

impl TitleState {
    pub fn new(item_id: i64, row: Option<&UserItem>) -> Self {
        Self {
            item_id,
            user_item_id: row.map(|r| r.id),
            in_watchlist: row.and_then(|r| r.status) == Some(WatchStatus::Watchlist),
            status: row.and_then(|r| r.status),
            favorite: row.map(|r| r.favorite).unwrap_or(false),
            rating: row.and_then(|r| r.rating),
            review: row.and_then(|r| r.review.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> UserItem {
        UserItem {
            id: 1,
            user_id: Uuid::nil(),
            item_id: 7,
            status: Some(WatchStatus::Watchlist),
            favorite: false,
            rating: Some(6),
            review: Some("fine".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_patch_touches_only_supplied_fields() {
        let mut r = row();
        UserItemPatch::favorite(true).apply(&mut r);
        assert!(r.favorite);
        assert_eq!(r.status, Some(WatchStatus::Watchlist));
        assert_eq!(r.rating, Some(6));
    }

    #[test]
    fn test_patch_can_clear_status() {
        let mut r = row();
        UserItemPatch::status(None).apply(&mut r);
        assert_eq!(r.status, None);
    }

    #[test]
    fn test_review_patch_overwrites_both_fields() {
        let mut r = row();
        UserItemPatch::review(None, None).apply(&mut r);
        assert_eq!(r.rating, None);
        assert_eq!(r.review, None);
    }

    #[test]
    fn test_library_filter_matches() {
        let mut r = row();
        assert!(LibraryFilter::All.matches(&r));
        assert!(LibraryFilter::Watchlist.matches(&r));
        assert!(!LibraryFilter::Completed.matches(&r));
        assert!(!LibraryFilter::Favorites.matches(&r));
        r.favorite = true;
        assert!(LibraryFilter::Favorites.matches(&r));
    }

    #[test]
    fn test_title_state_without_row() {
        let state = TitleState::new(3, None);
        assert_eq!(state.item_id, 3);
        assert!(!state.in_watchlist);
        assert!(!state.favorite);
        assert_eq!(state.user_item_id, None);
    }
}
