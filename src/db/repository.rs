use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Comment, CommentCount, FeedEntry, Item, LibraryEntry, LibraryFilter, MediaType, NewItem,
        NewProfile, Profile, ProfileUpdate, ReactionCount, Review, UserItem, UserItemPatch,
    },
};

/// Persistence boundary of the service
///
/// Every query the routes need goes through this trait so handlers and services
/// never touch SQL. Uniqueness (one user-item per user and item, one hidden row
/// per user and item, one mute per pair) is enforced by the schema; implementations
/// turn the corresponding writes into upserts.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Repository: Send + Sync {
    // Profiles

    async fn find_profile(&self, user_id: Uuid) -> AppResult<Option<Profile>>;

    async fn find_profile_by_username(&self, username: &str) -> AppResult<Option<Profile>>;

    async fn insert_profile(&self, profile: &NewProfile) -> AppResult<Profile>;

    /// Returns `None` when the profile does not exist
    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> AppResult<Option<Profile>>;

    async fn delete_profile(&self, user_id: Uuid) -> AppResult<u64>;

    // Items

    async fn find_item_by_catalog_id(
        &self,
        tmdb_id: i64,
        media_type: MediaType,
    ) -> AppResult<Option<Item>>;

    /// Case-insensitive exact title lookup within a media type
    async fn find_item_by_title(
        &self,
        title: &str,
        media_type: MediaType,
    ) -> AppResult<Option<Item>>;

    async fn insert_item(&self, item: &NewItem) -> AppResult<Item>;

    // User items

    async fn find_user_item(&self, user_id: Uuid, item_id: i64) -> AppResult<Option<UserItem>>;

    /// Insert-or-update keyed by (user, item); only fields set in `patch` change
    async fn upsert_user_item(
        &self,
        user_id: Uuid,
        item_id: i64,
        patch: &UserItemPatch,
    ) -> AppResult<UserItem>;

    /// A user's rows, newest first; `limit` of `None` returns everything
    async fn list_library(
        &self,
        user_id: Uuid,
        filter: LibraryFilter,
        limit: Option<i64>,
    ) -> AppResult<Vec<LibraryEntry>>;

    /// Rows of an item that carry a review, newest first
    async fn list_reviews(&self, item_id: i64, limit: i64) -> AppResult<Vec<Review>>;

    /// Global activity ordered by `updated_at` descending, strictly older than `before`
    async fn feed_page(
        &self,
        before: Option<DateTime<Utc>>,
        limit: i64,
    ) -> AppResult<Vec<FeedEntry>>;

    async fn delete_user_items(&self, user_id: Uuid) -> AppResult<u64>;

    // Reactions

    async fn insert_reaction(&self, user_id: Uuid, user_item_id: i64, emoji: &str)
        -> AppResult<()>;

    async fn find_reaction(
        &self,
        user_id: Uuid,
        user_item_id: i64,
        emoji: &str,
    ) -> AppResult<Option<i64>>;

    async fn delete_reaction(&self, reaction_id: i64) -> AppResult<()>;

    async fn reaction_counts(&self, user_item_ids: &[i64]) -> AppResult<Vec<ReactionCount>>;

    async fn delete_reactions_by_user(&self, user_id: Uuid) -> AppResult<u64>;

    // Comments

    async fn insert_comment(
        &self,
        user_id: Uuid,
        user_item_id: i64,
        content: &str,
    ) -> AppResult<Comment>;

    /// Comments of the given user-items, oldest first
    async fn list_comments(&self, user_item_ids: &[i64]) -> AppResult<Vec<Comment>>;

    async fn comment_counts(&self, user_item_ids: &[i64]) -> AppResult<Vec<CommentCount>>;

    async fn delete_comments_by_user(&self, user_id: Uuid) -> AppResult<u64>;

    // Feed suppression

    async fn hide_item(&self, user_id: Uuid, item_id: i64) -> AppResult<()>;

    async fn unhide_item(&self, user_id: Uuid, item_id: i64) -> AppResult<()>;

    async fn hidden_item_ids(&self, user_id: Uuid) -> AppResult<Vec<i64>>;

    async fn mute_user(&self, user_id: Uuid, muted_user_id: Uuid) -> AppResult<()>;

    async fn unmute_user(&self, user_id: Uuid, muted_user_id: Uuid) -> AppResult<()>;

    async fn muted_user_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Drops hidden rows and mutes where the user is either side
    async fn delete_suppressions(&self, user_id: Uuid) -> AppResult<u64>;
}
