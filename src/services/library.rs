use uuid::Uuid;

use crate::{
    auth::AuthUser,
    db::Repository,
    error::{AppError, AppResult},
    models::{
        library::MAX_RATING, Item, LibraryEntry, LibraryFilter, MediaType, NewItem, TitleState,
        UserItemPatch, WatchStatus,
    },
    services::{profile::ensure_profile, providers::MetadataProvider},
};

/// Looks up the catalog row for a TMDb title, creating it from TMDb details
/// the first time anyone touches the title
pub async fn ensure_catalog_item(
    repo: &dyn Repository,
    metadata: &dyn MetadataProvider,
    media_type: MediaType,
    tmdb_id: i64,
) -> AppResult<Item> {
    if let Some(item) = repo.find_item_by_catalog_id(tmdb_id, media_type).await? {
        return Ok(item);
    }

    let details = metadata.title_details(media_type, tmdb_id).await?;
    let new_item = NewItem::from_details(media_type, tmdb_id, &details);

    match repo.insert_item(&new_item).await {
        Ok(item) => {
            tracing::info!(tmdb_id, media_type = %media_type, item_id = item.id, "Catalog item created");
            Ok(item)
        }
        // Lost a race with a concurrent insert of the same title
        Err(e) => repo
            .find_item_by_catalog_id(tmdb_id, media_type)
            .await?
            .ok_or(e),
    }
}

/// Profile and catalog item a title action needs before it can write
async fn prepare(
    repo: &dyn Repository,
    metadata: &dyn MetadataProvider,
    user: &AuthUser,
    media_type: MediaType,
    tmdb_id: i64,
) -> AppResult<Item> {
    ensure_profile(repo, user).await?;
    ensure_catalog_item(repo, metadata, media_type, tmdb_id).await
}

/// The caller's state for a title page
pub async fn title_state(
    repo: &dyn Repository,
    metadata: &dyn MetadataProvider,
    user: &AuthUser,
    media_type: MediaType,
    tmdb_id: i64,
) -> AppResult<TitleState> {
    let item = prepare(repo, metadata, user, media_type, tmdb_id).await?;
    let row = repo.find_user_item(user.id, item.id).await?;
    Ok(TitleState::new(item.id, row.as_ref()))
}

/// Writes `patch` for the caller and returns the resulting state
async fn write(
    repo: &dyn Repository,
    user_id: Uuid,
    item_id: i64,
    patch: UserItemPatch,
) -> AppResult<TitleState> {
    let row = repo.upsert_user_item(user_id, item_id, &patch).await?;
    Ok(TitleState::new(item_id, Some(&row)))
}

/// Adds the title to the watchlist, or clears the status if it is already there
pub async fn toggle_watchlist(
    repo: &dyn Repository,
    metadata: &dyn MetadataProvider,
    user: &AuthUser,
    media_type: MediaType,
    tmdb_id: i64,
) -> AppResult<TitleState> {
    let item = prepare(repo, metadata, user, media_type, tmdb_id).await?;
    let current = repo.find_user_item(user.id, item.id).await?;

    let status = match current.and_then(|r| r.status) {
        Some(WatchStatus::Watchlist) => None,
        _ => Some(WatchStatus::Watchlist),
    };

    write(repo, user.id, item.id, UserItemPatch::status(status)).await
}

pub async fn toggle_favorite(
    repo: &dyn Repository,
    metadata: &dyn MetadataProvider,
    user: &AuthUser,
    media_type: MediaType,
    tmdb_id: i64,
) -> AppResult<TitleState> {
    let item = prepare(repo, metadata, user, media_type, tmdb_id).await?;
    let favorite = repo
        .find_user_item(user.id, item.id)
        .await?
        .map(|r| r.favorite)
        .unwrap_or(false);

    write(repo, user.id, item.id, UserItemPatch::favorite(!favorite)).await
}

pub async fn set_status(
    repo: &dyn Repository,
    metadata: &dyn MetadataProvider,
    user: &AuthUser,
    media_type: MediaType,
    tmdb_id: i64,
    status: Option<WatchStatus>,
) -> AppResult<TitleState> {
    let item = prepare(repo, metadata, user, media_type, tmdb_id).await?;
    write(repo, user.id, item.id, UserItemPatch::status(status)).await
}

/// Stores rating and review together; a blank review is stored as none
pub async fn save_review(
    repo: &dyn Repository,
    metadata: &dyn MetadataProvider,
    user: &AuthUser,
    media_type: MediaType,
    tmdb_id: i64,
    rating: Option<i16>,
    review: Option<String>,
) -> AppResult<TitleState> {
    if let Some(rating) = rating {
        if !(0..=MAX_RATING).contains(&rating) {
            return Err(AppError::InvalidInput(format!(
                "rating must be between 0 and {}",
                MAX_RATING
            )));
        }
    }

    let review = review
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    let item = prepare(repo, metadata, user, media_type, tmdb_id).await?;
    write(repo, user.id, item.id, UserItemPatch::review(rating, review)).await
}

/// The caller's library, newest first
pub async fn library(
    repo: &dyn Repository,
    user_id: Uuid,
    filter: LibraryFilter,
) -> AppResult<Vec<LibraryEntry>> {
    repo.list_library(user_id, filter, None).await
}
