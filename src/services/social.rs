use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::Repository,
    error::{AppError, AppResult},
    models::{social::group_reactions, Comment, MediaType, Review},
};

pub const MAX_EMOJI_CHARS: usize = 8;
pub const MAX_COMMENT_CHARS: usize = 1000;

/// Reviews shown on a title page
pub const REVIEW_LIMIT: i64 = 50;

/// First `max` characters of `s` (not bytes, so emoji stay whole)
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn clean_emoji(emoji: &str) -> AppResult<String> {
    let emoji = emoji.trim();
    if emoji.is_empty() {
        return Err(AppError::InvalidInput("emoji is required".to_string()));
    }
    Ok(truncate_chars(emoji, MAX_EMOJI_CHARS))
}

/// Appends a reaction
///
/// Store failures are logged and swallowed; the caller always sees success.
pub async fn add_reaction(
    repo: &dyn Repository,
    user_id: Uuid,
    user_item_id: i64,
    emoji: &str,
) -> AppResult<()> {
    let emoji = clean_emoji(emoji)?;

    if let Err(e) = repo.insert_reaction(user_id, user_item_id, &emoji).await {
        tracing::warn!(error = %e, user_item_id, "Reaction insert failed");
    }

    Ok(())
}

/// Result of a reaction toggle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToggleOutcome {
    /// Whether the caller's reaction exists after the toggle
    pub active: bool,
    /// Reactions with this emoji on the user-item after the toggle
    pub count: i64,
}

/// Removes the caller's identical reaction if present, otherwise adds one
pub async fn toggle_reaction(
    repo: &dyn Repository,
    user_id: Uuid,
    user_item_id: i64,
    emoji: &str,
) -> AppResult<ToggleOutcome> {
    let emoji = clean_emoji(emoji)?;

    let active = match repo.find_reaction(user_id, user_item_id, &emoji).await? {
        Some(reaction_id) => {
            repo.delete_reaction(reaction_id).await?;
            false
        }
        None => {
            repo.insert_reaction(user_id, user_item_id, &emoji).await?;
            true
        }
    };

    let count = repo
        .reaction_counts(&[user_item_id])
        .await?
        .into_iter()
        .filter(|c| c.emoji == emoji)
        .map(|c| c.count)
        .sum();

    Ok(ToggleOutcome { active, count })
}

/// Appends a comment; content is trimmed and capped at 1000 characters
pub async fn add_comment(
    repo: &dyn Repository,
    user_id: Uuid,
    user_item_id: i64,
    content: &str,
) -> AppResult<Comment> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::InvalidInput("content is required".to_string()));
    }

    let comment = repo
        .insert_comment(user_id, user_item_id, &truncate_chars(content, MAX_COMMENT_CHARS))
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, user_item_id, "Comment insert failed");
            e
        })?;

    tracing::info!(user_id = %user_id, user_item_id, "Comment added");

    Ok(comment)
}

/// Reviews of a title with their reactions and comments
///
/// A title nobody has stored yet has no reviews.
pub async fn title_social(
    repo: &dyn Repository,
    media_type: MediaType,
    tmdb_id: i64,
) -> AppResult<Vec<Review>> {
    let Some(item) = repo.find_item_by_catalog_id(tmdb_id, media_type).await? else {
        return Ok(Vec::new());
    };

    let mut reviews = repo.list_reviews(item.id, REVIEW_LIMIT).await?;
    if reviews.is_empty() {
        return Ok(reviews);
    }

    let ids: Vec<i64> = reviews.iter().map(|r| r.id).collect();
    let (reactions, comments) =
        tokio::try_join!(repo.reaction_counts(&ids), repo.list_comments(&ids))?;

    let mut reactions = group_reactions(reactions);
    for review in reviews.iter_mut() {
        review.reactions = reactions.remove(&review.id).unwrap_or_default();
        review.comments = comments
            .iter()
            .filter(|c| c.user_item_id == review.id)
            .cloned()
            .collect();
    }

    Ok(reviews)
}
