use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::{
    db::Repository,
    error::AppResult,
    models::{social::group_reactions, FeedEntry, FeedPage},
};

pub const DEFAULT_FEED_LIMIT: i64 = 20;
pub const MAX_FEED_LIMIT: i64 = 50;

/// Upper bound on store round-trips spent refilling a page that suppression
/// thinned out
const MAX_FETCH_ROUNDS: usize = 5;

/// Page size from the raw query value: missing, unparsable or zero means the
/// default, anything larger than the cap is clamped
pub fn clamp_limit(raw: Option<&str>) -> i64 {
    match raw.and_then(|s| s.trim().parse::<i64>().ok()) {
        Some(n) if n > 0 => n.min(MAX_FEED_LIMIT),
        _ => DEFAULT_FEED_LIMIT,
    }
}

/// Authors and items a viewer asked not to see
#[derive(Debug, Default)]
pub struct Suppressions {
    muted_users: HashSet<Uuid>,
    hidden_items: HashSet<i64>,
}

impl Suppressions {
    pub fn new(muted_users: Vec<Uuid>, hidden_items: Vec<i64>) -> Self {
        Self {
            muted_users: muted_users.into_iter().collect(),
            hidden_items: hidden_items.into_iter().collect(),
        }
    }

    pub async fn load(repo: &dyn Repository, viewer: Uuid) -> AppResult<Self> {
        let (muted, hidden) =
            tokio::try_join!(repo.muted_user_ids(viewer), repo.hidden_item_ids(viewer))?;
        Ok(Self::new(muted, hidden))
    }

    pub fn is_empty(&self) -> bool {
        self.muted_users.is_empty() && self.hidden_items.is_empty()
    }

    pub fn allows(&self, entry: &FeedEntry) -> bool {
        !self.muted_users.contains(&entry.user_id) && !self.hidden_items.contains(&entry.item.id)
    }
}

/// One page of global activity, newest first
///
/// Fetches `limit + 1` rows per round so "has more" is known without a count.
/// When suppression drops rows the cursor advances past the last raw row and
/// another batch is fetched, so a page holds at most `limit` entries and is
/// short only when the store runs out or the round bound is hit.
pub async fn feed_page(
    repo: &dyn Repository,
    viewer: Option<Uuid>,
    cursor: Option<DateTime<Utc>>,
    limit: i64,
) -> AppResult<FeedPage> {
    let limit = limit.clamp(1, MAX_FEED_LIMIT);
    let wanted = limit as usize;

    let suppressions = match viewer {
        Some(viewer) => Suppressions::load(repo, viewer).await?,
        None => Suppressions::default(),
    };

    let mut visible: Vec<FeedEntry> = Vec::with_capacity(wanted + 1);
    let mut before = cursor;
    let mut exhausted = false;

    for _ in 0..MAX_FETCH_ROUNDS {
        let batch = repo.feed_page(before, limit + 1).await?;
        exhausted = batch.len() <= wanted;

        if let Some(last) = batch.last() {
            before = Some(last.updated_at);
        }

        visible.extend(batch.into_iter().filter(|e| suppressions.allows(e)));

        if visible.len() > wanted || exhausted || suppressions.is_empty() {
            break;
        }
    }

    let next_cursor = if visible.len() > wanted {
        visible.truncate(wanted);
        visible.last().map(|e| e.updated_at)
    } else if !exhausted {
        // Round bound hit: resume after the last row inspected
        before
    } else {
        None
    };

    attach_social(repo, &mut visible).await?;

    tracing::debug!(
        viewer = ?viewer,
        count = visible.len(),
        has_more = next_cursor.is_some(),
        "Feed page built"
    );

    Ok(FeedPage {
        items: visible,
        next_cursor,
    })
}

/// Fills reaction counts and comment counts for the given entries
async fn attach_social(repo: &dyn Repository, entries: &mut [FeedEntry]) -> AppResult<()> {
    if entries.is_empty() {
        return Ok(());
    }

    let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
    let (reactions, comments) =
        tokio::try_join!(repo.reaction_counts(&ids), repo.comment_counts(&ids))?;

    let mut reactions = group_reactions(reactions);
    for entry in entries.iter_mut() {
        entry.reactions = reactions.remove(&entry.id).unwrap_or_default();
        entry.comment_count = comments
            .iter()
            .find(|c| c.user_item_id == entry.id)
            .map(|c| c.count)
            .unwrap_or(0);
    }

    Ok(())
}
