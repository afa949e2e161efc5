//! Bulk import of titles into a user's library
//!
//! Rows come either straight from a client (already matched) or from a
//! Letterboxd/Trakt CSV export run through [`csv::read_export`] and
//! [`matching::match_rows`]. Each row is imported on its own; one bad row never
//! aborts the batch.
use uuid::Uuid;

use crate::{
    db::Repository,
    error::{AppError, AppResult},
    models::{
        import::MAX_IMPORT_BATCH, library::MAX_RATING, ImportItem, ImportOutcome, ImportSummary,
        UserItemPatch,
    },
};

pub mod csv;
pub mod matching;

pub use self::csv::read_export;
pub use matching::match_rows;

/// Rounds an imported rating onto the stored scale
fn stored_rating(rating: Option<f64>) -> AppResult<Option<i16>> {
    let Some(rating) = rating else {
        return Ok(None);
    };

    let rounded = rating.round();
    if !(0.0..=f64::from(MAX_RATING)).contains(&rounded) {
        return Err(AppError::InvalidInput(format!(
            "rating {} is outside 0-{}",
            rating, MAX_RATING
        )));
    }

    Ok(Some(rounded as i16))
}

/// Finds the catalog item for a row by TMDb id, then by title, inserting a
/// minimal item when neither exists
async fn resolve_item(repo: &dyn Repository, row: &ImportItem) -> AppResult<i64> {
    if let Some(tmdb_id) = row.tmdb_id {
        if let Some(item) = repo.find_item_by_catalog_id(tmdb_id, row.media_type).await? {
            return Ok(item.id);
        }
    }

    if let Some(item) = repo.find_item_by_title(&row.title, row.media_type).await? {
        return Ok(item.id);
    }

    Ok(repo.insert_item(&row.new_item()).await?.id)
}

async fn import_row(repo: &dyn Repository, user_id: Uuid, row: &ImportItem) -> AppResult<()> {
    let rating = stored_rating(row.rating)?;
    let review = row
        .review
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    let item_id = resolve_item(repo, row).await?;

    let patch = UserItemPatch {
        status: Some(Some(row.status)),
        favorite: Some(row.favorite),
        rating: Some(rating),
        review: Some(review),
    };
    repo.upsert_user_item(user_id, item_id, &patch).await?;

    Ok(())
}

/// Imports rows for `user_id`, reporting an outcome per row
pub async fn import_rows(
    repo: &dyn Repository,
    user_id: Uuid,
    rows: &[ImportItem],
) -> AppResult<ImportSummary> {
    if rows.len() > MAX_IMPORT_BATCH {
        return Err(AppError::InvalidInput(format!(
            "At most {} items per import",
            MAX_IMPORT_BATCH
        )));
    }

    let mut outcomes = Vec::with_capacity(rows.len());
    for row in rows {
        let outcome = match import_row(repo, user_id, row).await {
            Ok(()) => ImportOutcome {
                ok: true,
                title: row.title.clone(),
                reason: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, title = %row.title, "Import row failed");
                ImportOutcome {
                    ok: false,
                    title: row.title.clone(),
                    reason: Some(e.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }

    let summary = ImportSummary::from_outcomes(outcomes);
    tracing::info!(
        user_id = %user_id,
        ok = summary.ok,
        failed = summary.failed,
        "Import finished"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MockRepository,
        models::{Item, MediaType, UserItem, WatchStatus},
    };
    use chrono::Utc;

    fn user() -> Uuid {
        Uuid::from_u128(42)
    }

    fn row(title: &str, tmdb_id: Option<i64>) -> ImportItem {
        ImportItem {
            tmdb_id,
            media_type: MediaType::Movie,
            title: title.to_string(),
            year: None,
            status: WatchStatus::Completed,
            favorite: true,
            rating: Some(7.6),
            review: Some("  loved it ".to_string()),
            poster_path: None,
            release_date: None,
            genres: None,
        }
    }

    fn item(id: i64) -> Item {
        Item {
            id,
            tmdb_id: None,
            media_type: MediaType::Movie,
            title: "x".to_string(),
            poster_path: None,
            release_date: None,
            genres: None,
        }
    }

    fn stored(item_id: i64, patch: &UserItemPatch) -> UserItem {
        let mut r = UserItem {
            id: item_id * 10,
            user_id: user(),
            item_id,
            status: None,
            favorite: false,
            rating: None,
            review: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        patch.apply(&mut r);
        r
    }

    #[test]
    fn test_stored_rating() {
        assert_eq!(stored_rating(None).unwrap(), None);
        assert_eq!(stored_rating(Some(7.6)).unwrap(), Some(8));
        assert_eq!(stored_rating(Some(0.0)).unwrap(), Some(0));
        assert!(stored_rating(Some(11.0)).is_err());
        assert!(stored_rating(Some(-1.0)).is_err());
    }

    #[tokio::test]
    async fn test_existing_catalog_item_reused() {
        let mut repo = MockRepository::new();
        repo.expect_find_item_by_catalog_id()
            .withf(|id, mt| *id == 603 && *mt == MediaType::Movie)
            .returning(|_, _| Ok(Some(item(5))));
        repo.expect_find_item_by_title().never();
        repo.expect_insert_item().never();
        repo.expect_upsert_user_item()
            .withf(|_, item_id, patch| {
                *item_id == 5
                    && patch.status == Some(Some(WatchStatus::Completed))
                    && patch.favorite == Some(true)
                    && patch.rating == Some(Some(8))
                    && patch.review == Some(Some("loved it".to_string()))
            })
            .returning(|_, item_id, patch| Ok(stored(item_id, patch)));

        let summary = import_rows(&repo, user(), &[row("The Matrix", Some(603))])
            .await
            .unwrap();
        assert_eq!(summary.ok, 1);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn test_title_lookup_then_insert() {
        let mut repo = MockRepository::new();
        repo.expect_find_item_by_catalog_id().never();
        repo.expect_find_item_by_title()
            .returning(|title, _| Ok((title == "Known").then(|| item(1))));
        repo.expect_insert_item()
            .times(1)
            .withf(|i| i.title == "Unknown")
            .returning(|_| Ok(item(2)));
        repo.expect_upsert_user_item()
            .times(2)
            .returning(|_, item_id, patch| Ok(stored(item_id, patch)));

        let summary = import_rows(&repo, user(), &[row("Known", None), row("Unknown", None)])
            .await
            .unwrap();
        assert_eq!(summary.ok, 2);
    }

    #[tokio::test]
    async fn test_row_failures_do_not_abort_batch() {
        let mut repo = MockRepository::new();
        repo.expect_find_item_by_title()
            .returning(|_, _| Ok(Some(item(1))));
        repo.expect_upsert_user_item()
            .returning(|_, item_id, patch| Ok(stored(item_id, patch)));

        let mut bad = row("Bad rating", None);
        bad.rating = Some(42.0);
        let rows = vec![row("First", None), bad, row("Third", None)];

        let summary = import_rows(&repo, user(), &rows).await.unwrap();
        assert_eq!(summary.ok, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.results[1].ok);
        assert_eq!(summary.results[1].title, "Bad rating");
        assert!(summary.results[1].reason.is_some());
    }

    #[tokio::test]
    async fn test_store_error_reported_per_row() {
        let mut repo = MockRepository::new();
        repo.expect_find_item_by_title()
            .returning(|_, _| Ok(None));
        repo.expect_insert_item()
            .returning(|_| Err(AppError::Internal("insert failed".to_string())));

        let summary = import_rows(&repo, user(), &[row("A", None)]).await.unwrap();
        assert_eq!(summary.failed, 1);
        assert!(summary.results[0]
            .reason
            .as_deref()
            .unwrap()
            .contains("insert failed"));
    }

    #[tokio::test]
    async fn test_oversized_batch_rejected() {
        let repo = MockRepository::new();
        let rows = vec![row("A", None); MAX_IMPORT_BATCH + 1];
        let err = import_rows(&repo, user(), &rows).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
