use std::collections::HashSet;
use uuid::Uuid;

use crate::{
    db::Repository,
    models::{LibraryEntry, LibraryFilter, SimpleItem},
    services::providers::MetadataProvider,
};

/// Recent library rows considered for recommendations
const RECENT_ROWS: i64 = 100;
const MAX_RECOMMENDATIONS: usize = 20;
/// Lowest rating counted as liked
const LIKED_RATING: i16 = 4;
const MAX_TRENDING: usize = 20;

fn liked(entry: &LibraryEntry) -> bool {
    entry.favorite || entry.rating.is_some_and(|r| r >= LIKED_RATING)
}

/// Titles the user liked, newest first, one per catalog title
///
/// Anonymous callers and lookup failures get an empty list.
pub async fn get_recommendations(repo: &dyn Repository, viewer: Option<Uuid>) -> Vec<SimpleItem> {
    let Some(user_id) = viewer else {
        return Vec::new();
    };

    let rows = match repo
        .list_library(user_id, LibraryFilter::All, Some(RECENT_ROWS))
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, user_id = %user_id, "Recommendations lookup failed");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(liked)
        .filter_map(|entry| {
            let tmdb_id = entry.item.tmdb_id?;
            seen.insert((entry.item.media_type, tmdb_id))
                .then(|| SimpleItem {
                    tmdb_id,
                    media_type: entry.item.media_type,
                    title: entry.item.title,
                    poster_path: entry.item.poster_path,
                    overview: None,
                })
        })
        .take(MAX_RECOMMENDATIONS)
        .collect()
}

/// This week's trending movies in compact form; empty when TMDb is unavailable
pub async fn trending(metadata: &dyn MetadataProvider) -> Vec<SimpleItem> {
    match metadata.trending_movies_week().await {
        Ok(results) => results
            .into_iter()
            .take(MAX_TRENDING)
            .map(SimpleItem::from)
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, provider = metadata.name(), "Trending lookup failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MockRepository,
        error::AppError,
        models::{Item, MediaType, TmdbResult},
        services::providers::MockMetadataProvider,
    };
    use chrono::Utc;
    use serde_json::json;

    fn entry(tmdb_id: Option<i64>, favorite: bool, rating: Option<i16>) -> LibraryEntry {
        LibraryEntry {
            id: tmdb_id.unwrap_or(0),
            status: None,
            favorite,
            rating,
            review: None,
            updated_at: Utc::now(),
            item: Item {
                id: tmdb_id.unwrap_or(0),
                tmdb_id,
                media_type: MediaType::Movie,
                title: format!("Movie {:?}", tmdb_id),
                poster_path: None,
                release_date: None,
                genres: None,
            },
        }
    }

    #[tokio::test]
    async fn test_anonymous_gets_nothing() {
        let mut repo = MockRepository::new();
        repo.expect_list_library().never();
        assert!(get_recommendations(&repo, None).await.is_empty());
    }

    #[tokio::test]
    async fn test_favorites_and_high_ratings_kept() {
        let mut repo = MockRepository::new();
        repo.expect_list_library()
            .withf(|_, _, limit| *limit == Some(RECENT_ROWS))
            .returning(|_, _, _| {
                Ok(vec![
                    entry(Some(1), true, None),
                    entry(Some(2), false, Some(3)),
                    entry(Some(3), false, Some(4)),
                    entry(Some(1), false, Some(9)),
                    entry(None, true, None),
                ])
            });

        let recs = get_recommendations(&repo, Some(Uuid::from_u128(1))).await;
        let ids: Vec<i64> = recs.iter().map(|r| r.tmdb_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_capped_at_twenty() {
        let mut repo = MockRepository::new();
        repo.expect_list_library().returning(|_, _, _| {
            Ok((1..=40).map(|i| entry(Some(i), true, None)).collect())
        });

        let recs = get_recommendations(&repo, Some(Uuid::from_u128(1))).await;
        assert_eq!(recs.len(), MAX_RECOMMENDATIONS);
    }

    #[tokio::test]
    async fn test_failure_is_empty() {
        let mut repo = MockRepository::new();
        repo.expect_list_library()
            .returning(|_, _, _| Err(AppError::Internal("down".to_string())));

        assert!(get_recommendations(&repo, Some(Uuid::from_u128(1)))
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_trending_normalized() {
        let mut metadata = MockMetadataProvider::new();
        metadata.expect_trending_movies_week().returning(|| {
            Ok((1..=25)
                .map(|i| {
                    serde_json::from_value::<TmdbResult>(json!({
                        "id": i,
                        "title": format!("Movie {}", i),
                        "overview": "plot",
                    }))
                    .unwrap()
                })
                .collect())
        });

        let items = trending(&metadata).await;
        assert_eq!(items.len(), MAX_TRENDING);
        assert_eq!(items[0].tmdb_id, 1);
        assert_eq!(items[0].media_type, MediaType::Movie);
        assert_eq!(items[0].overview.as_deref(), Some("plot"));
    }

    #[tokio::test]
    async fn test_trending_failure_is_empty() {
        let mut metadata = MockMetadataProvider::new();
        metadata
            .expect_trending_movies_week()
            .returning(|| Err(AppError::ExternalApi("down".to_string())));
        metadata.expect_name().return_const("tmdb");

        assert!(trending(&metadata).await.is_empty());
    }
}
