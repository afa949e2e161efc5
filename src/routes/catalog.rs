use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::{
    api::AppState,
    auth::MaybeUser,
    error::{AppError, AppResult},
    models::{MediaType, SimpleItem, TmdbResults},
    services::{catalog, recommendations},
};

use super::titles::TitlePath;

pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
) -> Json<Vec<SimpleItem>> {
    Json(recommendations::get_recommendations(state.repo.as_ref(), viewer.id()).await)
}

pub async fn trending(State(state): State<Arc<AppState>>) -> Json<Vec<SimpleItem>> {
    Json(recommendations::trending(state.metadata.as_ref()).await)
}

pub async fn tmdb_trending(State(state): State<Arc<AppState>>) -> Json<TmdbResults> {
    let results = catalog::trending_today(state.metadata.as_ref()).await;
    Json(TmdbResults { results })
}

pub async fn tmdb_popular(State(state): State<Arc<AppState>>) -> Json<TmdbResults> {
    let results = catalog::popular(state.metadata.as_ref()).await;
    Json(TmdbResults { results })
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    query: String,
}

/// Handler for TMDb multi search
pub async fn tmdb_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Json<TmdbResults> {
    let results = catalog::search(state.metadata.as_ref(), &params.query).await;
    Json(TmdbResults { results })
}

#[derive(Debug, Deserialize)]
pub struct DetailsQuery {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    media_type: Option<String>,
}

impl DetailsQuery {
    fn parse(&self) -> AppResult<(MediaType, i64)> {
        let (Some(id), Some(media_type)) = (self.id.as_deref(), self.media_type.as_deref()) else {
            return Err(AppError::InvalidInput(
                "Missing id or media_type".to_string(),
            ));
        };

        let media_type = media_type
            .parse::<MediaType>()
            .map_err(AppError::InvalidInput)?;
        let id = id
            .parse::<i64>()
            .map_err(|_| AppError::InvalidInput(format!("Invalid id '{}'", id)))?;

        Ok((media_type, id))
    }
}

pub async fn tmdb_search_details(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DetailsQuery>,
) -> AppResult<Json<Value>> {
    let (media_type, id) = params.parse()?;
    let details = state.metadata.search_details(media_type, id).await?;
    Ok(Json(details))
}

/// Full title details; TMDb errors keep their status
pub async fn tmdb_title(
    State(state): State<Arc<AppState>>,
    Path(path): Path<TitlePath>,
) -> AppResult<Json<Value>> {
    let (media_type, tmdb_id) = path.parse()?;
    let details = state.metadata.title_details(media_type, tmdb_id).await?;
    Ok(Json(details))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(id: Option<&str>, media_type: Option<&str>) -> DetailsQuery {
        DetailsQuery {
            id: id.map(str::to_string),
            media_type: media_type.map(str::to_string),
        }
    }

    #[test]
    fn test_details_query_requires_both_params() {
        assert_eq!(
            query(Some("603"), Some("movie")).parse().unwrap(),
            (MediaType::Movie, 603)
        );
        let err = query(Some("603"), None).parse().unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: Missing id or media_type");
        assert!(query(None, Some("tv")).parse().is_err());
        assert!(query(Some("x"), Some("tv")).parse().is_err());
        assert!(query(Some("1"), Some("person")).parse().is_err());
    }
}
