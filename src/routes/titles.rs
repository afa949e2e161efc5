use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    api::AppState,
    auth::CurrentUser,
    error::{AppError, AppResult},
    models::{MediaType, Review, TitleState, WatchStatus},
    services::{library, social},
};

/// `/:media_type/:tmdb_id` path segments
#[derive(Debug, Deserialize)]
pub struct TitlePath {
    media_type: String,
    tmdb_id: String,
}

impl TitlePath {
    /// Validates both segments; bad input is a 400
    pub fn parse(&self) -> AppResult<(MediaType, i64)> {
        let media_type = self
            .media_type
            .parse::<MediaType>()
            .map_err(AppError::InvalidInput)?;
        let tmdb_id = self
            .tmdb_id
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::InvalidInput(format!("Invalid id '{}'", self.tmdb_id)))?;
        Ok((media_type, tmdb_id))
    }
}

/// Handler for a title's reviews, reactions and comments
pub async fn social(
    State(state): State<Arc<AppState>>,
    Path(path): Path<TitlePath>,
) -> AppResult<Json<Vec<Review>>> {
    let (media_type, tmdb_id) = path.parse()?;
    let reviews = social::title_social(state.repo.as_ref(), media_type, tmdb_id).await?;
    Ok(Json(reviews))
}

pub async fn state(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(path): Path<TitlePath>,
) -> AppResult<Json<TitleState>> {
    let (media_type, tmdb_id) = path.parse()?;
    let title_state = library::title_state(
        state.repo.as_ref(),
        state.metadata.as_ref(),
        &user,
        media_type,
        tmdb_id,
    )
    .await?;
    Ok(Json(title_state))
}

pub async fn toggle_watchlist(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(path): Path<TitlePath>,
) -> AppResult<Json<TitleState>> {
    let (media_type, tmdb_id) = path.parse()?;
    let title_state = library::toggle_watchlist(
        state.repo.as_ref(),
        state.metadata.as_ref(),
        &user,
        media_type,
        tmdb_id,
    )
    .await?;
    Ok(Json(title_state))
}

pub async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(path): Path<TitlePath>,
) -> AppResult<Json<TitleState>> {
    let (media_type, tmdb_id) = path.parse()?;
    let title_state = library::toggle_favorite(
        state.repo.as_ref(),
        state.metadata.as_ref(),
        &user,
        media_type,
        tmdb_id,
    )
    .await?;
    Ok(Json(title_state))
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    rating: Option<i16>,
    #[serde(default)]
    review: Option<String>,
}

pub async fn review(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(path): Path<TitlePath>,
    Json(request): Json<ReviewRequest>,
) -> AppResult<Json<TitleState>> {
    let (media_type, tmdb_id) = path.parse()?;
    let title_state = library::save_review(
        state.repo.as_ref(),
        state.metadata.as_ref(),
        &user,
        media_type,
        tmdb_id,
        request.rating,
        request.review,
    )
    .await?;
    Ok(Json(title_state))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    status: Option<WatchStatus>,
}

pub async fn status(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(path): Path<TitlePath>,
    Json(request): Json<StatusRequest>,
) -> AppResult<Json<TitleState>> {
    let (media_type, tmdb_id) = path.parse()?;
    let title_state = library::set_status(
        state.repo.as_ref(),
        state.metadata.as_ref(),
        &user,
        media_type,
        tmdb_id,
        request.status,
    )
    .await?;
    Ok(Json(title_state))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(media_type: &str, tmdb_id: &str) -> TitlePath {
        TitlePath {
            media_type: media_type.to_string(),
            tmdb_id: tmdb_id.to_string(),
        }
    }

    #[test]
    fn test_title_path_parse() {
        assert_eq!(path("tv", "1396").parse().unwrap(), (MediaType::Tv, 1396));
        assert!(path("person", "1").parse().is_err());
        assert!(path("movie", "abc").parse().is_err());
        assert!(path("movie", "0").parse().is_err());
    }
}
