use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    api::AppState,
    auth::CurrentUser,
    error::AppResult,
    models::{LibraryEntry, LibraryFilter},
    services::library,
};

#[derive(Debug, Deserialize)]
pub struct LibraryQuery {
    #[serde(default)]
    filter: LibraryFilter,
}

/// Handler for the caller's library tabs
pub async fn library(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<LibraryQuery>,
) -> AppResult<Json<Vec<LibraryEntry>>> {
    let entries = library::library(state.repo.as_ref(), user.id, params.filter).await?;
    Ok(Json(entries))
}
