use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    api::AppState,
    auth::CurrentUser,
    error::AppResult,
    models::{ImportRequest, ImportSource, ImportSummary},
    services::{import, profile},
};

#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    #[serde(default)]
    source: ImportSource,
    #[serde(default)]
    only_watchlist: bool,
}

/// Normalizes a CSV export and resolves each row against TMDb
///
/// Oversized exports are refused by [`import::read_export`] before any search.
pub async fn match_csv(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ImportQuery>,
    body: String,
) -> AppResult<Json<Value>> {
    let rows = import::read_export(params.source, &body, params.only_watchlist)?;
    let items = import::match_rows(state.metadata.as_ref(), rows).await;
    Ok(Json(json!({ "items": items })))
}

pub async fn import(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ImportRequest>,
) -> AppResult<Json<ImportSummary>> {
    profile::ensure_profile(state.repo.as_ref(), &user).await?;
    let summary = import::import_rows(state.repo.as_ref(), user.id, &request.items).await?;
    Ok(Json(summary))
}

/// Parse, match and import in one call
pub async fn import_csv(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ImportQuery>,
    body: String,
) -> AppResult<Json<ImportSummary>> {
    let rows = import::read_export(params.source, &body, params.only_watchlist)?;

    profile::ensure_profile(state.repo.as_ref(), &user).await?;
    let items = import::match_rows(state.metadata.as_ref(), rows).await;
    let summary = import::import_rows(state.repo.as_ref(), user.id, &items).await?;
    Ok(Json(summary))
}
