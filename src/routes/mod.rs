use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::AppState;

pub mod account;
pub mod catalog;
pub mod feed;
pub mod import;
pub mod library;
pub mod profile;
pub mod social;
pub mod titles;

/// API routes under /api
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Feed
        .route("/feed", get(feed::feed))
        .route("/feed/hide", post(feed::hide).delete(feed::unhide))
        .route("/feed/mute", post(feed::mute).delete(feed::unmute))
        // Social
        .route("/reactions", post(social::react))
        .route("/reactions/toggle", post(social::toggle_reaction))
        .route("/comments", post(social::comment))
        // Titles
        .route("/titles/:media_type/:tmdb_id/social", get(titles::social))
        .route("/titles/:media_type/:tmdb_id/state", get(titles::state))
        .route("/titles/:media_type/:tmdb_id/watchlist", put(titles::toggle_watchlist))
        .route("/titles/:media_type/:tmdb_id/favorite", put(titles::toggle_favorite))
        .route("/titles/:media_type/:tmdb_id/review", put(titles::review))
        .route("/titles/:media_type/:tmdb_id/status", put(titles::status))
        // Library & profiles
        .route("/library", get(library::library))
        .route("/profile", get(profile::own).put(profile::update))
        .route("/users/:username", get(profile::public))
        // Discovery
        .route("/recommendations", get(catalog::recommendations))
        .route("/trending", get(catalog::trending))
        .route("/tmdb/trending", get(catalog::tmdb_trending))
        .route("/tmdb/popular", get(catalog::tmdb_popular))
        .route("/tmdb/search", get(catalog::tmdb_search))
        .route("/tmdb/search/details", get(catalog::tmdb_search_details))
        .route("/tmdb/title/:media_type/:tmdb_id", get(catalog::tmdb_title))
        // Import
        .route("/import", post(import::import))
        .route("/import/match", post(import::match_csv))
        .route("/import/csv", post(import::import_csv))
        // Account
        .route("/account/delete", post(account::delete))
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Body returned by write routes that have nothing else to report
pub(crate) fn ok() -> Json<Value> {
    Json(json!({ "ok": true }))
}
