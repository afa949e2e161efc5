//! TMDb lists proxied to clients
//!
//! List endpoints never fail: an unreachable or misconfigured TMDb yields an
//! empty list. Detail lookups propagate errors so clients can tell a missing
//! title from an outage.
use crate::{
    error::AppResult,
    models::TmdbResult,
    services::providers::MetadataProvider,
};

fn or_empty(
    metadata: &dyn MetadataProvider,
    list: &str,
    result: AppResult<Vec<TmdbResult>>,
) -> Vec<TmdbResult> {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, list = %list, provider = metadata.name(), "List lookup failed");
        Vec::new()
    })
}

pub async fn search(metadata: &dyn MetadataProvider, query: &str) -> Vec<TmdbResult> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    or_empty(metadata, "search", metadata.search(query).await)
}

pub async fn trending_today(metadata: &dyn MetadataProvider) -> Vec<TmdbResult> {
    or_empty(metadata, "trending", metadata.trending_all_day().await)
}

pub async fn popular(metadata: &dyn MetadataProvider) -> Vec<TmdbResult> {
    or_empty(metadata, "popular", metadata.popular_movies().await)
}
