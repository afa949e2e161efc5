/// Title metadata provider abstraction
///
/// Everything the service knows about titles beyond what users stored locally
/// (posters, cast, trending lists, watch providers) comes from a provider
/// behind this trait. TMDb is the only implementation; tests swap in mocks.
use serde_json::Value;

use crate::{
    error::AppResult,
    models::{MediaType, TmdbResult},
};

pub mod tmdb;

pub use tmdb::{TmdbClient, TmdbCredentials};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Multi search across movies, shows and people
    async fn search(&self, query: &str) -> AppResult<Vec<TmdbResult>>;

    /// Trending titles of any kind over the last day
    async fn trending_all_day(&self) -> AppResult<Vec<TmdbResult>>;

    /// Trending movies over the last week
    async fn trending_movies_week(&self) -> AppResult<Vec<TmdbResult>>;

    async fn popular_movies(&self) -> AppResult<Vec<TmdbResult>>;

    /// Details with images and credits, as used by search previews
    async fn search_details(&self, media_type: MediaType, id: i64) -> AppResult<Value>;

    /// Full title document: credits, release dates, watch providers, external
    /// ids, images, videos, recommendations and similar titles
    async fn title_details(&self, media_type: MediaType, id: i64) -> AppResult<Value>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
