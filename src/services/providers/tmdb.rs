/// TMDb API provider
///
/// Authenticates with a v4 read token when one is configured and falls back to
/// a v3 `api_key` query parameter otherwise.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{MediaType, TmdbResult, TmdbResults},
    services::providers::MetadataProvider,
};
use reqwest::{Client as HttpClient, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

const TITLE_CACHE_TTL: u64 = 3600; // 1 hour
const SEARCH_CACHE_TTL: u64 = 600; // 10 minutes
const MAX_ERROR_DETAIL: usize = 500;
const LANGUAGE: &str = "en-US";

const TITLE_APPEND: &str = "credits,release_dates,watch/providers,external_ids,images,videos,recommendations,similar";
const SEARCH_DETAILS_APPEND: &str = "images,credits";

/// How requests to TMDb are authorized
#[derive(Debug, Clone, PartialEq)]
pub enum TmdbCredentials {
    /// v4 read access token, sent as a bearer header
    ReadToken(String),
    /// v3 API key, sent as the `api_key` query parameter
    ApiKey(String),
    Missing,
}

impl TmdbCredentials {
    /// Prefers the read token; blank values count as absent
    pub fn from_config(read_token: Option<String>, api_key: Option<String>) -> Self {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        match (present(read_token), present(api_key)) {
            (Some(token), _) => TmdbCredentials::ReadToken(token),
            (None, Some(key)) => TmdbCredentials::ApiKey(key),
            (None, None) => TmdbCredentials::Missing,
        }
    }
}

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_url: String,
    credentials: TmdbCredentials,
    cache: Cache,
}

impl TmdbClient {
    pub fn new(cache: Cache, api_url: String, credentials: TmdbCredentials) -> Self {
        if credentials == TmdbCredentials::Missing {
            tracing::warn!("No TMDb credentials configured; metadata routes will be empty");
        }

        Self {
            http_client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            credentials,
            cache,
        }
    }

    /// Builds an authorized GET for `path` (relative to the API root)
    fn request(&self, path: &str) -> AppResult<RequestBuilder> {
        let url = format!("{}/{}", self.api_url, path.trim_start_matches('/'));
        let builder = self.http_client.get(url).query(&[("language", LANGUAGE)]);

        match &self.credentials {
            TmdbCredentials::ReadToken(token) => Ok(builder.bearer_auth(token)),
            TmdbCredentials::ApiKey(key) => Ok(builder.query(&[("api_key", key.as_str())])),
            TmdbCredentials::Missing => Err(AppError::Internal(
                "TMDb token missing. Set TMDB_READ_TOKEN or TMDB_API_KEY.".to_string(),
            )),
        }
    }

    /// Sends the request and decodes a 2xx body; other statuses become
    /// [`AppError::Upstream`] carrying TMDb's status and a truncated body
    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> AppResult<T> {
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, provider = "tmdb", "TMDb request failed");
            return Err(AppError::Upstream {
                status: status.as_u16(),
                detail: body.chars().take(MAX_ERROR_DETAIL).collect(),
            });
        }

        Ok(response.json().await?)
    }

    async fn fetch_list(&self, path: &str, query: &[(&str, &str)]) -> AppResult<Vec<TmdbResult>> {
        let builder = self.request(path)?.query(query);
        let results: TmdbResults = self.fetch(builder).await?;

        tracing::debug!(path = %path, results = results.results.len(), "TMDb list fetched");

        Ok(results.results)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbClient {
    async fn search(&self, query: &str) -> AppResult<Vec<TmdbResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        cached!(
            self.cache,
            CacheKey::Search(query.to_string()),
            SEARCH_CACHE_TTL,
            async move {
                let results = self
                    .fetch_list(
                        "search/multi",
                        &[("query", query), ("include_adult", "false"), ("page", "1")],
                    )
                    .await?;

                tracing::info!(
                    query = %query,
                    results = results.len(),
                    provider = "tmdb",
                    "Title search completed"
                );

                Ok::<_, AppError>(results)
            }
        )
    }

    async fn trending_all_day(&self) -> AppResult<Vec<TmdbResult>> {
        self.fetch_list("trending/all/day", &[]).await
    }

    async fn trending_movies_week(&self) -> AppResult<Vec<TmdbResult>> {
        self.fetch_list("trending/movie/week", &[]).await
    }

    async fn popular_movies(&self) -> AppResult<Vec<TmdbResult>> {
        self.fetch_list("movie/popular", &[("page", "1")]).await
    }

    async fn search_details(&self, media_type: MediaType, id: i64) -> AppResult<Value> {
        cached!(
            self.cache,
            CacheKey::SearchDetails(media_type.to_string(), id),
            TITLE_CACHE_TTL,
            async move {
                let builder = self
                    .request(&format!("{}/{}", media_type, id))?
                    .query(&[("append_to_response", SEARCH_DETAILS_APPEND)]);
                self.fetch::<Value>(builder).await
            }
        )
    }

    async fn title_details(&self, media_type: MediaType, id: i64) -> AppResult<Value> {
        cached!(
            self.cache,
            CacheKey::TitleDetails(media_type.to_string(), id),
            TITLE_CACHE_TTL,
            async move {
                let builder = self
                    .request(&format!("{}/{}", media_type, id))?
                    .query(&[("append_to_response", TITLE_APPEND)]);
                let details = self.fetch::<Value>(builder).await?;

                tracing::info!(
                    media_type = %media_type,
                    tmdb_id = id,
                    provider = "tmdb",
                    "Title details fetched"
                );

                Ok::<_, AppError>(details)
            }
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
