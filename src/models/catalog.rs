use serde::{Deserialize, Serialize};

use super::{MediaType, TmdbResult};

/// Locally cached catalog title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Item {
    pub id: i64,
    pub tmdb_id: Option<i64>,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub genres: Option<Vec<i32>>,
}

/// Fields needed to cache a title that is not stored yet
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewItem {
    pub tmdb_id: Option<i64>,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub genres: Option<Vec<i32>>,
}

impl NewItem {
    /// Builds an item record from a TMDb title details document
    pub fn from_details(media_type: MediaType, tmdb_id: i64, details: &serde_json::Value) -> Self {
        let text = |key: &str| {
            details
                .get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let genres = details.get("genres").and_then(|g| g.as_array()).map(|list| {
            list.iter()
                .filter_map(|g| g.get("id").and_then(|id| id.as_i64()))
                .map(|id| id as i32)
                .collect()
        });

        Self {
            tmdb_id: Some(tmdb_id),
            media_type,
            title: text("title")
                .or_else(|| text("name"))
                .unwrap_or_else(|| "Untitled".to_string()),
            poster_path: text("poster_path"),
            release_date: text("release_date").or_else(|| text("first_air_date")),
            genres,
        }
    }
}

/// Compact title shape returned by the trending and recommendation routes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimpleItem {
    pub tmdb_id: i64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
}

impl From<TmdbResult> for SimpleItem {
    fn from(result: TmdbResult) -> Self {
        let media_type = match result.media_type.as_deref() {
            Some("tv") => MediaType::Tv,
            _ => MediaType::Movie,
        };

        Self {
            tmdb_id: result.id,
            media_type,
            title: result.display_title().to_string(),
            poster_path: result.poster_path,
            overview: result.overview,
        }
    }
}
