use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

pub mod catalog;
pub mod import;
pub mod library;
pub mod profile;
pub mod social;

pub use catalog::{Item, NewItem, SimpleItem};
pub use import::{ImportItem, ImportOutcome, ImportRequest, ImportSource, ImportSummary};
pub use library::{LibraryEntry, LibraryFilter, TitleState, UserItem, UserItemPatch};
pub use profile::{NewProfile, Profile, ProfileSummary, ProfileUpdate, PublicProfile};
pub use social::{
    Comment, CommentCount, FeedEntry, FeedPage, ReactionCount, ReactionCounts, Review,
};

/// Kind of catalog title, as TMDb names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "media_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            other => Err(format!(
                "Invalid type '{}' (must be \"movie\" or \"tv\")",
                other
            )),
        }
    }
}

/// Where a title sits in a user's library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "watch_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WatchStatus {
    Watchlist,
    Completed,
}

// ============================================================================
// TMDb API Types
// ============================================================================

/// One entry of a TMDb list response (search/multi, trending, popular)
///
/// Only the fields the service reasons about are typed; everything else is
/// kept in `extra` so proxied responses stay byte-for-byte useful to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbResult {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_air_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre_ids: Option<Vec<i32>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TmdbResult {
    /// Display title; movies carry `title`, shows carry `name`
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("Untitled")
    }

    /// Release or first-air date, whichever the entry has
    pub fn date(&self) -> Option<&str> {
        [self.release_date.as_deref(), self.first_air_date.as_deref()]
            .into_iter()
            .flatten()
            .find(|d| !d.is_empty())
    }

    /// Four-digit year of [`TmdbResult::date`]
    pub fn year(&self) -> Option<i32> {
        self.date()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok())
    }
}

/// Envelope of every TMDb list endpoint
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TmdbResults {
    #[serde(default)]
    pub results: Vec<TmdbResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_from_str() {
        assert_eq!("movie".parse::<MediaType>(), Ok(MediaType::Movie));
        assert_eq!("tv".parse::<MediaType>(), Ok(MediaType::Tv));
        assert!("person".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_watch_status_serde() {
        let json = serde_json::to_string(&WatchStatus::Completed).unwrap();
        assert_eq!(json, r#""completed""#);
    }

    #[test]
    fn test_tmdb_result_keeps_unknown_fields() {
        let json = r#"{
            "id": 27205,
            "media_type": "movie",
            "title": "Inception",
            "poster_path": "/poster.jpg",
            "release_date": "2010-07-15",
            "genre_ids": [28, 878],
            "vote_average": 8.4
        }"#;

        let result: TmdbResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.id, 27205);
        assert_eq!(result.display_title(), "Inception");
        assert_eq!(result.year(), Some(2010));
        assert_eq!(result.extra.get("vote_average"), Some(&serde_json::json!(8.4)));

        let back = serde_json::to_value(&result).unwrap();
        assert_eq!(back["vote_average"], 8.4);
    }

    #[test]
    fn test_tmdb_result_tv_uses_name_and_first_air_date() {
        let json = r#"{
            "id": 1396,
            "media_type": "tv",
            "name": "Breaking Bad",
            "first_air_date": "2008-01-20"
        }"#;

        let result: TmdbResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.display_title(), "Breaking Bad");
        assert_eq!(result.year(), Some(2008));
        assert_eq!(result.poster_path, None);
    }

    #[test]
    fn test_tmdb_result_empty_date_has_no_year() {
        let json = r#"{ "id": 1, "title": "Unreleased", "release_date": "" }"#;
        let result: TmdbResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.year(), None);
    }
}
