use serde::{Deserialize, Serialize};

use super::{MediaType, NewItem, WatchStatus};

/// Rows accepted by one import request
pub const MAX_IMPORT_BATCH: usize = 500;

/// Which service exported the CSV
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportSource {
    #[default]
    Letterboxd,
    Trakt,
}

/// One title to import, either normalized from CSV or posted directly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportItem {
    #[serde(default)]
    pub tmdb_id: Option<i64>,
    pub media_type: MediaType,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default = "default_status")]
    pub status: WatchStatus,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genres: Option<Vec<i32>>,
}

fn default_status() -> WatchStatus {
    WatchStatus::Watchlist
}

impl ImportItem {
    /// Minimal item row for a title that is not cached yet
    pub fn new_item(&self) -> NewItem {
        NewItem {
            tmdb_id: self.tmdb_id,
            media_type: self.media_type,
            title: self.title.clone(),
            poster_path: self.poster_path.clone(),
            release_date: self.release_date.clone(),
            genres: self.genres.clone(),
        }
    }
}

/// Body of `POST /api/import`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportRequest {
    pub items: Vec<ImportItem>,
}

/// Result of importing one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub ok: bool,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Result of importing a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub ok: usize,
    pub failed: usize,
    pub results: Vec<ImportOutcome>,
}

impl ImportSummary {
    pub fn from_outcomes(results: Vec<ImportOutcome>) -> Self {
        let ok = results.iter().filter(|r| r.ok).count();
        Self {
            ok,
            failed: results.len() - ok,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_item_defaults() {
        let item: ImportItem =
            serde_json::from_str(r#"{ "media_type": "movie", "title": "Heat" }"#).unwrap();
        assert_eq!(item.status, WatchStatus::Watchlist);
        assert!(!item.favorite);
        assert_eq!(item.rating, None);
        assert_eq!(item.tmdb_id, None);
    }

    #[test]
    fn test_import_item_rejects_unknown_media_type() {
        let result = serde_json::from_str::<ImportItem>(r#"{ "media_type": "book", "title": "Dune" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_summary_counts() {
        let summary = ImportSummary::from_outcomes(vec![
            ImportOutcome {
                ok: true,
                title: "A".to_string(),
                reason: None,
            },
            ImportOutcome {
                ok: false,
                title: "B".to_string(),
                reason: Some("boom".to_string()),
            },
        ]);
        assert_eq!(summary.ok, 1);
        assert_eq!(summary.failed, 1);
    }
}
