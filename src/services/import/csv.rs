//! Reading Letterboxd and Trakt CSV exports into import rows
use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{import::MAX_IMPORT_BATCH, ImportItem, ImportSource, MediaType, WatchStatus},
};

/// One CSV record keyed by header
pub type RawRow = HashMap<String, String>;

/// Letterboxd rates 0.5 to 5 stars; stored ratings are on a 0 to 10 scale
const LETTERBOXD_RATING_SCALE: f64 = 2.0;

/// Parses a CSV document with a header row
pub fn parse_csv(body: &str) -> AppResult<Vec<RawRow>> {
    let body = body.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(
            headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect(),
        );
    }

    Ok(rows)
}

fn csv_error(e: csv::Error) -> AppError {
    AppError::InvalidInput(format!("Failed to parse CSV: {}", e))
}

/// First of `keys` with a non-blank value, trimmed
fn field<'a>(row: &'a RawRow, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}

fn year(row: &RawRow, keys: &[&str]) -> Option<i32> {
    field(row, keys)
        .and_then(|y| y.parse::<i32>().ok())
        .filter(|y| *y > 0)
}

fn number(row: &RawRow, keys: &[&str]) -> Option<f64> {
    field(row, keys)
        .and_then(|n| n.parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

fn item(media_type: MediaType, title: &str) -> ImportItem {
    ImportItem {
        tmdb_id: None,
        media_type,
        title: title.to_string(),
        year: None,
        status: WatchStatus::Watchlist,
        favorite: false,
        rating: None,
        review: None,
        poster_path: None,
        release_date: None,
        genres: None,
    }
}

/// Letterboxd export row; `None` when the row has no title
pub fn normalize_letterboxd(row: &RawRow) -> Option<ImportItem> {
    let title = field(row, &["Title"])?;

    let status = if field(row, &["WatchedDate"]).is_some() {
        WatchStatus::Completed
    } else {
        WatchStatus::Watchlist
    };

    let favorite = row
        .get("Tags")
        .map(|tags| tags.to_lowercase().contains("favorite"))
        .unwrap_or(false);

    Some(ImportItem {
        year: year(row, &["Year"]),
        status,
        favorite,
        rating: number(row, &["Rating"]).map(|r| r * LETTERBOXD_RATING_SCALE),
        review: field(row, &["Review"]).map(str::to_string),
        ..item(MediaType::Movie, title)
    })
}

/// Trakt export row; `None` when the row has no title
pub fn normalize_trakt(row: &RawRow) -> Option<ImportItem> {
    let kind = row
        .get("type")
        .map(|t| t.trim().to_lowercase())
        .unwrap_or_default();
    let media_type = if kind.contains("show") || kind == "episode" || kind == "tv" {
        MediaType::Tv
    } else {
        MediaType::Movie
    };

    let title = field(row, &["title", "movie_title", "show_title"])?;

    let action = row
        .get("action")
        .map(|a| a.trim().to_lowercase())
        .unwrap_or_default();
    let status = if action == "watchlisted" || action == "watchlist" {
        WatchStatus::Watchlist
    } else {
        WatchStatus::Completed
    };

    Some(ImportItem {
        year: year(row, &["year", "movie_year", "show_year"]),
        status,
        rating: number(row, &["rating", "user_rating"]),
        review: field(row, &["review"]).map(str::to_string),
        ..item(media_type, title)
    })
}

/// Parses an export and keeps the rows that carry a title
///
/// Exports with more than [`MAX_IMPORT_BATCH`] kept rows are rejected so no
/// caller matches an unbounded number of rows against TMDb.
pub fn read_export(
    source: ImportSource,
    body: &str,
    only_watchlist: bool,
) -> AppResult<Vec<ImportItem>> {
    let normalize: fn(&RawRow) -> Option<ImportItem> = match source {
        ImportSource::Letterboxd => normalize_letterboxd,
        ImportSource::Trakt => normalize_trakt,
    };

    let rows = parse_csv(body)?;
    let total = rows.len();
    let items: Vec<ImportItem> = rows
        .iter()
        .filter_map(normalize)
        .filter(|item| !only_watchlist || item.status == WatchStatus::Watchlist)
        .collect();

    if items.len() > MAX_IMPORT_BATCH {
        tracing::warn!(source = ?source, kept = items.len(), "CSV export too large");
        return Err(AppError::InvalidInput(format!(
            "At most {} items per import",
            MAX_IMPORT_BATCH
        )));
    }

    tracing::info!(source = ?source, rows = total, kept = items.len(), "CSV export read");

    Ok(items)
}
