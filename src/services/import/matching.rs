//! Matching imported rows to TMDb titles
use crate::{
    models::{ImportItem, TmdbResult},
    services::providers::MetadataProvider,
};

/// Year delta assigned to results without a usable date
const UNKNOWN_YEAR_DELTA: i32 = 9999;

/// Search text for a row: its title, followed by the year when known
pub fn search_query(item: &ImportItem) -> String {
    match item.year {
        Some(year) => format!("{} {}", item.title, year),
        None => item.title.clone(),
    }
}

/// Picks the result a row refers to
///
/// Candidates are the results of the row's media type, or every result when
/// none has that type. Without a year the first candidate wins; with a year,
/// the candidate released closest to it, earliest in the list on ties.
pub fn best_match<'a>(item: &ImportItem, results: &'a [TmdbResult]) -> Option<&'a TmdbResult> {
    let wanted = item.media_type.as_str();
    let typed: Vec<&TmdbResult> = results
        .iter()
        .filter(|r| r.media_type.as_deref() == Some(wanted))
        .collect();

    let candidates: Vec<&TmdbResult> = if typed.is_empty() {
        results.iter().collect()
    } else {
        typed
    };

    let Some(year) = item.year else {
        return candidates.first().copied();
    };

    // min_by_key keeps the first of equal keys
    candidates.into_iter().min_by_key(|r| {
        r.year()
            .map(|y| (y - year).abs())
            .unwrap_or(UNKNOWN_YEAR_DELTA)
    })
}

/// Copies catalog fields from the matched result onto the row
pub fn apply_match(item: &mut ImportItem, result: &TmdbResult) {
    item.tmdb_id = Some(result.id);
    item.poster_path = result.poster_path.clone();
    item.release_date = result.date().map(str::to_string);
    item.genres = result.genre_ids.clone();
}

/// Resolves a single row against TMDb search
///
/// Rows that already carry a TMDb id are returned untouched. Search failures
/// leave the row unmatched.
pub async fn match_item(metadata: &dyn MetadataProvider, mut item: ImportItem) -> ImportItem {
    if item.tmdb_id.is_some() {
        return item;
    }

    let query = search_query(&item);
    let results = match metadata.search(&query).await {
        Ok(results) => results,
        Err(e) => {
            tracing::warn!(error = %e, query = %query, "Import match search failed");
            return item;
        }
    };

    if let Some(result) = best_match(&item, &results) {
        tracing::debug!(
            title = %item.title,
            tmdb_id = result.id,
            media_type = item.media_type.as_str(),
            "Import row matched"
        );
        apply_match(&mut item, result);
    }

    item
}

/// Matches every row, one search at a time to stay inside TMDb rate limits
pub async fn match_rows(metadata: &dyn MetadataProvider, items: Vec<ImportItem>) -> Vec<ImportItem> {
    let total = items.len();
    let mut matched = Vec::with_capacity(total);

    for item in items {
        matched.push(match_item(metadata, item).await);
    }

    let resolved = matched.iter().filter(|i| i.tmdb_id.is_some()).count();
    tracing::info!(rows = total, matched = resolved, "Import rows matched");

    matched
}
