/// Returns a cached value or computes, caches and returns it.
///
/// Cache failures never fail the caller: an unreadable entry counts as a miss
/// and the write happens in the background.
///
/// * `$cache`: a [`Cache`](crate::db::Cache)
/// * `$key`: the [`CacheKey`](crate::db::CacheKey)
/// * `$ttl`: time-to-live in seconds
/// * `$block`: future producing `AppResult<T>` on a miss
///
/// ```rust,ignore
/// let details: serde_json::Value = cached!(self.cache, key, TITLE_CACHE_TTL, async move {
///     self.fetch_details(media_type, id).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_or_miss(&$key).await {
            Ok(cached)
        } else {
            match $block.await {
                Ok(value) => {
                    $cache.set_in_background(&$key, &value, $ttl);
                    Ok(value)
                }
                Err(e) => Err(e),
            }
        }
    }};
}
