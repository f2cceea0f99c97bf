/// Read-through caching for async lookups.
///
/// Returns the cached value under `$key` when present. Otherwise awaits `$block`,
/// queues the result for a background write with `$ttl` seconds to live, and returns it.
/// Errors from either the cache read or the block propagate with `?`.
///
/// `$cache` must provide `get_from_cache` and `set_in_background`.
///
/// # Example
/// ```rust,ignore
/// let movie = cached!(self.cache, CacheKey::MovieDetails(603), 3600, async move {
///     self.inner.movie_details(603).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        if let Some(hit) = $cache.get_from_cache(&key).await? {
            tracing::debug!(key = %key, "Cache hit");
            Ok(hit)
        } else {
            tracing::debug!(key = %key, "Cache miss");
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}
