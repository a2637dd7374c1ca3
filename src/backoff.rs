const INITIAL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(100);
const MAX_INTERVAL_BETWEEN_TRIES: std::time::Duration = std::time::Duration::from_secs(1);

/// Backoff for transient upstream failures. A zero budget disables retrying.
pub(crate) fn upstream_backoff(max_elapsed: std::time::Duration) -> backoff::ExponentialBackoff {
    backoff::ExponentialBackoffBuilder::new()
        .with_initial_interval(INITIAL_INTERVAL)
        .with_max_interval(MAX_INTERVAL_BETWEEN_TRIES)
        .with_max_elapsed_time(Some(max_elapsed))
        .build()
}
