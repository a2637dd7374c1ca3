use anyhow::Context;

/// Entries are valid for ten minutes, both the id list and individual stories.
pub(crate) const CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) port: u16,
    pub(crate) hn_api_base_url: String,
    pub(crate) fetch_timeout: std::time::Duration,
    pub(crate) retry_max_elapsed: std::time::Duration,
    pub(crate) cache_max_entries: u64,
    pub(crate) log_to_console: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 80,
            hn_api_base_url: "https://hacker-news.firebaseio.com/v0".to_string(),
            fetch_timeout: std::time::Duration::from_secs(10),
            retry_max_elapsed: std::time::Duration::from_secs(5),
            cache_max_entries: 10_000,
            log_to_console: false,
        }
    }
}

impl Config {
    /// Reads settings from the environment, falling back to defaults for anything unset.
    /// A `.env` file in the working directory is loaded first if present.
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        // Deployments usually inject real env vars, so a missing .env is fine.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
            hn_api_base_url: lookup("HN_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.hn_api_base_url),
            fetch_timeout: parse_var(&lookup, "FETCH_TIMEOUT_SECS")?
                .map(std::time::Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
            retry_max_elapsed: parse_var(&lookup, "RETRY_MAX_ELAPSED_SECS")?
                .map(std::time::Duration::from_secs)
                .unwrap_or(defaults.retry_max_elapsed),
            cache_max_entries: parse_var(&lookup, "CACHE_MAX_ENTRIES")?
                .unwrap_or(defaults.cache_max_entries),
            log_to_console: parse_var(&lookup, "LOG_TO_CONSOLE")?
                .unwrap_or(defaults.log_to_console),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{name} has an invalid value: {raw:?}"))
        })
        .transpose()
}
