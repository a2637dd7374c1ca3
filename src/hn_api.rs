pub(crate) type StoryId = i64;

/// An item as returned by `/item/{id}.json`. Fields the API omits fall back to empty values.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub(crate) struct Story {
    pub(crate) id: StoryId,
    pub(crate) title: Option<String>,
    pub(crate) url: Option<String>,
    pub(crate) by: Option<String>,

    #[serde(default)]
    pub(crate) time: i64,
    #[serde(default)]
    pub(crate) score: i64,
    #[serde(default)]
    pub(crate) descendants: i64,

    #[serde(rename = "type")]
    pub(crate) story_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum HnApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("empty response body from {url}")]
    EmptyResponse { url: String },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HnApiError {
    /// Connection failures, timeouts and 5xx answers are worth another try.
    fn is_transient(&self) -> bool {
        match self {
            HnApiError::Transport { source, .. } => {
                source.is_timeout()
                    || source.is_connect()
                    || source.status().is_some_and(|s| s.is_server_error())
            }
            HnApiError::EmptyResponse { .. } | HnApiError::Decode { .. } => false,
        }
    }
}

#[async_trait::async_trait]
pub(crate) trait HnApi: Send + Sync {
    async fn best_story_ids(&self) -> Result<Vec<StoryId>, HnApiError>;

    async fn story(&self, id: StoryId) -> Result<Story, HnApiError>;
}

/// Talks to the real Hacker News firebase API.
pub(crate) struct HttpHnApi {
    client: reqwest::Client,
    base_url: String,
    retry_max_elapsed: std::time::Duration,
}

impl HttpHnApi {
    pub(crate) fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        retry_max_elapsed: std::time::Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            retry_max_elapsed,
        }
    }

    pub(crate) fn from_config(config: &crate::config::Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::new(
            client,
            config.hn_api_base_url.clone(),
            config.retry_max_elapsed,
        ))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, HnApiError> {
        let client = &self.client;

        let body = backoff::future::retry(
            crate::backoff::upstream_backoff(self.retry_max_elapsed),
            move || async move {
                get_body(client, url).await.map_err(|e| {
                    if e.is_transient() {
                        tracing::warn!(error = %e, "Transient upstream error, retrying");
                        backoff::Error::transient(e)
                    } else {
                        backoff::Error::permanent(e)
                    }
                })
            },
        )
        .await?;

        if body.trim().is_empty() {
            return Err(HnApiError::EmptyResponse {
                url: url.to_string(),
            });
        }

        serde_json::from_str(&body).map_err(|source| HnApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

async fn get_body(client: &reqwest::Client, url: &str) -> Result<String, HnApiError> {
    let transport = |source: reqwest::Error| HnApiError::Transport {
        url: url.to_string(),
        source,
    };

    client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(transport)?
        .text()
        .await
        .map_err(transport)
}

#[async_trait::async_trait]
impl HnApi for HttpHnApi {
    async fn best_story_ids(&self) -> Result<Vec<StoryId>, HnApiError> {
        self.get_json(&format!("{}/beststories.json", self.base_url))
            .await
    }

    async fn story(&self, id: StoryId) -> Result<Story, HnApiError> {
        self.get_json(&format!("{}/item/{}.json", self.base_url, id))
            .await
    }
}
