use crate::hn_api::{HnApi, Story, StoryId};

const BEST_STORIES_KEY: &str = "beststories";

fn story_key(id: StoryId) -> String {
    format!("item/{id}")
}

#[derive(Debug, Clone)]
pub(crate) enum CachedValue {
    StoryIds(std::sync::Arc<[StoryId]>),
    Story(Story),
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum BestStoriesError {
    #[error("could not fetch the best stories id list")]
    UpstreamUnavailable(#[source] crate::hn_api::HnApiError),
}

/// A story as presented to API clients.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BestStory {
    pub(crate) title: Option<String>,
    pub(crate) uri: Option<String>,
    pub(crate) posted_by: Option<String>,
    pub(crate) time: String,
    pub(crate) score: i64,
    pub(crate) comment_count: i64,
}

impl From<Story> for BestStory {
    fn from(story: Story) -> Self {
        let time = match chrono::DateTime::from_timestamp(story.time, 0) {
            Some(time) => time,
            None => {
                tracing::warn!(
                    id = story.id,
                    time = story.time,
                    "Story timestamp out of range, using the Unix epoch"
                );
                chrono::DateTime::<chrono::Utc>::UNIX_EPOCH
            }
        }
        .to_rfc3339();

        Self {
            title: story.title,
            uri: story.url,
            posted_by: story.by,
            time,
            score: story.score,
            comment_count: story.descendants,
        }
    }
}

/// Fetches, caches and ranks the best stories. Cheap to clone; clones share the
/// upstream client and the cache.
#[derive(Clone)]
pub(crate) struct BestStories {
    api: std::sync::Arc<dyn HnApi>,
    cache: crate::cache::TtlCache<CachedValue>,
    ttl: std::time::Duration,
}

impl BestStories {
    pub(crate) fn new(
        api: std::sync::Arc<dyn HnApi>,
        cache: crate::cache::TtlCache<CachedValue>,
        ttl: std::time::Duration,
    ) -> Self {
        Self { api, cache, ttl }
    }

    /// Returns up to `n` of the current best stories, highest score first.
    ///
    /// Only a failure to get the id list fails the call. Stories that cannot be
    /// fetched are logged and left out.
    pub(crate) async fn get_best_stories(
        &self,
        n: usize,
    ) -> Result<Vec<BestStory>, BestStoriesError> {
        let ids = self
            .best_story_ids()
            .await
            .map_err(BestStoriesError::UpstreamUnavailable)?;

        let selected: Vec<StoryId> = ids.iter().take(n).copied().collect();
        let mut stories = self.fetch_stories(&selected).await;

        // Stable, so equal scores keep the upstream order.
        stories.sort_by(|a, b| b.score.cmp(&a.score));

        tracing::info!(
            requested = n,
            available = ids.len(),
            fetched = stories.len(),
            // Moka counts lazily, writes from this request may be missing.
            approx_cached_entries = self.cache.entry_count(),
            "Ranked best stories"
        );

        Ok(stories.into_iter().map(BestStory::from).collect())
    }

    async fn best_story_ids(&self) -> Result<std::sync::Arc<[StoryId]>, crate::hn_api::HnApiError> {
        if let Some(CachedValue::StoryIds(ids)) = self.cache.get(BEST_STORIES_KEY).await {
            return Ok(ids);
        }

        let ids: std::sync::Arc<[StoryId]> = self.api.best_story_ids().await?.into();
        tracing::info!(num_ids = ids.len(), "Fetched best story ids");

        self.cache
            .set(BEST_STORIES_KEY, CachedValue::StoryIds(ids.clone()), self.ttl)
            .await;

        Ok(ids)
    }

    async fn story(&self, id: StoryId) -> Result<Story, crate::hn_api::HnApiError> {
        let key = story_key(id);
        if let Some(CachedValue::Story(story)) = self.cache.get(&key).await {
            return Ok(story);
        }

        let story = self.api.story(id).await?;
        self.cache
            .set(key, CachedValue::Story(story.clone()), self.ttl)
            .await;

        Ok(story)
    }

    /// Fetches every id concurrently and waits for all of them. The result keeps
    /// the order of `ids`, with failed fetches dropped.
    async fn fetch_stories(&self, ids: &[StoryId]) -> Vec<Story> {
        let mut slots: Vec<Option<Story>> = vec![None; ids.len()];

        let mut queries_set: tokio::task::JoinSet<(usize, StoryId, _)> =
            tokio::task::JoinSet::new();

        for (slot, &id) in ids.iter().enumerate() {
            let this = self.clone();
            queries_set.spawn(async move { (slot, id, this.story(id).await) });
        }

        while let Some(res) = queries_set.join_next().await {
            match res {
                Ok((slot, _, Ok(story))) => slots[slot] = Some(story),
                Ok((_, id, Err(e))) => tracing::error!(id, error = %e, "Error getting story"),
                Err(e) => tracing::error!(error =? e, "Story fetch task failed"),
            }
        }

        slots.into_iter().flatten().collect()
    }
}
