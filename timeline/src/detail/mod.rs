//! Rate-limited, time-boxed lookups of a post's surrounding conversation.

use std::{collections::HashMap, time::Duration};

use color_eyre::eyre::Context;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::post::Post;

pub mod fixture;
pub mod record;

pub use self::{fixture::FixtureDetailSource, record::parse_detail_body};

#[derive(Debug, thiserror::Error)]
pub enum DetailError {
    #[error("ReqwestError: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Detail endpoint returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Malformed detail response: {0}")]
    Malformed(String),
    #[error("SerdeJsonError: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything that can fetch the conversation around one post.
#[async_trait::async_trait]
pub trait DetailSource: Send + Sync {
    async fn fetch_detail(&self, post_id: &str) -> Result<Vec<Post>, DetailError>;
}

pub const DEFAULT_FRESHNESS: Duration = Duration::from_mins(30);
pub const DEFAULT_MIN_SPACING: Duration = Duration::from_millis(1700);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailPolicy {
    /// How long a fetched conversation is served from the cache.
    pub freshness: Duration,
    /// Minimum gap between two outbound detail requests.
    pub min_spacing: Duration,
}

impl Default for DetailPolicy {
    fn default() -> Self {
        Self {
            freshness: DEFAULT_FRESHNESS,
            min_spacing: DEFAULT_MIN_SPACING,
        }
    }
}

impl DetailPolicy {
    #[instrument(name = "DetailPolicy::from_env")]
    pub fn from_env() -> color_eyre::Result<Self> {
        let mut policy = Self::default();

        if let Ok(secs) = std::env::var("DETAIL_CACHE_FRESHNESS_SECS") {
            let secs: u64 = secs
                .parse()
                .wrap_err("DETAIL_CACHE_FRESHNESS_SECS must be a whole number of seconds")?;
            policy.freshness = Duration::from_secs(secs);
        }

        if let Ok(millis) = std::env::var("DETAIL_MIN_SPACING_MS") {
            let millis: u64 = millis
                .parse()
                .wrap_err("DETAIL_MIN_SPACING_MS must be a whole number of milliseconds")?;
            policy.min_spacing = Duration::from_millis(millis);
        }

        Ok(policy)
    }
}

#[derive(Debug)]
struct CachedDetail {
    posts: Vec<Post>,
    fetched_at: Instant,
}

/// Wraps a [`DetailSource`] with a per-id cache and a minimum spacing
/// between outbound requests.
///
/// The limiter state lives in this value, so one cache is one limiter.
/// Lookups take `&mut self`: passes that need to run concurrently each
/// need their own cache.
pub struct DetailCache<S> {
    source: S,
    policy: DetailPolicy,
    entries: HashMap<String, CachedDetail>,
    last_call: Option<Instant>,
}

impl<S: DetailSource> DetailCache<S> {
    pub fn new(source: S, policy: DetailPolicy) -> Self {
        Self {
            source,
            policy,
            entries: HashMap::new(),
            last_call: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the conversation around `post_id`, or `None` when it is not
    /// available. Failures are logged here and never cached.
    #[instrument(name = "detail_cache.lookup", skip(self), fields(post.id = post_id))]
    pub async fn lookup(&mut self, post_id: &str) -> Option<Vec<Post>> {
        if let Some(cached) = self.entries.get(post_id) {
            if cached.fetched_at.elapsed() < self.policy.freshness {
                debug!("Using cached conversation");
                return Some(cached.posts.clone());
            }
        }

        self.wait_for_slot().await;

        let fetched = self.source.fetch_detail(post_id).await;
        let now = Instant::now();
        self.last_call = Some(now);

        match fetched {
            Ok(posts) => {
                debug!(count = posts.len(), "Fetched conversation");
                self.entries.insert(
                    post_id.to_string(),
                    CachedDetail {
                        posts: posts.clone(),
                        fetched_at: now,
                    },
                );
                Some(posts)
            }
            Err(e) => {
                warn!(error = %e, "Conversation not available");
                None
            }
        }
    }

    async fn wait_for_slot(&self) {
        let Some(last_call) = self.last_call else {
            return;
        };

        let wait = self.policy.min_spacing.saturating_sub(last_call.elapsed());
        if !wait.is_zero() {
            debug!(?wait, "Rate limiting detail request");
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::post::Author;

    /// Serves canned conversations and records when each request was made.
    #[derive(Default)]
    pub(crate) struct CannedSource {
        conversations: HashMap<String, Vec<Post>>,
        pub(crate) calls: Mutex<Vec<(String, Instant)>>,
    }

    impl CannedSource {
        pub(crate) fn with(mut self, post_id: &str, posts: Vec<Post>) -> Self {
            self.conversations.insert(post_id.to_string(), posts);
            self
        }

        pub(crate) fn call_ids(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(id, _)| id.clone())
                .collect()
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(_, at)| *at)
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl DetailSource for CannedSource {
        async fn fetch_detail(&self, post_id: &str) -> Result<Vec<Post>, DetailError> {
            self.calls
                .lock()
                .unwrap()
                .push((post_id.to_string(), Instant::now()));

            self.conversations
                .get(post_id)
                .cloned()
                .ok_or_else(|| DetailError::Malformed(format!("no conversation for {post_id}")))
        }
    }

    fn conversation(root: &str) -> Vec<Post> {
        vec![Post::new(root, Author::with_id("u1"))]
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_id_within_window_is_one_call() {
        let source = CannedSource::default().with("1", conversation("1"));
        let mut cache = DetailCache::new(source, DetailPolicy::default());

        let first = cache.lookup("1").await;
        let second = cache.lookup("1").await;

        assert_eq!(first, second);
        assert!(first.is_some());
        assert_eq!(cache.source().call_ids(), vec!["1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_is_refetched() {
        let source = CannedSource::default().with("1", conversation("1"));
        let mut cache = DetailCache::new(source, DetailPolicy::default());

        cache.lookup("1").await;
        tokio::time::advance(DEFAULT_FRESHNESS + Duration::from_secs(1)).await;
        cache.lookup("1").await;

        assert_eq!(cache.source().call_ids(), vec!["1", "1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_ids_are_spaced() {
        let source = CannedSource::default()
            .with("1", conversation("1"))
            .with("2", conversation("2"))
            .with("3", conversation("3"));
        let mut cache = DetailCache::new(source, DetailPolicy::default());

        cache.lookup("1").await;
        cache.lookup("2").await;
        cache.lookup("3").await;

        let times = cache.source().call_times();
        assert_eq!(times.len(), 3);
        for pair in times.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= DEFAULT_MIN_SPACING);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_spacing_already_elapsed() {
        let source = CannedSource::default()
            .with("1", conversation("1"))
            .with("2", conversation("2"));
        let mut cache = DetailCache::new(source, DetailPolicy::default());

        cache.lookup("1").await;
        tokio::time::advance(Duration::from_secs(5)).await;
        let before = Instant::now();
        cache.lookup("2").await;

        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_not_available_and_not_cached() {
        let source = CannedSource::default();
        let mut cache = DetailCache::new(source, DetailPolicy::default());

        assert_eq!(cache.lookup("404").await, None);
        assert_eq!(cache.lookup("404").await, None);

        assert_eq!(cache.source().call_ids(), vec!["404", "404"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_call_still_counts_for_spacing() {
        let source = CannedSource::default().with("2", conversation("2"));
        let mut cache = DetailCache::new(source, DetailPolicy::default());

        cache.lookup("missing").await;
        cache.lookup("2").await;

        let times = cache.source().call_times();
        assert!(times[1].duration_since(times[0]) >= DEFAULT_MIN_SPACING);
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_caches_do_not_share_limiter() {
        let policy = DetailPolicy::default();
        let mut a = DetailCache::new(CannedSource::default().with("1", conversation("1")), policy);
        let mut b = DetailCache::new(CannedSource::default().with("2", conversation("2")), policy);

        let start = Instant::now();
        a.lookup("1").await;
        b.lookup("2").await;

        assert_eq!(Instant::now(), start);
    }

    #[test]
    fn test_default_policy() {
        let policy = DetailPolicy::default();

        assert_eq!(policy.freshness, Duration::from_secs(1800));
        assert_eq!(policy.min_spacing, Duration::from_millis(1700));
    }
}
