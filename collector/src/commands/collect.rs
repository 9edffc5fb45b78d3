use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::Context;
use timeline::{
    normalize_timeline, DetailCache, DetailPolicy, FeedClient, FeedConfig, ThreadReconstructor,
};
use tracing::{info, instrument, warn};

use crate::{storage::Storage, Result};

#[derive(Debug, Default, Args)]
pub(crate) struct Collect {
    /// How many posts to request. Defaults to `TWITTER_POST_COUNT`.
    #[arg(long)]
    count: Option<u32>,

    /// Save the posts without looking up their threads.
    #[arg(long)]
    no_threads: bool,
}

impl Collect {
    pub(crate) async fn collect(&self, storage: &Storage) -> Result<()> {
        let config = FeedConfig::from_env()?;
        let policy = DetailPolicy::from_env()?;
        let count = self.count.unwrap_or(config.post_count);

        let client = FeedClient::new(config)?;
        let policy = (!self.no_threads).then_some(policy);

        collect_posts(client, policy, count, storage).await?;

        Ok(())
    }
}

/// Fetches, normalizes and stores one snapshot of the list. Threads are
/// rebuilt when a detail policy is given. Returns where the posts were
/// written, or `None` when the list came back empty.
#[instrument(name = "collect_posts", skip(client, storage))]
pub(crate) async fn collect_posts(
    client: FeedClient,
    policy: Option<DetailPolicy>,
    count: u32,
    storage: &Storage,
) -> Result<Option<PathBuf>> {
    info!("Collecting list timeline");

    let payload = client
        .fetch_list_timeline(count)
        .await
        .wrap_err("Failed to fetch the list timeline")?;

    let posts = normalize_timeline(&payload);
    if posts.is_empty() {
        warn!("No posts found, nothing saved");
        return Ok(None);
    }
    info!(count = posts.len(), "Normalized posts");

    let posts = match policy {
        Some(policy) => {
            let mut reconstructor = ThreadReconstructor::new(DetailCache::new(client, policy));
            reconstructor.reconstruct(posts).await
        }
        None => posts,
    };

    let path = storage.save_posts(&posts)?;
    info!(count = posts.len(), path = %path.display(), "Saved posts");

    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{json, Value};
    use url::Url;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    fn raw_post(id: &str, author_id: &str, text: &str) -> Value {
        json!({
            "rest_id": id,
            "core": { "user_results": { "result": {
                "rest_id": author_id,
                "legacy": { "name": "Someone", "screen_name": "someone" }
            }}},
            "legacy": {
                "conversation_id_str": id,
                "full_text": text,
                "created_at": "Tue Mar 11 08:15:55 +0000 2025"
            }
        })
    }

    fn list_body(results: Vec<Value>) -> Value {
        let entries: Vec<Value> = results
            .into_iter()
            .map(|result| {
                json!({ "content": {
                    "__typename": "TimelineTimelineItem",
                    "itemContent": {
                        "__typename": "TimelineTweet",
                        "tweet_results": { "result": result }
                    }
                }})
            })
            .collect();

        json!({
            "code": 200,
            "data": { "list": { "tweets_timeline": { "timeline": {
                "instructions": [{ "type": "TimelineAddEntries", "entries": entries }]
            }}}}
        })
    }

    fn client_for(server: &MockServer) -> FeedClient {
        let mut config = FeedConfig::new("test-key", "123").unwrap();
        config.list_url = Url::parse(&format!("{}/list", server.uri())).unwrap();
        config.detail_url = Url::parse(&format!("{}/detail", server.uri())).unwrap();

        FeedClient::new(config).unwrap()
    }

    fn fast_policy() -> DetailPolicy {
        DetailPolicy {
            min_spacing: Duration::ZERO,
            ..DetailPolicy::default()
        }
    }

    #[tokio::test]
    async fn test_collect_saves_posts_with_threads() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(list_body(vec![raw_post("100", "u1", "first")])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/detail"))
            .and(query_param("tweet_id", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tweets": [
                { "tweet_id": "100", "user_id": "u1", "text": "first" },
                { "tweet_id": "101", "user_id": "u1", "text": "second",
                  "created_at": "Tue Mar 11 08:16:55 +0000 2025" }
            ]})))
            .expect(1)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();

        let saved = collect_posts(client_for(&server), Some(fast_policy()), 5, &storage)
            .await
            .unwrap();

        assert!(saved.is_some());
        let posts = storage.todays_posts().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(
            posts[0].thread.as_ref().unwrap().full_text,
            "first\n\nsecond"
        );
    }

    #[tokio::test]
    async fn test_empty_list_saves_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_body(vec![])))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();

        let saved = collect_posts(client_for(&server), None, 5, &storage)
            .await
            .unwrap();

        assert_eq!(saved, None);
        let saved_files = std::fs::read_dir(dir.path().join("tweets")).unwrap();
        assert_eq!(saved_files.count(), 0);
    }

    #[tokio::test]
    async fn test_list_failure_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();

        assert!(collect_posts(client_for(&server), None, 5, &storage)
            .await
            .is_err());
    }
}
