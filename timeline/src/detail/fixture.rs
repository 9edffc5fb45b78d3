use std::path::PathBuf;

use serde_json::Value;
use tracing::instrument;

use super::{parse_detail_body, DetailError, DetailSource};
use crate::post::Post;

/// Serves detail lookups from saved responses named `thread-<id>.json`.
#[derive(Debug, Clone)]
pub struct FixtureDetailSource {
    dir: PathBuf,
}

impl FixtureDetailSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, post_id: &str) -> PathBuf {
        self.dir.join(format!("thread-{post_id}.json"))
    }
}

#[async_trait::async_trait]
impl DetailSource for FixtureDetailSource {
    #[instrument(name = "FixtureDetailSource::fetch_detail", skip(self))]
    async fn fetch_detail(&self, post_id: &str) -> Result<Vec<Post>, DetailError> {
        let raw = tokio::fs::read(self.path_for(post_id)).await?;
        let body: Value = serde_json::from_slice(&raw)?;

        parse_detail_body(&body)
    }
}
