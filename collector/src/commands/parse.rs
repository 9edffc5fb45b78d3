use std::{path::PathBuf, time::Duration};

use clap::Args;
use color_eyre::eyre::Context;
use serde_json::Value;
use timeline::{
    normalize_timeline, DetailCache, DetailPolicy, FixtureDetailSource, Post, ThreadReconstructor,
};

use crate::Result;

#[derive(Debug, Args)]
pub(crate) struct Parse {
    /// A saved list timeline response.
    #[arg(long)]
    input: PathBuf,

    /// Directory of saved detail responses named `thread-<id>.json`. When
    /// given, threads are rebuilt from them.
    #[arg(long)]
    details: Option<PathBuf>,
}

impl Parse {
    pub(crate) async fn parse(&self) -> Result<()> {
        let raw = tokio::fs::read_to_string(&self.input)
            .await
            .wrap_err_with(|| format!("Couldn't read {}", self.input.display()))?;
        let response: Value = serde_json::from_str(&raw)
            .wrap_err_with(|| format!("{} is not valid JSON", self.input.display()))?;

        let posts = self.posts(&response).await;

        println!("{}", serde_json::to_string_pretty(&posts)?);

        Ok(())
    }

    async fn posts(&self, response: &Value) -> Vec<Post> {
        let posts = normalize_timeline(response);

        let Some(dir) = &self.details else {
            return posts;
        };

        // Saved files need no spacing between reads.
        let policy = DetailPolicy {
            min_spacing: Duration::ZERO,
            ..DetailPolicy::default()
        };
        let mut reconstructor =
            ThreadReconstructor::new(DetailCache::new(FixtureDetailSource::new(dir), policy));

        reconstructor.reconstruct(posts).await
    }
}
