use color_eyre::eyre::Context;
use url::Url;

pub const DEFAULT_LIST_URL: &str = "https://api.apidance.pro/graphql/ListLatestTweetsTimeline";
pub const DEFAULT_DETAIL_URL: &str = "https://api.apidance.pro/sapi/TweetDetail";
pub const DEFAULT_POST_COUNT: u32 = 20;

/// Where the list timeline and detail lookups come from.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub api_key: String,
    pub list_id: String,
    pub list_url: Url,
    pub detail_url: Url,
    pub post_count: u32,
}

impl FeedConfig {
    /// A config against the default endpoints.
    pub fn new(api_key: impl Into<String>, list_id: impl Into<String>) -> color_eyre::Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            list_id: list_id.into(),
            list_url: Url::parse(DEFAULT_LIST_URL).context("Invalid default list URL")?,
            detail_url: Url::parse(DEFAULT_DETAIL_URL).context("Invalid default detail URL")?,
            post_count: DEFAULT_POST_COUNT,
        })
    }

    pub fn from_env() -> color_eyre::Result<Self> {
        let list_url =
            std::env::var("TWITTER_LIST_URL").unwrap_or_else(|_| DEFAULT_LIST_URL.to_string());
        let detail_url =
            std::env::var("TWITTER_DETAIL_URL").unwrap_or_else(|_| DEFAULT_DETAIL_URL.to_string());
        let post_count = match std::env::var("TWITTER_POST_COUNT") {
            Ok(count) => count
                .parse()
                .context("TWITTER_POST_COUNT must be a positive number")?,
            Err(_) => DEFAULT_POST_COUNT,
        };

        Ok(Self {
            api_key: std::env::var("TWITTER_API_KEY").context("TWITTER_API_KEY env var missing")?,
            list_id: std::env::var("TWITTER_LIST_ID").context("TWITTER_LIST_ID env var missing")?,
            list_url: Url::parse(&list_url).context("TWITTER_LIST_URL is not a valid URL")?,
            detail_url: Url::parse(&detail_url).context("TWITTER_DETAIL_URL is not a valid URL")?,
            post_count,
        })
    }
}
