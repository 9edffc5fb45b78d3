use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{instrument, warn};

use crate::{
    config::FeedConfig,
    detail::{parse_detail_body, DetailError, DetailSource},
    post::Post,
};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("ReqwestError: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("List endpoint returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("List endpoint reported code {code}: {message}")]
    Provider { code: i64, message: String },
    #[error("SerdeJsonError: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListVariables<'a> {
    list_id: &'a str,
    count: u32,
    include_promoted_content: bool,
}

/// Client for the list timeline and post detail endpoints.
pub struct FeedClient {
    client: reqwest::Client,
    config: FeedConfig,
}

impl FeedClient {
    pub fn new(config: FeedConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetches the newest `count` entries of the configured list and returns
    /// the response's `data` payload, ready for decoding.
    #[instrument(name = "FeedClient::fetch_list_timeline", skip(self), fields(list.id = %self.config.list_id))]
    pub async fn fetch_list_timeline(&self, count: u32) -> Result<Value, FetchError> {
        let variables = serde_json::to_string(&ListVariables {
            list_id: &self.config.list_id,
            count,
            include_promoted_content: false,
        })?;

        let response = self
            .client
            .get(self.config.list_url.clone())
            .query(&[("variables", variables)])
            .header("apikey", &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".to_string());
            return Err(FetchError::Status { status, body });
        }

        let mut body: Value = response.json().await?;

        if let Some(code) = body.get("code").and_then(Value::as_i64) {
            if code != 200 {
                let message = body
                    .get("msg")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string();
                return Err(FetchError::Provider { code, message });
            }
        }

        match body.get_mut("data").map(Value::take) {
            Some(data) if !data.is_null() => Ok(data),
            _ => {
                warn!("List response has no data payload");
                Ok(Value::Null)
            }
        }
    }
}

#[async_trait::async_trait]
impl DetailSource for FeedClient {
    #[instrument(name = "FeedClient::fetch_detail", skip(self))]
    async fn fetch_detail(&self, post_id: &str) -> Result<Vec<Post>, DetailError> {
        let response = self
            .client
            .get(self.config.detail_url.clone())
            .query(&[("tweet_id", post_id)])
            .header("apikey", &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".to_string());
            return Err(DetailError::Status { status, body });
        }

        let body: Value = response.json().await?;

        parse_detail_body(&body)
    }
}
