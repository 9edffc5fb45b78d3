use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    de::{lenient_bool, lenient_opt, lenient_opt_string, lenient_u64},
    media::RawMedia,
    post::{Author, ExternalLink, Metrics, Post, ReplyTo, UNKNOWN},
};

use super::DetailError;

/// One post as the detail endpoint returns it. Flatter than the timeline
/// shape, with counters that usually arrive as strings.
#[derive(Debug, Deserialize)]
struct DetailRecord {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    tweet_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    conversation_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    user: Option<DetailUser>,
    #[serde(default, deserialize_with = "lenient_opt")]
    text: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    lang: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    is_reply: bool,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    related_tweet_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    related_user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    in_reply_to_status_id_str: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    is_retweet: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    is_quote: bool,
    #[serde(default, deserialize_with = "lenient_u64")]
    reply_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    retweet_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    favorite_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    quote_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    view_count: u64,
    #[serde(default, deserialize_with = "lenient_opt")]
    media_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    medias: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient_opt")]
    urls: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct DetailUser {
    #[serde(default, deserialize_with = "lenient_opt")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    screen_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    profile_image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    verified: bool,
}

#[derive(Debug, Deserialize)]
struct DetailUrl {
    #[serde(default, deserialize_with = "lenient_opt")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    expanded_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    display_url: Option<String>,
}

impl DetailRecord {
    fn into_post(self) -> Option<Post> {
        let id = self.tweet_id?;
        let user = self.user.unwrap_or_default();

        let reply_to = self
            .in_reply_to_status_id_str
            .or(self.related_tweet_id.filter(|_| self.is_reply))
            .map(|post_id| ReplyTo {
                post_id,
                user_id: self.related_user_id,
                handle: None,
            });

        let fallback_kind = self.media_type;
        let media = self
            .medias
            .unwrap_or_default()
            .iter()
            .filter_map(|m| RawMedia::deserialize(m).ok())
            .filter_map(|mut m| {
                if m.kind.is_none() {
                    m.kind.clone_from(&fallback_kind);
                }
                m.into_media()
            })
            .collect();

        let external_links = self
            .urls
            .unwrap_or_default()
            .iter()
            .filter_map(|u| DetailUrl::deserialize(u).ok())
            .map(|u| ExternalLink {
                short_url: u.url.unwrap_or_default(),
                expanded_url: u.expanded_url.unwrap_or_default(),
                display_url: u.display_url.unwrap_or_default(),
            })
            .collect();

        Some(Post {
            conversation_id: self.conversation_id.unwrap_or_else(|| id.clone()),
            id,
            author: Author {
                id: self.user_id.unwrap_or_default(),
                display_name: user.name.unwrap_or_else(|| UNKNOWN.to_string()),
                handle: user.screen_name.unwrap_or_else(|| UNKNOWN.to_string()),
                avatar_url: user.profile_image_url.unwrap_or_default(),
                verified: user.verified,
            },
            text: self.text.unwrap_or_default(),
            created_at: self.created_at.unwrap_or_default(),
            lang: self.lang.unwrap_or_default(),
            metrics: Metrics {
                replies: self.reply_count,
                reposts: self.retweet_count,
                likes: self.favorite_count,
                quotes: self.quote_count,
                views: self.view_count,
            },
            media,
            external_links,
            reply_to,
            quoted_post: None,
            reposted_post: None,
            is_repost: self.is_retweet,
            is_quote: self.is_quote,
            thread: None,
        })
    }
}

/// Converts a detail response body (`{"tweets": [...]}`) into posts.
///
/// A body without a `tweets` array is malformed. Individual records that
/// can't be read, or have no id, are dropped.
pub fn parse_detail_body(body: &Value) -> Result<Vec<Post>, DetailError> {
    let Some(records) = body.get("tweets").and_then(Value::as_array) else {
        return Err(DetailError::Malformed(
            "response has no tweets array".to_string(),
        ));
    };

    let posts: Vec<Post> = records
        .iter()
        .filter_map(|record| match DetailRecord::deserialize(record) {
            Ok(record) => record.into_post(),
            Err(e) => {
                debug!(error = %e, "Skipping unreadable detail record");
                None
            }
        })
        .collect();

    if posts.len() < records.len() {
        debug!(
            dropped = records.len() - posts.len(),
            "Dropped detail records without an id"
        );
    }

    Ok(posts)
}
