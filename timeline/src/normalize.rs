use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    de::{lenient_bool, lenient_opt, lenient_opt_string, lenient_u64},
    media::RawMedia,
    post::{Author, ExternalLink, Media, Metrics, Post, ReplyTo, UNKNOWN},
};

/// Embedded posts nested deeper than this are dropped rather than normalized.
pub const MAX_EMBED_DEPTH: usize = 2;

const QUOTED_RESULT: [&str; 2] = [
    "/quoted_status_result/result",
    "/legacy/quoted_status_result/result",
];
const REPOSTED_RESULT: [&str; 2] = [
    "/legacy/retweeted_status_result/result",
    "/retweeted_status_result/result",
];

#[derive(Debug, Deserialize)]
struct RawTweet {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    rest_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    legacy: Option<RawLegacy>,
    #[serde(default, deserialize_with = "lenient_opt")]
    core: Option<RawCore>,
    #[serde(default, deserialize_with = "lenient_opt")]
    views: Option<RawViews>,
    #[serde(default, deserialize_with = "lenient_opt")]
    note_tweet: Option<RawNoteTweet>,
}

#[derive(Debug, Deserialize)]
struct RawLegacy {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    id_str: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    conversation_id_str: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    user_id_str: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    full_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    lang: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    reply_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    retweet_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    favorite_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    quote_count: u64,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    in_reply_to_status_id_str: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    in_reply_to_user_id_str: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    in_reply_to_screen_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    entities: Option<RawEntities>,
    #[serde(default, deserialize_with = "lenient_opt")]
    extended_entities: Option<RawEntities>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntities {
    #[serde(default, deserialize_with = "lenient_opt")]
    urls: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient_opt")]
    media: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawUrl {
    #[serde(default, deserialize_with = "lenient_opt")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    expanded_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    display_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCore {
    #[serde(default, deserialize_with = "lenient_opt")]
    user_results: Option<RawUserResults>,
}

#[derive(Debug, Deserialize)]
struct RawUserResults {
    #[serde(default, deserialize_with = "lenient_opt")]
    result: Option<RawUser>,
}

#[derive(Debug, Default, Deserialize)]
struct RawUser {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    rest_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    legacy: Option<RawUserProfile>,
    /// Newer payloads move name and handle out of `legacy`.
    #[serde(default, deserialize_with = "lenient_opt")]
    core: Option<RawUserProfile>,
    #[serde(default, deserialize_with = "lenient_opt")]
    avatar: Option<RawAvatar>,
    #[serde(default, deserialize_with = "lenient_bool")]
    is_blue_verified: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RawUserProfile {
    #[serde(default, deserialize_with = "lenient_opt")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    screen_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt")]
    profile_image_url_https: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    verified: bool,
}

#[derive(Debug, Deserialize)]
struct RawAvatar {
    #[serde(default, deserialize_with = "lenient_opt")]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawViews {
    #[serde(default, deserialize_with = "lenient_u64")]
    count: u64,
}

#[derive(Debug, Deserialize)]
struct RawNoteTweet {
    #[serde(default, deserialize_with = "lenient_opt")]
    note_tweet_results: Option<RawNoteResults>,
}

#[derive(Debug, Deserialize)]
struct RawNoteResults {
    #[serde(default, deserialize_with = "lenient_opt")]
    result: Option<RawNote>,
}

#[derive(Debug, Deserialize)]
struct RawNote {
    #[serde(default, deserialize_with = "lenient_opt")]
    text: Option<String>,
}

/// Normalizes one raw post result from the timeline.
///
/// Returns `None` for results without a `legacy` body or without any id, so
/// callers can drop corrupt items and keep going.
pub fn normalize_post(raw: &Value) -> Option<Post> {
    normalize_at_depth(raw, 0)
}

/// Normalizes every result, dropping the ones that fail.
pub fn normalize_posts<'a>(raws: impl IntoIterator<Item = &'a Value>) -> Vec<Post> {
    let mut dropped = 0_usize;
    let posts: Vec<Post> = raws
        .into_iter()
        .filter_map(|raw| {
            let post = normalize_post(raw);
            if post.is_none() {
                dropped += 1;
            }
            post
        })
        .collect();

    if dropped > 0 {
        debug!(
            dropped,
            kept = posts.len(),
            "Dropped posts that failed to normalize"
        );
    }

    posts
}

fn normalize_at_depth(raw: &Value, depth: usize) -> Option<Post> {
    let raw = unwrap_visibility(raw);

    let tweet = match RawTweet::deserialize(raw) {
        Ok(tweet) => tweet,
        Err(e) => {
            debug!(error = %e, "Post result has an unexpected shape");
            return None;
        }
    };

    let Some(legacy) = tweet.legacy else {
        debug!(rest_id = ?tweet.rest_id, "Skipping post result without a legacy body");
        return None;
    };

    let Some(id) = tweet.rest_id.or_else(|| legacy.id_str.clone()) else {
        debug!("Skipping post result without an id");
        return None;
    };

    let quoted_ref = embedded(raw, &QUOTED_RESULT);
    let reposted_ref = embedded(raw, &REPOSTED_RESULT);

    let (quoted_post, reposted_post) = if depth < MAX_EMBED_DEPTH {
        (
            quoted_ref
                .and_then(|q| normalize_at_depth(q, depth + 1))
                .map(Box::new),
            reposted_ref
                .and_then(|r| normalize_at_depth(r, depth + 1))
                .map(Box::new),
        )
    } else {
        if quoted_ref.is_some() || reposted_ref.is_some() {
            debug!(%id, depth, "Dropping embedded posts past the nesting limit");
        }
        (None, None)
    };

    let note_text = tweet
        .note_tweet
        .and_then(|n| n.note_tweet_results)
        .and_then(|r| r.result)
        .and_then(|r| r.text)
        .filter(|t| !t.is_empty());

    let reply_to = legacy.in_reply_to_status_id_str.map(|post_id| ReplyTo {
        post_id,
        user_id: legacy.in_reply_to_user_id_str,
        handle: legacy.in_reply_to_screen_name,
    });

    let user = tweet
        .core
        .and_then(|c| c.user_results)
        .and_then(|r| r.result)
        .unwrap_or_default();
    let author = author(user, legacy.user_id_str);

    let media = pick_media(legacy.extended_entities.as_ref(), legacy.entities.as_ref());
    let external_links = legacy
        .entities
        .and_then(|e| e.urls)
        .unwrap_or_default()
        .iter()
        .filter_map(external_link)
        .collect();

    Some(Post {
        conversation_id: legacy.conversation_id_str.unwrap_or_else(|| id.clone()),
        id,
        author,
        text: note_text.or(legacy.full_text).unwrap_or_default(),
        created_at: legacy.created_at.unwrap_or_default(),
        lang: legacy.lang.unwrap_or_default(),
        metrics: Metrics {
            replies: legacy.reply_count,
            reposts: legacy.retweet_count,
            likes: legacy.favorite_count,
            quotes: legacy.quote_count,
            views: tweet.views.map_or(0, |v| v.count),
        },
        media,
        external_links,
        reply_to,
        is_repost: reposted_ref.is_some(),
        is_quote: quoted_ref.is_some(),
        quoted_post,
        reposted_post,
        thread: None,
    })
}

fn unwrap_visibility(raw: &Value) -> &Value {
    let wrapped = raw.get("__typename").and_then(Value::as_str)
        == Some("TweetWithVisibilityResults")
        || raw.get("legacy").is_none();

    match raw.get("tweet") {
        Some(inner) if wrapped && inner.is_object() => inner,
        _ => raw,
    }
}

fn embedded<'a>(raw: &'a Value, pointers: &[&str]) -> Option<&'a Value> {
    pointers
        .iter()
        .filter_map(|p| raw.pointer(p))
        .find(|v| !v.is_null())
}

fn author(user: RawUser, fallback_id: Option<String>) -> Author {
    let legacy = user.legacy.unwrap_or_default();
    let core = user.core.unwrap_or_default();

    let display_name = legacy.name.or(core.name);
    let handle = legacy.screen_name.or(core.screen_name);
    let avatar_url = legacy
        .profile_image_url_https
        .or(user.avatar.and_then(|a| a.image_url));

    Author {
        id: user.rest_id.or(fallback_id).unwrap_or_default(),
        display_name: display_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        handle: handle
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        avatar_url: avatar_url.unwrap_or_default(),
        verified: legacy.verified || user.is_blue_verified,
    }
}

/// `extended_entities` carries dimensions and video variants, so it wins
/// over the basic `entities` list whenever it has anything in it.
fn pick_media(extended: Option<&RawEntities>, basic: Option<&RawEntities>) -> Vec<Media> {
    let list = [extended, basic]
        .into_iter()
        .flatten()
        .filter_map(|e| e.media.as_ref())
        .find(|m| !m.is_empty());

    list.map(|items| {
        items
            .iter()
            .filter_map(|item| RawMedia::deserialize(item).ok())
            .filter_map(RawMedia::into_media)
            .collect()
    })
    .unwrap_or_default()
}

fn external_link(raw: &Value) -> Option<ExternalLink> {
    let url = RawUrl::deserialize(raw).ok()?;

    Some(ExternalLink {
        short_url: url.url.unwrap_or_default(),
        expanded_url: url.expanded_url.unwrap_or_default(),
        display_url: url.display_url.unwrap_or_default(),
    })
}
