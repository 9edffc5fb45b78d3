use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Placeholder for author names and handles the provider did not send.
pub const UNKNOWN: &str = "unknown";

/// `created_at` format used by the list timeline and detail endpoints,
/// e.g. `Tue Mar 11 08:15:55 +0000 2025`.
pub const PROVIDER_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub conversation_id: String,
    pub author: Author,
    pub text: String,
    /// Kept exactly as the provider sent it.
    pub created_at: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub external_links: Vec<ExternalLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyTo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_post: Option<Box<Post>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reposted_post: Option<Box<Post>>,
    #[serde(default)]
    pub is_repost: bool,
    #[serde(default)]
    pub is_quote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<Thread>,
}

impl Post {
    /// A post with the given identity and every other field at its default.
    pub fn new(id: impl Into<String>, author: Author) -> Self {
        let id = id.into();

        Self {
            conversation_id: id.clone(),
            id,
            author,
            text: String::new(),
            created_at: String::new(),
            lang: String::new(),
            metrics: Metrics::default(),
            media: vec![],
            external_links: vec![],
            reply_to: None,
            quoted_post: None,
            reposted_post: None,
            is_repost: false,
            is_quote: false,
            thread: None,
        }
    }

    pub fn is_reply(&self) -> bool {
        self.reply_to.is_some()
    }

    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_created_at(&self.created_at)
    }

    /// Continuation posts attached by thread reconstruction, empty before it runs.
    pub fn thread_posts(&self) -> &[Post] {
        self.thread.as_ref().map_or(&[][..], |t| t.posts.as_slice())
    }
}

/// Parses the provider timestamp format, falling back to RFC 3339.
pub fn parse_created_at(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw, PROVIDER_TIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: String,
    pub display_name: String,
    pub handle: String,
    pub avatar_url: String,
    pub verified: bool,
}

impl Author {
    /// An author known only by id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: UNKNOWN.to_string(),
            handle: UNKNOWN.to_string(),
            avatar_url: String::new(),
            verified: false,
        }
    }

    pub fn is_known(&self) -> bool {
        !self.id.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub replies: u64,
    pub reposts: u64,
    pub likes: u64,
    pub quotes: u64,
    pub views: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    AnimatedGif,
}

impl MediaKind {
    /// Maps the provider's media `type` string. Unknown types have no kind.
    pub fn from_provider(kind: &str) -> Option<Self> {
        match kind {
            "photo" | "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "animated_gif" => Some(Self::AnimatedGif),
            _ => None,
        }
    }

    pub fn is_playable(self) -> bool {
        matches!(self, Self::Video | Self::AnimatedGif)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_video_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLink {
    pub short_url: String,
    pub expanded_url: String,
    pub display_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyTo {
    pub post_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

/// Same-author continuation of a root post, with the root's content merged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// Oldest first.
    pub posts: Vec<Post>,
    pub full_text: String,
    pub media: Vec<Media>,
    pub external_links: Vec<ExternalLink>,
}
