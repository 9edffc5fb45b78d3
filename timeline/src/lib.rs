//! Decoding, normalization and thread reconstruction for list timelines.
//!
//! The pipeline is `decode_timeline` → `normalize_posts` →
//! [`ThreadReconstructor::reconstruct`].

use serde_json::Value;

pub mod client;
pub mod config;
mod de;
pub mod decode;
pub mod detail;
pub mod media;
pub mod normalize;
pub mod post;
pub mod thread;

#[cfg(test)]
mod testing;

pub use client::{FeedClient, FetchError};
pub use config::FeedConfig;
pub use decode::decode_timeline;
pub use detail::{DetailCache, DetailError, DetailPolicy, DetailSource, FixtureDetailSource};
pub use media::best_video_url;
pub use normalize::{normalize_post, normalize_posts};
pub use post::{Author, ExternalLink, Media, MediaKind, Metrics, Post, ReplyTo, Thread};
pub use thread::ThreadReconstructor;

/// Decodes and normalizes a timeline response in one step.
pub fn normalize_timeline(response: &Value) -> Vec<Post> {
    normalize_posts(decode_timeline(response))
}
