use serde::Deserialize;
use tracing::debug;

use crate::{
    de::{dimension, lenient_opt_u64, lenient_u64},
    post::{Media, MediaKind},
};

/// The only content type served as a direct, seekable download. Everything
/// else the provider lists (HLS manifests) is adaptive streaming.
pub const PROGRESSIVE_CONTENT_TYPE: &str = "video/mp4";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoVariant {
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    pub bitrate: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub variants: Vec<VideoVariant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct OriginalInfo {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub width: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub height: u64,
}

/// One media entity as the provider describes it, on either the timeline
/// (`media_url_https`, `original_info`) or the detail endpoint (`media_url`,
/// flat `width`/`height`).
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawMedia {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub media_url_https: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub original_info: Option<OriginalInfo>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub width: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub height: u64,
    #[serde(default)]
    pub video_info: Option<VideoInfo>,
}

impl RawMedia {
    pub(crate) fn into_media(self) -> Option<Media> {
        let Some(kind) = self.kind.as_deref().and_then(MediaKind::from_provider) else {
            debug!(kind = ?self.kind, "Skipping media with unknown type");
            return None;
        };

        let best_video_url = if kind.is_playable() {
            self.video_info
                .as_ref()
                .and_then(|info| best_video_url(&info.variants))
                .map(str::to_owned)
        } else {
            None
        };

        let (width, height) = match &self.original_info {
            Some(info) => (info.width, info.height),
            None => (self.width, self.height),
        };

        let url = self
            .media_url_https
            .or(self.media_url)
            .or(self.url)
            .unwrap_or_default();

        Some(Media {
            kind,
            url,
            width: dimension(width),
            height: dimension(height),
            best_video_url,
        })
    }
}

/// Picks the progressive download with the highest bitrate.
///
/// Variants without a bitrate or with any other content type never qualify,
/// and the first variant wins a tie. Manifests are never returned.
pub fn best_video_url(variants: &[VideoVariant]) -> Option<&str> {
    let mut best: Option<(u64, &str)> = None;

    for variant in variants {
        if variant.content_type.as_deref() != Some(PROGRESSIVE_CONTENT_TYPE) {
            continue;
        }
        let (Some(bitrate), Some(url)) = (variant.bitrate, variant.url.as_deref()) else {
            continue;
        };

        match best {
            Some((best_bitrate, _)) if bitrate <= best_bitrate => {}
            _ => best = Some((bitrate, url)),
        }
    }

    best.map(|(_, url)| url)
}
