//! Stream player resolution.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use serde::Serialize;

use crate::{Camera, StreamKind};

/// Path of the server's video feed proxy.
pub const FEED_PATH: &str = "/video_feed";

/// Placeholder shown for cameras without a stream URL.
pub const NO_STREAM_MESSAGE: &str = "No stream URL";

/// Placeholder shown when a YouTube URL has no usable video ID.
pub const INVALID_YOUTUBE_MESSAGE: &str = "Invalid YouTube URL";

const YOUTUBE_ID_LEN: usize = 11;

static YOUTUBE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=|live/)([^#&?]*).*")
        .unwrap_or_else(|_| unreachable!())
});

/// Extracts the 11-character video ID from a YouTube URL.
///
/// Understands `youtu.be/`, `/embed/`, `/live/`, `watch?v=` and `&v=`
/// forms. Returns `None` when nothing matches or the candidate is not
/// exactly 11 characters long.
#[must_use]
pub fn extract_youtube_id(url: &str) -> Option<&str> {
    let id = YOUTUBE_ID_RE.captures(url)?.get(2)?.as_str();
    (id.len() == YOUTUBE_ID_LEN).then_some(id)
}

/// Builds the embed URL for a YouTube video: autoplay, muted, with
/// controls and minimal branding.
#[must_use]
pub fn youtube_embed_url(video_id: &str) -> String {
    format!(
        "https://www.youtube.com/embed/{video_id}?autoplay=1&mute=1&controls=1&rel=0&modestbranding=1"
    )
}

/// Builds the relative proxy URL `/video_feed?url=<encoded>` for a stream.
#[must_use]
pub fn feed_url(stream_url: &str) -> String {
    let mut url = Url::parse("http://localhost/").unwrap_or_else(|_| unreachable!());
    url.set_path(FEED_PATH);
    url.query_pairs_mut().append_pair("url", stream_url);
    format!("{}?{}", url.path(), url.query().unwrap_or_default())
}

/// How the dashboard should show one camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraPlayer {
    /// An embedded YouTube iframe.
    #[serde(rename_all = "camelCase")]
    Youtube { video_id: String, embed_url: String },
    /// An HLS playlist, playable directly or through the feed proxy.
    #[serde(rename_all = "camelCase")]
    Hls { source_url: String, feed_url: String },
    /// Nothing to play; show `message` instead.
    Unavailable { message: String },
}

/// Resolves the player for `camera`.
#[must_use]
pub fn player_for(camera: &Camera) -> CameraPlayer {
    if !camera.has_stream() {
        return CameraPlayer::Unavailable {
            message: NO_STREAM_MESSAGE.to_string(),
        };
    }

    match camera.kind {
        StreamKind::Youtube => match extract_youtube_id(&camera.stream_url) {
            Some(id) => CameraPlayer::Youtube {
                video_id: id.to_string(),
                embed_url: youtube_embed_url(id),
            },
            None => {
                log::warn!(
                    "Camera {} has no usable YouTube ID in {}",
                    camera.id,
                    camera.stream_url
                );
                CameraPlayer::Unavailable {
                    message: INVALID_YOUTUBE_MESSAGE.to_string(),
                }
            }
        },
        StreamKind::Hls => CameraPlayer::Hls {
            source_url: camera.stream_url.clone(),
            feed_url: feed_url(&camera.stream_url),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CameraStatus;

    fn camera(kind: StreamKind, stream_url: &str) -> Camera {
        Camera {
            id: "cam".to_string(),
            name: "Cam".to_string(),
            location: "Mumbai".to_string(),
            coordinates: None,
            stream_url: stream_url.to_string(),
            status: CameraStatus::Online,
            kind,
        }
    }

    #[test]
    fn extracts_ids_from_common_forms() {
        for url in [
            "https://www.youtube.com/watch?v=y-Os52eW2rg",
            "https://www.youtube.com/live/y-Os52eW2rg?si=yf9CIMI81lJfNftb",
            "https://youtu.be/y-Os52eW2rg",
            "https://www.youtube.com/embed/y-Os52eW2rg",
            "https://www.youtube.com/watch?feature=share&v=y-Os52eW2rg",
        ] {
            assert_eq!(extract_youtube_id(url), Some("y-Os52eW2rg"), "{url}");
        }
    }

    #[test]
    fn rejects_bad_ids() {
        assert_eq!(extract_youtube_id(""), None);
        assert_eq!(extract_youtube_id("https://example.com/stream.m3u8"), None);
        assert_eq!(extract_youtube_id("https://youtu.be/short"), None);
    }

    #[test]
    fn youtube_player() {
        let player = player_for(&camera(
            StreamKind::Youtube,
            "https://www.youtube.com/watch?v=y-Os52eW2rg",
        ));
        assert_eq!(
            player,
            CameraPlayer::Youtube {
                video_id: "y-Os52eW2rg".to_string(),
                embed_url: "https://www.youtube.com/embed/y-Os52eW2rg?autoplay=1&mute=1&controls=1&rel=0&modestbranding=1".to_string(),
            }
        );
    }

    #[test]
    fn empty_stream_is_unavailable() {
        assert_eq!(
            player_for(&camera(StreamKind::Youtube, "  ")),
            CameraPlayer::Unavailable {
                message: NO_STREAM_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn bad_youtube_url_is_unavailable() {
        assert!(matches!(
            player_for(&camera(StreamKind::Youtube, "https://youtu.be/short")),
            CameraPlayer::Unavailable { ref message } if message == INVALID_YOUTUBE_MESSAGE
        ));
    }

    #[test]
    fn hls_player_uses_proxy() {
        let url = "https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8";
        let CameraPlayer::Hls { source_url, feed_url } = player_for(&camera(StreamKind::Hls, url))
        else {
            panic!("expected HLS player");
        };
        assert_eq!(source_url, url);
        assert_eq!(
            feed_url,
            "/video_feed?url=https%3A%2F%2Ftest-streams.mux.dev%2Fx36xhzz%2Fx36xhzz.m3u8"
        );
    }

    #[test]
    fn player_serializes_with_kind_tag() {
        let json = serde_json::to_value(CameraPlayer::Youtube {
            video_id: "y-Os52eW2rg".to_string(),
            embed_url: "e".to_string(),
        })
        .unwrap();
        assert_eq!(json["kind"], "youtube");
        assert_eq!(json["videoId"], "y-Os52eW2rg");
    }
}
