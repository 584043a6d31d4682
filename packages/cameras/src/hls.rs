//! HLS relaying for the video feed proxy.
//!
//! A roster HLS camera is a master playlist whose variant playlists and
//! media segments live beside it. The proxy may relay anything under a
//! roster playlist's directory, and every URI inside a relayed playlist is
//! rewritten to go back through [`FEED_PATH`](crate::player::FEED_PATH) so
//! the player never leaves the proxy.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use reqwest::Url;

use crate::player::feed_url;
use crate::{Camera, StreamKind, all_cameras};

/// Content type of a relayed playlist.
pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

static URI_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"URI="([^"]*)""#).unwrap_or_else(|_| unreachable!()));

/// Directory a playlist's relative references resolve against.
#[must_use]
pub fn playlist_base(playlist_url: &str) -> Option<Url> {
    let url = Url::parse(playlist_url.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.join("./").ok()
}

/// Whether `candidate` is on the same origin as `base` and inside its path.
///
/// Parsing already collapses `..` segments, so an escape shows up as a
/// path outside the base.
#[must_use]
pub fn is_under(base: &Url, candidate: &Url) -> bool {
    candidate.scheme() == base.scheme()
        && candidate.host_str() == base.host_str()
        && candidate.port_or_known_default() == base.port_or_known_default()
        && candidate.path().starts_with(base.path())
}

/// Whether `url` is an HLS camera's playlist or a file beside it.
#[must_use]
pub fn stream_allowed(cameras: &[Camera], url: &Url) -> bool {
    cameras
        .iter()
        .filter(|c| c.kind == StreamKind::Hls && c.has_stream())
        .filter_map(|c| playlist_base(&c.stream_url))
        .any(|base| is_under(&base, url))
}

/// [`stream_allowed`] against the embedded roster.
#[must_use]
pub fn is_relayable_stream(url: &Url) -> bool {
    stream_allowed(&all_cameras(), url)
}

/// Whether an upstream response is a playlist that needs rewriting.
#[must_use]
pub fn is_playlist(url: &Url, content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("mpegurl"))
        || url.path().to_ascii_lowercase().ends_with(".m3u8")
}

fn relay(playlist_url: &Url, reference: &str) -> String {
    playlist_url
        .join(reference)
        .map_or_else(|_| reference.to_string(), |abs| feed_url(abs.as_str()))
}

/// Rewrites every URI in an M3U8 playlist to a proxy URL.
///
/// URI lines and `URI="..."` tag attributes are resolved against
/// `playlist_url` first. Other tags and blank lines pass through.
#[must_use]
pub fn rewrite_playlist(playlist_url: &Url, body: &str) -> String {
    let mut out = String::with_capacity(body.len() * 2);
    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            out.push_str(line);
        } else if trimmed.starts_with('#') {
            let rewritten = URI_ATTR_RE.replace_all(line, |caps: &Captures| {
                format!("URI=\"{}\"", relay(playlist_url, &caps[1]))
            });
            out.push_str(&rewritten);
        } else {
            out.push_str(&relay(playlist_url, trimmed));
        }
        out.push('\n');
    }
    if !body.ends_with('\n') {
        out.pop();
    }
    out
}
