use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::extractor::error::{Result, SheetaError};

// Matched against `{host}{path}`. Order matters: the channel shapes would
// also accept video and live paths.
static MULTI_VIDEO_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^/]+/([^/]+)/(?:video|audio)/([A-Za-z0-9]+)/*$").unwrap()
});
static SINGLE_VIDEO_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^/]+/(?:video|audio)/([A-Za-z0-9]+)/*$").unwrap());
static MULTI_LIVE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^/]+/([^/]+)/live/([A-Za-z0-9]+)/*$").unwrap());
static SINGLE_LIVE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^/]+/live/([A-Za-z0-9]+)/*$").unwrap());
static MULTI_CHANNEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^/]+/([^/]+)(?:/videos)?/*$").unwrap());
static SINGLE_CHANNEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^/]+(?:/videos)?/*$").unwrap());
static CONTENT_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());

/// What a Sheeta URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlKind {
    Video,
    Live,
    Channel,
}

impl UrlKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlKind::Video => "video",
            UrlKind::Live => "live",
            UrlKind::Channel => "channel",
        }
    }
}

impl fmt::Display for UrlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifiers pulled out of a URL by [`classify`].
///
/// `video_id` is set exactly for [`UrlKind::Video`] and [`UrlKind::Live`];
/// `channel_id` only on multi-channel sites; `tag` only for channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlDescriptor {
    pub kind: UrlKind,
    /// Host (and explicit port, if any) of the URL.
    pub base_domain: String,
    pub channel_id: Option<String>,
    pub video_id: Option<String>,
    pub tag: Option<String>,
}

impl UrlDescriptor {
    fn item(kind: UrlKind, base_domain: String, channel_id: Option<&str>, video_id: &str) -> Self {
        Self {
            kind,
            base_domain,
            channel_id: channel_id.map(str::to_owned),
            video_id: Some(video_id.to_owned()),
            tag: None,
        }
    }

    fn channel(base_domain: String, channel_id: Option<&str>, tag: Option<String>) -> Self {
        Self {
            kind: UrlKind::Channel,
            base_domain,
            channel_id: channel_id.map(str::to_owned),
            video_id: None,
            tag,
        }
    }
}

/// Whether `code` can appear as the id segment of a video or live URL.
pub(crate) fn is_content_code(code: &str) -> bool {
    CONTENT_CODE_REGEX.is_match(code)
}

fn invalid(url: &str, reason: &str) -> SheetaError {
    SheetaError::InvalidUrl(format!("{url}: {reason}"))
}

/// Classifies a Sheeta URL. Pure: no network access.
pub fn classify(url: &str) -> Result<UrlDescriptor> {
    let parsed = Url::parse(url).map_err(|e| invalid(url, &e.to_string()))?;
    if parsed.scheme() != "https" {
        return Err(invalid(url, "URL must be HTTPS"));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| invalid(url, "missing host"))?;
    let base_domain = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let path = match parsed.path() {
        "" => "/",
        p => p,
    };
    let text = format!("{base_domain}{path}");

    if let Some(caps) = MULTI_VIDEO_REGEX.captures(&text) {
        return Ok(UrlDescriptor::item(
            UrlKind::Video,
            base_domain,
            Some(&caps[1]),
            &caps[2],
        ));
    }
    if let Some(caps) = SINGLE_VIDEO_REGEX.captures(&text) {
        return Ok(UrlDescriptor::item(
            UrlKind::Video,
            base_domain,
            None,
            &caps[1],
        ));
    }
    if let Some(caps) = MULTI_LIVE_REGEX.captures(&text) {
        return Ok(UrlDescriptor::item(
            UrlKind::Live,
            base_domain,
            Some(&caps[1]),
            &caps[2],
        ));
    }
    if let Some(caps) = SINGLE_LIVE_REGEX.captures(&text) {
        return Ok(UrlDescriptor::item(
            UrlKind::Live,
            base_domain,
            None,
            &caps[1],
        ));
    }

    let tag = parsed
        .query_pairs()
        .find(|(k, _)| k == "tag")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty());

    // A bare `/videos` is the single-channel listing, not a channel named "videos".
    if let Some(caps) = MULTI_CHANNEL_REGEX.captures(&text)
        && &caps[1] != "videos"
    {
        return Ok(UrlDescriptor::channel(base_domain, Some(&caps[1]), tag));
    }
    if SINGLE_CHANNEL_REGEX.is_match(&text) {
        return Ok(UrlDescriptor::channel(base_domain, None, tag));
    }

    Err(invalid(url, "could not determine URL type"))
}
