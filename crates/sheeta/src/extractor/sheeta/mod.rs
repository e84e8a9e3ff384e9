mod channel;
mod models;
mod site;
mod url_type;
mod video;

use std::fmt;

pub use channel::{ChannelHandle, ListingSummary, PageType};
pub use site::{
    SITE_ID_HEADER, SiteContext, SiteSettings, base_headers, resolve_settings, resolve_site_id,
    settings_url,
};
pub use url_type::{UrlDescriptor, UrlKind, classify};
pub use video::VideoHandle;

/// A resolved Sheeta page, ready for hydration or listing.
#[derive(Debug)]
pub enum EntityHandle {
    Video(VideoHandle),
    Live(VideoHandle),
    Channel(ChannelHandle),
}

impl EntityHandle {
    pub fn kind(&self) -> UrlKind {
        match self {
            EntityHandle::Video(_) => UrlKind::Video,
            EntityHandle::Live(_) => UrlKind::Live,
            EntityHandle::Channel(_) => UrlKind::Channel,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            EntityHandle::Video(v) | EntityHandle::Live(v) => v.url(),
            EntityHandle::Channel(c) => c.url(),
        }
    }

    pub fn context(&self) -> &SiteContext {
        match self {
            EntityHandle::Video(v) | EntityHandle::Live(v) => v.context(),
            EntityHandle::Channel(c) => c.context(),
        }
    }

    pub fn as_video(&self) -> Option<&VideoHandle> {
        match self {
            EntityHandle::Video(v) | EntityHandle::Live(v) => Some(v),
            EntityHandle::Channel(_) => None,
        }
    }

    pub fn as_video_mut(&mut self) -> Option<&mut VideoHandle> {
        match self {
            EntityHandle::Video(v) | EntityHandle::Live(v) => Some(v),
            EntityHandle::Channel(_) => None,
        }
    }

    pub fn as_channel_mut(&mut self) -> Option<&mut ChannelHandle> {
        match self {
            EntityHandle::Channel(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_channel(self) -> Option<ChannelHandle> {
        match self {
            EntityHandle::Channel(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityHandle::Video(v) | EntityHandle::Live(v) => fmt::Display::fmt(v, f),
            EntityHandle::Channel(c) => fmt::Display::fmt(c, f),
        }
    }
}
