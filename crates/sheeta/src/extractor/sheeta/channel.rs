use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::extractor::error::{Result, SheetaError};
use crate::extractor::fetch::{JsonFetcher, Query};
use crate::extractor::sheeta::models::PageListResponse;
use crate::extractor::sheeta::site::SiteContext;
use crate::extractor::sheeta::url_type::{UrlKind, is_content_code};
use crate::extractor::sheeta::video::VideoHandle;

/// Which `fanclub_sites/{id}/*_pages` listing to walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Video,
    Live,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Video => "video",
            PageType::Live => "live",
        }
    }

    fn child_kind(&self) -> UrlKind {
        match self {
            PageType::Video => UrlKind::Video,
            PageType::Live => UrlKind::Live,
        }
    }
}

/// Outcome of one listing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingSummary {
    /// Records appended by this call.
    pub records: usize,
    /// Pages fetched successfully.
    pub pages: u32,
    /// A request failed mid-way and the listing stopped early.
    pub interrupted: bool,
}

/// A channel (or single-channel site) listing.
///
/// `videos` and `video_dumps` stay index-aligned, in the order the API
/// returned them; likewise `lives` and `live_dumps`.
pub struct ChannelHandle {
    url: String,
    channel_id: Option<String>,
    tag: Option<String>,
    per_page: usize,
    context: Arc<SiteContext>,
    fetcher: Arc<dyn JsonFetcher>,
    video_dumps: Vec<Value>,
    videos: Vec<VideoHandle>,
    live_dumps: Vec<Value>,
    lives: Vec<VideoHandle>,
}

impl ChannelHandle {
    pub(crate) fn new(
        url: impl Into<String>,
        channel_id: Option<String>,
        tag: Option<String>,
        per_page: usize,
        context: Arc<SiteContext>,
        fetcher: Arc<dyn JsonFetcher>,
    ) -> Self {
        Self {
            url: url.into(),
            channel_id,
            tag,
            per_page,
            context,
            fetcher,
            video_dumps: Vec::new(),
            videos: Vec::new(),
            live_dumps: Vec::new(),
            lives: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.channel_id.as_deref()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn site_id(&self) -> Option<i64> {
        self.context.site_id()
    }

    pub fn context(&self) -> &SiteContext {
        &self.context
    }

    pub fn video_dumps(&self) -> &[Value] {
        &self.video_dumps
    }

    pub fn videos(&self) -> &[VideoHandle] {
        &self.videos
    }

    pub fn videos_mut(&mut self) -> &mut [VideoHandle] {
        &mut self.videos
    }

    pub fn live_dumps(&self) -> &[Value] {
        &self.live_dumps
    }

    pub fn lives(&self) -> &[VideoHandle] {
        &self.lives
    }

    pub fn lives_mut(&mut self) -> &mut [VideoHandle] {
        &mut self.lives
    }

    /// Lists every video, newest first.
    pub async fn list_videos(&mut self) -> Result<ListingSummary> {
        self.list(PageType::Video, &[("sort", "-display_date")]).await
    }

    /// Lists lives currently on air.
    pub async fn list_lives_now(&mut self) -> Result<ListingSummary> {
        self.list(PageType::Live, &[("live_type", "1")]).await
    }

    /// Lists scheduled lives.
    pub async fn list_lives_scheduled(&mut self) -> Result<ListingSummary> {
        self.list(PageType::Live, &[("live_type", "2")]).await
    }

    /// Walks the listing one page at a time until a short page, appending
    /// each page before the next is requested. A request failure ends the
    /// walk with what was collected so far. A response that cannot be
    /// understood fails the call; pages appended before it are kept.
    async fn list(
        &mut self,
        page_type: PageType,
        params: &[(&str, &str)],
    ) -> Result<ListingSummary> {
        let url = self.pages_url(page_type)?;
        let mut summary = ListingSummary {
            records: 0,
            pages: 0,
            interrupted: false,
        };
        let mut page = 1u32;

        loop {
            let query = self.page_query(params, page);
            let value = match self
                .fetcher
                .fetch_json(&url, self.context.headers(), &query)
                .await
            {
                Ok(value) => value,
                Err(e) if e.is_transport() => {
                    warn!(
                        url = %url,
                        page,
                        collected = summary.records,
                        error = %e,
                        "page request failed; returning partial listing"
                    );
                    summary.interrupted = true;
                    break;
                }
                Err(e) => {
                    return Err(SheetaError::ListingFailed(format!("page {page}: {e}")));
                }
            };

            let response: PageListResponse = serde_json::from_value(value)
                .map_err(|e| SheetaError::ListingFailed(format!("page {page}: {e}")))?;
            let records = response.into_records();
            let count = records.len();
            debug!(page_type = page_type.as_str(), page, count, "fetched page");

            let handles = records
                .iter()
                .map(|record| self.child_handle(page_type, record))
                .collect::<Result<Vec<_>>>()?;
            self.append(page_type, records, handles);
            summary.records += count;
            summary.pages = page;

            if count < self.per_page {
                break;
            }
            page += 1;
        }

        Ok(summary)
    }

    fn append(&mut self, page_type: PageType, records: Vec<Value>, handles: Vec<VideoHandle>) {
        let (dumps, children) = match page_type {
            PageType::Video => (&mut self.video_dumps, &mut self.videos),
            PageType::Live => (&mut self.live_dumps, &mut self.lives),
        };
        dumps.extend(records);
        children.extend(handles);
    }

    pub fn pages_url(&self, page_type: PageType) -> Result<String> {
        let site_id = self.context.require_site_id()?;
        Ok(format!(
            "{}/fanclub_sites/{}/{}_pages",
            self.context.api_base_url(),
            site_id,
            page_type.as_str()
        ))
    }

    fn page_query(&self, params: &[(&str, &str)], page: u32) -> Query {
        let mut query: Query = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        query.push(("page".to_string(), page.to_string()));
        query.push(("per_page".to_string(), self.per_page.to_string()));
        query.push(("sort".to_string(), "display_date".to_string()));
        if let Some(tag) = &self.tag {
            query.push(("tag".to_string(), tag.clone()));
        }
        query
    }

    /// Canonical page URL for a listed record.
    pub fn child_url(&self, page_type: PageType, content_code: &str) -> String {
        let channel = self
            .channel_id
            .as_deref()
            .map(|c| format!("{c}/"))
            .unwrap_or_default();
        format!(
            "https://{}/{}{}/{}",
            self.context.base_domain(),
            channel,
            page_type.as_str(),
            content_code
        )
    }

    fn child_handle(&self, page_type: PageType, record: &Value) -> Result<VideoHandle> {
        let content_code = record
            .get("content_code")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SheetaError::ListingFailed(format!(
                    "{} page record has no content_code",
                    page_type.as_str()
                ))
            })?;
        if !is_content_code(content_code) {
            return Err(SheetaError::ListingFailed(format!(
                "{} page record has invalid content_code {content_code:?}",
                page_type.as_str()
            )));
        }

        Ok(VideoHandle::new(
            page_type.child_kind(),
            self.child_url(page_type, content_code),
            self.channel_id.clone(),
            content_code,
            Arc::clone(&self.context),
            Arc::clone(&self.fetcher),
        ))
    }
}

impl fmt::Debug for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelHandle")
            .field("url", &self.url)
            .field("channel_id", &self.channel_id)
            .field("tag", &self.tag)
            .field("site_id", &self.site_id())
            .field("videos", &self.videos.len())
            .field("lives", &self.lives.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel: {}", self.url)?;
        if let Some(tag) = &self.tag {
            write!(f, " [tag={tag}]")?;
        }
        Ok(())
    }
}
