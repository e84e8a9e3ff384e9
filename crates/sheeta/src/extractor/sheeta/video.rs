use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::extractor::error::{Result, SheetaError};
use crate::extractor::fetch::JsonFetcher;
use crate::extractor::sheeta::site::SiteContext;
use crate::extractor::sheeta::url_type::UrlKind;

/// A single video or live page.
#[derive(Clone)]
pub struct VideoHandle {
    kind: UrlKind,
    url: String,
    channel_id: Option<String>,
    video_id: String,
    info_dump: Option<Value>,
    context: Arc<SiteContext>,
    fetcher: Arc<dyn JsonFetcher>,
}

impl VideoHandle {
    /// `kind` must be [`UrlKind::Video`] or [`UrlKind::Live`].
    pub(crate) fn new(
        kind: UrlKind,
        url: impl Into<String>,
        channel_id: Option<String>,
        video_id: impl Into<String>,
        context: Arc<SiteContext>,
        fetcher: Arc<dyn JsonFetcher>,
    ) -> Self {
        debug_assert!(kind != UrlKind::Channel);
        Self {
            kind,
            url: url.into(),
            channel_id,
            video_id: video_id.into(),
            info_dump: None,
            context,
            fetcher,
        }
    }

    pub fn kind(&self) -> UrlKind {
        self.kind
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.channel_id.as_deref()
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn context(&self) -> &SiteContext {
        &self.context
    }

    /// Raw `video_pages/{id}` response from the last successful [`hydrate`](Self::hydrate).
    pub fn info_dump(&self) -> Option<&Value> {
        self.info_dump.as_ref()
    }

    pub fn info_url(&self) -> String {
        format!(
            "{}/video_pages/{}",
            self.context.api_base_url(),
            self.video_id
        )
    }

    /// Fetches the page metadata and stores it, replacing any earlier dump.
    pub async fn hydrate(&mut self) -> Result<&Value> {
        let headers = self.context.headers_with_site_id()?;
        let url = self.info_url();
        debug!(url = %url, video_id = %self.video_id, "fetching video info");

        let info = self
            .fetcher
            .fetch_json(&url, &headers, &[])
            .await
            .map_err(|e| SheetaError::MetadataUnavailable(e.to_string()))?;

        Ok(self.info_dump.insert(info))
    }
}

impl fmt::Debug for VideoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoHandle")
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("channel_id", &self.channel_id)
            .field("video_id", &self.video_id)
            .field("info_dump", &self.info_dump)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for VideoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.kind, self.video_id, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::config::SheetaConfig;
    use crate::extractor::fetch::mock::{Reply, ScriptedFetcher};
    use crate::extractor::sheeta::site::{SITE_ID_HEADER, SiteSettings, base_headers};
    use serde_json::json;

    const API: &str = "https://api.example.jp/fc";

    fn context(site_id: Option<i64>) -> Arc<SiteContext> {
        let ctx = SiteContext::new(
            "nicochannel.jp",
            base_headers("nicochannel.jp", &SheetaConfig::default()),
            SiteSettings::from_value(json!({"api_base_url": API})).unwrap(),
        );
        Arc::new(match site_id {
            Some(id) => ctx.with_site_id(id),
            None => ctx,
        })
    }

    fn handle(fetcher: Arc<ScriptedFetcher>, site_id: Option<i64>) -> VideoHandle {
        VideoHandle::new(
            UrlKind::Video,
            "https://nicochannel.jp/ch/video/sm9",
            Some("ch".to_string()),
            "sm9",
            context(site_id),
            fetcher,
        )
    }

    #[tokio::test]
    async fn test_hydrate_sends_site_id_and_stores_dump() {
        let fetcher = Arc::new(ScriptedFetcher::new().on(
            &format!("{API}/video_pages/sm9"),
            Reply::Json(json!({"data": {"video_page": {"title": "first"}}})),
        ));
        let mut video = handle(fetcher.clone(), Some(42));
        assert!(video.info_dump().is_none());

        let info = video.hydrate().await.unwrap();
        assert_eq!(info["data"]["video_page"]["title"], "first");
        assert_eq!(
            video.info_dump().unwrap()["data"]["video_page"]["title"],
            "first"
        );

        let calls = fetcher.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].headers[SITE_ID_HEADER], "42");
        assert!(calls[0].query.is_empty());
    }

    #[tokio::test]
    async fn test_hydrate_refetches() {
        let fetcher = Arc::new(ScriptedFetcher::new().on(
            &format!("{API}/video_pages/sm9"),
            Reply::Json(json!({"n": 1})),
        ));
        let mut video = handle(fetcher.clone(), Some(42));
        video.hydrate().await.unwrap();
        video.hydrate().await.unwrap();
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_hydrate_failures() {
        for reply in [Reply::Status(404), Reply::Garbage] {
            let fetcher =
                Arc::new(ScriptedFetcher::new().on(&format!("{API}/video_pages/sm9"), reply));
            let mut video = handle(fetcher, Some(42));
            let err = video.hydrate().await.unwrap_err();
            assert!(matches!(err, SheetaError::MetadataUnavailable(_)));
            assert!(video.info_dump().is_none());
        }
    }

    #[tokio::test]
    async fn test_hydrate_requires_site_id() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let mut video = handle(fetcher.clone(), None);
        let err = video.hydrate().await.unwrap_err();
        assert!(matches!(err, SheetaError::SiteIdUnavailable(_)));
        assert!(fetcher.calls().is_empty());
    }

    #[test]
    fn test_display() {
        let video = handle(Arc::new(ScriptedFetcher::new()), Some(1));
        assert_eq!(
            video.to_string(),
            "video: sm9 (https://nicochannel.jp/ch/video/sm9)"
        );
    }
}
