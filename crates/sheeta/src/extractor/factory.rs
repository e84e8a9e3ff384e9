use std::sync::Arc;

use tracing::debug;

use super::config::SheetaConfig;
use super::error::{Result, SheetaError};
use super::fetch::JsonFetcher;
use super::sheeta::{
    ChannelHandle, EntityHandle, SiteContext, UrlDescriptor, UrlKind, VideoHandle, base_headers,
    classify, resolve_settings, resolve_site_id,
};

/// Turns Sheeta URLs into typed handles.
///
/// Each [`open`](Self::open) resolves its own [`SiteContext`]; the handle
/// it returns (and any children it lists) share that context read-only.
#[derive(Clone)]
pub struct SheetaFactory {
    fetcher: Arc<dyn JsonFetcher>,
    config: SheetaConfig,
}

impl SheetaFactory {
    pub fn new(fetcher: Arc<dyn JsonFetcher>, config: SheetaConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &SheetaConfig {
        &self.config
    }

    /// Classifies `url` and confirms the site serves Sheeta settings.
    pub async fn classify_type(&self, url: &str) -> Result<UrlKind> {
        let descriptor = classify(url)?;
        let headers = base_headers(&descriptor.base_domain, &self.config);
        resolve_settings(self.fetcher.as_ref(), &descriptor.base_domain, &headers).await?;
        Ok(descriptor.kind)
    }

    /// Runs settings and site id resolution for an already classified URL.
    pub async fn resolve_context(&self, descriptor: &UrlDescriptor) -> Result<SiteContext> {
        let headers = base_headers(&descriptor.base_domain, &self.config);
        let settings =
            resolve_settings(self.fetcher.as_ref(), &descriptor.base_domain, &headers).await?;
        let context = SiteContext::new(descriptor.base_domain.clone(), headers, settings);

        let site_id = resolve_site_id(
            self.fetcher.as_ref(),
            &context,
            descriptor.channel_id.as_deref(),
        )
        .await?;
        Ok(context.with_site_id(site_id))
    }

    /// Opens `url` as a handle. Nothing is hydrated or listed yet.
    pub async fn open(&self, url: &str) -> Result<EntityHandle> {
        let descriptor = classify(url)?;
        debug!(url, kind = %descriptor.kind, "classified url");

        let context = Arc::new(self.resolve_context(&descriptor).await?);
        let fetcher = Arc::clone(&self.fetcher);

        let handle = match descriptor.kind {
            UrlKind::Channel => EntityHandle::Channel(ChannelHandle::new(
                url,
                descriptor.channel_id,
                descriptor.tag,
                self.config.per_page(),
                context,
                fetcher,
            )),
            kind => {
                let video_id = descriptor
                    .video_id
                    .ok_or_else(|| SheetaError::InvalidUrl(format!("{url}: missing {kind} id")))?;
                let video =
                    VideoHandle::new(kind, url, descriptor.channel_id, video_id, context, fetcher);
                if kind == UrlKind::Live {
                    EntityHandle::Live(video)
                } else {
                    EntityHandle::Video(video)
                }
            }
        };
        Ok(handle)
    }
}
