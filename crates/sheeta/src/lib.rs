//! Resolves and lists content on Sheeta-powered fanclub sites.
//!
//! A URL is classified into a video, live or channel page, the site's
//! settings and fanclub site id are resolved, and the result is returned as
//! an [`EntityHandle`]. Channel handles can then walk the site's paginated
//! listings to produce child video and live handles.
//!
//! ```rust,no_run
//! use sheeta_parser::{SheetaConfig, default_factory};
//!
//! # async fn run() -> Result<(), sheeta_parser::SheetaError> {
//! let factory = default_factory(SheetaConfig::default())?;
//! let mut handle = factory.open("https://nicochannel.jp/some-channel/videos").await?;
//! if let Some(channel) = handle.as_channel_mut() {
//!     let summary = channel.list_videos().await?;
//!     println!("{} videos over {} pages", summary.records, summary.pages);
//! }
//! # Ok(())
//! # }
//! ```

pub mod extractor;

pub use extractor::config::SheetaConfig;
pub use extractor::error::{FetchError, Result, SheetaError};
pub use extractor::factory::SheetaFactory;
pub use extractor::fetch::{JsonFetcher, ReqwestFetcher};
pub use extractor::sheeta::{
    ChannelHandle, EntityHandle, ListingSummary, PageType, SiteContext, SiteSettings,
    UrlDescriptor, UrlKind, VideoHandle, classify,
};
pub use extractor::{default_client, default_factory};
