use thiserror::Error;

/// Failure of a single JSON fetch through a [`JsonFetcher`](super::fetch::JsonFetcher).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("invalid json from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Whether the request itself failed, as opposed to returning a body we
    /// could not understand.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Status { .. })
    }
}

#[derive(Debug, Error)]
pub enum SheetaError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("failed to get site settings: {0}")]
    SettingsUnavailable(String),
    #[error("failed to get fanclub site id: {0}")]
    SiteIdUnavailable(String),
    #[error("failed to get video info: {0}")]
    MetadataUnavailable(String),
    #[error("failed to get page list: {0}")]
    ListingFailed(String),
    #[error("http client error: {0}")]
    Client(String),
}

pub type Result<T> = std::result::Result<T, SheetaError>;
