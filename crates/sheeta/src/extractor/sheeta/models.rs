use serde::Deserialize;
use serde_json::Value;

/// `GET {api_base_url}/content_providers/channels`
#[derive(Debug, Deserialize, Default)]
pub struct ChannelsResponse {
    #[serde(default)]
    pub data: Option<ChannelsData>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ChannelsData {
    #[serde(default)]
    pub content_providers: Option<Vec<ContentProvider>>,
}

#[derive(Debug, Deserialize)]
pub struct ContentProvider {
    pub id: Option<Value>,
    pub domain: Option<Value>,
}

impl ContentProvider {
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_ref().and_then(Value::as_str)
    }
}

impl ChannelsResponse {
    pub fn into_providers(self) -> Vec<ContentProvider> {
        self.data
            .and_then(|d| d.content_providers)
            .unwrap_or_default()
    }
}

/// `GET {api_base_url}/fanclub_sites/{id}/{video,live}_pages`
///
/// Both endpoints nest their records under `video_pages`.
#[derive(Debug, Deserialize, Default)]
pub struct PageListResponse {
    #[serde(default)]
    pub data: Option<PageListData>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PageListData {
    #[serde(default)]
    pub video_pages: Option<PageList>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PageList {
    #[serde(default)]
    pub list: Option<Vec<Value>>,
}

impl PageListResponse {
    pub fn into_records(self) -> Vec<Value> {
        self.data
            .and_then(|d| d.video_pages)
            .and_then(|p| p.list)
            .unwrap_or_default()
    }
}
