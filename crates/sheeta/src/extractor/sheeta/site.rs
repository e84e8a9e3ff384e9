//! Site-level resolution: request headers, `site/settings.json`, and the
//! numeric fanclub site id that scopes every per-site API call.
//!
//! Each step takes what the previous one produced and returns a new value;
//! nothing here mutates a context in place.

use std::str::FromStr;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use tracing::debug;

use crate::extractor::config::SheetaConfig;
use crate::extractor::error::{Result, SheetaError};
use crate::extractor::fetch::JsonFetcher;
use crate::extractor::sheeta::models::ChannelsResponse;

/// Header carrying the resolved site id on per-item requests.
pub const SITE_ID_HEADER: &str = "fc_site_id";

const ACCEPT_JSON: &str = "application/json, text/plain, */*";

/// Contents of `https://{domain}/site/settings.json`.
///
/// Only `api_base_url` is required; the rest of the object is kept as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSettings {
    api_base_url: String,
    raw: Map<String, Value>,
}

impl SiteSettings {
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(raw) = value else {
            return Err(SheetaError::SettingsUnavailable(
                "settings is not a JSON object".to_string(),
            ));
        };
        let api_base_url = raw
            .get("api_base_url")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SheetaError::SettingsUnavailable("missing string api_base_url".to_string())
            })?
            .trim_end_matches('/')
            .to_string();

        Ok(Self { api_base_url, raw })
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// True unless `channel` is present and not `true`/`null`.
    pub fn uses_channel_directory(&self) -> bool {
        matches!(
            self.raw.get("channel"),
            None | Some(Value::Null) | Some(Value::Bool(true))
        )
    }

    pub fn fanclub_site_id(&self) -> Option<i64> {
        self.raw.get("fanclub_site_id").and_then(Value::as_i64)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }
}

/// Everything needed to talk to one site. Shared read-only by a handle tree.
#[derive(Debug, Clone)]
pub struct SiteContext {
    base_domain: String,
    headers: HeaderMap,
    settings: SiteSettings,
    site_id: Option<i64>,
}

impl SiteContext {
    pub fn new(base_domain: impl Into<String>, headers: HeaderMap, settings: SiteSettings) -> Self {
        Self {
            base_domain: base_domain.into(),
            headers,
            settings,
            site_id: None,
        }
    }

    pub fn with_site_id(self, site_id: i64) -> Self {
        Self {
            site_id: Some(site_id),
            ..self
        }
    }

    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn settings(&self) -> &SiteSettings {
        &self.settings
    }

    pub fn api_base_url(&self) -> &str {
        self.settings.api_base_url()
    }

    pub fn site_id(&self) -> Option<i64> {
        self.site_id
    }

    pub fn require_site_id(&self) -> Result<i64> {
        self.site_id.ok_or_else(|| {
            SheetaError::SiteIdUnavailable(format!(
                "site id for {} has not been resolved",
                self.base_domain
            ))
        })
    }

    /// Base headers plus the site id header, for per-item requests.
    pub fn headers_with_site_id(&self) -> Result<HeaderMap> {
        let site_id = self.require_site_id()?;
        let mut headers = self.headers.clone();
        headers.insert(
            HeaderName::from_static(SITE_ID_HEADER),
            HeaderValue::from(site_id),
        );
        Ok(headers)
    }
}

fn insert_header(headers: &mut HeaderMap, key: &str, value: &str) {
    match HeaderName::from_str(key) {
        Ok(name) => match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(e) => {
                debug!(error = %e, key, "Invalid header value; skipping");
            }
        },
        Err(e) => {
            debug!(error = %e, key, "Invalid header name; skipping");
        }
    }
}

/// Headers the site's own web client sends.
pub fn base_headers(base_domain: &str, config: &SheetaConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let origin = format!("https://{base_domain}");
    let referer = format!("https://{base_domain}/");

    insert_header(&mut headers, "fc_use_device", "null");
    insert_header(&mut headers, header::ORIGIN.as_str(), &origin);
    insert_header(&mut headers, header::REFERER.as_str(), &referer);
    insert_header(&mut headers, header::USER_AGENT.as_str(), config.user_agent());
    insert_header(&mut headers, header::ACCEPT.as_str(), ACCEPT_JSON);
    insert_header(
        &mut headers,
        header::ACCEPT_LANGUAGE.as_str(),
        config.accept_language(),
    );
    headers
}

pub fn settings_url(base_domain: &str) -> String {
    format!("https://{base_domain}/site/settings.json")
}

pub async fn resolve_settings(
    fetcher: &dyn JsonFetcher,
    base_domain: &str,
    headers: &HeaderMap,
) -> Result<SiteSettings> {
    let url = settings_url(base_domain);
    let value = fetcher
        .fetch_json(&url, headers, &[])
        .await
        .map_err(|e| SheetaError::SettingsUnavailable(e.to_string()))?;
    let settings = SiteSettings::from_value(value)?;
    debug!(
        base_domain,
        api_base_url = settings.api_base_url(),
        "resolved site settings"
    );
    Ok(settings)
}

/// Resolves the fanclub site id for `channel_id` on the context's site.
///
/// Sites whose settings mark `channel: false` carry the id directly;
/// otherwise it is looked up in the channel directory by domain.
pub async fn resolve_site_id(
    fetcher: &dyn JsonFetcher,
    ctx: &SiteContext,
    channel_id: Option<&str>,
) -> Result<i64> {
    let settings = ctx.settings();

    if !settings.uses_channel_directory() {
        let id = settings.fanclub_site_id().ok_or_else(|| {
            SheetaError::SiteIdUnavailable("settings has no integer fanclub_site_id".to_string())
        })?;
        debug!(site_id = id, "site id from settings");
        return Ok(id);
    }

    let channel_id = channel_id.ok_or_else(|| {
        SheetaError::SiteIdUnavailable(format!(
            "{} is a channel site but the URL names no channel",
            ctx.base_domain()
        ))
    })?;
    let domain = format!("https://{}/{}", ctx.base_domain(), channel_id);
    let url = format!("{}/content_providers/channels", ctx.api_base_url());

    let value = fetcher
        .fetch_json(&url, ctx.headers(), &[])
        .await
        .map_err(|e| SheetaError::SiteIdUnavailable(e.to_string()))?;
    let response: ChannelsResponse = serde_json::from_value(value)
        .map_err(|e| SheetaError::SiteIdUnavailable(e.to_string()))?;

    let provider = response
        .into_providers()
        .into_iter()
        .find(|p| p.domain() == Some(domain.as_str()))
        .ok_or_else(|| SheetaError::SiteIdUnavailable(format!("no channel matches {domain}")))?;

    let id = provider.id.as_ref().and_then(Value::as_i64).ok_or_else(|| {
        SheetaError::SiteIdUnavailable(format!("channel {domain} has no integer id"))
    })?;
    debug!(site_id = id, %domain, "site id from channel directory");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::fetch::mock::{Reply, ScriptedFetcher};
    use serde_json::json;

    const API: &str = "https://api.example.jp/fc";

    fn context(settings: Value) -> SiteContext {
        SiteContext::new(
            "nicochannel.jp",
            base_headers("nicochannel.jp", &SheetaConfig::default()),
            SiteSettings::from_value(settings).unwrap(),
        )
    }

    fn channels() -> Value {
        json!({
            "data": {
                "content_providers": [
                    {"id": 11, "domain": "https://nicochannel.jp/other"},
                    {"id": 42, "domain": "https://nicochannel.jp/ch"},
                    {"id": 43, "domain": "https://nicochannel.jp/ch"}
                ]
            }
        })
    }

    #[test]
    fn test_settings_requires_api_base_url() {
        assert!(matches!(
            SiteSettings::from_value(json!({"channel": true})),
            Err(SheetaError::SettingsUnavailable(_))
        ));
        assert!(matches!(
            SiteSettings::from_value(json!({"api_base_url": 3})),
            Err(SheetaError::SettingsUnavailable(_))
        ));
        assert!(matches!(
            SiteSettings::from_value(json!([API])),
            Err(SheetaError::SettingsUnavailable(_))
        ));
        let s = SiteSettings::from_value(json!({"api_base_url": format!("{API}/")})).unwrap();
        assert_eq!(s.api_base_url(), API);
    }

    #[test]
    fn test_uses_channel_directory() {
        let flag = |v: Value| {
            SiteSettings::from_value(json!({"api_base_url": API, "channel": v}))
                .unwrap()
                .uses_channel_directory()
        };
        assert!(flag(json!(true)));
        assert!(flag(Value::Null));
        assert!(!flag(json!(false)));
        assert!(
            SiteSettings::from_value(json!({"api_base_url": API}))
                .unwrap()
                .uses_channel_directory()
        );
    }

    #[test]
    fn test_base_headers() {
        let config = SheetaConfig {
            user_agent: Some("agent/1.0".into()),
            ..Default::default()
        };
        let headers = base_headers("qlover.jp", &config);
        assert_eq!(headers["fc_use_device"], "null");
        assert_eq!(headers[header::ORIGIN], "https://qlover.jp");
        assert_eq!(headers[header::REFERER], "https://qlover.jp/");
        assert_eq!(headers[header::USER_AGENT], "agent/1.0");
        assert_eq!(headers[header::ACCEPT], ACCEPT_JSON);
        assert_eq!(headers[header::ACCEPT_LANGUAGE], "ja,en-US;q=0.9,en;q=0.8");
    }

    #[test]
    fn test_headers_with_site_id() {
        let ctx = context(json!({"api_base_url": API}));
        assert!(matches!(
            ctx.headers_with_site_id(),
            Err(SheetaError::SiteIdUnavailable(_))
        ));
        let headers = ctx.with_site_id(42).headers_with_site_id().unwrap();
        assert_eq!(headers[SITE_ID_HEADER], "42");
    }

    #[tokio::test]
    async fn test_resolve_settings() {
        let fetcher = ScriptedFetcher::new().on(
            "https://nicochannel.jp/site/settings.json",
            Reply::Json(json!({"api_base_url": API, "channel": true})),
        );
        let headers = base_headers("nicochannel.jp", &SheetaConfig::default());
        let settings = resolve_settings(&fetcher, "nicochannel.jp", &headers)
            .await
            .unwrap();
        assert_eq!(settings.api_base_url(), API);
        assert_eq!(settings.get("channel"), Some(&json!(true)));

        let calls = fetcher.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].headers[header::ORIGIN], "https://nicochannel.jp");
    }

    #[tokio::test]
    async fn test_resolve_settings_failures() {
        let headers = HeaderMap::new();
        for reply in [
            Reply::Status(500),
            Reply::Garbage,
            Reply::Json(json!({"channel": true})),
        ] {
            let fetcher =
                ScriptedFetcher::new().on("https://nicochannel.jp/site/settings.json", reply);
            let err = resolve_settings(&fetcher, "nicochannel.jp", &headers)
                .await
                .unwrap_err();
            assert!(matches!(err, SheetaError::SettingsUnavailable(_)));
        }
    }

    #[tokio::test]
    async fn test_site_id_from_settings_when_channel_false() {
        let fetcher = ScriptedFetcher::new();
        let ctx = context(json!({"api_base_url": API, "channel": false, "fanclub_site_id": 7}));
        let id = resolve_site_id(&fetcher, &ctx, Some("ignored")).await.unwrap();
        assert_eq!(id, 7);
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_site_id_from_settings_must_be_integer() {
        let fetcher = ScriptedFetcher::new();
        let ctx = context(json!({"api_base_url": API, "channel": false, "fanclub_site_id": "7"}));
        let err = resolve_site_id(&fetcher, &ctx, None).await.unwrap_err();
        assert!(matches!(err, SheetaError::SiteIdUnavailable(_)));
    }

    #[tokio::test]
    async fn test_site_id_from_directory() {
        let directory = format!("{API}/content_providers/channels");
        for settings in [
            json!({"api_base_url": API, "channel": true}),
            json!({"api_base_url": API}),
        ] {
            let fetcher = ScriptedFetcher::new().on(&directory, Reply::Json(channels()));
            let ctx = context(settings);
            let id = resolve_site_id(&fetcher, &ctx, Some("ch")).await.unwrap();
            // First match wins.
            assert_eq!(id, 42);
            assert_eq!(fetcher.calls_to(&directory).len(), 1);
        }
    }

    #[tokio::test]
    async fn test_site_id_skips_malformed_providers() {
        let directory = format!("{API}/content_providers/channels");
        let fetcher = ScriptedFetcher::new().on(
            &directory,
            Reply::Json(json!({"data": {"content_providers": [
                {"id": 1, "domain": 17},
                {"id": 2, "domain": {"url": "https://nicochannel.jp/ch"}},
                {"id": 3},
                {"id": 42, "domain": "https://nicochannel.jp/ch"}
            ]}})),
        );
        let ctx = context(json!({"api_base_url": API, "channel": true}));
        let id = resolve_site_id(&fetcher, &ctx, Some("ch")).await.unwrap();
        assert_eq!(id, 42);
    }

    #[tokio::test]
    async fn test_site_id_directory_failures() {
        let directory = format!("{API}/content_providers/channels");
        let ctx = context(json!({"api_base_url": API, "channel": true}));

        let cases: Vec<(ScriptedFetcher, Option<&str>)> = vec![
            (ScriptedFetcher::new().on(&directory, Reply::Json(channels())), Some("missing")),
            (ScriptedFetcher::new().on(&directory, Reply::Json(channels())), None),
            (ScriptedFetcher::new().on(&directory, Reply::Status(502)), Some("ch")),
            (
                ScriptedFetcher::new().on(
                    &directory,
                    Reply::Json(json!({"data": {"content_providers": [
                        {"id": "42", "domain": "https://nicochannel.jp/ch"}
                    ]}})),
                ),
                Some("ch"),
            ),
        ];

        for (fetcher, channel_id) in cases {
            let err = resolve_site_id(&fetcher, &ctx, channel_id).await.unwrap_err();
            assert!(matches!(err, SheetaError::SiteIdUnavailable(_)));
        }
    }
}
