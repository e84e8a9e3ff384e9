use std::sync::{Arc, OnceLock};

use reqwest::Client;
use rustls::{ClientConfig, crypto::aws_lc_rs};
use rustls_platform_verifier::BuilderVerifierExt;
use tracing::debug;

use super::config::SheetaConfig;
use super::error::{Result, SheetaError};
use super::factory::SheetaFactory;
use super::fetch::ReqwestFetcher;

pub(crate) const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36 Edg/121.0.0.0";
pub(crate) const DEFAULT_ACCEPT_LANGUAGE: &str = "ja,en-US;q=0.9,en;q=0.8";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub(crate) const DEFAULT_PER_PAGE: usize = 100;

/// Installs aws-lc-rs as the process-wide rustls provider, needed by any
/// `reqwest::Client` built without a preconfigured TLS config.
pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = aws_lc_rs::default_provider().install_default() {
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Builds the HTTP client used for all Sheeta API calls.
pub fn default_client(config: &SheetaConfig) -> Result<Client> {
    install_rustls_provider();

    let provider = Arc::new(aws_lc_rs::default_provider());
    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| SheetaError::Client(e.to_string()))?
        .with_platform_verifier()
        .map_err(|e| SheetaError::Client(e.to_string()))?
        .with_no_client_auth();

    Client::builder()
        .use_preconfigured_tls(tls_config)
        .timeout(config.timeout())
        .build()
        .map_err(|e| SheetaError::Client(e.to_string()))
}

/// Returns a factory backed by a real HTTP client.
pub fn default_factory(config: SheetaConfig) -> Result<SheetaFactory> {
    let client = default_client(&config)?;
    Ok(SheetaFactory::new(
        Arc::new(ReqwestFetcher::new(client)),
        config,
    ))
}
