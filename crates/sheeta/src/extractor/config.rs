//! Configuration for Sheeta requests.
//!
//! Every field is optional so that a partially filled config (or a loose
//! JSON "extras" object) can be layered over the defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::default::{DEFAULT_ACCEPT_LANGUAGE, DEFAULT_PER_PAGE, DEFAULT_TIMEOUT_SECS, DEFAULT_UA};
use super::utils::{extras_get_str, extras_get_u64};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SheetaConfig {
    /// User agent sent with every request (default: desktop Edge)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Per-request timeout in seconds (default: 20)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Accept-Language header (default: "ja,en-US;q=0.9,en;q=0.8")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_language: Option<String>,
    /// Listing page size; a shorter page ends pagination (default: 100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

impl SheetaConfig {
    /// Reads the config keys out of an extras object. Numbers may be given
    /// either natively or as strings.
    pub fn from_extras(extras: Option<&Value>) -> Self {
        Self {
            user_agent: extras_get_str(extras, "user_agent").map(str::to_owned),
            timeout_secs: extras_get_u64(extras, "timeout_secs"),
            accept_language: extras_get_str(extras, "accept_language").map(str::to_owned),
            per_page: extras_get_u64(extras, "per_page").and_then(|v| u32::try_from(v).ok()),
        }
    }

    /// Fields set on `overlay` replace those on `self`.
    pub fn merge(self, overlay: SheetaConfig) -> Self {
        Self {
            user_agent: overlay.user_agent.or(self.user_agent),
            timeout_secs: overlay.timeout_secs.or(self.timeout_secs),
            accept_language: overlay.accept_language.or(self.accept_language),
            per_page: overlay.per_page.or(self.per_page),
        }
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_UA)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn accept_language(&self) -> &str {
        self.accept_language
            .as_deref()
            .unwrap_or(DEFAULT_ACCEPT_LANGUAGE)
    }

    pub fn per_page(&self) -> usize {
        match self.per_page {
            Some(n) if n > 0 => n as usize,
            _ => DEFAULT_PER_PAGE,
        }
    }
}
