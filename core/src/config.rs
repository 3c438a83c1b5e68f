//! Client configuration.

use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://www.accountview.net/api/v3";

pub const DEFAULT_USER_AGENT: &str = concat!("accountview-core/", env!("CARGO_PKG_VERSION"));

/// Settings for `AccountViewClient`. Missing keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// Sent as `X-Company` on every request.
    pub company_id: String,
    pub user_agent: String,
    /// Reject error envelopes that carry keys this crate does not know.
    pub disallow_unknown_fields: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            company_id: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            disallow_unknown_fields: false,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str, company_id: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            company_id: company_id.to_string(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `ACCOUNTVIEW_BASE_URL` and
    /// `ACCOUNTVIEW_COMPANY_ID` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("ACCOUNTVIEW_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(company) = std::env::var("ACCOUNTVIEW_COMPANY_ID") {
            config.company_id = company;
        }
        config
    }
}
