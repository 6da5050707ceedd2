use serde::Deserialize;

use commons_core::config::Config;

use crate::infra::luma::LumaConfig;
use crate::infra::mailer::SmtpConfig;

/// Community service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct CommunityConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HMAC secret for signing JWT access and refresh tokens.
    pub jwt_secret: String,
    /// Cookie domain attribute (root domain, e.g. "example.com").
    pub cookie_domain: String,
    /// Public origin of the web app, used in mailed links.
    pub public_url: String,
    /// TCP port to listen on. Env var: `COMMUNITY_PORT`.
    #[serde(default = "default_port")]
    pub community_port: u16,
    /// Limit for non-streaming requests.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    pub luma_api_key: String,
    #[serde(default = "default_luma_base_url")]
    pub luma_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub luma_timeout_secs: u64,
    #[serde(default = "default_luma_max_retries")]
    pub luma_max_retries: u32,

    /// Mail goes to the log when unset.
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    /// Defaults to `no-reply@{cookie_domain}`.
    pub smtp_from: Option<String>,
}

fn default_port() -> u16 {
    3120
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_luma_base_url() -> String {
    "https://api.lu.ma".to_owned()
}

fn default_luma_max_retries() -> u32 {
    3
}

fn default_smtp_port() -> u16 {
    587
}

impl Config for CommunityConfig {}

impl CommunityConfig {
    pub fn luma_config(&self) -> LumaConfig {
        LumaConfig {
            base_url: self.luma_base_url.clone(),
            api_key: self.luma_api_key.clone(),
            max_retries: self.luma_max_retries,
            timeout_secs: self.luma_timeout_secs,
            backoff_base_ms: 1000,
        }
    }

    pub fn smtp_config(&self) -> Option<SmtpConfig> {
        let host = self.smtp_host.clone().filter(|h| !h.is_empty())?;
        Some(SmtpConfig {
            host,
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            from: self
                .smtp_from
                .clone()
                .unwrap_or_else(|| format!("no-reply@{}", self.cookie_domain)),
        })
    }
}
