//! Client configuration: vendor endpoints, timeouts, proxy.

use crate::error::{Result, SeedrError};
use std::time::Duration;

const API_URL: &str = "https://www.seedr.cc/api";
const OAUTH_URL: &str = "https://www.seedr.cc/oauth_test";
const USER_AGENT: &str = concat!("seedr-api/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// OAuth client id used by the device-code flow (the Kodi add-on's id).
pub(crate) const DEVICE_CLIENT_ID: &str = "seedr_xbmc";
/// OAuth client id used by the password and refresh-token grants (the
/// browser extension's id).
pub(crate) const PASSWORD_CLIENT_ID: &str = "seedr_chrome";

/// Base URLs of the two Seedr backends.
///
/// | URL                         | Default                            |
/// |-----------------------------|------------------------------------|
/// | [`resource_url`](Self::resource_url)         | `{oauth}/resource.php`  |
/// | [`token_url`](Self::token_url)               | `{oauth}/token.php`     |
/// | [`device_code_url`](Self::device_code_url)   | `{api}/device/code`     |
/// | [`device_authorize_url`](Self::device_authorize_url) | `{api}/device/authorize` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api: String,
    pub oauth: String,
}

impl Endpoints {
    /// Point both backends at `base` (e.g. a local mock server).
    pub fn single(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            api: base.to_owned(),
            oauth: base.to_owned(),
        }
    }

    pub fn resource_url(&self) -> String {
        format!("{}/resource.php", self.oauth)
    }

    pub fn token_url(&self) -> String {
        format!("{}/token.php", self.oauth)
    }

    pub fn device_code_url(&self) -> String {
        format!("{}/device/code", self.api)
    }

    pub fn device_authorize_url(&self) -> String {
        format!("{}/device/authorize", self.api)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api: API_URL.to_owned(),
            oauth: OAUTH_URL.to_owned(),
        }
    }
}

/// Settings shared by [`SeedrClient`](crate::SeedrClient) and
/// [`AsyncSeedrClient`](crate::AsyncSeedrClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoints: Endpoints,
    pub timeout: Duration,
    pub user_agent: String,
    /// Proxy URL applied to all schemes, e.g. `socks5://127.0.0.1:9050`.
    pub proxy: Option<String>,
    pub(crate) blocking_http: Option<reqwest::blocking::Client>,
    pub(crate) async_http: Option<reqwest::Client>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_owned(),
            proxy: None,
            blocking_http: None,
            async_http: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from `SEEDR_API_URL`, `SEEDR_OAUTH_URL`,
    /// `SEEDR_TIMEOUT_SECS` and `SEEDR_PROXY`, defaulting what is unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(api) = lookup("SEEDR_API_URL") {
            config.endpoints.api = api.trim_end_matches('/').to_owned();
        }
        if let Some(oauth) = lookup("SEEDR_OAUTH_URL") {
            config.endpoints.oauth = oauth.trim_end_matches('/').to_owned();
        }
        if let Some(secs) = lookup("SEEDR_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| SeedrError::invalid(format!("SEEDR_TIMEOUT_SECS: {secs:?}")))?;
            config.timeout = Duration::from_secs(secs);
        }
        config.proxy = lookup("SEEDR_PROXY").filter(|p| !p.is_empty());
        Ok(config)
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Use a caller-owned blocking client instead of building one.
    /// Timeout, user agent and proxy settings are then ignored.
    #[must_use]
    pub fn with_blocking_http_client(mut self, http: reqwest::blocking::Client) -> Self {
        self.blocking_http = Some(http);
        self
    }

    /// Use a caller-owned async client instead of building one.
    /// Timeout, user agent and proxy settings are then ignored.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.async_http = Some(http);
        self
    }

    pub(crate) fn blocking_client(&self) -> Result<reqwest::blocking::Client> {
        if let Some(http) = &self.blocking_http {
            return Ok(http.clone());
        }
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.timeout);
        if let Some(proxy) = &self.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(builder.build()?)
    }

    pub(crate) fn async_client(&self) -> Result<reqwest::Client> {
        if let Some(http) = &self.async_http {
            return Ok(http.clone());
        }
        let mut builder = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.timeout);
        if let Some(proxy) = &self.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(builder.build()?)
    }
}
