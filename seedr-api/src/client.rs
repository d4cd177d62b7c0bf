//! Blocking HTTP client for the Seedr API.
//!
//! Every account action is a call to `resource.php`:
//!
//! ```text
//! POST https://www.seedr.cc/oauth_test/resource.php?access_token=<token>&func=<action>
//! Content-Type: application/x-www-form-urlencoded
//!
//! <action-specific form fields>
//! ```
//!
//! The server answers with JSON. Replies are classified into success,
//! authorization failure or [`SeedrError::Api`].
//!
//! # Expired tokens
//!
//! When a call is refused with an authorization failure, the client
//! refreshes the token once, stores it, fires the refresh callback and
//! retries the call once. A second refusal is returned as
//! [`SeedrError::Authentication`].

use crate::auth::{self, RefreshRequest};
use crate::callback::TokenCallback;
use crate::config::{ClientConfig, Endpoints};
use crate::error::{Result, SeedrError};
use crate::params::{self, Form};
use crate::response::{self, Reply};
use crate::token::Token;
use crate::torrents::TorrentFile;
use crate::types::{DeviceCode, RefreshTokenResult, ResponseModel};
use reqwest::Method;
use reqwest::blocking::{Client, multipart};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Blocking client for the Seedr API.
///
/// Holds its own [`reqwest::blocking::Client`], released when the
/// `SeedrClient` is dropped or [`close`](Self::close)d. API methods are
/// implemented in separate modules (`account`, `files`, `torrents`) as
/// `impl SeedrClient` blocks.
///
/// ```no_run
/// use seedr_api::{ClientConfig, SeedrClient, Token};
///
/// let token = Token::from_json(r#"{"access_token":"...","refresh_token":"..."}"#)?;
/// let client = SeedrClient::new(token, ClientConfig::default())?
///     .on_token_refresh(|t| println!("new token: {}", t.to_base64()));
/// let settings = client.get_settings()?;
/// println!("Hello, {}", settings.account.username);
/// # Ok::<(), seedr_api::SeedrError>(())
/// ```
pub struct SeedrClient {
    http: Client,
    endpoints: Endpoints,
    token: Mutex<Token>,
    /// Held for the whole refresh cycle, so refreshes never overlap.
    refresh_gate: Mutex<()>,
    on_token_refresh: Option<TokenCallback>,
}

impl SeedrClient {
    /// Wrap an existing token. No request is made.
    pub fn new(token: Token, config: ClientConfig) -> Result<Self> {
        let http = config.blocking_client()?;
        Ok(Self::assemble(http, config.endpoints, token))
    }

    /// Log in with email and password.
    pub fn from_password(username: &str, password: &str, config: ClientConfig) -> Result<Self> {
        let form = params::password_grant(username, password)?;
        let http = config.blocking_client()?;
        let reply = grant(&http, Method::POST, &config.endpoints.token_url(), &[], &form)
            .map_err(|e| auth::into_auth_error(e, "login rejected"))?;
        let token = auth::token_from_grant(&reply, None)?;
        info!("logged in with password");
        Ok(Self::assemble(http, config.endpoints, token))
    }

    /// Authorize with a device code from [`get_device_code`](Self::get_device_code),
    /// after the user approved it in the browser.
    pub fn from_device_code(device_code: &str, config: ClientConfig) -> Result<Self> {
        let query = params::device_authorize(device_code)?;
        let http = config.blocking_client()?;
        let reply = grant(&http, Method::GET, &config.endpoints.device_authorize_url(), &query, &[])
            .map_err(|e| auth::into_auth_error(e, "device authorization rejected"))?;
        let token = auth::token_from_grant(&reply, Some(device_code))?;
        info!("authorized with device code");
        Ok(Self::assemble(http, config.endpoints, token))
    }

    /// Start a session from a stored refresh token.
    pub fn from_refresh_token(refresh_token: &str, config: ClientConfig) -> Result<Self> {
        let form = params::refresh_grant(refresh_token)?;
        let http = config.blocking_client()?;
        let reply = grant(&http, Method::POST, &config.endpoints.token_url(), &[], &form)
            .map_err(|e| auth::into_auth_error(e, "refresh token rejected"))?;
        let previous = Token::new("").with_refresh_token(refresh_token);
        let token = auth::refreshed_token(&previous, &reply)?;
        info!("session restored from refresh token");
        Ok(Self::assemble(http, config.endpoints, token))
    }

    /// Request a device and user code; the first step of the device flow.
    pub fn get_device_code(config: &ClientConfig) -> Result<DeviceCode> {
        let http = config.blocking_client()?;
        let query = params::device_code_request();
        let reply = grant(&http, Method::GET, &config.endpoints.device_code_url(), &query, &[])?;
        Ok(DeviceCode::from_value(reply))
    }

    /// Register a callback that receives every refreshed token.
    #[must_use]
    pub fn on_token_refresh<F>(self, f: F) -> Self
    where
        F: Fn(Token) + Send + Sync + 'static,
    {
        self.with_token_callback(TokenCallback::from_sync(f))
    }

    #[must_use]
    pub fn with_token_callback(mut self, callback: TokenCallback) -> Self {
        self.on_token_refresh = Some(callback);
        self
    }

    /// The token currently in use.
    pub fn token(&self) -> Token {
        self.lock_token().clone()
    }

    /// Refresh the access token now instead of waiting for it to expire.
    pub fn refresh_token(&self) -> Result<RefreshTokenResult> {
        let _gate = self.refresh_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.token();
        let (_, result) = self.perform_refresh(&current)?;
        Ok(result)
    }

    /// Release the connection pool. Dropping the client does the same.
    pub fn close(self) {
        drop(self);
    }

    fn assemble(http: Client, endpoints: Endpoints, token: Token) -> Self {
        Self {
            http,
            endpoints,
            token: Mutex::new(token),
            refresh_gate: Mutex::new(()),
            on_token_refresh: None,
        }
    }

    fn lock_token(&self) -> MutexGuard<'_, Token> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Call `resource.php?func=<func>` with a url-encoded form and decode
    /// the reply into `T`.
    pub(crate) fn call<T: ResponseModel>(
        &self,
        method: Method,
        func: &str,
        form: &Form,
    ) -> Result<T> {
        self.resource(method, func, form, None).map(T::from_value)
    }

    /// Send an authenticated `resource.php` request, refreshing the token
    /// at most once.
    pub(crate) fn resource(
        &self,
        method: Method,
        func: &str,
        form: &Form,
        file: Option<&TorrentFile>,
    ) -> Result<Value> {
        let url = self.endpoints.resource_url();
        let mut token = self.token();
        let mut refreshed = false;

        if token.is_expired() && token.can_refresh() {
            debug!(func, "stored token expired, refreshing first");
            token = self.refresh_after(&token)?;
            refreshed = true;
        }

        loop {
            debug!(%method, func, "seedr request");
            let query = vec![
                ("access_token", token.access_token().to_owned()),
                ("func", func.to_owned()),
            ];
            match send(&self.http, &method, &url, &query, form, file)? {
                Reply::Success(json) => return Ok(json),
                Reply::Unauthorized(payload) if refreshed => {
                    return Err(SeedrError::Authentication {
                        message: "access token rejected after refresh".into(),
                        payload,
                    });
                }
                Reply::Unauthorized(_) => {
                    warn!(func, "access token rejected, refreshing");
                    token = self.refresh_after(&token)?;
                    refreshed = true;
                }
            }
        }
    }

    /// Refresh unless someone else already replaced `stale`.
    fn refresh_after(&self, stale: &Token) -> Result<Token> {
        let _gate = self.refresh_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.token();
        if current.access_token() != stale.access_token() {
            return Ok(current);
        }
        self.perform_refresh(&current).map(|(token, _)| token)
    }

    /// Exchange the refresh credential, store the new token, then notify.
    /// Callers hold `refresh_gate`.
    fn perform_refresh(&self, current: &Token) -> Result<(Token, RefreshTokenResult)> {
        let reply = match auth::refresh_request(current)? {
            RefreshRequest::RefreshGrant(form) => {
                grant(&self.http, Method::POST, &self.endpoints.token_url(), &[], &form)
            }
            RefreshRequest::DeviceCode(query) => grant(
                &self.http,
                Method::GET,
                &self.endpoints.device_authorize_url(),
                &query,
                &[],
            ),
        }
        .map_err(|e| auth::into_auth_error(e, "token refresh rejected"))?;

        let token = auth::refreshed_token(current, &reply)?;
        *self.lock_token() = token.clone();
        info!(expires_at = ?token.expires_at(), "access token refreshed");

        if let Some(callback) = &self.on_token_refresh {
            callback.call_blocking(token.clone());
        }
        Ok((token, RefreshTokenResult::from_value(reply)))
    }
}

/// One unauthenticated call to a grant endpoint.
fn grant(
    http: &Client,
    method: Method,
    url: &str,
    query: &[(&str, String)],
    form: &[(&str, String)],
) -> Result<Value> {
    match send(http, &method, url, query, form, None)? {
        Reply::Success(json) => Ok(json),
        Reply::Unauthorized(payload) => Err(SeedrError::Authentication {
            message: "credentials rejected".into(),
            payload,
        }),
    }
}

fn send(
    http: &Client,
    method: &Method,
    url: &str,
    query: &[(&str, String)],
    form: &[(&str, String)],
    file: Option<&TorrentFile>,
) -> Result<Reply> {
    let mut req = http.request(method.clone(), url).query(query);
    if let Some(file) = file {
        let mut parts = multipart::Form::new();
        for (name, value) in form {
            parts = parts.text((*name).to_owned(), value.clone());
        }
        let part = multipart::Part::bytes(file.data.clone()).file_name(file.name.clone());
        req = req.multipart(parts.part("torrent_file", part));
    } else if !form.is_empty() {
        req = req.form(form);
    }

    let resp = req.send()?;
    let status = resp.status().as_u16();
    let body = resp.text()?;
    response::classify(status, &body)
}
