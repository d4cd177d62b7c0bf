//! Async HTTP client for the Seedr API.
//!
//! Same surface and wire format as [`SeedrClient`](crate::SeedrClient), on
//! top of [`reqwest::Client`] and tokio. One client can be shared by many
//! tasks (`Arc<AsyncSeedrClient>`); concurrent calls that all hit an expired
//! token trigger a single refresh, and the others reuse its result.

use crate::auth::{self, RefreshRequest};
use crate::callback::TokenCallback;
use crate::config::{ClientConfig, Endpoints};
use crate::error::{Result, SeedrError};
use crate::params::{self, Form};
use crate::response::{self, Reply};
use crate::token::Token;
use crate::torrents::TorrentFile;
use crate::types::{DeviceCode, RefreshTokenResult, ResponseModel};
use reqwest::{Client, Method, multipart};
use serde_json::Value;
use std::future::Future;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Async client for the Seedr API.
///
/// ```no_run
/// use seedr_api::{AsyncSeedrClient, ClientConfig};
///
/// # async fn run() -> seedr_api::Result<()> {
/// let config = ClientConfig::default();
/// let client = AsyncSeedrClient::from_password("me@example.com", "hunter2", config)
///     .await?
///     .on_token_refresh_async(|token| async move {
///         tokio::fs::write("token.json", token.to_json()).await.ok();
///     });
/// let root = client.list_contents("0").await?;
/// for folder in &root.folder.folders {
///     println!("{}", folder.name);
/// }
/// # Ok(())
/// # }
/// ```
pub struct AsyncSeedrClient {
    http: Client,
    endpoints: Endpoints,
    token: RwLock<Token>,
    refresh_gate: Mutex<()>,
    on_token_refresh: Option<TokenCallback>,
}

impl AsyncSeedrClient {
    /// Wrap an existing token. No request is made.
    pub fn new(token: Token, config: ClientConfig) -> Result<Self> {
        let http = config.async_client()?;
        Ok(Self::assemble(http, config.endpoints, token))
    }

    pub async fn from_password(
        username: &str,
        password: &str,
        config: ClientConfig,
    ) -> Result<Self> {
        let form = params::password_grant(username, password)?;
        let http = config.async_client()?;
        let reply = grant(&http, Method::POST, &config.endpoints.token_url(), &[], &form)
            .await
            .map_err(|e| auth::into_auth_error(e, "login rejected"))?;
        let token = auth::token_from_grant(&reply, None)?;
        info!("logged in with password");
        Ok(Self::assemble(http, config.endpoints, token))
    }

    pub async fn from_device_code(device_code: &str, config: ClientConfig) -> Result<Self> {
        let query = params::device_authorize(device_code)?;
        let http = config.async_client()?;
        let reply = grant(&http, Method::GET, &config.endpoints.device_authorize_url(), &query, &[])
            .await
            .map_err(|e| auth::into_auth_error(e, "device authorization rejected"))?;
        let token = auth::token_from_grant(&reply, Some(device_code))?;
        info!("authorized with device code");
        Ok(Self::assemble(http, config.endpoints, token))
    }

    pub async fn from_refresh_token(refresh_token: &str, config: ClientConfig) -> Result<Self> {
        let form = params::refresh_grant(refresh_token)?;
        let http = config.async_client()?;
        let reply = grant(&http, Method::POST, &config.endpoints.token_url(), &[], &form)
            .await
            .map_err(|e| auth::into_auth_error(e, "refresh token rejected"))?;
        let previous = Token::new("").with_refresh_token(refresh_token);
        let token = auth::refreshed_token(&previous, &reply)?;
        info!("session restored from refresh token");
        Ok(Self::assemble(http, config.endpoints, token))
    }

    pub async fn get_device_code(config: &ClientConfig) -> Result<DeviceCode> {
        let http = config.async_client()?;
        let query = params::device_code_request();
        let url = config.endpoints.device_code_url();
        let reply = grant(&http, Method::GET, &url, &query, &[]).await?;
        Ok(DeviceCode::from_value(reply))
    }

    /// Register a blocking callback. It runs on tokio's blocking pool, so
    /// slow work in it (disk writes, keyring access) does not stall the
    /// runtime.
    #[must_use]
    pub fn on_token_refresh<F>(self, f: F) -> Self
    where
        F: Fn(Token) + Send + Sync + 'static,
    {
        self.with_token_callback(TokenCallback::from_sync(f))
    }

    /// Register an async callback; its future is awaited in place.
    #[must_use]
    pub fn on_token_refresh_async<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Token) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.with_token_callback(TokenCallback::from_async(f))
    }

    #[must_use]
    pub fn with_token_callback(mut self, callback: TokenCallback) -> Self {
        self.on_token_refresh = Some(callback);
        self
    }

    pub async fn token(&self) -> Token {
        self.token.read().await.clone()
    }

    pub async fn refresh_token(&self) -> Result<RefreshTokenResult> {
        let _gate = self.refresh_gate.lock().await;
        let current = self.token().await;
        let (_, result) = self.perform_refresh(&current).await?;
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
            token: RwLock::new(token),
            refresh_gate: Mutex::new(()),
            on_token_refresh: None,
        }
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) async fn call<T: ResponseModel>(
        &self,
        method: Method,
        func: &str,
        form: &Form,
    ) -> Result<T> {
        self.resource(method, func, form, None).await.map(T::from_value)
    }

    pub(crate) async fn resource(
        &self,
        method: Method,
        func: &str,
        form: &Form,
        file: Option<&TorrentFile>,
    ) -> Result<Value> {
        let url = self.endpoints.resource_url();
        let mut token = self.token().await;
        let mut refreshed = false;

        if token.is_expired() && token.can_refresh() {
            debug!(func, "stored token expired, refreshing first");
            token = self.refresh_after(&token).await?;
            refreshed = true;
        }

        loop {
            debug!(%method, func, "seedr request");
            let query = vec![
                ("access_token", token.access_token().to_owned()),
                ("func", func.to_owned()),
            ];
            match send(&self.http, &method, &url, &query, form, file).await? {
                Reply::Success(json) => return Ok(json),
                Reply::Unauthorized(payload) if refreshed => {
                    return Err(SeedrError::Authentication {
                        message: "access token rejected after refresh".into(),
                        payload,
                    });
                }
                Reply::Unauthorized(_) => {
                    warn!(func, "access token rejected, refreshing");
                    token = self.refresh_after(&token).await?;
                    refreshed = true;
                }
            }
        }
    }

    /// Wait for any refresh in flight; refresh only if the stored token is
    /// still the one that was rejected.
    async fn refresh_after(&self, stale: &Token) -> Result<Token> {
        let _gate = self.refresh_gate.lock().await;
        let current = self.token().await;
        if current.access_token() != stale.access_token() {
            debug!("token already refreshed by another task");
            return Ok(current);
        }
        self.perform_refresh(&current).await.map(|(token, _)| token)
    }

    async fn perform_refresh(&self, current: &Token) -> Result<(Token, RefreshTokenResult)> {
        let reply = match auth::refresh_request(current)? {
            RefreshRequest::RefreshGrant(form) => {
                grant(&self.http, Method::POST, &self.endpoints.token_url(), &[], &form).await
            }
            RefreshRequest::DeviceCode(query) => {
                grant(
                    &self.http,
                    Method::GET,
                    &self.endpoints.device_authorize_url(),
                    &query,
                    &[],
                )
                .await
            }
        }
        .map_err(|e| auth::into_auth_error(e, "token refresh rejected"))?;

        let token = auth::refreshed_token(current, &reply)?;
        *self.token.write().await = token.clone();
        info!(expires_at = ?token.expires_at(), "access token refreshed");

        if let Some(callback) = &self.on_token_refresh {
            callback.invoke(token.clone()).await;
        }
        Ok((token, RefreshTokenResult::from_value(reply)))
    }
}

async fn grant(
    http: &Client,
    method: Method,
    url: &str,
    query: &[(&str, String)],
    form: &[(&str, String)],
) -> Result<Value> {
    match send(http, &method, url, query, form, None).await? {
        Reply::Success(json) => Ok(json),
        Reply::Unauthorized(payload) => Err(SeedrError::Authentication {
            message: "credentials rejected".into(),
            payload,
        }),
    }
}

async fn send(
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

    let resp = req.send().await?;
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    response::classify(status, &body)
}
