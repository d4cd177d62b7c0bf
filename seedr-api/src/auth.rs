//! Grant bookkeeping shared by the blocking and async clients.
//!
//! Seedr speaks two OAuth dialects:
//!
//! - `POST {oauth}/token.php` with `grant_type=password` or
//!   `grant_type=refresh_token` (client id `seedr_chrome`)
//! - `GET {api}/device/authorize?client_id=seedr_xbmc&device_code=...`,
//!   which keeps answering with fresh access tokens for as long as the
//!   device stays authorized
//!
//! Both answer with:
//!
//! ```json
//! { "access_token": "...", "refresh_token": "...", "expires_in": 3600 }
//! ```
//!
//! `refresh_token` is absent from device-flow replies.

use crate::error::{Result, SeedrError};
use crate::params::{self, Form};
use crate::token::Token;
use serde_json::Value;

/// How to mint a new access token for a given [`Token`].
#[derive(Debug)]
pub(crate) enum RefreshRequest {
    /// POST this form to the token endpoint.
    RefreshGrant(Form),
    /// GET the device authorize endpoint with this query.
    DeviceCode(Form),
}

pub(crate) fn refresh_request(token: &Token) -> Result<RefreshRequest> {
    if let Some(rt) = token.refresh_token() {
        return Ok(RefreshRequest::RefreshGrant(params::refresh_grant(rt)?));
    }
    if let Some(dc) = token.device_code() {
        return Ok(RefreshRequest::DeviceCode(params::device_authorize(dc)?));
    }
    Err(SeedrError::auth(
        "session expired and the token has no refresh token or device code",
    ))
}

/// Build the token handed out by a login or device authorization.
pub(crate) fn token_from_grant(reply: &Value, device_code: Option<&str>) -> Result<Token> {
    let mut token = Token::new(access_token(reply)?);
    if let Some(rt) = reply.get("refresh_token").and_then(Value::as_str) {
        token = token.with_refresh_token(rt);
    }
    if let Some(dc) = device_code {
        token = token.with_device_code(dc);
    }
    if let Some(secs) = expires_in(reply) {
        token = token.with_expires_in(secs);
    }
    Ok(token)
}

/// Build the successor of `previous` from a refresh reply. The refresh
/// token and device code carry over unless the server rotated them.
pub(crate) fn refreshed_token(previous: &Token, reply: &Value) -> Result<Token> {
    let mut token = Token::new(access_token(reply)?);
    let rotated = reply.get("refresh_token").and_then(Value::as_str);
    if let Some(rt) = rotated.or(previous.refresh_token()) {
        token = token.with_refresh_token(rt);
    }
    if let Some(dc) = previous.device_code() {
        token = token.with_device_code(dc);
    }
    if let Some(secs) = expires_in(reply) {
        token = token.with_expires_in(secs);
    }
    Ok(token)
}

/// Re-label a failed grant call as an authentication failure, keeping the
/// vendor payload. Server errors (5xx) and transport errors stay what they are.
pub(crate) fn into_auth_error(err: SeedrError, context: &str) -> SeedrError {
    match err {
        SeedrError::Api { status, .. } if status >= 500 => err,
        SeedrError::Api {
            message, payload, ..
        } => SeedrError::Authentication {
            message: format!("{context}: {message}"),
            payload,
        },
        SeedrError::Authentication { message, payload } => SeedrError::Authentication {
            message: format!("{context}: {message}"),
            payload,
        },
        other => other,
    }
}

fn access_token(reply: &Value) -> Result<&str> {
    reply
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SeedrError::Authentication {
            message: "response did not contain an access token".into(),
            payload: Some(reply.clone()),
        })
}

fn expires_in(reply: &Value) -> Option<i64> {
    let v = reply.get("expires_in")?;
    v.as_i64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}
