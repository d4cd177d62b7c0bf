//! Authentication token and its serialized forms.
//!
//! A [`Token`] is what a caller persists between sessions. Three encodings
//! are supported and all of them round-trip losslessly:
//!
//! | Encoding | Produce          | Consume              |
//! |----------|------------------|----------------------|
//! | JSON     | [`Token::to_json`]   | [`Token::from_json`]   |
//! | Base64   | [`Token::to_base64`] | [`Token::from_base64`] |
//! | Map      | [`Token::to_map`]    | [`Token::from_map`]    |
//!
//! The JSON form omits absent fields:
//!
//! ```json
//! { "access_token": "abc", "refresh_token": "def", "expires_at": 1767225600 }
//! ```
//!
//! The Base64 form is the standard, padded encoding of that JSON text.

use crate::error::TokenError;
use base64::{Engine, engine::general_purpose::STANDARD as B64};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Credentials for one Seedr session.
///
/// Immutable: a refresh produces a new `Token` rather than editing this one.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Token {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    device_code: Option<String>,
    /// Unix timestamp (seconds) after which `access_token` is no longer valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<i64>,
}

impl Token {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            device_code: None,
            expires_at: None,
        }
    }

    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    #[must_use]
    pub fn with_device_code(mut self, device_code: impl Into<String>) -> Self {
        self.device_code = Some(device_code.into());
        self
    }

    #[must_use]
    pub fn with_expires_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set the expiry to `seconds` from now.
    #[must_use]
    pub fn with_expires_in(self, seconds: i64) -> Self {
        let at = Utc::now().timestamp().saturating_add(seconds);
        self.with_expires_at(at)
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn device_code(&self) -> Option<&str> {
        self.device_code.as_deref()
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    /// Whether the stored expiry has passed. Tokens without an expiry
    /// never report expired; the server's answer decides for them.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now().timestamp())
    }

    /// Whether the token carries anything that can mint a new access token.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some() || self.device_code.is_some()
    }

    pub fn to_json(&self) -> String {
        // A struct of strings and integers always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, TokenError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_base64(&self) -> String {
        B64.encode(self.to_json())
    }

    pub fn from_base64(encoded: &str) -> Result<Self, TokenError> {
        let bytes = B64.decode(encoded.trim())?;
        let json = String::from_utf8(bytes)?;
        Self::from_json(&json)
    }

    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("access_token".into(), self.access_token.clone().into());
        if let Some(rt) = &self.refresh_token {
            map.insert("refresh_token".into(), rt.clone().into());
        }
        if let Some(dc) = &self.device_code {
            map.insert("device_code".into(), dc.clone().into());
        }
        if let Some(at) = self.expires_at {
            map.insert("expires_at".into(), at.into());
        }
        map
    }

    pub fn from_map(map: Map<String, Value>) -> Result<Self, TokenError> {
        Ok(serde_json::from_value(Value::Object(map))?)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &Masked(Some(self.access_token.as_str())))
            .field("refresh_token", &Masked(self.refresh_token.as_deref()))
            .field("device_code", &Masked(self.device_code.as_deref()))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

struct Masked<'a>(Option<&'a str>);

impl fmt::Debug for Masked<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => f.write_str("None"),
            Some(s) => {
                let head: String = s.chars().take(5).collect();
                write!(f, "{head}****")
            }
        }
    }
}
