//! Interpretation of raw HTTP replies.
//!
//! Both clients read the status and body and hand them here, so the rules
//! for what counts as success live in one place:
//!
//! | Reply                                              | Outcome                         |
//! |----------------------------------------------------|---------------------------------|
//! | status 401                                         | [`Reply::Unauthorized`]         |
//! | `{"error": "expired_token" \| "invalid_token"}`    | [`Reply::Unauthorized`]         |
//! | other non-2xx                                      | [`SeedrError::Api`]             |
//! | 2xx, body not JSON                                 | [`SeedrError::Json`]            |
//! | 2xx, `result` present and not `true`               | [`SeedrError::Api`]             |
//! | 2xx, string `error` field                          | [`SeedrError::Api`]             |
//! | 2xx, no `result`, string `type` or failure `code`  | [`SeedrError::Api`]             |
//! | anything else                                      | [`Reply::Success`]              |

use crate::error::{Result, SeedrError};
use serde_json::Value;

const AUTH_ERRORS: [&str; 2] = ["expired_token", "invalid_token"];

#[derive(Debug)]
pub(crate) enum Reply {
    Success(Value),
    /// The access token was refused; a refresh may fix it.
    Unauthorized(Option<Value>),
}

pub(crate) fn classify(status: u16, body: &str) -> Result<Reply> {
    let json = serde_json::from_str::<Value>(body).ok();

    let auth_error = json
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(Value::as_str)
        .is_some_and(|e| AUTH_ERRORS.contains(&e));
    if status == 401 || auth_error {
        return Ok(Reply::Unauthorized(json));
    }

    if !(200..300).contains(&status) {
        let payload =
            json.or_else(|| (!body.is_empty()).then(|| Value::String(body.to_owned())));
        return Err(api_error(status, payload));
    }

    let json = match json {
        Some(json) => json,
        None => serde_json::from_str(body)?,
    };

    if is_failure(&json) {
        return Err(api_error(status, Some(json)));
    }

    Ok(Reply::Success(json))
}

/// A 2xx body that still reports an error.
///
/// Without `result`, the vendor signals failure with a string `type` or a
/// `code` other than 0 or 200, e.g. `{"code": 37, "type": "invalid_magnet"}`.
fn is_failure(json: &Value) -> bool {
    if json.get("error").is_some_and(Value::is_string) {
        return true;
    }
    match json.get("result") {
        Some(result) => result != &Value::Bool(true),
        None => {
            json.get("type").is_some_and(Value::is_string)
                || json.get("code").and_then(code_of).is_some_and(|c| c != 0 && c != 200)
        }
    }
}

/// Vendor codes come as numbers or numeric strings.
fn code_of(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Build [`SeedrError::Api`] from whatever the vendor sent.
pub(crate) fn api_error(status: u16, payload: Option<Value>) -> SeedrError {
    let field = |key: &str| payload.as_ref().and_then(|p| p.get(key));

    let code = field("code").and_then(code_of);
    let kind = field("type")
        .or_else(|| field("error"))
        .and_then(Value::as_str)
        .map(String::from);
    let message = ["error_description", "message", "error", "type"]
        .into_iter()
        .find_map(|k| field(k).and_then(Value::as_str))
        .or_else(|| payload.as_ref().and_then(Value::as_str))
        .map_or_else(|| format!("HTTP {status}"), String::from);

    SeedrError::Api {
        status,
        code,
        kind,
        message,
        payload,
    }
}
