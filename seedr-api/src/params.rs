//! Form and query payloads for each vendor call.
//!
//! Seedr's `resource.php` takes `access_token` and `func` in the query
//! string and everything else as a url-encoded form. Some actions take a
//! JSON array serialized into a single form field:
//!
//! ```text
//! delete_arr=[{"type":"folder","id":123}]
//! archive_arr=[{"type":"folder","id":123}]
//! ```

use crate::config::{DEVICE_CLIENT_ID, PASSWORD_CLIENT_ID};
use crate::error::{Result, SeedrError};

/// Ordered `(name, value)` pairs, fed to reqwest's `.form()` / `.query()`.
pub(crate) type Form = Vec<(&'static str, String)>;

/// Kinds accepted by `func=delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemKind {
    File,
    Folder,
    Torrent,
}

impl ItemKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
            Self::Torrent => "torrent",
        }
    }
}

/// Reject empty (or whitespace-only) values.
pub(crate) fn require<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(SeedrError::invalid(format!("{name} must not be empty")));
    }
    Ok(value)
}

/// Ids embedded in JSON-array parameters must be integers: they are
/// written into the array unquoted.
pub(crate) fn require_numeric<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    let value = require(name, value)?.trim();
    if value.parse::<i64>().is_err() {
        return Err(SeedrError::invalid(format!("{name} must be numeric, got {value:?}")));
    }
    Ok(value)
}

pub(crate) fn password_grant(username: &str, password: &str) -> Result<Form> {
    Ok(vec![
        ("grant_type", "password".into()),
        ("client_id", PASSWORD_CLIENT_ID.into()),
        ("type", "login".into()),
        ("username", require("username", username)?.into()),
        ("password", require("password", password)?.into()),
    ])
}

pub(crate) fn refresh_grant(refresh_token: &str) -> Result<Form> {
    Ok(vec![
        ("grant_type", "refresh_token".into()),
        ("refresh_token", require("refresh token", refresh_token)?.into()),
        ("client_id", PASSWORD_CLIENT_ID.into()),
    ])
}

pub(crate) fn device_code_request() -> Form {
    vec![("client_id", DEVICE_CLIENT_ID.into())]
}

pub(crate) fn device_authorize(device_code: &str) -> Result<Form> {
    Ok(vec![
        ("client_id", DEVICE_CLIENT_ID.into()),
        ("device_code", require("device code", device_code)?.into()),
    ])
}

pub(crate) fn list_contents(folder_id: &str) -> Result<Form> {
    Ok(vec![
        ("content_type", "folder".into()),
        ("content_id", require("folder id", folder_id)?.into()),
    ])
}

/// Form fields of `func=add_torrent`. The torrent file itself, when any,
/// travels as a multipart part next to these.
pub(crate) fn add_torrent(
    magnet: Option<&str>,
    wishlist_id: Option<&str>,
    folder_id: &str,
) -> Result<Form> {
    let mut form = Form::new();
    if let Some(magnet) = magnet {
        form.push(("torrent_magnet", require("magnet link", magnet)?.into()));
    }
    if let Some(id) = wishlist_id {
        form.push(("wishlist_id", require("wishlist id", id)?.into()));
    }
    form.push(("folder_id", require("folder id", folder_id)?.into()));
    Ok(form)
}

pub(crate) fn scan_page(url: &str) -> Result<Form> {
    Ok(vec![("url", require("url", url)?.into())])
}

pub(crate) fn fetch_file(file_id: &str) -> Result<Form> {
    Ok(vec![("folder_file_id", require("file id", file_id)?.into())])
}

pub(crate) fn create_archive(folder_id: &str) -> Result<Form> {
    let id = require_numeric("folder id", folder_id)?;
    Ok(vec![("archive_arr", format!(r#"[{{"type":"folder","id":{id}}}]"#))])
}

pub(crate) fn search_files(query: &str) -> Result<Form> {
    Ok(vec![("search_query", require("query", query)?.into())])
}

pub(crate) fn add_folder(name: &str) -> Result<Form> {
    Ok(vec![("name", require("folder name", name)?.into())])
}

pub(crate) fn rename(kind: ItemKind, id: &str, rename_to: &str) -> Result<Form> {
    let id_field = match kind {
        ItemKind::Folder => "folder_id",
        ItemKind::File | ItemKind::Torrent => "file_id",
    };
    Ok(vec![
        ("rename_to", require("new name", rename_to)?.into()),
        (id_field, require(id_field, id)?.into()),
    ])
}

pub(crate) fn delete_item(kind: ItemKind, id: &str) -> Result<Form> {
    let id = require_numeric("id", id)?;
    let kind = kind.as_str();
    Ok(vec![("delete_arr", format!(r#"[{{"type":"{kind}","id":{id}}}]"#))])
}

pub(crate) fn remove_wishlist(wishlist_id: &str) -> Result<Form> {
    Ok(vec![("id", require("wishlist id", wishlist_id)?.into())])
}

pub(crate) fn change_name(name: &str, password: &str) -> Result<Form> {
    Ok(vec![
        ("setting", "fullname".into()),
        ("password", require("password", password)?.into()),
        ("fullname", require("name", name)?.into()),
    ])
}

pub(crate) fn change_password(old_password: &str, new_password: &str) -> Result<Form> {
    let new_password = require("new password", new_password)?;
    Ok(vec![
        ("setting", "password".into()),
        ("password", require("old password", old_password)?.into()),
        ("new_password", new_password.into()),
        ("new_password_repeat", new_password.into()),
    ])
}
