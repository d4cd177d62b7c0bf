//! Data types for Seedr API responses.
//!
//! Seedr has no published schema, so every model reads only the fields this
//! crate uses and keeps the full payload around: [`ResponseModel::raw`]
//! returns it unchanged for anything not modelled here.
//!
//! Decoding is lenient. The API is inconsistent about types (ids arrive as
//! numbers or strings, flags as booleans or `0`/`1`), so absent or odd
//! fields fall back to defaults instead of failing the call. Timestamps come
//! either as `"2024-01-31 12:00:00"` strings or unix seconds and are exposed
//! as [`NaiveDateTime`] (UTC for unix seconds).

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

/// Common behaviour of response models.
pub trait ResponseModel: Sized {
    /// Decode a model from a vendor JSON payload.
    fn from_value(raw: Value) -> Self;

    /// The unparsed payload this model was built from.
    fn raw(&self) -> &Value;
}

macro_rules! raw_accessor {
    ($($ty:ty),* $(,)?) => {$(
        impl $ty {
            /// The unparsed payload this value was built from.
            pub fn raw(&self) -> &Value {
                &self.raw
            }
        }
    )*};
}

/// A file stored in the account.
#[derive(Debug, Clone)]
pub struct File {
    /// `folder_file_id`, the id used by `fetch_file`, `rename_file` and `delete_file`.
    pub id: u64,
    pub name: String,
    pub size: u64,
    pub folder_id: u64,
    pub hash: Option<String>,
    pub last_updated: Option<NaiveDateTime>,
    pub play_video: bool,
    pub play_audio: bool,
    pub stream_link: Option<String>,
    pub video_codec: Option<String>,
    pub video_width: Option<u64>,
    pub video_height: Option<u64>,
    raw: Value,
}

impl File {
    fn parse(v: Value) -> Self {
        Self {
            id: first_id(&v, &["folder_file_id", "id", "file_id"]),
            name: string(&v["name"]),
            size: uint(&v["size"]),
            folder_id: first_id(&v, &["folder_id", "parent_folder_id"]),
            hash: opt_string(&v["hash"]),
            last_updated: datetime(&v["last_update"]).or_else(|| datetime(&v["last_updated"])),
            play_video: flag(&v["play_video"]),
            play_audio: flag(&v["play_audio"]),
            stream_link: opt_string(&v["stream_link"]),
            video_codec: opt_string(&v["video_codec"]),
            video_width: opt_uint(&v["video_width"]),
            video_height: opt_uint(&v["video_height"]),
            raw: v,
        }
    }
}

/// A folder with its direct children.
///
/// Also the shape of `search_files` results, where `folders`/`files` hold
/// the matches.
#[derive(Debug, Clone)]
pub struct Folder {
    pub id: u64,
    pub name: String,
    /// Path from the root, e.g. `Movies/Big Buck Bunny`.
    pub fullname: String,
    pub size: u64,
    pub parent_id: Option<u64>,
    pub last_update: Option<NaiveDateTime>,
    pub is_shared: bool,
    pub play_audio: bool,
    pub play_video: bool,
    pub folders: Vec<Folder>,
    pub files: Vec<File>,
    pub torrents: Vec<Torrent>,
    raw: Value,
}

impl ResponseModel for Folder {
    fn from_value(v: Value) -> Self {
        let name = string(&v["name"]);
        Self {
            id: first_id(&v, &["id", "folder_id"]),
            fullname: opt_string(&v["fullname"]).unwrap_or_else(|| name.clone()),
            name,
            size: uint(&v["size"]),
            parent_id: opt_uint(&v["parent_id"]).or_else(|| opt_uint(&v["parent"])),
            last_update: datetime(&v["last_update"]).or_else(|| datetime(&v["timestamp"])),
            is_shared: flag(&v["is_shared"]),
            play_audio: flag(&v["play_audio"]),
            play_video: flag(&v["play_video"]),
            folders: list(&v["folders"], Folder::from_value),
            files: list(&v["files"], File::parse),
            torrents: list(&v["torrents"], Torrent::parse),
            raw: v,
        }
    }

    fn raw(&self) -> &Value {
        &self.raw
    }
}

/// A torrent that is still downloading.
#[derive(Debug, Clone)]
pub struct Torrent {
    pub id: u64,
    pub name: String,
    pub size: u64,
    pub hash: String,
    /// Percent complete as sent by the server, e.g. `"42.5"`.
    pub progress: String,
    pub last_update: Option<NaiveDateTime>,
    pub folder: String,
    pub download_rate: u64,
    pub upload_rate: u64,
    pub seeders: u64,
    pub leechers: u64,
    pub warnings: Option<String>,
    pub stopped: bool,
    pub progress_url: Option<String>,
    raw: Value,
}

impl Torrent {
    fn parse(v: Value) -> Self {
        Self {
            id: uint(&v["id"]),
            name: string(&v["name"]),
            size: uint(&v["size"]),
            hash: string(&v["hash"]),
            progress: string(&v["progress"]),
            last_update: datetime(&v["last_update"]),
            folder: string(&v["folder"]),
            download_rate: uint(&v["download_rate"]),
            upload_rate: uint(&v["upload_rate"]),
            seeders: uint(&v["seeders"]),
            leechers: uint(&v["leechers"]),
            warnings: opt_string(&v["warnings"]).filter(|w| !w.is_empty() && w != "[]"),
            stopped: flag(&v["stopped"]),
            progress_url: opt_string(&v["progress_url"]),
            raw: v,
        }
    }
}

/// Result of `list_contents`: the folder plus account-wide storage figures.
#[derive(Debug, Clone)]
pub struct ListContentsResult {
    pub space_used: u64,
    pub space_max: u64,
    pub folder: Folder,
}

impl ResponseModel for ListContentsResult {
    fn from_value(v: Value) -> Self {
        Self {
            space_used: uint(&v["space_used"]),
            space_max: uint(&v["space_max"]),
            folder: Folder::from_value(v),
        }
    }

    fn raw(&self) -> &Value {
        self.folder.raw()
    }
}

/// Preferences from `get_settings`.
#[derive(Debug, Clone)]
pub struct AccountSettings {
    pub allow_remote_access: bool,
    pub site_language: String,
    pub subtitles_language: String,
    pub email_announcements: bool,
    pub email_newsletter: bool,
}

/// Account status from `get_settings`.
#[derive(Debug, Clone)]
pub struct AccountInfo {
    pub username: String,
    pub user_id: u64,
    pub email: String,
    pub premium: bool,
    pub package_id: u64,
    pub package_name: String,
    pub space_used: u64,
    pub space_max: u64,
    pub bandwidth_used: u64,
    pub wishlist: Vec<Value>,
    pub invites: u64,
    pub invites_accepted: u64,
    pub max_invites: u64,
}

#[derive(Debug, Clone)]
pub struct UserSettings {
    pub settings: AccountSettings,
    pub account: AccountInfo,
    pub country: String,
    raw: Value,
}

impl ResponseModel for UserSettings {
    fn from_value(v: Value) -> Self {
        let s = &v["settings"];
        let a = &v["account"];
        Self {
            settings: AccountSettings {
                allow_remote_access: flag(&s["allow_remote_access"]),
                site_language: string(&s["site_language"]),
                subtitles_language: string(&s["subtitles_language"]),
                email_announcements: flag(&s["email_announcements"]),
                email_newsletter: flag(&s["email_newsletter"]),
            },
            account: AccountInfo {
                username: string(&a["username"]),
                user_id: uint(&a["user_id"]),
                email: string(&a["email"]),
                premium: flag(&a["premium"]),
                package_id: uint(&a["package_id"]),
                package_name: string(&a["package_name"]),
                space_used: uint(&a["space_used"]),
                space_max: uint(&a["space_max"]),
                bandwidth_used: uint(&a["bandwidth_used"]),
                wishlist: a["wishlist"].as_array().cloned().unwrap_or_default(),
                invites: uint(&a["invites"]),
                invites_accepted: uint(&a["invites_accepted"]),
                max_invites: uint(&a["max_invites"]),
            },
            country: string(&v["country"]),
            raw: v,
        }
    }

    fn raw(&self) -> &Value {
        &self.raw
    }
}

/// Storage and bandwidth usage, in bytes.
#[derive(Debug, Clone)]
pub struct MemoryBandwidth {
    pub space_used: u64,
    pub space_max: u64,
    pub bandwidth_used: u64,
    pub bandwidth_max: u64,
    pub is_premium: bool,
    raw: Value,
}

impl ResponseModel for MemoryBandwidth {
    fn from_value(v: Value) -> Self {
        Self {
            space_used: uint(&v["space_used"]),
            space_max: uint(&v["space_max"]),
            bandwidth_used: uint(&v["bandwidth_used"]),
            bandwidth_max: uint(&v["bandwidth_max"]),
            is_premium: flag(&v["is_premium"]),
            raw: v,
        }
    }

    fn raw(&self) -> &Value {
        &self.raw
    }
}

/// A device authorized on the account.
#[derive(Debug, Clone)]
pub struct Device {
    pub client_id: String,
    pub client_name: String,
    pub device_code: String,
    pub tk: String,
    raw: Value,
}

impl ResponseModel for Device {
    fn from_value(v: Value) -> Self {
        Self {
            client_id: string(&v["client_id"]),
            client_name: string(&v["client_name"]),
            device_code: string(&v["device_code"]),
            tk: string(&v["tk"]),
            raw: v,
        }
    }

    fn raw(&self) -> &Value {
        &self.raw
    }
}

/// First step of the device flow: show `user_code` and
/// `verification_url` to the user, then authorize with `device_code`.
#[derive(Debug, Clone)]
pub struct DeviceCode {
    pub device_code: String,
    pub user_code: String,
    pub verification_url: String,
    /// Seconds until `device_code` stops being accepted.
    pub expires_in: u64,
    /// Suggested polling interval in seconds.
    pub interval: u64,
    raw: Value,
}

impl ResponseModel for DeviceCode {
    fn from_value(v: Value) -> Self {
        Self {
            device_code: string(&v["device_code"]),
            user_code: string(&v["user_code"]),
            verification_url: opt_string(&v["verification_url"])
                .or_else(|| opt_string(&v["verification_uri"]))
                .unwrap_or_default(),
            expires_in: uint(&v["expires_in"]),
            interval: uint(&v["interval"]),
            raw: v,
        }
    }

    fn raw(&self) -> &Value {
        &self.raw
    }
}

/// Reply of a token refresh.
#[derive(Clone)]
pub struct RefreshTokenResult {
    pub access_token: String,
    pub expires_in: Option<u64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    raw: Value,
}

impl std::fmt::Debug for RefreshTokenResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenResult")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ResponseModel for RefreshTokenResult {
    fn from_value(v: Value) -> Self {
        Self {
            access_token: string(&v["access_token"]),
            expires_in: opt_uint(&v["expires_in"]),
            token_type: opt_string(&v["token_type"]),
            scope: opt_string(&v["scope"]),
            raw: v,
        }
    }

    fn raw(&self) -> &Value {
        &self.raw
    }
}

#[derive(Debug, Clone)]
pub struct AddTorrentResult {
    pub result: bool,
    pub user_torrent_id: u64,
    pub title: String,
    pub torrent_hash: String,
    pub code: Option<i64>,
    raw: Value,
}

impl ResponseModel for AddTorrentResult {
    fn from_value(v: Value) -> Self {
        Self {
            result: flag(&v["result"]),
            user_torrent_id: uint(&v["user_torrent_id"]),
            title: string(&v["title"]),
            torrent_hash: string(&v["torrent_hash"]),
            code: opt_int(&v["code"]),
            raw: v,
        }
    }

    fn raw(&self) -> &Value {
        &self.raw
    }
}

/// A torrent or magnet link found by `scan_page`.
#[derive(Debug, Clone)]
pub struct ScannedTorrent {
    pub title: String,
    pub magnet: String,
    pub hash: String,
    pub size: u64,
    raw: Value,
}

#[derive(Debug, Clone)]
pub struct ScanPageResult {
    pub torrents: Vec<ScannedTorrent>,
    raw: Value,
}

impl ResponseModel for ScanPageResult {
    fn from_value(v: Value) -> Self {
        let torrents = list(&v["torrents"], |t| ScannedTorrent {
            title: string(&t["title"]),
            magnet: string(&t["magnet"]),
            hash: string(&t["hash"]),
            size: uint(&t["size"]),
            raw: t,
        });
        Self { torrents, raw: v }
    }

    fn raw(&self) -> &Value {
        &self.raw
    }
}

/// A temporary download link for one file.
#[derive(Debug, Clone)]
pub struct FetchFileResult {
    pub result: bool,
    pub url: String,
    pub name: String,
    pub size: u64,
    pub code: Option<i64>,
    raw: Value,
}

impl ResponseModel for FetchFileResult {
    fn from_value(v: Value) -> Self {
        Self {
            result: flag(&v["result"]),
            url: string(&v["url"]),
            name: string(&v["name"]),
            size: uint(&v["size"]),
            code: opt_int(&v["code"]),
            raw: v,
        }
    }

    fn raw(&self) -> &Value {
        &self.raw
    }
}

/// A zip download link for a folder.
#[derive(Debug, Clone)]
pub struct CreateArchiveResult {
    pub result: bool,
    pub archive_id: u64,
    pub archive_url: String,
    pub code: Option<i64>,
    raw: Value,
}

impl ResponseModel for CreateArchiveResult {
    fn from_value(v: Value) -> Self {
        Self {
            result: flag(&v["result"]),
            archive_id: uint(&v["archive_id"]),
            archive_url: string(&v["archive_url"]),
            code: opt_int(&v["code"]),
            raw: v,
        }
    }

    fn raw(&self) -> &Value {
        &self.raw
    }
}

/// Bare acknowledgement returned by rename/delete/settings calls.
#[derive(Debug, Clone)]
pub struct ApiResult {
    pub result: bool,
    pub code: Option<i64>,
    raw: Value,
}

impl ResponseModel for ApiResult {
    fn from_value(v: Value) -> Self {
        Self {
            result: flag(&v["result"]),
            code: opt_int(&v["code"]),
            raw: v,
        }
    }

    fn raw(&self) -> &Value {
        &self.raw
    }
}

raw_accessor!(File, Torrent, ScannedTorrent);

/// `devices` array of a `get_devices` reply.
pub(crate) fn parse_devices(v: &Value) -> Vec<Device> {
    list(&v["devices"], Device::from_value)
}

// ── lenient field readers ──

fn list<T>(v: &Value, f: impl Fn(Value) -> T) -> Vec<T> {
    v.as_array()
        .map(|arr| arr.iter().cloned().map(f).collect())
        .unwrap_or_default()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn opt_uint(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn uint(v: &Value) -> u64 {
    opt_uint(v).unwrap_or(0)
}

fn opt_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn first_id(v: &Value, keys: &[&str]) -> u64 {
    keys.iter().find_map(|k| opt_uint(&v[*k])).unwrap_or(0)
}

fn opt_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string(v: &Value) -> String {
    opt_string(v).unwrap_or_default()
}

fn flag(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim(), "1" | "true" | "True"),
        _ => false,
    }
}

fn datetime(v: &Value) -> Option<NaiveDateTime> {
    match v {
        Value::String(s) => NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S").ok(),
        Value::Number(n) => n
            .as_i64()
            .filter(|secs| *secs > 0)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.naive_utc()),
        _ => None,
    }
}
