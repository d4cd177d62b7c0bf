//! Torrent API.
//!
//! Endpoints (all `resource.php`):
//!
//! | func             | form                                               |
//! |------------------|----------------------------------------------------|
//! | `add_torrent`    | `torrent_magnet`, `wishlist_id` or a `torrent_file` part; `folder_id` |
//! | `scan_page`      | `url`                                              |
//! | `delete`         | `delete_arr=[{"type":"torrent","id":42}]`          |
//! | `remove_wishlist`| `id`                                               |
//!
//! `add_torrent` with a file is sent as `multipart/form-data`; everything
//! else is url-encoded. A typical reply:
//!
//! ```json
//! { "result": true, "user_torrent_id": 2047, "title": "ubuntu.iso", "torrent_hash": "..." }
//! ```
//!
//! Rejections come back as `{ "result": false, "code": 37, "type": "invalid_magnet" }`
//! and surface as [`SeedrError::Api`](crate::SeedrError::Api).

use crate::async_client::AsyncSeedrClient;
use crate::client::SeedrClient;
use crate::error::{Result, SeedrError};
use crate::params::{self, Form, ItemKind};
use crate::types::{AddTorrentResult, ApiResult, ResponseModel, ScanPageResult};
use reqwest::{Method, StatusCode, Url};
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_FILE_NAME: &str = "upload.torrent";

/// What to add with `add_torrent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TorrentSource {
    /// A `magnet:?xt=...` link.
    Magnet(String),
    /// A local `.torrent` file, read when the call is made.
    File(PathBuf),
    /// A remote `.torrent` file. It is downloaded by this client, then
    /// uploaded to Seedr.
    Url(String),
    /// `.torrent` contents already in memory.
    Bytes { name: String, data: Vec<u8> },
    /// An entry of the account's wishlist.
    Wishlist(String),
}

/// A torrent file ready to upload.
#[derive(Debug)]
pub(crate) struct TorrentFile {
    pub(crate) name: String,
    pub(crate) data: Vec<u8>,
}

/// The part of a source that still needs I/O before the upload.
enum Pending {
    Nothing,
    Read(PathBuf),
    Download(String),
    Ready(TorrentFile),
}

impl TorrentSource {
    /// Validate the source and split it into form fields and outstanding I/O.
    /// Nothing touches the disk or network here.
    fn plan(self, folder_id: &str) -> Result<(Form, Pending)> {
        let (form, pending) = match self {
            Self::Magnet(magnet) => (
                params::add_torrent(Some(magnet.as_str()), None, folder_id)?,
                Pending::Nothing,
            ),
            Self::Wishlist(id) => (
                params::add_torrent(None, Some(id.as_str()), folder_id)?,
                Pending::Nothing,
            ),
            Self::File(path) => {
                if path.as_os_str().is_empty() {
                    return Err(SeedrError::invalid("torrent file path must not be empty"));
                }
                (params::add_torrent(None, None, folder_id)?, Pending::Read(path))
            }
            Self::Url(url) => {
                params::require("torrent url", &url)?;
                (params::add_torrent(None, None, folder_id)?, Pending::Download(url))
            }
            Self::Bytes { name, data } => {
                let file = TorrentFile::new(name, data)?;
                (params::add_torrent(None, None, folder_id)?, Pending::Ready(file))
            }
        };
        Ok((form, pending))
    }
}

impl TorrentFile {
    fn new(name: String, data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(SeedrError::invalid("torrent file is empty"));
        }
        let name = if name.trim().is_empty() {
            DEFAULT_FILE_NAME.to_owned()
        } else {
            name
        };
        Ok(Self { name, data })
    }

    fn from_path(path: &Path, data: Vec<u8>) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(name, data)
    }

    fn from_url(url: &str, data: Vec<u8>) -> Result<Self> {
        Self::new(name_from_url(url), data)
    }
}

/// Last path segment of a URL, without query or fragment.
fn name_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.path_segments()?.next_back().map(str::to_owned))
        .unwrap_or_default()
}

/// A download that did not succeed is reported with its HTTP status.
fn check_download(url: &str, status: StatusCode) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    Err(SeedrError::Api {
        status: status.as_u16(),
        code: None,
        kind: None,
        message: format!("cannot download {url}: HTTP {}", status.as_u16()),
        payload: None,
    })
}

fn default_folder(folder_id: Option<&str>) -> &str {
    folder_id.unwrap_or("-1")
}

impl SeedrClient {
    /// Add a torrent. `folder_id` defaults to `-1`, the account root.
    pub fn add_torrent(
        &self,
        source: TorrentSource,
        folder_id: Option<&str>,
    ) -> Result<AddTorrentResult> {
        let (form, pending) = source.plan(default_folder(folder_id))?;
        let file = match pending {
            Pending::Nothing => None,
            Pending::Ready(file) => Some(file),
            Pending::Read(path) => {
                debug!(path = %path.display(), "reading torrent file");
                let data = std::fs::read(&path)?;
                Some(TorrentFile::from_path(&path, data)?)
            }
            Pending::Download(url) => {
                debug!(%url, "downloading torrent file");
                let resp = self.http().get(&url).send()?;
                check_download(&url, resp.status())?;
                Some(TorrentFile::from_url(&url, resp.bytes()?.to_vec())?)
            }
        };
        self.resource(Method::POST, "add_torrent", &form, file.as_ref())
            .map(AddTorrentResult::from_value)
    }

    /// List the torrents Seedr finds on a web page.
    pub fn scan_page(&self, url: &str) -> Result<ScanPageResult> {
        self.call(Method::POST, "scan_page", &params::scan_page(url)?)
    }

    pub fn delete_torrent(&self, torrent_id: &str) -> Result<ApiResult> {
        self.call(Method::POST, "delete", &params::delete_item(ItemKind::Torrent, torrent_id)?)
    }

    pub fn delete_wishlist(&self, wishlist_id: &str) -> Result<ApiResult> {
        self.call(Method::POST, "remove_wishlist", &params::remove_wishlist(wishlist_id)?)
    }
}

impl AsyncSeedrClient {
    /// Add a torrent. `folder_id` defaults to `-1`, the account root.
    pub async fn add_torrent(
        &self,
        source: TorrentSource,
        folder_id: Option<&str>,
    ) -> Result<AddTorrentResult> {
        let (form, pending) = source.plan(default_folder(folder_id))?;
        let file = match pending {
            Pending::Nothing => None,
            Pending::Ready(file) => Some(file),
            Pending::Read(path) => {
                debug!(path = %path.display(), "reading torrent file");
                let data = tokio::fs::read(&path).await?;
                Some(TorrentFile::from_path(&path, data)?)
            }
            Pending::Download(url) => {
                debug!(%url, "downloading torrent file");
                let resp = self.http().get(&url).send().await?;
                check_download(&url, resp.status())?;
                Some(TorrentFile::from_url(&url, resp.bytes().await?.to_vec())?)
            }
        };
        self.resource(Method::POST, "add_torrent", &form, file.as_ref())
            .await
            .map(AddTorrentResult::from_value)
    }

    pub async fn scan_page(&self, url: &str) -> Result<ScanPageResult> {
        self.call(Method::POST, "scan_page", &params::scan_page(url)?).await
    }

    pub async fn delete_torrent(&self, torrent_id: &str) -> Result<ApiResult> {
        self.call(Method::POST, "delete", &params::delete_item(ItemKind::Torrent, torrent_id)?)
            .await
    }

    pub async fn delete_wishlist(&self, wishlist_id: &str) -> Result<ApiResult> {
        self.call(Method::POST, "remove_wishlist", &params::remove_wishlist(wishlist_id)?)
            .await
    }
}
