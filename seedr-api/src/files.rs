//! Folder and file API.
//!
//! | func                   | form                                          |
//! |------------------------|-----------------------------------------------|
//! | `list_contents`        | `content_type=folder`, `content_id`           |
//! | `fetch_file`           | `folder_file_id`                              |
//! | `create_empty_archive` | `archive_arr=[{"type":"folder","id":123}]`    |
//! | `search_files`         | `search_query`                                |
//! | `add_folder`           | `name`                                        |
//! | `rename`               | `rename_to`, `file_id` or `folder_id`         |
//! | `delete`               | `delete_arr=[{"type":"file","id":123}]`       |
//!
//! `list_contents` with `content_id=0` lists the root folder:
//!
//! ```json
//! {
//!   "space_used": 1048576, "space_max": 2147483648,
//!   "id": 0, "name": "", "parent": -1,
//!   "folders": [
//!     { "id": 12, "name": "Movies", "size": 1048576, "last_update": "2024-01-02 10:00:00" }
//!   ],
//!   "files": [],
//!   "torrents": []
//! }
//! ```

use crate::async_client::AsyncSeedrClient;
use crate::client::SeedrClient;
use crate::error::Result;
use crate::params::{self, ItemKind};
use crate::types::{ApiResult, CreateArchiveResult, FetchFileResult, Folder, ListContentsResult};
use reqwest::Method;

impl SeedrClient {
    /// List a folder. `"0"` is the root.
    pub fn list_contents(&self, folder_id: &str) -> Result<ListContentsResult> {
        self.call(Method::POST, "list_contents", &params::list_contents(folder_id)?)
    }

    /// Get a download link for a file.
    pub fn fetch_file(&self, file_id: &str) -> Result<FetchFileResult> {
        self.call(Method::POST, "fetch_file", &params::fetch_file(file_id)?)
    }

    /// Start building a zip of a folder.
    pub fn create_archive(&self, folder_id: &str) -> Result<CreateArchiveResult> {
        self.call(Method::POST, "create_empty_archive", &params::create_archive(folder_id)?)
    }

    /// Search the account. Matches come back as a synthetic folder.
    pub fn search_files(&self, query: &str) -> Result<Folder> {
        self.call(Method::POST, "search_files", &params::search_files(query)?)
    }

    pub fn add_folder(&self, name: &str) -> Result<ApiResult> {
        self.call(Method::POST, "add_folder", &params::add_folder(name)?)
    }

    pub fn rename_file(&self, file_id: &str, rename_to: &str) -> Result<ApiResult> {
        self.call(Method::POST, "rename", &params::rename(ItemKind::File, file_id, rename_to)?)
    }

    pub fn rename_folder(&self, folder_id: &str, rename_to: &str) -> Result<ApiResult> {
        self.call(Method::POST, "rename", &params::rename(ItemKind::Folder, folder_id, rename_to)?)
    }

    pub fn delete_file(&self, file_id: &str) -> Result<ApiResult> {
        self.call(Method::POST, "delete", &params::delete_item(ItemKind::File, file_id)?)
    }

    pub fn delete_folder(&self, folder_id: &str) -> Result<ApiResult> {
        self.call(Method::POST, "delete", &params::delete_item(ItemKind::Folder, folder_id)?)
    }
}

impl AsyncSeedrClient {
    pub async fn list_contents(&self, folder_id: &str) -> Result<ListContentsResult> {
        self.call(Method::POST, "list_contents", &params::list_contents(folder_id)?)
            .await
    }

    pub async fn fetch_file(&self, file_id: &str) -> Result<FetchFileResult> {
        self.call(Method::POST, "fetch_file", &params::fetch_file(file_id)?)
            .await
    }

    pub async fn create_archive(&self, folder_id: &str) -> Result<CreateArchiveResult> {
        self.call(Method::POST, "create_empty_archive", &params::create_archive(folder_id)?)
            .await
    }

    pub async fn search_files(&self, query: &str) -> Result<Folder> {
        self.call(Method::POST, "search_files", &params::search_files(query)?)
            .await
    }

    pub async fn add_folder(&self, name: &str) -> Result<ApiResult> {
        self.call(Method::POST, "add_folder", &params::add_folder(name)?)
            .await
    }

    pub async fn rename_file(&self, file_id: &str, rename_to: &str) -> Result<ApiResult> {
        let form = params::rename(ItemKind::File, file_id, rename_to)?;
        self.call(Method::POST, "rename", &form).await
    }

    pub async fn rename_folder(&self, folder_id: &str, rename_to: &str) -> Result<ApiResult> {
        let form = params::rename(ItemKind::Folder, folder_id, rename_to)?;
        self.call(Method::POST, "rename", &form).await
    }

    pub async fn delete_file(&self, file_id: &str) -> Result<ApiResult> {
        let form = params::delete_item(ItemKind::File, file_id)?;
        self.call(Method::POST, "delete", &form).await
    }

    pub async fn delete_folder(&self, folder_id: &str) -> Result<ApiResult> {
        let form = params::delete_item(ItemKind::Folder, folder_id)?;
        self.call(Method::POST, "delete", &form).await
    }
}
