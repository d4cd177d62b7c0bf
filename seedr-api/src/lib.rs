//! Seedr.cc API client library.
//!
//! Blocking ([`SeedrClient`]) and async ([`AsyncSeedrClient`]) clients for
//! the unofficial Seedr REST API: account info, folder listing, torrent
//! management and file links.
//!
//! # Authentication
//!
//! A session is a [`Token`]. Get one by logging in with a password, through
//! the device-code flow, or from a stored refresh token, and persist it with
//! a refresh callback:
//!
//! ```no_run
//! use seedr_api::{ClientConfig, SeedrClient, Token};
//!
//! let config = ClientConfig::default();
//! let client = SeedrClient::from_password("me@example.com", "hunter2", config)?
//!     .on_token_refresh(|token| {
//!         std::fs::write("token.json", token.to_json()).ok();
//!     });
//! std::fs::write("token.json", client.token().to_json())?;
//!
//! // later
//! let token = Token::from_json(&std::fs::read_to_string("token.json")?)?;
//! let client = SeedrClient::new(token, ClientConfig::default())?;
//! # Ok::<(), seedr_api::SeedrError>(())
//! ```
//!
//! Expired access tokens are refreshed transparently, once per call.
//!
//! # API endpoint mapping
//!
//! | Method                                | `func`                  | Description            |
//! |---------------------------------------|-------------------------|------------------------|
//! | [`SeedrClient::get_settings`]         | `get_settings`          | Account settings       |
//! | [`SeedrClient::get_memory_bandwidth`] | `get_memory_bandwidth`  | Storage and bandwidth  |
//! | [`SeedrClient::get_devices`]          | `get_devices`           | Authorized devices     |
//! | [`SeedrClient::list_contents`]        | `list_contents`         | Folder listing         |
//! | [`SeedrClient::add_torrent`]          | `add_torrent`           | Add a torrent          |
//! | [`SeedrClient::scan_page`]            | `scan_page`             | Find torrents on a page |
//! | [`SeedrClient::fetch_file`]           | `fetch_file`            | Download link          |
//! | [`SeedrClient::create_archive`]       | `create_empty_archive`  | Zip a folder           |
//! | [`SeedrClient::search_files`]         | `search_files`          | Search                 |
//! | [`SeedrClient::add_folder`]           | `add_folder`            | New folder             |
//! | [`SeedrClient::rename_file`]          | `rename`                | Rename file or folder  |
//! | [`SeedrClient::delete_file`]          | `delete`                | Delete an item         |
//! | [`SeedrClient::delete_wishlist`]      | `remove_wishlist`       | Drop a wishlist entry  |
//! | [`SeedrClient::change_name`]          | `user_account_modify`   | Name or password       |
//!
//! [`AsyncSeedrClient`] has the same methods as `async fn`s.

mod account;
pub mod async_client;
mod auth;
pub mod callback;
pub mod client;
pub mod config;
pub mod error;
mod files;
mod params;
mod response;
pub mod token;
mod torrents;
pub mod types;

pub use async_client::AsyncSeedrClient;
pub use callback::TokenCallback;
pub use client::SeedrClient;
pub use config::{ClientConfig, Endpoints};
pub use error::{Result, SeedrError, TokenError};
pub use token::Token;
pub use torrents::TorrentSource;
pub use types::{
    AccountInfo, AccountSettings, AddTorrentResult, ApiResult, CreateArchiveResult, Device,
    DeviceCode, FetchFileResult, File, Folder, ListContentsResult, MemoryBandwidth,
    RefreshTokenResult, ResponseModel, ScanPageResult, ScannedTorrent, Torrent, UserSettings,
};
