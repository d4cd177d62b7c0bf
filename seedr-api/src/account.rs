//! Account API.
//!
//! | func                   | method | form                                   |
//! |------------------------|--------|----------------------------------------|
//! | `get_settings`         | GET    |                                        |
//! | `get_memory_bandwidth` | GET    |                                        |
//! | `get_devices`          | GET    |                                        |
//! | `user_account_modify`  | POST   | `setting=fullname`, `password`, `fullname` |
//! | `user_account_modify`  | POST   | `setting=password`, `password`, `new_password`,  |
//! |                        |        | `new_password_repeat`                  |
//!
//! `get_settings` response:
//! ```json
//! {
//!   "result": true,
//!   "settings": { "allow_remote_access": false, "site_language": "en", ... },
//!   "account": { "username": "me", "user_id": 1, "premium": 0, "space_max": 2147483648, ... },
//!   "country": "DE"
//! }
//! ```

use crate::async_client::AsyncSeedrClient;
use crate::client::SeedrClient;
use crate::error::Result;
use crate::params::{self, Form};
use crate::types::{self, ApiResult, Device, MemoryBandwidth, UserSettings};
use reqwest::Method;

impl SeedrClient {
    /// Account settings and profile.
    pub fn get_settings(&self) -> Result<UserSettings> {
        self.call(Method::GET, "get_settings", &Form::new())
    }

    /// Storage and bandwidth usage.
    pub fn get_memory_bandwidth(&self) -> Result<MemoryBandwidth> {
        self.call(Method::GET, "get_memory_bandwidth", &Form::new())
    }

    /// Devices authorized through the device-code flow.
    pub fn get_devices(&self) -> Result<Vec<Device>> {
        let reply = self.resource(Method::GET, "get_devices", &Form::new(), None)?;
        Ok(types::parse_devices(&reply))
    }

    /// Change the account's display name. Requires the account password.
    pub fn change_name(&self, name: &str, password: &str) -> Result<ApiResult> {
        self.call(Method::POST, "user_account_modify", &params::change_name(name, password)?)
    }

    pub fn change_password(&self, old_password: &str, new_password: &str) -> Result<ApiResult> {
        let form = params::change_password(old_password, new_password)?;
        self.call(Method::POST, "user_account_modify", &form)
    }
}

impl AsyncSeedrClient {
    pub async fn get_settings(&self) -> Result<UserSettings> {
        self.call(Method::GET, "get_settings", &Form::new()).await
    }

    pub async fn get_memory_bandwidth(&self) -> Result<MemoryBandwidth> {
        self.call(Method::GET, "get_memory_bandwidth", &Form::new()).await
    }

    pub async fn get_devices(&self) -> Result<Vec<Device>> {
        let reply = self
            .resource(Method::GET, "get_devices", &Form::new(), None)
            .await?;
        Ok(types::parse_devices(&reply))
    }

    pub async fn change_name(&self, name: &str, password: &str) -> Result<ApiResult> {
        let form = params::change_name(name, password)?;
        self.call(Method::POST, "user_account_modify", &form).await
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<ApiResult> {
        let form = params::change_password(old_password, new_password)?;
        self.call(Method::POST, "user_account_modify", &form).await
    }
}
