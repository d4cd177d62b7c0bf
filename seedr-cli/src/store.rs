//! Token persistence for the CLI.
//!
//! The token lives in `<config dir>/seedr/token.json` by default:
//!
//! ```json
//! { "access_token": "...", "refresh_token": "...", "expires_at": 1700000000 }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use seedr_api::Token;

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_location() -> Result<Self> {
        let config = dirs::config_dir().context("cannot determine config directory")?;
        Ok(Self::new(config.join("seedr").join("token.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` if no token has been saved yet.
    pub fn load(&self) -> Result<Option<Token>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let token = Token::from_json(&data)
            .with_context(|| format!("{} is not a valid token file", self.path.display()))?;
        Ok(Some(token))
    }

    /// Write the token, creating parent directories if needed.
    pub fn save(&self, token: &Token) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token.to_json())
            .with_context(|| format!("failed to write {}", self.path.display()))
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
