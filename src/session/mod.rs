//! Login session persisted between invocations.
//!
//! The token is the sole authorization check: commands that need the backend
//! construct one `Session`, hand it to the API client, and never look the
//! token up again. Login writes the file, logout removes it.

use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub username: Option<String>,
}

impl Session {
    /// Load the stored session. A missing file is a logged-out session, not
    /// an error.
    pub fn load() -> Result<Self> {
        Self::load_from(&global::session_file()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&global::session_file()?)
    }

    /// Remove the stored session file, if any.
    pub fn clear() -> Result<()> {
        let path = global::session_file()?;
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove session file")?;
            debug!("Removed session file {:?}", path);
        }
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).context("Failed to read session file")?;
        serde_json::from_str(&content).context("Failed to parse session file")
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize session")?;
        std::fs::write(path, content).context("Failed to write session file")?;
        Ok(())
    }
}
