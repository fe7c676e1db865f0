//! Persisted configuration and the session store seam.
//!
//! The configuration document holds the login token alongside the
//! update-check metadata. It is stored at `~/.config/cloudkey/config.json`
//! and is always rewritten atomically: readers see either the old document
//! or the new one, never a partial write.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::auth::SessionToken;
use crate::update::{is_newer, UpdateInfo};

// ============================================================================
// Constants
// ============================================================================

/// Application name used for the config directory path
const APP_NAME: &str = "cloudkey";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Number of random bytes in a generated client id (hex encoded to 32 chars)
const CLIENT_ID_BYTES: usize = 16;

/// Minimum time between two online update checks.
/// Once a day keeps the startup check from slowing down every invocation.
const UPDATE_CHECK_INTERVAL_HOURS: i64 = 24;

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not find config directory")]
    NoConfigDir,

    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ============================================================================
// SessionStore
// ============================================================================

/// Durable home of the session token.
///
/// `set_token` only changes the in-memory value; nothing is durable until
/// `save` returns `Ok`.
pub trait SessionStore {
    fn token(&self) -> Option<&SessionToken>;

    fn set_token(&mut self, token: Option<SessionToken>);

    fn save(&mut self) -> Result<(), StoreError>;
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "generate_client_id")]
    pub client_id: String,
    #[serde(default)]
    login_token: Option<SessionToken>,
    #[serde(default)]
    pub latest_version: Option<String>,
    #[serde(default)]
    pub update_prompt: Option<String>,
    #[serde(default)]
    pub last_update_check: Option<DateTime<Utc>>,
    #[serde(default)]
    pub services_url: Option<String>,
    #[serde(skip)]
    path: PathBuf,
}

impl Config {
    /// Fresh configuration that will be written to `path` on first save
    pub fn new(path: PathBuf) -> Self {
        Self {
            client_id: generate_client_id(),
            login_token: None,
            latest_version: None,
            update_prompt: None,
            last_update_check: None,
            services_url: None,
            path,
        }
    }

    /// Load from the default location
    pub fn load() -> Result<Self, StoreError> {
        Self::load_from(Self::config_path()?)
    }

    /// Load from an explicit path. A missing file yields defaults; a corrupt
    /// one is an error so a stored token is never silently discarded.
    pub fn load_from(path: PathBuf) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, starting fresh");
            return Ok(Self::new(path));
        }

        let contents = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        let mut config: Config =
            serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?;
        config.path = path;
        Ok(config)
    }

    fn config_path() -> Result<PathBuf, StoreError> {
        let config_dir = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Write to a sibling temp file, then rename over the real one.
    fn write_atomic(&self) -> Result<(), StoreError> {
        let path = &self.path;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        let tmp_path = path.with_extension("json.tmp");

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(&tmp_path)
            .map_err(|e| StoreError::io(&tmp_path, e))?;
        file.write_all(contents.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| StoreError::io(&tmp_path, e))?;
        drop(file);

        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(StoreError::io(path, e));
        }
        Ok(())
    }

    // ===== Update metadata =====

    /// Whether enough time has passed since the last online update check
    pub fn update_check_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_update_check {
            Some(last) => now - last >= Duration::hours(UPDATE_CHECK_INTERVAL_HOURS),
            None => true,
        }
    }

    /// Record the result of an online update check
    pub fn record_update_check(&mut self, now: DateTime<Utc>, info: Option<&UpdateInfo>) {
        self.last_update_check = Some(now);
        self.latest_version = info.map(|i| i.latest_version.clone());
        self.update_prompt = info.map(|i| i.install_command.clone());
    }

    /// The last recorded update, if it is newer than the running version
    pub fn cached_update(&self, current_version: &str) -> Option<UpdateInfo> {
        match (&self.latest_version, &self.update_prompt) {
            (Some(latest), Some(prompt)) if is_newer(latest, current_version) => Some(UpdateInfo {
                latest_version: latest.clone(),
                install_command: prompt.clone(),
            }),
            _ => None,
        }
    }
}

impl SessionStore for Config {
    fn token(&self) -> Option<&SessionToken> {
        self.login_token.as_ref()
    }

    fn set_token(&mut self, token: Option<SessionToken>) {
        self.login_token = token;
    }

    fn save(&mut self) -> Result<(), StoreError> {
        self.write_atomic()?;
        debug!(path = %self.path.display(), "Config saved");
        Ok(())
    }
}

fn generate_client_id() -> String {
    let mut bytes = [0u8; CLIENT_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-process store that keeps a separate "persisted" copy of the token so
/// callers can tell what would have survived a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    token: Option<SessionToken>,
    persisted: Option<SessionToken>,
    saves: usize,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that starts out authenticated with `token`
    pub fn with_token(token: SessionToken) -> Self {
        Self {
            token: Some(token.clone()),
            persisted: Some(token),
            ..Self::default()
        }
    }

    /// Make every subsequent `save` fail
    pub fn fail_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    /// Token as of the last successful save
    pub fn persisted_token(&self) -> Option<&SessionToken> {
        self.persisted.as_ref()
    }

    /// Number of `save` calls, successful or not
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl SessionStore for MemoryStore {
    fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    fn set_token(&mut self, token: Option<SessionToken>) {
        self.token = token;
    }

    fn save(&mut self) -> Result<(), StoreError> {
        self.saves += 1;
        if self.fail_saves {
            return Err(StoreError::Unavailable("saves disabled".to_string()));
        }
        self.persisted = self.token.clone();
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
