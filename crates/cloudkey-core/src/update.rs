//! New-version check.
//!
//! At startup the binary asks the services endpoint for the latest release.
//! A failed check (network, status, body shape) is logged at debug level and
//! the last known answer is used instead: an update notice is never worth an
//! error message.

use std::future::Future;

use chrono::{DateTime, Utc};
use reqwest::multipart::Form;
use reqwest::Client;
use semver::Version;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::{Config, SessionStore};

/// Default endpoint answering with the latest published release
const DEFAULT_SERVICES_URL: &str = "https://auth.epirus.io/api/cli/versions/latest";

/// Version of the running binary
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    pub latest_version: String,
    pub install_command: String,
}

/// Why an online update check produced no answer
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("Update check request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Update check returned HTTP {0}")]
    Status(u16),

    #[error("Malformed update check response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("No install command for {0}")]
    MissingInstallCommand(String),
}

/// `Ok(None)` means the running version is current.
pub trait UpdateCheck {
    fn check_for_update(
        &self,
    ) -> impl Future<Output = Result<Option<UpdateInfo>, UpdateError>> + Send;
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    latest: LatestRelease,
}

#[derive(Debug, Deserialize)]
struct LatestRelease {
    version: String,
    install_win: Option<String>,
    install_unix: Option<String>,
}

pub struct Updater {
    client: Client,
    services_url: String,
    client_id: String,
    current_version: String,
}

impl Updater {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            services_url: config
                .services_url
                .clone()
                .unwrap_or_else(|| DEFAULT_SERVICES_URL.to_string()),
            client_id: config.client_id.clone(),
            current_version: CURRENT_VERSION.to_string(),
        }
    }

    /// Compare against a version other than the running one
    pub fn with_current_version(mut self, version: impl Into<String>) -> Self {
        self.current_version = version.into();
        self
    }
}

impl UpdateCheck for Updater {
    async fn check_for_update(&self) -> Result<Option<UpdateInfo>, UpdateError> {
        let form = Form::new()
            .text("os", std::env::consts::OS)
            .text("clientId", self.client_id.clone())
            .text("data", "update_check");

        let response = self
            .client
            .post(&self.services_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        if status != 200 {
            return Err(UpdateError::Status(status));
        }

        parse_latest(&body, &self.current_version, std::env::consts::OS)
    }
}

/// Whether `candidate` is a strictly newer release than `current`.
/// Versions that are not semver only count as newer when they differ.
pub fn is_newer(candidate: &str, current: &str) -> bool {
    match (Version::parse(candidate), Version::parse(current)) {
        (Ok(candidate), Ok(current)) => candidate > current,
        _ => candidate != current,
    }
}

/// Extract the newer release from a services response, if there is one.
pub fn parse_latest(
    body: &str,
    current_version: &str,
    os: &str,
) -> Result<Option<UpdateInfo>, UpdateError> {
    let latest = serde_json::from_str::<VersionResponse>(body)?.latest;
    if !is_newer(&latest.version, current_version) {
        return Ok(None);
    }

    let install_command = if os == "windows" {
        latest.install_win
    } else {
        latest.install_unix
    }
    .ok_or_else(|| UpdateError::MissingInstallCommand(os.to_string()))?;

    Ok(Some(UpdateInfo {
        latest_version: latest.version,
        install_command,
    }))
}

/// Run the online check when it is due and record the answer in `config`;
/// otherwise fall back to the last recorded answer. A failed check records
/// nothing, so it is retried on the next run.
pub async fn refresh_update_info<U: UpdateCheck>(
    checker: &U,
    config: &mut Config,
    now: DateTime<Utc>,
) -> Option<UpdateInfo> {
    if !config.update_check_due(now) {
        return config.cached_update(CURRENT_VERSION);
    }

    match checker.check_for_update().await {
        Ok(info) => {
            config.record_update_check(now, info.as_ref());
            if let Err(e) = config.save() {
                debug!(error = %e, "Failed to record update check");
            }
            info
        }
        Err(e) => {
            debug!(error = %e, "Update check failed");
            config.cached_update(CURRENT_VERSION)
        }
    }
}

/// Message shown when a newer release exists
pub fn update_notice(current_version: &str, info: &UpdateInfo) -> String {
    format!(
        "Your current cloudkey version is: {}. The latest version is: {}. To update, run: {}",
        current_version, info.latest_version, info.install_command
    )
}
