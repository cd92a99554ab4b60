//! Checks the release feed for a newer published version.

use std::cmp::Ordering;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::UpdateError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Version of this build.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The subset of a GitHub release payload that matters here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseInfo {
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl ReleaseInfo {
    /// Tag (or release name when the tag is empty) without a leading `v`.
    pub fn version(&self) -> Option<String> {
        let raw = self
            .tag_name
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(self.name.as_deref())
            .unwrap_or("")
            .trim();
        let version = raw
            .strip_prefix('v')
            .or_else(|| raw.strip_prefix('V'))
            .unwrap_or(raw)
            .trim();
        (!version.is_empty()).then(|| version.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateStatus {
    UpdateAvailable {
        latest: String,
        current: String,
        url: Option<String>,
    },
    UpToDate {
        current: String,
    },
    AheadOfRelease {
        latest: String,
        current: String,
    },
}

impl std::fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateStatus::UpdateAvailable {
                latest,
                current,
                url,
            } => {
                write!(f, "New version available: v{} (you have v{}).", latest, current)?;
                if let Some(url) = url {
                    write!(f, " {}", url)?;
                }
                Ok(())
            }
            UpdateStatus::UpToDate { current } => {
                write!(f, "You're up to date (v{}).", current)
            }
            UpdateStatus::AheadOfRelease { latest, current } => write!(
                f,
                "You are running a newer version (v{}) than the latest tagged release (v{}).",
                current, latest
            ),
        }
    }
}

/// Compares dotted numeric versions component by component.
///
/// Each component contributes its leading digits; missing or non-numeric
/// components count as 0, so `1.2` equals `1.2.0`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let pa = version_components(a);
    let pb = version_components(b);
    let len = pa.len().max(pb.len());
    for i in 0..len {
        let da = pa.get(i).copied().unwrap_or(0);
        let db = pb.get(i).copied().unwrap_or(0);
        match da.cmp(&db) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn version_components(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| {
            let digits: String = part
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().unwrap_or(0)
        })
        .collect()
}

/// Classifies a release against the running version.
pub fn classify(release: &ReleaseInfo, current: &str) -> Result<UpdateStatus, UpdateError> {
    let latest = release.version().ok_or(UpdateError::UnknownVersion)?;
    let current = current.to_string();
    Ok(match compare_versions(&latest, &current) {
        Ordering::Greater => UpdateStatus::UpdateAvailable {
            latest,
            current,
            url: release.html_url.clone(),
        },
        Ordering::Equal => UpdateStatus::UpToDate { current },
        Ordering::Less => UpdateStatus::AheadOfRelease { latest, current },
    })
}

/// Fetches the latest release from `feed_url` and compares it to `current`.
pub async fn check_for_updates(
    feed_url: &str,
    current: &str,
) -> Result<UpdateStatus, UpdateError> {
    let client = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("file43/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let response = client
        .get(feed_url)
        .header("Accept", "application/vnd.github+json")
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(UpdateError::Status(response.status().as_u16()));
    }

    let release: ReleaseInfo = response.json().await?;
    tracing::debug!(tag = ?release.tag_name, "Fetched latest release");
    classify(&release, current)
}
