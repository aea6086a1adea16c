//! Release locator: resolve the download URL for the AF_XDP asset.
//!
//! Queries the GitHub release index and picks the first release carrying
//! an asset with the exact target name. The index is assumed to list
//! releases newest first; no semantic-version or timestamp comparison is
//! performed, so the pick is order-dependent by design. The chosen tag is
//! logged so a surprising pick is at least visible.

use crate::config::InstallConfig;
use crate::error::InstallError;
use crate::http::Transport;
use crate::retry::run_with_retry;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Content-negotiation header value for the GitHub REST API.
pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// One release in the index response. Only the fields the locator needs.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A named downloadable file attached to a release.
#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
}

/// Outcome of a successful locate: which tag matched and where to fetch
/// its asset from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseCandidate {
    pub tag_name: String,
    pub download_url: String,
}

/// Select the first release (index order, not newest-by-version) whose
/// asset list contains an asset with the exact target name.
pub fn select_candidate(releases: &[Release], asset_name: &str) -> Option<ReleaseCandidate> {
    releases.iter().find_map(|rel| {
        rel.assets
            .iter()
            .find(|a| a.name == asset_name)
            .map(|a| ReleaseCandidate {
                tag_name: rel.tag_name.clone(),
                download_url: a.browser_download_url.clone(),
            })
    })
}

/// One query attempt: fetch the index, parse it, select a candidate.
fn query_once(
    transport: &dyn Transport,
    releases_url: &str,
    token: Option<&str>,
    asset_name: &str,
) -> Result<ReleaseCandidate> {
    let auth;
    let mut headers: Vec<(&str, &str)> = vec![("Accept", GITHUB_ACCEPT)];
    if let Some(token) = token {
        auth = format!("token {}", token);
        headers.push(("Authorization", auth.as_str()));
    }

    let body = transport
        .fetch(releases_url, &headers)
        .context("release index request failed")?;
    let releases: Vec<Release> =
        serde_json::from_slice(&body).context("release index is not valid JSON")?;
    let candidate = select_candidate(&releases, asset_name)
        .with_context(|| format!("no release carries an asset named {:?}", asset_name))?;
    url::Url::parse(&candidate.download_url)
        .with_context(|| format!("asset URL {:?} is not a valid URL", candidate.download_url))?;
    Ok(candidate)
}

/// Resolve the download URL for the configured asset, retrying with
/// linear backoff. Every failure mode of an attempt is treated as
/// transient; after the attempt budget is spent the locator fails with
/// [`InstallError::ReleaseNotFound`].
pub fn locate(
    transport: &dyn Transport,
    cfg: &InstallConfig,
    sleep: impl FnMut(Duration),
) -> Result<ReleaseCandidate, InstallError> {
    run_with_retry(&cfg.backoff, sleep, |attempt| {
        tracing::debug!(attempt, url = %cfg.releases_url, "querying release index");
        match query_once(
            transport,
            &cfg.releases_url,
            cfg.token.as_deref(),
            &cfg.asset_name,
        ) {
            Ok(candidate) => {
                tracing::info!(tag = %candidate.tag_name, "matched release");
                Ok(candidate)
            }
            Err(e) => {
                tracing::warn!(attempt, error = %format!("{:#}", e), "release query attempt failed");
                Err(e)
            }
        }
    })
    .map_err(|_| InstallError::ReleaseNotFound {
        asset: cfg.asset_name.clone(),
        attempts: cfg.backoff.max_attempts,
    })
}
