//! The sequential install pipeline.
//!
//! `Checking → Locating → Installing → InstallingAux → Done`, with a
//! single branch point: the release locator either resolves a download
//! URL or the whole run fails. Strictly single-threaded and blocking.

use crate::config::InstallConfig;
use crate::host::{self, HostProfile};
use crate::http::Transport;
use crate::{archive, hugepages, release};
use anyhow::Result;
use std::time::Duration;

/// Progress milestones reported to the caller; the CLI turns these into
/// stdout lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Checking,
    Locating,
    /// The locator matched a release; carries the tag for display.
    Located { tag: String },
    Installing,
    InstallingAux,
    Done,
}

/// Run the whole install. `sleep` is the backoff delay between release
/// query attempts and `progress` receives each stage transition; both are
/// injected so the pipeline can be driven end to end in tests.
pub fn run(
    transport: &dyn Transport,
    cfg: &InstallConfig,
    profile: &HostProfile,
    mut sleep: impl FnMut(Duration),
    mut progress: impl FnMut(Stage),
) -> Result<()> {
    progress(Stage::Checking);
    host::check(profile, &cfg.requirements)?;
    tracing::info!(
        os = %profile.os_name,
        arch = %profile.architecture,
        kernel = %profile.kernel_release,
        cores = profile.logical_cores,
        "host requirements satisfied"
    );

    progress(Stage::Locating);
    let candidate = release::locate(transport, cfg, &mut sleep)?;
    progress(Stage::Located {
        tag: candidate.tag_name.clone(),
    });

    progress(Stage::Installing);
    archive::run(transport, cfg, &candidate.download_url)?;

    progress(Stage::InstallingAux);
    hugepages::run(transport, cfg)?;

    progress(Stage::Done);
    Ok(())
}
