//! Auxiliary tool installer: the DPDK hugepages helper script.
//!
//! sanicdns needs hugepages configured before it can run; the upstream
//! DPDK helper is installed alongside the binaries so operators have it
//! on PATH.

use crate::archive::install_file;
use crate::config::InstallConfig;
use crate::error::InstallError;
use crate::http::Transport;
use anyhow::{Context, Result};
use std::fs;

/// Download the helper to the working directory, install it with mode
/// 0755, then remove the temporary copy.
pub fn run(transport: &dyn Transport, cfg: &InstallConfig) -> Result<()> {
    let tmp = cfg.work_dir.join(&cfg.hugepages_script);
    let body = transport
        .fetch(&cfg.hugepages_url, &[])
        .map_err(|source| InstallError::DownloadFailed {
            url: cfg.hugepages_url.clone(),
            source,
        })?;
    fs::write(&tmp, body).with_context(|| format!("write {}", tmp.display()))?;

    install_file(&tmp, &cfg.install_dir.join(&cfg.hugepages_script))?;
    fs::remove_file(&tmp).with_context(|| format!("remove {}", tmp.display()))?;
    Ok(())
}
