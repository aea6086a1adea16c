//! Installer configuration: endpoints, file names, thresholds and retry
//! policy, passed explicitly into each stage.

use crate::host::KernelVersion;
use crate::retry::LinearBackoff;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// GitHub release index for the sanicdns project.
pub const RELEASES_URL: &str = "https://api.github.com/repos/hadriansecurity/sanicdns/releases";
/// Exact asset name the locator matches on.
pub const ASSET_NAME: &str = "sanicdns_af_xdp.tar.gz";
/// Directory the archive unpacks to (fixed by how the asset is built).
pub const EXTRACT_DIR: &str = "sanicdns_af_xdp";
/// Upstream source of the DPDK hugepages helper.
pub const HUGEPAGES_URL: &str =
    "https://raw.githubusercontent.com/DPDK/dpdk/main/usertools/dpdk-hugepages.py";
/// File name the helper is installed under.
pub const HUGEPAGES_SCRIPT: &str = "dpdk-hugepages.py";
/// System-wide executable directory the binaries land in.
pub const INSTALL_DIR: &str = "/usr/local/bin";

/// Host facts required before anything touches the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostRequirements {
    pub os_name: String,
    pub architecture: String,
    /// Minimum kernel version; AF_XDP busy polling needs 5.11.
    pub kernel_min: KernelVersion,
    pub min_logical_cores: usize,
}

impl Default for HostRequirements {
    fn default() -> Self {
        Self {
            os_name: "Linux".to_string(),
            architecture: "x86_64".to_string(),
            kernel_min: KernelVersion { major: 5, minor: 11 },
            min_logical_cores: 2,
        }
    }
}

/// Everything the pipeline needs for one run. `Default` is the production
/// install; tests override the endpoints and directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    pub releases_url: String,
    pub asset_name: String,
    /// Files to install, relative to the working directory after
    /// extraction.
    pub archive_binaries: Vec<String>,
    /// Top-level directory the archive extracts to, removed on success.
    pub extract_dir: String,
    pub hugepages_url: String,
    pub hugepages_script: String,
    pub install_dir: PathBuf,
    /// Where temporaries (archive, extracted tree, script) are staged.
    pub work_dir: PathBuf,
    /// Bearer credential for the release index. Read from `GITHUB_TOKEN`
    /// by the CLI and handed in here so the locator never touches the
    /// environment itself.
    pub token: Option<String>,
    pub requirements: HostRequirements,
    pub backoff: LinearBackoff,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            releases_url: RELEASES_URL.to_string(),
            asset_name: ASSET_NAME.to_string(),
            archive_binaries: vec![
                format!("{EXTRACT_DIR}/sanicdns"),
                format!("{EXTRACT_DIR}/sanicdns_xdp.c.o"),
            ],
            extract_dir: EXTRACT_DIR.to_string(),
            hugepages_url: HUGEPAGES_URL.to_string(),
            hugepages_script: HUGEPAGES_SCRIPT.to_string(),
            install_dir: PathBuf::from(INSTALL_DIR),
            work_dir: PathBuf::from("."),
            token: None,
            requirements: HostRequirements::default(),
            backoff: LinearBackoff::default(),
        }
    }
}
