//! CLI for the sanicdns installer.
//!
//! A bare invocation runs the non-interactive install; the one
//! subcommand post-processes sanicdns scan output.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sdi_core::config::InstallConfig;
use sdi_core::host::HostProfile;
use sdi_core::hostmap::IpMap;
use sdi_core::http::CurlTransport;
use sdi_core::installer::{self, Stage};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Install the sanicdns AF_XDP resolver onto this host.
#[derive(Debug, Parser)]
#[command(name = "sdi")]
#[command(version)]
#[command(
    about = "Installs the sanicdns binaries and the DPDK hugepages helper into /usr/local/bin",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Map an ip[:port] target list back to hostnames using sanicdns
    /// NDJSON output.
    MapHosts {
        /// Path to the sanicdns NDJSON result file.
        dns_results: PathBuf,
        /// Path to the ip[:port] list to annotate.
        targets: PathBuf,
    },
}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        match cli.command {
            None => run_install(),
            Some(CliCommand::MapHosts {
                dns_results,
                targets,
            }) => run_map_hosts(&dns_results, &targets),
        }
    }
}

fn run_install() -> Result<()> {
    let mut cfg = InstallConfig::default();
    cfg.work_dir = std::env::current_dir().context("resolve working directory")?;
    cfg.token = normalize_token(std::env::var("GITHUB_TOKEN").ok());
    if cfg.token.is_none() {
        println!(" - warning: GITHUB_TOKEN is not set; querying the release index unauthenticated");
        tracing::warn!("GITHUB_TOKEN is not set; querying the release index unauthenticated");
    }

    let profile = HostProfile::detect()?;
    let transport = CurlTransport::default();

    installer::run(
        &transport,
        &cfg,
        &profile,
        |delay| {
            println!(" - retrying in {}s", delay.as_secs());
            std::thread::sleep(delay);
        },
        print_stage,
    )
}

/// Treat an unset or empty `GITHUB_TOKEN` the same: no credential.
fn normalize_token(raw: Option<String>) -> Option<String> {
    raw.filter(|t| !t.is_empty())
}

fn run_map_hosts(dns_results: &Path, targets: &Path) -> Result<()> {
    let dns = File::open(dns_results)
        .with_context(|| format!("open {}", dns_results.display()))?;
    let (map, warnings) = IpMap::from_ndjson(BufReader::new(dns))?;
    for warning in &warnings {
        eprintln!(" - warning: {}", warning);
    }

    let list =
        File::open(targets).with_context(|| format!("open {}", targets.display()))?;
    let (lines, join_warnings) = map.join(BufReader::new(list))?;
    for warning in &join_warnings {
        eprintln!(" - warning: {}", warning);
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

fn print_stage(stage: Stage) {
    match stage {
        Stage::Checking => println!("==> Checking host requirements"),
        Stage::Locating => println!("==> Locating the sanicdns AF_XDP release"),
        Stage::Located { tag } => println!(" - matched release {}", tag),
        Stage::Installing => println!("==> Installing sanicdns binaries"),
        Stage::InstallingAux => println!("==> Installing dpdk-hugepages.py"),
        Stage::Done => println!("==> Install complete"),
    }
}
