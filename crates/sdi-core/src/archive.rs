//! Archive installer: download the release asset, unpack it, place the
//! binaries, clean up the temporaries.
//!
//! Failures past the download are fail-fast with context and perform no
//! rollback; a partial install is left in place for the operator to
//! inspect.

use crate::config::InstallConfig;
use crate::error::InstallError;
use crate::http::Transport;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs;
use std::path::Path;

/// Download the resolved asset into `dest`. A failed fetch here is fatal
/// with no retry; the release query already spent the retry budget.
pub fn download_archive(transport: &dyn Transport, url: &str, dest: &Path) -> Result<()> {
    let body = transport
        .fetch(url, &[])
        .map_err(|source| InstallError::DownloadFailed {
            url: url.to_string(),
            source,
        })?;
    fs::write(dest, body).with_context(|| format!("write {}", dest.display()))?;
    Ok(())
}

/// Unpack a gzip-compressed tar archive into `dest_dir`.
pub fn extract(archive: &Path, dest_dir: &Path) -> Result<()> {
    let file = fs::File::open(archive).with_context(|| format!("open {}", archive.display()))?;
    let mut tar = tar::Archive::new(GzDecoder::new(file));
    tar.unpack(dest_dir)
        .with_context(|| format!("unpack {} into {}", archive.display(), dest_dir.display()))?;
    Ok(())
}

/// Install a single file with mode 0755, mirroring `install -m 0755`.
pub fn install_file(src: &Path, dest: &Path) -> Result<()> {
    fs::copy(src, dest)
        .with_context(|| format!("install {} -> {}", src.display(), dest.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dest, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("chmod 0755 {}", dest.display()))?;
    }
    Ok(())
}

/// Copy each work-dir-relative binary into the install directory under
/// its bare file name.
pub fn install_binaries(work_dir: &Path, relative: &[String], install_dir: &Path) -> Result<()> {
    for rel in relative {
        let src = work_dir.join(rel);
        let name = src
            .file_name()
            .map(|n| n.to_owned())
            .with_context(|| format!("no file name in {}", src.display()))?;
        install_file(&src, &install_dir.join(name))?;
        tracing::debug!(binary = %rel, "installed");
    }
    Ok(())
}

/// Remove the downloaded archive and the extracted tree.
pub fn cleanup(archive: &Path, extracted: &Path) -> Result<()> {
    fs::remove_file(archive).with_context(|| format!("remove {}", archive.display()))?;
    fs::remove_dir_all(extracted).with_context(|| format!("remove {}", extracted.display()))?;
    Ok(())
}

/// The whole stage: download, extract, install, clean up.
pub fn run(transport: &dyn Transport, cfg: &InstallConfig, download_url: &str) -> Result<()> {
    let archive_path = cfg.work_dir.join(&cfg.asset_name);
    download_archive(transport, download_url, &archive_path)?;
    extract(&archive_path, &cfg.work_dir)?;
    install_binaries(&cfg.work_dir, &cfg.archive_binaries, &cfg.install_dir)?;
    cleanup(&archive_path, &cfg.work_dir.join(&cfg.extract_dir))?;
    Ok(())
}
