//! Install error taxonomy.

use crate::host::KernelVersion;
use crate::http::FetchError;
use thiserror::Error;

/// Fatal installer failures with a stable, user-facing meaning.
///
/// The four pre-flight variants describe static facts about the host and
/// are never retried. Only the release query recovers locally (by
/// retrying) before surfacing `ReleaseNotFound`; everything downstream of
/// it is fail-fast.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("unsupported operating system {0:?} (supported: Linux)")]
    UnsupportedOs(String),

    #[error("unsupported CPU architecture {0:?} (supported: x86_64)")]
    UnsupportedArch(String),

    #[error("cannot parse kernel release {0:?}")]
    KernelUnrecognized(String),

    #[error("kernel {found} is older than the required {required}")]
    KernelTooOld {
        found: KernelVersion,
        required: KernelVersion,
    },

    #[error("host has {found} logical cores, {required} or more are required")]
    InsufficientCores { found: usize, required: usize },

    #[error("no release with an asset named {asset:?} after {attempts} attempts")]
    ReleaseNotFound { asset: String, attempts: u32 },

    #[error("download of {url} failed")]
    DownloadFailed {
        url: String,
        #[source]
        source: FetchError,
    },
}
