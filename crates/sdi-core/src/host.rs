//! Pre-flight host compatibility checks.
//!
//! These are static facts about the machine (OS, architecture, kernel,
//! core count), so a failing check aborts immediately with no retry and
//! before anything touches the network.

use crate::config::HostRequirements;
use crate::error::InstallError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kernel version as (major, minor). The derived ordering compares major
/// first, then minor, which is exactly the check the installer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KernelVersion {
    pub major: u32,
    pub minor: u32,
}

impl KernelVersion {
    /// Parse the leading `major.minor` of a kernel release string such as
    /// `6.1.0-18-amd64` or `5.15`. Everything after the minor component
    /// (patch level, distro suffix) is ignored.
    pub fn parse(release: &str) -> Option<Self> {
        let mut parts = release.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor_part = parts.next()?;
        let digits: String = minor_part
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let minor = digits.parse().ok()?;
        Some(Self { major, minor })
    }
}

impl fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Snapshot of the facts checked during pre-flight. Read once from the
/// live system, never mutated.
#[derive(Debug, Clone)]
pub struct HostProfile {
    pub os_name: String,
    pub architecture: String,
    pub kernel_release: String,
    pub logical_cores: usize,
}

impl HostProfile {
    /// Probe the live host via uname(2) and the scheduler-visible CPU
    /// count.
    #[cfg(unix)]
    pub fn detect() -> anyhow::Result<Self> {
        let uts = uname()?;
        let logical_cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Ok(Self {
            os_name: uts.sysname,
            architecture: uts.machine,
            kernel_release: uts.release,
            logical_cores,
        })
    }
}

#[cfg(unix)]
struct Utsname {
    sysname: String,
    release: String,
    machine: String,
}

#[cfg(unix)]
fn uname() -> anyhow::Result<Utsname> {
    use std::ffi::CStr;

    // SAFETY: utsname is plain old data; uname either fills it in or
    // reports failure via its return code.
    let mut raw: libc::utsname = unsafe { std::mem::zeroed() };
    if unsafe { libc::uname(&mut raw) } != 0 {
        anyhow::bail!("uname failed: {}", std::io::Error::last_os_error());
    }

    fn field(buf: &[libc::c_char]) -> String {
        // SAFETY: uname NUL-terminates every field.
        unsafe { CStr::from_ptr(buf.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }

    Ok(Utsname {
        sysname: field(&raw.sysname),
        release: field(&raw.release),
        machine: field(&raw.machine),
    })
}

/// Verify the profile against the requirements, in order; the first
/// failing check wins.
pub fn check(profile: &HostProfile, req: &HostRequirements) -> Result<(), InstallError> {
    if profile.os_name != req.os_name {
        return Err(InstallError::UnsupportedOs(profile.os_name.clone()));
    }
    if profile.architecture != req.architecture {
        return Err(InstallError::UnsupportedArch(profile.architecture.clone()));
    }
    let found = KernelVersion::parse(&profile.kernel_release)
        .ok_or_else(|| InstallError::KernelUnrecognized(profile.kernel_release.clone()))?;
    if found < req.kernel_min {
        return Err(InstallError::KernelTooOld {
            found,
            required: req.kernel_min,
        });
    }
    if profile.logical_cores < req.min_logical_cores {
        return Err(InstallError::InsufficientCores {
            found: profile.logical_cores,
            required: req.min_logical_cores,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(os: &str, arch: &str, kernel: &str, cores: usize) -> HostProfile {
        HostProfile {
            os_name: os.to_string(),
            architecture: arch.to_string(),
            kernel_release: kernel.to_string(),
            logical_cores: cores,
        }
    }

    fn req() -> HostRequirements {
        HostRequirements::default()
    }

    #[test]
    fn kernel_parse_plain_and_suffixed() {
        assert_eq!(
            KernelVersion::parse("5.15"),
            Some(KernelVersion { major: 5, minor: 15 })
        );
        assert_eq!(
            KernelVersion::parse("6.1.0-18-amd64"),
            Some(KernelVersion { major: 6, minor: 1 })
        );
        assert_eq!(
            KernelVersion::parse("5.15-rc2"),
            Some(KernelVersion { major: 5, minor: 15 })
        );
        assert_eq!(KernelVersion::parse("garbage"), None);
        assert_eq!(KernelVersion::parse("5"), None);
    }

    #[test]
    fn kernel_threshold_boundaries() {
        for (release, ok) in [("5.10", false), ("4.19", false), ("5.11", true), ("6.0", true)] {
            let got = check(&profile("Linux", "x86_64", release, 4), &req());
            match (ok, got) {
                (true, Ok(())) => {}
                (false, Err(InstallError::KernelTooOld { .. })) => {}
                (_, other) => panic!("kernel {}: unexpected {:?}", release, other),
            }
        }
    }

    #[test]
    fn core_count_boundaries() {
        for (cores, ok) in [(0usize, false), (1, false), (2, true), (8, true)] {
            let got = check(&profile("Linux", "x86_64", "5.15", cores), &req());
            match (ok, got) {
                (true, Ok(())) => {}
                (false, Err(InstallError::InsufficientCores { found, required })) => {
                    assert_eq!(found, cores);
                    assert_eq!(required, 2);
                }
                (_, other) => panic!("cores {}: unexpected {:?}", cores, other),
            }
        }
    }

    #[test]
    fn wrong_os_rejected_first() {
        // Everything else is also wrong; OS must be the reported failure.
        let got = check(&profile("Darwin", "arm64", "4.0", 1), &req());
        assert!(matches!(got, Err(InstallError::UnsupportedOs(os)) if os == "Darwin"));
    }

    #[test]
    fn wrong_arch_rejected() {
        let got = check(&profile("Linux", "aarch64", "6.0", 8), &req());
        assert!(matches!(got, Err(InstallError::UnsupportedArch(a)) if a == "aarch64"));
    }

    #[test]
    fn unparsable_kernel_release_rejected() {
        let got = check(&profile("Linux", "x86_64", "unknown", 4), &req());
        assert!(matches!(got, Err(InstallError::KernelUnrecognized(_))));
    }
}
