//! `TIOCGWINSZ` request code resolution.
//!
//! The request number differs between kernels and, on Linux, between CPU
//! families. The host value is resolved once and cached.

use std::sync::OnceLock;
use tracing::debug;

use crate::error::{Result, TermError};

/// Linux on most architectures
pub const TIOCGWINSZ_LINUX: u64 = 0x0000_5413;
/// `_IOR('t', 104, struct winsize)`: Darwin, the BSDs, and Linux on MIPS/PowerPC/SPARC
pub const TIOCGWINSZ_IOR: u64 = 0x4008_7468;
/// Solaris/illumos `_TIOC | 104`
pub const TIOCGWINSZ_SOLARIS: u64 = ((b'T' as u64) << 8) | 104;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OsFamily {
    Linux,
    Solaris,
    Darwin,
    Bsd,
}

impl OsFamily {
    fn from_name(os: &str) -> Option<Self> {
        let os = os.to_ascii_lowercase();
        let starts = |prefixes: &[&str]| prefixes.iter().any(|p| os.starts_with(p));

        if starts(&["linux", "android"]) {
            Some(OsFamily::Linux)
        } else if starts(&["solaris", "sunos", "illumos"]) {
            Some(OsFamily::Solaris)
        } else if starts(&["mac", "darwin", "ios"]) {
            Some(OsFamily::Darwin)
        } else if starts(&["freebsd", "openbsd", "netbsd", "dragonfly"]) {
            Some(OsFamily::Bsd)
        } else {
            None
        }
    }
}

fn is_mips_ppc_or_sparc(arch: &str) -> bool {
    let arch = arch.to_ascii_lowercase();
    ["mips", "ppc", "powerpc", "sparc"]
        .iter()
        .any(|p| arch.starts_with(p))
}

/// Resolve the `TIOCGWINSZ` request code for an OS name and CPU architecture.
///
/// Accepts both `std::env::consts` spellings (`linux`, `macos`, `powerpc64`)
/// and `uname`-style ones (`Linux`, `Mac OS X`, `SunOS`, `ppc64le`).
pub fn tiocgwinsz(os: &str, arch: &str) -> Result<u64> {
    match OsFamily::from_name(os) {
        Some(OsFamily::Linux) if is_mips_ppc_or_sparc(arch) => Ok(TIOCGWINSZ_IOR),
        Some(OsFamily::Linux) => Ok(TIOCGWINSZ_LINUX),
        Some(OsFamily::Solaris) => Ok(TIOCGWINSZ_SOLARIS),
        Some(OsFamily::Darwin) | Some(OsFamily::Bsd) => Ok(TIOCGWINSZ_IOR),
        None => Err(TermError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        }),
    }
}

static HOST_TIOCGWINSZ: OnceLock<Result<u64>> = OnceLock::new();

/// Request code for the running host, resolved on first use
pub fn host_tiocgwinsz() -> Result<u64> {
    HOST_TIOCGWINSZ
        .get_or_init(|| {
            let (os, arch) = (std::env::consts::OS, std::env::consts::ARCH);
            let resolved = tiocgwinsz(os, arch);
            debug!(os, arch, ?resolved, "Resolved TIOCGWINSZ");
            resolved
        })
        .clone()
}
