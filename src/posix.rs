//! Terminal size on Linux / macOS / BSD / Solaris via `ioctl(TIOCGWINSZ)`.

use std::io;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::{Result, TermError};
use crate::layout::WinSize;
use crate::size::TerminalSize;

/// Which standard stream to query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    #[default]
    Stdout,
    Stderr,
}

impl Stream {
    pub fn from_use_stdout(use_stdout: bool) -> Self {
        if use_stdout {
            Stream::Stdout
        } else {
            Stream::Stderr
        }
    }

    /// File descriptor number
    pub fn fd(self) -> i32 {
        match self {
            Stream::Stdout => 1,
            Stream::Stderr => 2,
        }
    }
}

/// The single native call the POSIX query needs.
///
/// Implementations must capture `errno` before returning, so that nothing
/// between the call and the error report can clobber it.
pub trait WinsizeIoctl {
    fn winsize(&self, fd: i32, request: u64, ws: &mut WinSize) -> io::Result<()>;
}

/// `libc::ioctl`
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct LibcIoctl;

#[cfg(unix)]
impl WinsizeIoctl for LibcIoctl {
    fn winsize(&self, fd: i32, request: u64, ws: &mut WinSize) -> io::Result<()> {
        // Safety: WinSize is layout-identical to `struct winsize` and outlives the call
        let rc = unsafe { libc::ioctl(fd, request as _, ws as *mut WinSize) };
        if rc == -1 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}

/// Query the window size of `stream` through `api`.
///
/// A failing `ioctl` is reported as an error; the zeroed struct is never
/// returned as a size.
pub fn terminal_size_with<I: WinsizeIoctl>(
    api: &I,
    request: u64,
    stream: Stream,
) -> Result<TerminalSize> {
    let mut ws = WinSize::default();

    if let Err(e) = api.winsize(stream.fd(), request, &mut ws) {
        warn!(?stream, request, error = %e, "ioctl(TIOCGWINSZ) failed");
        return Err(TermError::call_failed("ioctl(TIOCGWINSZ)", e.to_string()));
    }

    trace!(?stream, ?ws, "winsize");
    Ok(TerminalSize::new(ws.ws_col, ws.ws_row))
}
