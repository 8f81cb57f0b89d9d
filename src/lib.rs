//! nativeterm - terminal size and ANSI setup through native OS calls
//!
//! On Unix the size comes from `ioctl(TIOCGWINSZ)` on stdout or stderr. On
//! Windows it comes from `GetConsoleScreenBufferInfo`, and
//! [`enable_ansi_windows`] turns on virtual-terminal processing so escape
//! sequences are interpreted by the console.
//!
//! ```no_run
//! # #[cfg(unix)]
//! # fn main() -> nativeterm::Result<()> {
//! nativeterm::init()?;
//! let size = nativeterm::get_terminal_size(true)?;
//! println!("{} columns, {} rows", size.columns, size.rows);
//! # Ok(())
//! # }
//! # #[cfg(not(unix))]
//! # fn main() {}
//! ```
//!
//! # Layout
//!
//! ```text
//! platform   TIOCGWINSZ request code per OS / CPU
//! layout     #[repr(C)] mirrors of winsize, COORD, SMALL_RECT, CONSOLE_SCREEN_BUFFER_INFO
//! posix      WinsizeIoctl seam + libc implementation
//! console    ConsoleApi seam, size / ANSI logic
//! kernel32   ConsoleApi backed by kernel32.dll (Windows only)
//! ```

pub mod console;
pub mod error;
pub mod layout;
pub mod platform;
pub mod posix;
mod size;

#[cfg(windows)]
pub mod kernel32;

pub use error::{Result, TermError};
pub use posix::Stream;
pub use size::TerminalSize;

/// One-time native setup.
///
/// Resolves the `TIOCGWINSZ` code on Unix, or loads the Kernel32 symbols on
/// Windows. Every query does this lazily, so calling `init` is optional; it
/// lets a program surface an unsupported platform at startup. Repeated
/// calls return the outcome of the first.
pub fn init() -> Result<()> {
    #[cfg(unix)]
    platform::host_tiocgwinsz()?;

    #[cfg(windows)]
    kernel32::Kernel32::get()?;

    Ok(())
}

/// Size of the terminal attached to stdout (`use_stdout`) or stderr
#[cfg(unix)]
pub fn get_terminal_size(use_stdout: bool) -> Result<TerminalSize> {
    let request = platform::host_tiocgwinsz()?;
    posix::terminal_size_with(&posix::LibcIoctl, request, Stream::from_use_stdout(use_stdout))
}

/// Visible window size of the console attached to stdout
#[cfg(windows)]
pub fn get_terminal_size_windows() -> Result<TerminalSize> {
    console::window_size(kernel32::Kernel32::get()?)
}

/// Enable ANSI escape processing on the stdout console
#[cfg(windows)]
pub fn enable_ansi_windows() -> Result<bool> {
    console::enable_virtual_terminal(kernel32::Kernel32::get()?)
}
