//! Windows console queries.
//!
//! The logic here is written against [`ConsoleApi`] and compiles on every
//! platform; the Kernel32-backed implementation lives in `kernel32`.

use bitflags::bitflags;
use tracing::{debug, trace, warn};

use crate::error::{Result, TermError};
use crate::layout::ConsoleScreenBufferInfo;
use crate::size::TerminalSize;

/// Numeric value reported by `GetLastError`
pub type OsErrorCode = u32;

bitflags! {
    /// Console output mode bits
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ConsoleMode: u32 {
        const PROCESSED_OUTPUT            = 0x0001;
        const WRAP_AT_EOL_OUTPUT          = 0x0002;
        const VIRTUAL_TERMINAL_PROCESSING = 0x0004;
        const DISABLE_NEWLINE_AUTO_RETURN = 0x0008;
        const LVB_GRID_WORLDWIDE          = 0x0010;
    }
}

/// Native console calls used by the queries.
///
/// Each fallible call returns the `GetLastError` code captured right after
/// the failing call.
pub trait ConsoleApi {
    type Handle: Copy;

    fn std_output_handle(&self) -> Self::Handle;

    fn screen_buffer_info(
        &self,
        handle: Self::Handle,
        info: &mut ConsoleScreenBufferInfo,
    ) -> std::result::Result<(), OsErrorCode>;

    fn console_mode(&self, handle: Self::Handle) -> std::result::Result<u32, OsErrorCode>;

    fn set_console_mode(
        &self,
        handle: Self::Handle,
        mode: u32,
    ) -> std::result::Result<(), OsErrorCode>;

    /// System text for an error code, already trimmed
    fn format_message(&self, code: OsErrorCode) -> String;
}

fn failure<A: ConsoleApi>(api: &A, call: &'static str, code: OsErrorCode) -> TermError {
    let message = api.format_message(code);
    warn!(call, code, %message, "Console call failed");
    TermError::call_failed(call, message)
}

/// Visible window size of the standard-output console
pub fn window_size<A: ConsoleApi>(api: &A) -> Result<TerminalSize> {
    let handle = api.std_output_handle();
    let mut info = ConsoleScreenBufferInfo::default();

    api.screen_buffer_info(handle, &mut info)
        .map_err(|code| failure(api, "GetConsoleScreenBufferInfo", code))?;

    trace!(window = ?info.window, "Console screen buffer info");
    Ok(TerminalSize::new(info.window_width(), info.window_height()))
}

/// Turn on virtual-terminal processing for standard output.
///
/// Returns `Ok(true)` once ANSI output is enabled. Failing to read or to
/// write the mode is an error either way. Other mode bits are kept.
pub fn enable_virtual_terminal<A: ConsoleApi>(api: &A) -> Result<bool> {
    let handle = api.std_output_handle();

    let raw = api
        .console_mode(handle)
        .map_err(|code| failure(api, "GetConsoleMode", code))?;
    let mode = ConsoleMode::from_bits_retain(raw);

    if mode.contains(ConsoleMode::VIRTUAL_TERMINAL_PROCESSING) {
        debug!(mode = raw, "Virtual terminal processing already enabled");
        return Ok(true);
    }

    let enabled = mode | ConsoleMode::VIRTUAL_TERMINAL_PROCESSING;
    api.set_console_mode(handle, enabled.bits())
        .map_err(|code| failure(api, "SetConsoleMode", code))?;

    debug!(from = raw, to = enabled.bits(), "Enabled virtual terminal processing");
    Ok(true)
}

/// Decode a `FormatMessageW` buffer: stop at the first NUL, drop the
/// trailing line terminator and whitespace.
pub fn decode_message(buf: &[u16]) -> String {
    let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..end]).trim_end().to_string()
}

/// Fallback text when the system has no message for `code`
pub fn unknown_error(code: OsErrorCode) -> String {
    format!("unknown error 0x{:08x}", code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SmallRect;
    use std::cell::{Cell, RefCell};

    const ERROR_INVALID_HANDLE: u32 = 6;

    /// In-memory console
    struct StubConsole {
        window: SmallRect,
        info_error: Option<u32>,
        mode: u32,
        read_error: Option<u32>,
        write_error: Option<u32>,
        written: RefCell<Vec<u32>>,
        handle_requests: Cell<usize>,
    }

    impl Default for StubConsole {
        fn default() -> Self {
            Self {
                window: SmallRect::new(0, 0, 79, 23),
                info_error: None,
                mode: 0,
                read_error: None,
                write_error: None,
                written: RefCell::new(Vec::new()),
                handle_requests: Cell::new(0),
            }
        }
    }

    impl ConsoleApi for StubConsole {
        type Handle = ();

        fn std_output_handle(&self) {
            self.handle_requests.set(self.handle_requests.get() + 1);
        }

        fn screen_buffer_info(
            &self,
            _handle: (),
            info: &mut ConsoleScreenBufferInfo,
        ) -> std::result::Result<(), OsErrorCode> {
            if let Some(code) = self.info_error {
                return Err(code);
            }
            info.window = self.window;
            Ok(())
        }

        fn console_mode(&self, _handle: ()) -> std::result::Result<u32, OsErrorCode> {
            match self.read_error {
                Some(code) => Err(code),
                None => Ok(self.mode),
            }
        }

        fn set_console_mode(&self, _handle: (), mode: u32) -> std::result::Result<(), OsErrorCode> {
            if let Some(code) = self.write_error {
                return Err(code);
            }
            self.written.borrow_mut().push(mode);
            Ok(())
        }

        fn format_message(&self, code: OsErrorCode) -> String {
            match code {
                ERROR_INVALID_HANDLE => "The handle is invalid.".to_string(),
                other => unknown_error(other),
            }
        }
    }

    #[test]
    fn test_window_size_inclusive() {
        let console = StubConsole::default();
        assert_eq!(window_size(&console).unwrap(), TerminalSize::new(80, 24));
        assert_eq!(console.handle_requests.get(), 1);
    }

    #[test]
    fn test_window_size_failure() {
        let console = StubConsole {
            info_error: Some(ERROR_INVALID_HANDLE),
            ..Default::default()
        };
        let err = window_size(&console).unwrap_err();
        assert_eq!(
            err,
            TermError::NativeCallFailed {
                call: "GetConsoleScreenBufferInfo",
                message: "The handle is invalid.".to_string(),
            }
        );
    }

    #[test]
    fn test_enable_sets_vt_flag() {
        let console = StubConsole::default();
        assert!(enable_virtual_terminal(&console).unwrap());
        assert_eq!(*console.written.borrow(), vec![0x0004]);
    }

    #[test]
    fn test_enable_keeps_other_bits() {
        let console = StubConsole {
            mode: 0x0003 | 0x8000,
            ..Default::default()
        };
        assert!(enable_virtual_terminal(&console).unwrap());
        assert_eq!(*console.written.borrow(), vec![0x8007]);
    }

    #[test]
    fn test_enable_when_already_set() {
        let console = StubConsole {
            mode: 0x0007,
            ..Default::default()
        };
        assert!(enable_virtual_terminal(&console).unwrap());
        assert!(console.written.borrow().is_empty());
    }

    #[test]
    fn test_enable_read_failure() {
        let console = StubConsole {
            read_error: Some(ERROR_INVALID_HANDLE),
            ..Default::default()
        };
        let err = enable_virtual_terminal(&console).unwrap_err();
        assert!(err.to_string().contains("The handle is invalid."));
        assert!(matches!(
            err,
            TermError::NativeCallFailed { call: "GetConsoleMode", .. }
        ));
        assert!(console.written.borrow().is_empty());
    }

    #[test]
    fn test_enable_write_failure() {
        let console = StubConsole {
            write_error: Some(87),
            ..Default::default()
        };
        let err = enable_virtual_terminal(&console).unwrap_err();
        assert_eq!(
            err,
            TermError::NativeCallFailed {
                call: "SetConsoleMode",
                message: "unknown error 0x00000057".to_string(),
            }
        );
    }

    #[test]
    fn test_repeated_calls_agree() {
        let console = StubConsole::default();
        assert_eq!(window_size(&console).unwrap(), window_size(&console).unwrap());
        assert_eq!(
            enable_virtual_terminal(&console).unwrap(),
            enable_virtual_terminal(&console).unwrap()
        );
        // The stub's mode never changes, so both calls write the same value
        assert_eq!(*console.written.borrow(), vec![0x0004, 0x0004]);
    }

    #[test]
    fn test_decode_message() {
        let mut buf: Vec<u16> = "Access is denied.\r\n".encode_utf16().collect();
        buf.resize(160, 0);
        assert_eq!(decode_message(&buf), "Access is denied.");

        let full: Vec<u16> = "no terminator".encode_utf16().collect();
        assert_eq!(decode_message(&full), "no terminator");

        assert_eq!(decode_message(&[0; 8]), "");
    }
}
