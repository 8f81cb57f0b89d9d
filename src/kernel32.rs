//! Kernel32 bindings for the console queries.
//!
//! Symbols are looked up once from `kernel32.dll` rather than linked, so a
//! missing export surfaces as [`TermError::NativeCallUnavailable`] instead of
//! a loader failure at process start.

use std::ffi::c_void;
use std::ptr;
use std::sync::OnceLock;

use tracing::debug;
use windows::core::{s, w};
use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};

use crate::console::{self, ConsoleApi, OsErrorCode};
use crate::error::{Result, TermError};
use crate::layout::ConsoleScreenBufferInfo;

type RawHandle = *mut c_void;

const STD_OUTPUT_HANDLE: u32 = -11i32 as u32;
const FORMAT_MESSAGE_IGNORE_INSERTS: u32 = 0x0000_0200;
const FORMAT_MESSAGE_FROM_SYSTEM: u32 = 0x0000_1000;
const MESSAGE_CAPACITY: usize = 512;

type GetStdHandleFn = unsafe extern "system" fn(u32) -> RawHandle;
type GetConsoleScreenBufferInfoFn =
    unsafe extern "system" fn(RawHandle, *mut ConsoleScreenBufferInfo) -> i32;
type GetConsoleModeFn = unsafe extern "system" fn(RawHandle, *mut u32) -> i32;
type SetConsoleModeFn = unsafe extern "system" fn(RawHandle, u32) -> i32;
type GetLastErrorFn = unsafe extern "system" fn() -> u32;
type FormatMessageWFn = unsafe extern "system" fn(
    u32,
    *const c_void,
    u32,
    u32,
    *mut u16,
    u32,
    *const c_void,
) -> u32;

/// Resolved Kernel32 entry points
pub struct Kernel32 {
    get_std_handle: GetStdHandleFn,
    get_console_screen_buffer_info: GetConsoleScreenBufferInfoFn,
    get_console_mode: GetConsoleModeFn,
    set_console_mode: SetConsoleModeFn,
    get_last_error: GetLastErrorFn,
    format_message_w: FormatMessageWFn,
}

macro_rules! resolve {
    ($module:expr, $name:literal) => {{
        // Safety: the target fn type matches the documented export signature
        match unsafe { GetProcAddress($module, s!($name)) } {
            Some(proc) => unsafe { std::mem::transmute(proc) },
            None => return Err(TermError::NativeCallUnavailable($name.to_string())),
        }
    }};
}

static KERNEL32: OnceLock<Result<Kernel32>> = OnceLock::new();

impl Kernel32 {
    /// Process-wide table, loaded on first use. A load failure is cached too.
    pub fn get() -> Result<&'static Kernel32> {
        KERNEL32
            .get_or_init(Self::load)
            .as_ref()
            .map_err(Clone::clone)
    }

    fn load() -> Result<Self> {
        let module = unsafe { LoadLibraryW(w!("kernel32.dll")) }
            .map_err(|e| TermError::NativeCallUnavailable(format!("kernel32.dll: {}", e)))?;

        let table = Kernel32 {
            get_std_handle: resolve!(module, "GetStdHandle"),
            get_console_screen_buffer_info: resolve!(module, "GetConsoleScreenBufferInfo"),
            get_console_mode: resolve!(module, "GetConsoleMode"),
            set_console_mode: resolve!(module, "SetConsoleMode"),
            get_last_error: resolve!(module, "GetLastError"),
            format_message_w: resolve!(module, "FormatMessageW"),
        };

        debug!("Resolved kernel32 console symbols");
        Ok(table)
    }

    fn last_error(&self) -> OsErrorCode {
        unsafe { (self.get_last_error)() }
    }
}

impl ConsoleApi for Kernel32 {
    type Handle = RawHandle;

    fn std_output_handle(&self) -> RawHandle {
        unsafe { (self.get_std_handle)(STD_OUTPUT_HANDLE) }
    }

    fn screen_buffer_info(
        &self,
        handle: RawHandle,
        info: &mut ConsoleScreenBufferInfo,
    ) -> std::result::Result<(), OsErrorCode> {
        if unsafe { (self.get_console_screen_buffer_info)(handle, info) } == 0 {
            return Err(self.last_error());
        }
        Ok(())
    }

    fn console_mode(&self, handle: RawHandle) -> std::result::Result<u32, OsErrorCode> {
        let mut mode: u32 = 0;
        if unsafe { (self.get_console_mode)(handle, &mut mode) } == 0 {
            return Err(self.last_error());
        }
        Ok(mode)
    }

    fn set_console_mode(&self, handle: RawHandle, mode: u32) -> std::result::Result<(), OsErrorCode> {
        if unsafe { (self.set_console_mode)(handle, mode) } == 0 {
            return Err(self.last_error());
        }
        Ok(())
    }

    fn format_message(&self, code: OsErrorCode) -> String {
        let mut buf = [0u16; MESSAGE_CAPACITY];
        let len = unsafe {
            (self.format_message_w)(
                FORMAT_MESSAGE_FROM_SYSTEM | FORMAT_MESSAGE_IGNORE_INSERTS,
                ptr::null(),
                code,
                0,
                buf.as_mut_ptr(),
                buf.len() as u32,
                ptr::null(),
            )
        };

        let message = console::decode_message(&buf[..(len as usize).min(MESSAGE_CAPACITY)]);
        if message.is_empty() {
            console::unknown_error(code)
        } else {
            message
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_is_cached() {
        let first = Kernel32::get().unwrap() as *const Kernel32;
        let second = Kernel32::get().unwrap() as *const Kernel32;
        assert_eq!(first, second);
    }

    #[test]
    fn test_format_known_error() {
        // ERROR_FILE_NOT_FOUND
        let message = Kernel32::get().unwrap().format_message(2);
        assert!(!message.is_empty());
        assert!(!message.ends_with('\n'));
    }

    #[test]
    fn test_format_unknown_error() {
        let message = Kernel32::get().unwrap().format_message(0x2000_0001);
        assert_eq!(message, "unknown error 0x20000001");
    }

    #[test]
    fn test_vt_flag_matches_windows() {
        use windows::Win32::System::Console::ENABLE_VIRTUAL_TERMINAL_PROCESSING;

        assert_eq!(
            console::ConsoleMode::VIRTUAL_TERMINAL_PROCESSING.bits(),
            ENABLE_VIRTUAL_TERMINAL_PROCESSING.0
        );
    }
}
