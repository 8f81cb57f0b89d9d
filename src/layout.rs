//! Native struct layouts.
//!
//! Each record mirrors an OS ABI struct field for field. Sizes and offsets are
//! pinned as constants and checked at compile time, so a drifting definition
//! fails the build instead of corrupting reads.
//!
//! ```text
//! winsize (POSIX, 8 bytes)
//! ├── 0  ws_row
//! ├── 2  ws_col
//! ├── 4  ws_xpixel
//! └── 6  ws_ypixel
//!
//! CONSOLE_SCREEN_BUFFER_INFO (Windows, 22 bytes)
//! ├── 0  dwSize               COORD
//! ├── 4  dwCursorPosition     COORD
//! ├── 8  wAttributes          WORD
//! ├── 10 srWindow             SMALL_RECT
//! └── 18 dwMaximumWindowSize  COORD
//! ```

use std::mem::{offset_of, size_of};

/// POSIX `struct winsize`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WinSize {
    pub ws_row: u16,
    pub ws_col: u16,
    pub ws_xpixel: u16,
    pub ws_ypixel: u16,
}

pub const WINSIZE_SIZE: usize = 8;
pub const WS_ROW_OFFSET: usize = 0;
pub const WS_COL_OFFSET: usize = 2;

/// Windows `COORD`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coord {
    pub x: i16,
    pub y: i16,
}

pub const COORD_SIZE: usize = 4;

/// Windows `SMALL_RECT`, inclusive on every edge
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmallRect {
    pub left: i16,
    pub top: i16,
    pub right: i16,
    pub bottom: i16,
}

pub const SMALL_RECT_SIZE: usize = 8;

impl SmallRect {
    pub const fn new(left: i16, top: i16, right: i16, bottom: i16) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Number of columns covered, counting both edges
    pub fn width(&self) -> u16 {
        inclusive_span(self.left, self.right)
    }

    /// Number of rows covered, counting both edges
    pub fn height(&self) -> u16 {
        inclusive_span(self.top, self.bottom)
    }
}

// Widen before subtracting: i16 edges can overflow, and an inverted rect
// clamps to zero instead of wrapping.
fn inclusive_span(start: i16, end: i16) -> u16 {
    let span = i32::from(end) - i32::from(start) + 1;
    span.clamp(0, i32::from(u16::MAX)) as u16
}

/// Windows `CONSOLE_SCREEN_BUFFER_INFO`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsoleScreenBufferInfo {
    pub size: Coord,
    pub cursor_position: Coord,
    pub attributes: u16,
    pub window: SmallRect,
    pub maximum_window_size: Coord,
}

pub const CONSOLE_SCREEN_BUFFER_INFO_SIZE: usize = 22;
pub const CSBI_SIZE_OFFSET: usize = 0;
pub const CSBI_CURSOR_POSITION_OFFSET: usize = 4;
pub const CSBI_ATTRIBUTES_OFFSET: usize = 8;
pub const CSBI_WINDOW_OFFSET: usize = 10;
pub const CSBI_MAXIMUM_WINDOW_SIZE_OFFSET: usize = 18;

impl ConsoleScreenBufferInfo {
    /// Visible window width in columns
    pub fn window_width(&self) -> u16 {
        self.window.width()
    }

    /// Visible window height in rows
    pub fn window_height(&self) -> u16 {
        self.window.height()
    }
}

const _: () = {
    assert!(size_of::<WinSize>() == WINSIZE_SIZE);
    assert!(offset_of!(WinSize, ws_row) == WS_ROW_OFFSET);
    assert!(offset_of!(WinSize, ws_col) == WS_COL_OFFSET);

    assert!(size_of::<Coord>() == COORD_SIZE);
    assert!(size_of::<SmallRect>() == SMALL_RECT_SIZE);

    assert!(size_of::<ConsoleScreenBufferInfo>() == CONSOLE_SCREEN_BUFFER_INFO_SIZE);
    assert!(offset_of!(ConsoleScreenBufferInfo, size) == CSBI_SIZE_OFFSET);
    assert!(offset_of!(ConsoleScreenBufferInfo, cursor_position) == CSBI_CURSOR_POSITION_OFFSET);
    assert!(offset_of!(ConsoleScreenBufferInfo, attributes) == CSBI_ATTRIBUTES_OFFSET);
    assert!(offset_of!(ConsoleScreenBufferInfo, window) == CSBI_WINDOW_OFFSET);
    assert!(
        offset_of!(ConsoleScreenBufferInfo, maximum_window_size)
            == CSBI_MAXIMUM_WINDOW_SIZE_OFFSET
    );
};
