//! ANSI terminal colors.

use std::fmt;

/// Foreground colors as SGR codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Color {
    Default = 0,
    Red = 31,
    Green = 32,
    Yellow = 33,
    Blue = 34,
    Magenta = 35,
    Cyan = 36,
    White = 37,
}

impl Color {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Wraps `text` in an SGR sequence and a reset.
///
/// ```
/// use autoroute::color::{paint, Color};
///
/// assert_eq!(paint(Color::Red, "500"), "\x1b[31m500\x1b[0m");
/// ```
pub fn paint(color: Color, text: &str) -> String {
    format!("\x1b[{color}m{text}\x1b[0m")
}
