//! Pure text services applied between the gateway and the display.

mod reply_formatter;

pub use reply_formatter::*;
