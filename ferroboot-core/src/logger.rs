// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! ASCII log stream over the platform UART.
//!
//! Lines are formatted into a fixed-size `heapless` buffer; nothing here
//! allocates and an over-long line is truncated rather than dropped.

use core::fmt::{self, Write as _};

use crate::platform::Platform;

const LINE_CAP: usize = 160;

/// Format one log line and push it out the UART with a CRLF terminator.
/// Prefer the [`bootlog!`](crate::bootlog) macro over calling this directly.
pub fn write_line<P: Platform>(platform: &mut P, args: fmt::Arguments<'_>) {
    let mut line: heapless::String<LINE_CAP> = heapless::String::new();
    // A full buffer makes `write` return Err; ship what fit
    let _ = line.write_fmt(args);
    platform.uart_write(line.as_bytes());
    platform.uart_write(b"\r\n");
}

/// `printf`-style logging through the platform UART capability.
#[macro_export]
macro_rules! bootlog {
    ($platform:expr, $($arg:tt)*) => {
        $crate::logger::write_line($platform, core::format_args!($($arg)*))
    };
}
