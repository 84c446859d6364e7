// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Support for in-driver debugging output.
//!
//! The board registers a sink once with [set_debug_writer]; after that every
//! [debug!](crate::debug!) in the clock drivers is formatted with its source
//! location and handed to the sink. Until a sink is registered the messages
//! are dropped.
//!
//! ```rust,ignore
//! unsafe { x5::debug::set_debug_writer(&UART_SINK) };
//! debug!("cpu clock now at {}Hz", rate);
//! ```

use core::fmt::{Arguments, Result, Write};
use core::ptr::addr_of;

/// Byte sink for debug output, usually a console UART.
pub trait IoWrite {
    /// Write `buf`, returning how many bytes were accepted.
    fn write(&self, buf: &[u8]) -> usize;
}

static mut DEBUG_WRITER: Option<&'static dyn IoWrite> = None;

/// Register the sink used by [debug!](crate::debug!).
///
/// # Safety
///
/// Must be called before any other code may print, and not concurrently with
/// it.
pub unsafe fn set_debug_writer(writer: &'static dyn IoWrite) {
    DEBUG_WRITER = Some(writer);
}

struct DebugWriterWrapper {
    writer: &'static dyn IoWrite,
}

impl Write for DebugWriterWrapper {
    fn write_str(&mut self, s: &str) -> Result {
        self.writer.write(s.as_bytes());
        Ok(())
    }
}

fn debug_writer() -> Option<DebugWriterWrapper> {
    // SAFETY: the writer is only set during board setup, before any clock
    // driver runs.
    let writer = unsafe { *addr_of!(DEBUG_WRITER) };
    writer.map(|writer| DebugWriterWrapper { writer })
}

#[doc(hidden)]
pub fn begin_debug_fmt(args: Arguments, file_line: &(&'static str, u32)) {
    if let Some(mut writer) = debug_writer() {
        let (file, line) = *file_line;
        let _ = writer.write_fmt(format_args!("X5_DEBUG: {}:{}: ", file, line));
        let _ = writer.write_fmt(args);
        let _ = writer.write_str("\r\n");
    }
}

/// In-driver debugging print.
#[macro_export]
macro_rules! debug {
    () => ({
        // Allow an empty debug!() to print the location when hit
        $crate::debug!("")
    });
    ($msg:expr $(,)?) => ({
        $crate::debug::begin_debug_fmt(format_args!($msg), {
            static _FILE_LINE: (&'static str, u32) = (file!(), line!());
            &_FILE_LINE
        })
    });
    ($fmt:expr, $($arg:tt)+) => ({
        $crate::debug::begin_debug_fmt(format_args!($fmt, $($arg)+), {
            static _FILE_LINE: (&'static str, u32) = (file!(), line!());
            &_FILE_LINE
        })
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink {
        bytes: AtomicUsize,
    }

    impl IoWrite for CountingSink {
        fn write(&self, buf: &[u8]) -> usize {
            self.bytes.fetch_add(buf.len(), Ordering::Relaxed);
            buf.len()
        }
    }

    static SINK: CountingSink = CountingSink {
        bytes: AtomicUsize::new(0),
    };

    #[test]
    fn messages_reach_registered_writer() {
        unsafe { set_debug_writer(&SINK) };
        let before = SINK.bytes.load(Ordering::Relaxed);
        debug!("pll locked at {}Hz", 1_500_000_000u64);
        // prefix, location, message and line ending
        assert!(SINK.bytes.load(Ordering::Relaxed) >= before + "pll locked at 1500000000Hz\r\n".len());
    }
}
