// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Structured logging for the blobstage workspace
//!
//! Usage:
//! - Set BLOBSTAGE_LOG=off (default) - no logs
//! - Set BLOBSTAGE_LOG=info - staging lifecycle events
//! - Set BLOBSTAGE_LOG=debug - every progress message and timing
//!
//! Library code logs with named properties so the emitted events stay
//! machine-readable: `debug!("staged {bytes} bytes", bytes: 42)`.

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable selecting the minimum level.
pub const LOG_ENV: &str = "BLOBSTAGE_LOG";

static INIT: Once = Once::new();

/// Parsed value of [`LOG_ENV`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSetting {
    Off,
    Level(emit::Level),
    /// Unrecognized value; treated as `info`.
    Unknown,
}

/// Map a `BLOBSTAGE_LOG` value to a setting. Matching is case-insensitive.
#[must_use]
pub fn parse_log_setting(value: &str) -> LogSetting {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" => LogSetting::Off,
        "debug" => LogSetting::Level(emit::Level::Debug),
        "info" => LogSetting::Level(emit::Level::Info),
        "warn" => LogSetting::Level(emit::Level::Warn),
        "error" => LogSetting::Level(emit::Level::Error),
        _ => LogSetting::Unknown,
    }
}

/// Initialize diagnostics based on the BLOBSTAGE_LOG environment variable
///
/// Call once at application startup. Later calls are ignored.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let value = std::env::var(LOG_ENV).unwrap_or_else(|_| "off".to_string());

        let level = match parse_log_setting(&value) {
            LogSetting::Off => return,
            LogSetting::Level(level) => level,
            LogSetting::Unknown => {
                // Bootstrap warning: the emit runtime is not installed yet
                eprintln!("Warning: Unknown {LOG_ENV} value '{value}', using 'info'");
                emit::Level::Info
            }
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        // The runtime lives for the rest of the process
        std::mem::forget(rt);
    });
}

/// Log staging lifecycle events (open, staging decision, close)
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log detailed diagnostics (progress messages, timings, partition numbers)
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log recoverable faults (temp file cleanup failures)
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures that abort an operation
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

/// Re-export the init function for convenience
pub use init_diagnostics as init;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_safe_to_call_multiple_times() {
        init_diagnostics();
        init_diagnostics();
    }

    #[test]
    fn test_parse_log_setting() {
        assert_eq!(parse_log_setting("off"), LogSetting::Off);
        assert_eq!(parse_log_setting(""), LogSetting::Off);
        assert_eq!(
            parse_log_setting("DEBUG"),
            LogSetting::Level(emit::Level::Debug)
        );
        assert_eq!(
            parse_log_setting(" warn "),
            LogSetting::Level(emit::Level::Warn)
        );
        assert_eq!(parse_log_setting("verbose"), LogSetting::Unknown);
    }

    #[test]
    fn test_macros_compile() {
        info!("Test message");
        debug!("Debug message with {value}", value: 42);
        warn!("Warning message");
        error!("Error message");
    }
}
