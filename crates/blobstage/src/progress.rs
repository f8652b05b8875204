// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Optional progress callback and timing helpers
//!
//! Progress messages are informational only. They go to the caller's
//! callback (when one is configured) and to the `emit` runtime as debug
//! events; they never influence control flow.

use diagnostics::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Caller-supplied progress callback.
pub type ProgressFn = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Clone, Default)]
pub struct Progress {
    callback: Option<ProgressFn>,
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("enabled", &self.enabled())
            .finish()
    }
}

impl Progress {
    #[must_use]
    pub fn new(callback: Option<ProgressFn>) -> Self {
        Self { callback }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.callback.is_some()
    }

    pub fn report(&self, message: &str) {
        debug!("{message}", message);
        if let Some(callback) = &self.callback {
            callback(message);
        }
    }

    /// Report a fault that the caller cannot act on (teardown cleanup).
    pub fn fault(&self, message: &str) {
        warn!("{message}", message);
        if let Some(callback) = &self.callback {
            callback(message);
        }
    }
}

/// Wall-clock timer for progress messages.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    #[must_use]
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Elapsed time as `HHh:MMm:SSs:mmmms`.
    #[must_use]
    pub fn descriptive(&self) -> String {
        format_elapsed(self.elapsed())
    }
}

#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    let millis = elapsed.subsec_millis();
    format!("{hours:02}h:{minutes:02}m:{seconds:02}s:{millis:03}ms")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "00h:00m:00s:000ms");
        assert_eq!(
            format_elapsed(Duration::from_millis(1_250)),
            "00h:00m:01s:250ms"
        );
        assert_eq!(
            format_elapsed(Duration::from_secs(3 * 3600 + 7 * 60 + 9) + Duration::from_millis(5)),
            "03h:07m:09s:005ms"
        );
    }

    #[test]
    fn test_report_reaches_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress = Progress::new(Some(Arc::new(move |msg: &str| {
            sink.lock().expect("lock").push(msg.to_string());
        })));

        assert!(progress.enabled());
        progress.report("first");
        progress.fault("second");

        let seen = seen.lock().expect("lock");
        assert_eq!(*seen, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_disabled_progress_is_silent() {
        let progress = Progress::default();
        assert!(!progress.enabled());
        progress.report("nobody listens");
    }
}
