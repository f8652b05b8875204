// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Reader configuration

use crate::error::Error;
use crate::policy::{BYTES_PER_MEGABYTE, DEFAULT_THRESHOLD_BYTES};
use crate::progress::{Progress, ProgressFn};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

fn default_threshold() -> u64 {
    DEFAULT_THRESHOLD_BYTES
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ReaderOptions {
    /// Objects at or below this size are staged in memory
    #[serde(default = "default_threshold")]
    pub staging_threshold_bytes: u64,

    /// Directory for temporary stage files (platform temp dir when unset).
    /// Not checked up front; a bad directory fails when the file stage is created.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// Progress callback; diagnostics are disabled when unset
    #[serde(skip)]
    pub on_progress: Option<ProgressFn>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            staging_threshold_bytes: DEFAULT_THRESHOLD_BYTES,
            staging_dir: None,
            on_progress: None,
        }
    }
}

impl std::fmt::Debug for ReaderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderOptions")
            .field("staging_threshold_bytes", &self.staging_threshold_bytes)
            .field("staging_dir", &self.staging_dir)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl ReaderOptions {
    #[must_use]
    pub fn with_threshold_bytes(mut self, bytes: u64) -> Self {
        self.staging_threshold_bytes = bytes;
        self
    }

    /// Threshold in mebibytes; saturates instead of overflowing.
    #[must_use]
    pub fn with_threshold_megabytes(mut self, megabytes: u64) -> Self {
        self.staging_threshold_bytes = megabytes.saturating_mul(BYTES_PER_MEGABYTE);
        self
    }

    #[must_use]
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn logging_enabled(&self) -> bool {
        self.on_progress.is_some()
    }

    pub(crate) fn progress(&self) -> Progress {
        Progress::new(self.on_progress.clone())
    }

    /// Checked at the start of every open.
    pub fn validate(&self) -> Result<()> {
        // An in-memory stage must be addressable
        if usize::try_from(self.staging_threshold_bytes).is_err() {
            return Err(Error::InvalidOptions(format!(
                "staging_threshold_bytes {} exceeds addressable memory",
                self.staging_threshold_bytes
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReaderOptions::default();
        assert_eq!(options.staging_threshold_bytes, 250 * 1024 * 1024);
        assert!(!options.logging_enabled());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_megabytes_saturate() {
        let options = ReaderOptions::default().with_threshold_megabytes(u64::MAX);
        assert_eq!(options.staging_threshold_bytes, u64::MAX);

        let options = ReaderOptions::default().with_threshold_megabytes(2);
        assert_eq!(options.staging_threshold_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_deserialize_fills_defaults() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let options: ReaderOptions = serde_json::from_str("{}")?;
        assert_eq!(options.staging_threshold_bytes, DEFAULT_THRESHOLD_BYTES);
        assert!(options.staging_dir.is_none());

        let options: ReaderOptions =
            serde_json::from_str(r#"{"staging_threshold_bytes": 1000}"#)?;
        assert_eq!(options.staging_threshold_bytes, 1000);
        Ok(())
    }

    #[test]
    fn test_staging_dir_is_not_checked_up_front() {
        let options = ReaderOptions::default().with_staging_dir("/definitely/not/here");
        assert!(options.validate().is_ok());
    }
}
