// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Memory-versus-disk staging decision

pub const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

/// Objects up to this size are staged in memory by default.
pub const DEFAULT_THRESHOLD_BYTES: u64 = 250 * BYTES_PER_MEGABYTE;

/// Where a downloaded object is staged before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingDecision {
    InMemory,
    TemporaryFile,
}

impl std::fmt::Display for StagingDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StagingDecision::InMemory => write!(f, "memory"),
            StagingDecision::TemporaryFile => write!(f, "temporary file"),
        }
    }
}

/// Pick a stage for an object of `object_len` bytes. The threshold is
/// inclusive: an object exactly at the threshold stays in memory.
#[must_use]
pub fn decide(object_len: u64, threshold_bytes: u64) -> StagingDecision {
    if object_len <= threshold_bytes {
        StagingDecision::InMemory
    } else {
        StagingDecision::TemporaryFile
    }
}

/// Whole mebibytes, rounded down.
#[must_use]
pub fn bytes_to_megabytes(bytes: u64) -> u64 {
    bytes / BYTES_PER_MEGABYTE
}
