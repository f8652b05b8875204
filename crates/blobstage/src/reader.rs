// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Staged reader state machine
//!
//! ```text
//! Created --open()--> Opening --ok--> Open --close()--> Closed
//!                        |
//!                        +--err--> Failed --close()--> Closed
//! ```
//!
//! Reads are only valid while `Open`. Teardown always runs in the same
//! order: decoder, then the stage's file handle, then temp file deletion.
//! It runs on `close()`, on a failed `open()`, and when the reader is
//! dropped, so every exit path from an open scope releases the stage.

use crate::decoder::{DataField, ParquetDecoder};
use crate::error::Error;
use crate::fetcher::{ObjectStoreFetcher, RemoteObjectFetcher, build_object_store};
use crate::location::ObjectLocation;
use crate::options::ReaderOptions;
use crate::policy::{StagingDecision, bytes_to_megabytes, decide};
use crate::progress::{Progress, Stopwatch};
use crate::record::ForArrow;
use crate::stage::Stage;
use crate::stream::{ReadMode, RecordStream};
use crate::Result;
use diagnostics::*;
use futures::Stream;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Created,
    Opening,
    Open,
    Closed,
    /// A previous `open()` failed; the stage has been released.
    Failed,
}

impl std::fmt::Display for ReaderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReaderState::Created => "created",
            ReaderState::Opening => "opening",
            ReaderState::Open => "open",
            ReaderState::Closed => "closed",
            ReaderState::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Reader for one remote parquet object, staged locally on open.
///
/// Not designed for concurrent use: one open/read/close sequence runs on
/// one task.
pub struct StagedReader {
    location: ObjectLocation,
    options: ReaderOptions,
    progress: Progress,
    fetcher: Arc<dyn RemoteObjectFetcher>,
    state: ReaderState,
    object_size: Option<u64>,
    decision: Option<StagingDecision>,
    // Field order mirrors teardown order
    decoder: Option<Arc<ParquetDecoder>>,
    stage: Option<Stage>,
}

impl std::fmt::Debug for StagedReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedReader")
            .field("location", &self.location)
            .field("state", &self.state)
            .field("decision", &self.decision)
            .field("options", &self.options)
            .finish()
    }
}

impl StagedReader {
    #[must_use]
    pub fn new(
        location: ObjectLocation,
        options: ReaderOptions,
        fetcher: Arc<dyn RemoteObjectFetcher>,
    ) -> Self {
        let progress = options.progress();
        Self {
            location,
            options,
            progress,
            fetcher,
            state: ReaderState::Created,
            object_size: None,
            decision: None,
            decoder: None,
            stage: None,
        }
    }

    /// Build the object store for `connection` (see [`build_object_store`])
    /// and a reader for `path` inside `container`.
    pub fn connect(
        connection: &str,
        container: &str,
        path: &str,
        store_options: &BTreeMap<String, String>,
        options: ReaderOptions,
    ) -> Result<Self> {
        let location = ObjectLocation::new(container, path);
        let store = build_object_store(connection, location.container(), store_options)?;
        let fetcher = Arc::new(ObjectStoreFetcher::new(store));
        Ok(Self::new(location, options, fetcher))
    }

    /// Query the size, stage the object and bind the decoder.
    ///
    /// Only valid from `Created`. Every failure is returned as
    /// `Error::OpenFailed` after the partial stage has been released, and
    /// leaves the reader `Failed`. Firing `cancel` aborts the size query or
    /// the download with a `Cancelled` cause.
    pub async fn open(&mut self, cancel: &CancellationToken) -> Result<()> {
        if self.state != ReaderState::Created {
            return Err(Error::InvalidState { state: self.state });
        }
        self.state = ReaderState::Opening;
        let timer = Stopwatch::start();

        match self.stage_object(cancel).await {
            Ok(()) => {
                self.state = ReaderState::Open;
                let location = self.location.to_string();
                let decision = self.decision.map(|d| d.to_string()).unwrap_or_default();
                info!("Opened {location} ({decision})", location, decision);
                self.progress.report(&format!(
                    "Blob [{}] is open for reading in [{}].",
                    self.location,
                    timer.descriptive()
                ));
                Ok(())
            }
            Err(e) => {
                self.teardown();
                self.state = ReaderState::Failed;
                let location = self.location.to_string();
                let message = e.to_string();
                error!("Failed to open {location}: {message}", location, message);
                Err(Error::OpenFailed {
                    location,
                    source: Box::new(e),
                })
            }
        }
    }

    async fn stage_object(&mut self, cancel: &CancellationToken) -> Result<()> {
        self.options.validate()?;

        self.progress
            .report(&format!("Reading Blob Info for [{}]...", self.location));
        let timer = Stopwatch::start();
        let size = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::cancelled(&self.location)),
            size = self.fetcher.size(&self.location) => size?,
        };
        self.progress.report(&format!(
            "Blob Info retrieved successfully in [{}]",
            timer.descriptive()
        ));

        let decision = decide(size, self.options.staging_threshold_bytes);
        self.object_size = Some(size);
        self.decision = Some(decision);

        self.progress.report("Initializing local stream for Blob data...");
        let stage = Stage::allocate(decision, size, self.options.staging_dir.as_deref())?;
        match stage.path() {
            Some(path) => {
                self.progress
                    .report(&format!("Initialized Temp File [{}]...", path.display()));
                self.progress.report("File Stream created successfully...");
            }
            None => self.progress.report("Memory Stream created successfully..."),
        }
        let stage = self.stage.insert(stage);

        self.progress.report(&format!(
            "Downloading Data ~[{} MB] into the local stream...",
            bytes_to_megabytes(size)
        ));
        let timer = Stopwatch::start();
        let written = self
            .fetcher
            .download_into(&self.location, stage, cancel)
            .await?;
        self.progress.report(&format!(
            "Successfully downloaded the Blob data in [{}]...",
            timer.descriptive()
        ));
        if written != size {
            self.progress.report(&format!(
                "Downloaded [{written}] bytes but Blob Info reported [{size}]"
            ));
        }

        let source = stage.seal().await?;
        self.decoder = Some(Arc::new(ParquetDecoder::open(source)?));
        Ok(())
    }

    /// Release the decoder and the stage. Idempotent; never fails.
    pub fn close(&mut self) {
        if self.state == ReaderState::Closed {
            return;
        }
        self.teardown();
        self.state = ReaderState::Closed;
        self.progress
            .report(&format!("Closed Blob Reader for [{}]", self.location));
    }

    fn teardown(&mut self) {
        // The decoder shares the stage's file handle
        drop(self.decoder.take());
        if let Some(stage) = self.stage.take() {
            stage.release(&self.progress);
        }
    }

    /// Record-oriented view of the open object.
    pub fn records(&self) -> Result<RecordStream<'_>> {
        match (&self.state, &self.decoder) {
            (ReaderState::Open, Some(decoder)) => Ok(RecordStream::new(decoder, &self.progress)),
            _ => Err(Error::NotOpen { state: self.state }),
        }
    }

    /// Lazy records, one row group at a time. See [`RecordStream::partitioned`].
    pub fn read_partitioned<T>(&self) -> Result<impl Stream<Item = Result<T>> + '_>
    where
        T: ForArrow + DeserializeOwned + Send + 'static,
    {
        Ok(self.records()?.partitioned::<T>())
    }

    /// Every record in one decode call.
    pub async fn read_all<T>(&self) -> Result<Vec<T>>
    where
        T: ForArrow + DeserializeOwned + Send + 'static,
    {
        self.records()?.all::<T>().await
    }

    pub async fn read<T>(&self, mode: ReadMode) -> Result<Vec<T>>
    where
        T: ForArrow + DeserializeOwned + Send + 'static,
    {
        self.records()?.collect::<T>(mode).await
    }

    /// Physical columns of the staged object.
    pub fn read_data_fields(&self) -> Result<Vec<DataField>> {
        Ok(self.records()?.data_fields())
    }

    #[must_use]
    pub fn state(&self) -> ReaderState {
        self.state
    }

    #[must_use]
    pub fn location(&self) -> &ObjectLocation {
        &self.location
    }

    #[must_use]
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Decision taken by the last `open()` that got as far as sizing.
    #[must_use]
    pub fn staging_decision(&self) -> Option<StagingDecision> {
        self.decision
    }

    /// Remote object size reported during `open()`.
    #[must_use]
    pub fn object_size(&self) -> Option<u64> {
        self.object_size
    }

    #[must_use]
    pub fn partition_count(&self) -> Option<usize> {
        self.decoder.as_ref().map(|decoder| decoder.partition_count())
    }

    #[must_use]
    pub fn row_count(&self) -> Option<u64> {
        self.decoder.as_ref().map(|decoder| decoder.row_count())
    }

    /// Rows in each row group, in file order.
    #[must_use]
    pub fn partition_row_counts(&self) -> Option<Vec<u64>> {
        self.decoder.as_ref().map(|decoder| {
            (0..decoder.partition_count())
                .filter_map(|index| decoder.partition_row_count(index))
                .collect()
        })
    }

    /// Temp file backing the stage, while one exists.
    #[must_use]
    pub fn staged_path(&self) -> Option<&Path> {
        self.stage.as_ref().and_then(Stage::path)
    }
}

impl Drop for StagedReader {
    fn drop(&mut self) {
        self.close();
    }
}
