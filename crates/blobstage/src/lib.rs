// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Staged reads of remote parquet objects
//!
//! A [`StagedReader`] asks the remote store for an object's size, stages
//! the object in memory or in a temporary file depending on
//! [`ReaderOptions::staging_threshold_bytes`], and then decodes it into
//! schema-bound records either one row group at a time or all at once.
//!
//! ```no_run
//! # use blobstage::{ReaderOptions, StagedReader};
//! # use std::collections::BTreeMap;
//! # use tokio_util::sync::CancellationToken;
//! # async fn demo() -> blobstage::Result<()> {
//! let options = ReaderOptions::default().with_threshold_megabytes(64);
//! let mut reader = StagedReader::connect(
//!     "file:///data",
//!     "items",
//!     "2025/items.parquet",
//!     &BTreeMap::new(),
//!     options,
//! )?;
//! reader.open(&CancellationToken::new()).await?;
//! let fields = reader.read_data_fields()?;
//! reader.close();
//! # let _ = fields;
//! # Ok(())
//! # }
//! ```

pub mod decoder;
pub mod error;
pub mod fetcher;
pub mod location;
pub mod options;
pub mod policy;
pub mod progress;
pub mod reader;
pub mod record;
pub mod stage;
pub mod stream;

pub use decoder::{DataField, ParquetDecoder};
pub use error::Error;
pub use fetcher::{ObjectStoreFetcher, RemoteObjectFetcher, build_object_store};
pub use location::ObjectLocation;
pub use options::ReaderOptions;
pub use policy::{DEFAULT_THRESHOLD_BYTES, StagingDecision, decide};
pub use progress::{ProgressFn, Stopwatch};
pub use reader::{ReaderState, StagedReader};
pub use record::ForArrow;
pub use stage::{Stage, StagedSource};
pub use stream::{ReadMode, RecordStream};

pub type Result<T> = std::result::Result<T, Error>;
