// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Record-oriented views over an open staged object
//!
//! Two read modes share one record type and one ordering contract:
//! row groups are visited in ascending order and records keep decoder
//! order within a row group.
//!
//! - [`RecordStream::partitioned`] is lazy and holds at most one row
//!   group's records at a time.
//! - [`RecordStream::all`] materializes the whole object in one call.
//!   Filter before collecting when combining with other iteration to
//!   avoid enumerating twice.
//!
//! Decoding reads the stage synchronously (a file stage does blocking
//! `std::fs` reads), so every decode call runs on tokio's blocking pool.

use crate::decoder::{DataField, ParquetDecoder};
use crate::error::Error;
use crate::progress::{Progress, Stopwatch};
use crate::record::ForArrow;
use crate::Result;
use async_stream::try_stream;
use futures::{Stream, TryStreamExt};
use serde::de::DeserializeOwned;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// One row group at a time
    #[default]
    Partitioned,
    /// The whole object in one decode call
    WholeObject,
}

impl std::str::FromStr for ReadMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "partitioned" | "partition" | "row-group" => Ok(ReadMode::Partitioned),
            "all" | "whole" | "whole-object" => Ok(ReadMode::WholeObject),
            other => Err(format!("unknown read mode '{other}'")),
        }
    }
}

/// Borrowed view of an open reader's decoder.
#[derive(Debug, Clone, Copy)]
pub struct RecordStream<'a> {
    decoder: &'a Arc<ParquetDecoder>,
    progress: &'a Progress,
}

/// Run a decode off the async worker threads.
async fn decode_blocking<T, F>(decoder: &Arc<ParquetDecoder>, decode: F) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: FnOnce(&ParquetDecoder) -> Result<Vec<T>> + Send + 'static,
{
    let decoder = Arc::clone(decoder);
    tokio::task::spawn_blocking(move || decode(&decoder))
        .await
        .map_err(|e| Error::Decode(format!("decode task failed: {e}")))?
}

impl<'a> RecordStream<'a> {
    pub(crate) fn new(decoder: &'a Arc<ParquetDecoder>, progress: &'a Progress) -> Self {
        Self { decoder, progress }
    }

    /// Lazy, single-pass sequence of records, one row group at a time.
    ///
    /// A decode failure ends the sequence with that error.
    pub fn partitioned<T>(self) -> impl Stream<Item = Result<T>> + 'a
    where
        T: ForArrow + DeserializeOwned + Send + 'static,
    {
        let decoder = self.decoder;
        let progress = self.progress;
        try_stream! {
            for index in 0..decoder.partition_count() {
                progress.report(&format!("Enumerating over RowGroup #[{index}]..."));
                let timer = Stopwatch::start();

                let group =
                    decode_blocking(decoder, move |d| d.decode_partition::<T>(index)).await?;

                progress.report(&format!(
                    "Deserialized RowGroup [{index}] from the Stream in [{}].",
                    timer.descriptive()
                ));

                for item in group {
                    yield item;
                }
            }
        }
    }

    /// Every record of the object, decoded in one call.
    pub async fn all<T>(self) -> Result<Vec<T>>
    where
        T: ForArrow + DeserializeOwned + Send + 'static,
    {
        self.progress.report("Deserializing all RowGroups from the Stream...");
        let timer = Stopwatch::start();

        let items = decode_blocking(self.decoder, ParquetDecoder::decode_all::<T>).await?;

        self.progress.report(&format!(
            "Deserialized [{}] records from the Stream in [{}].",
            items.len(),
            timer.descriptive()
        ));
        Ok(items)
    }

    /// Collect records using either mode.
    pub async fn collect<T>(self, mode: ReadMode) -> Result<Vec<T>>
    where
        T: ForArrow + DeserializeOwned + Send + 'static,
    {
        match mode {
            ReadMode::Partitioned => self.partitioned::<T>().try_collect().await,
            ReadMode::WholeObject => self.all::<T>().await,
        }
    }

    #[must_use]
    pub fn data_fields(self) -> Vec<DataField> {
        self.decoder.data_fields()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_mode_parses() {
        assert_eq!("partitioned".parse::<ReadMode>(), Ok(ReadMode::Partitioned));
        assert_eq!("ALL".parse::<ReadMode>(), Ok(ReadMode::WholeObject));
        assert!("sideways".parse::<ReadMode>().is_err());
        assert_eq!(ReadMode::default(), ReadMode::Partitioned);
    }
}
