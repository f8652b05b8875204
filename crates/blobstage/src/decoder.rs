// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Parquet decoder bound to a sealed stage
//!
//! File metadata is parsed once when the decoder is opened. Each decode
//! call builds a fresh record batch reader over the shared source, either
//! restricted to one row group or spanning the whole object.

use crate::error::Error;
use crate::record::{ForArrow, records_from_batch};
use crate::stage::StagedSource;
use crate::Result;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::{
    ArrowReaderMetadata, ArrowReaderOptions, ParquetRecordBatchReaderBuilder,
};
use serde::de::DeserializeOwned;

/// A physical column of the staged object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataField {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl std::fmt::Display for DataField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.data_type)?;
        if self.nullable {
            write!(f, " (nullable)")?;
        }
        Ok(())
    }
}

pub struct ParquetDecoder {
    source: StagedSource,
    metadata: ArrowReaderMetadata,
}

impl std::fmt::Debug for ParquetDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParquetDecoder")
            .field("partitions", &self.partition_count())
            .field("rows", &self.row_count())
            .finish()
    }
}

impl ParquetDecoder {
    /// Parse the footer of the staged object.
    pub fn open(source: StagedSource) -> Result<Self> {
        let metadata = ArrowReaderMetadata::load(&source, ArrowReaderOptions::default())?;
        Ok(Self { source, metadata })
    }

    /// Number of row groups.
    #[must_use]
    pub fn partition_count(&self) -> usize {
        self.metadata.metadata().num_row_groups()
    }

    #[must_use]
    pub fn row_count(&self) -> u64 {
        u64::try_from(self.metadata.metadata().file_metadata().num_rows()).unwrap_or(0)
    }

    /// Rows in one row group, if it exists.
    #[must_use]
    pub fn partition_row_count(&self, index: usize) -> Option<u64> {
        let groups = self.metadata.metadata().row_groups();
        groups
            .get(index)
            .map(|group| u64::try_from(group.num_rows()).unwrap_or(0))
    }

    /// Top-level physical columns in file order.
    #[must_use]
    pub fn data_fields(&self) -> Vec<DataField> {
        self.metadata
            .schema()
            .fields()
            .iter()
            .map(|field| DataField {
                name: field.name().clone(),
                data_type: field.data_type().clone(),
                nullable: field.is_nullable(),
            })
            .collect()
    }

    pub fn decode_partition<T>(&self, index: usize) -> Result<Vec<T>>
    where
        T: ForArrow + DeserializeOwned,
    {
        if index >= self.partition_count() {
            return Err(Error::Decode(format!(
                "row group {index} out of range (object has {})",
                self.partition_count()
            )));
        }
        self.decode(Some(vec![index]))
    }

    pub fn decode_all<T>(&self) -> Result<Vec<T>>
    where
        T: ForArrow + DeserializeOwned,
    {
        self.decode(None)
    }

    fn decode<T>(&self, row_groups: Option<Vec<usize>>) -> Result<Vec<T>>
    where
        T: ForArrow + DeserializeOwned,
    {
        let mut builder = ParquetRecordBatchReaderBuilder::new_with_metadata(
            self.source.clone(),
            self.metadata.clone(),
        );
        if let Some(row_groups) = row_groups {
            builder = builder.with_row_groups(row_groups);
        }
        let reader = builder.build().map_err(decode_error)?;

        let mut items = Vec::new();
        for batch in reader {
            let batch = batch.map_err(decode_error)?;
            items.extend(records_from_batch::<T>(&batch).map_err(decode_error)?);
        }
        Ok(items)
    }
}

/// Failures while materializing records all surface as `Error::Decode`.
fn decode_error(err: impl Into<Error>) -> Error {
    match err.into() {
        Error::Decode(message) => Error::Decode(message),
        other => Error::Decode(other.to_string()),
    }
}
