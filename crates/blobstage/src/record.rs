// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Schema-bound records
//!
//! A record type declares the physical columns it binds to through
//! [`ForArrow`]; serde field names (use `#[serde(rename = "...")]`) must
//! match the declared column names. Binding is lenient:
//!
//! - columns present in the file but not declared are ignored
//! - declared nullable columns missing from the file decode as null
//! - declared non-nullable columns missing from the file are left to
//!   `#[serde(default)]`
//! - present columns whose physical type differs from the declared type
//!   are cast to the declared type

use crate::Result;
use arrow::array::{ArrayRef, new_null_array};
use arrow::compute::cast;
use arrow::datatypes::{Field, FieldRef, Schema};
use arrow_array::{RecordBatch, RecordBatchOptions};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Columns a record type binds to, in declaration order.
pub trait ForArrow {
    fn for_arrow() -> Vec<FieldRef>;

    /// Declared column names.
    #[must_use]
    fn column_names() -> Vec<String> {
        Self::for_arrow()
            .iter()
            .map(|field| field.name().clone())
            .collect()
    }
}

/// Reshape `batch` to exactly the columns `declared` can bind.
pub fn bind_batch(batch: &RecordBatch, declared: &[FieldRef]) -> Result<RecordBatch> {
    let physical = batch.schema();
    let mut fields: Vec<Field> = Vec::with_capacity(declared.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(declared.len());

    for want in declared {
        match physical.column_with_name(want.name()) {
            Some((index, have)) => {
                let column = batch.column(index);
                let column = if have.data_type() == want.data_type() {
                    column.clone()
                } else {
                    cast(column, want.data_type())?
                };
                fields.push(Field::new(want.name(), want.data_type().clone(), true));
                columns.push(column);
            }
            None if want.is_nullable() => {
                fields.push(Field::new(want.name(), want.data_type().clone(), true));
                columns.push(new_null_array(want.data_type(), batch.num_rows()));
            }
            None => {}
        }
    }

    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    Ok(RecordBatch::try_new_with_options(
        Arc::new(Schema::new(fields)),
        columns,
        &options,
    )?)
}

/// Decode every row of `batch` as a `T`.
pub fn records_from_batch<T>(batch: &RecordBatch) -> Result<Vec<T>>
where
    T: ForArrow + DeserializeOwned,
{
    let bound = bind_batch(batch, &T::for_arrow())?;
    let items: Vec<T> = serde_arrow::from_record_batch(&bound)?;
    Ok(items)
}
