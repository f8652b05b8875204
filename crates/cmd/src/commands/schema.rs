// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use blobstage::StagedReader;
use tokio_util::sync::CancellationToken;

/// Schema command - shows the physical columns of the object
pub async fn schema_command<F>(
    reader: &mut StagedReader,
    cancel: &CancellationToken,
    mut handler: F,
) -> Result<()>
where
    F: FnMut(&str),
{
    let location = reader.location().to_string();
    reader
        .open(cancel)
        .await
        .with_context(|| format!("Failed to open {location}"))?;

    let fields = reader.read_data_fields();
    let partitions = reader.partition_count().unwrap_or(0);
    let rows = reader.row_count().unwrap_or(0);
    let group_rows = reader.partition_row_counts().unwrap_or_default();
    reader.close();
    let fields = fields.with_context(|| format!("Failed to read schema of {location}"))?;

    handler(&format!("Schema of {location}:"));
    for field in &fields {
        handler(&format!("  {field}"));
    }
    handler(&format!("Row groups: {partitions}"));
    for (index, count) in group_rows.iter().enumerate() {
        handler(&format!("  Row group {index}: {count} rows"));
    }
    handler(&format!("Rows: {rows}"));
    Ok(())
}
