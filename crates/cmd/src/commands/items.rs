// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::model::{ItemModel, or_blank};
use anyhow::{Context, Result};
use blobstage::{ReadMode, StagedReader};
use diagnostics::*;
use futures::TryStreamExt;
use tokio_util::sync::CancellationToken;

/// Statuses kept when none are requested.
pub const DEFAULT_STATUSES: [i32; 3] = [1, 2, 3];

#[derive(Debug, Clone)]
pub struct ItemsArgs {
    pub statuses: Vec<i32>,
    pub mode: ReadMode,
    /// One JSON object per line instead of the numbered listing
    pub json: bool,
}

impl Default for ItemsArgs {
    fn default() -> Self {
        Self {
            statuses: DEFAULT_STATUSES.to_vec(),
            mode: ReadMode::default(),
            json: false,
        }
    }
}

impl ItemsArgs {
    fn wants(&self, item: &ItemModel) -> bool {
        item.status_id.is_some_and(|status| self.statuses.contains(&status))
    }
}

/// Items command - lists items whose status is in the requested set
///
/// Opens the reader, filters while reading, and materializes the filtered
/// list once so the count and the listing come from the same pass. The
/// reader is closed before any output is written. Returns the number of
/// items listed.
pub async fn items_command<F>(
    reader: &mut StagedReader,
    args: &ItemsArgs,
    cancel: &CancellationToken,
    mut handler: F,
) -> Result<usize>
where
    F: FnMut(&str),
{
    let location = reader.location().to_string();
    debug!("items_command called for {location}", location);

    reader
        .open(cancel)
        .await
        .with_context(|| format!("Failed to open {location}"))?;

    let selected = select_items(reader, args).await;
    reader.close();
    let items = selected.with_context(|| format!("Failed to read items from {location}"))?;

    if args.json {
        for item in &items {
            handler(&serde_json::to_string(item)?);
        }
    } else {
        handler(&format!("[{}] Valid Items found after Filtering!", items.len()));
        for (index, item) in items.iter().enumerate() {
            handler(&format!(
                "{}) {} -- {} [Status={}]",
                index + 1,
                or_blank(item.id.as_ref()),
                or_blank(item.name.as_ref()),
                or_blank(item.status_id.as_ref())
            ));
        }
    }

    Ok(items.len())
}

async fn select_items(reader: &StagedReader, args: &ItemsArgs) -> blobstage::Result<Vec<ItemModel>> {
    match args.mode {
        ReadMode::Partitioned => {
            reader
                .read_partitioned::<ItemModel>()?
                .try_filter(|item| futures::future::ready(args.wants(item)))
                .try_collect()
                .await
        }
        ReadMode::WholeObject => Ok(reader
            .read_all::<ItemModel>()
            .await?
            .into_iter()
            .filter(|item| args.wants(item))
            .collect()),
    }
}
