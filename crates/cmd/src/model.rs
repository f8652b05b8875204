// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use arrow::datatypes::{DataType, Field, FieldRef};
use blobstage::ForArrow;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Row of an items object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemModel {
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(rename = "status")]
    pub status_id: Option<i32>,
}

impl ForArrow for ItemModel {
    fn for_arrow() -> Vec<FieldRef> {
        vec![
            Arc::new(Field::new("id", DataType::Int64, true)),
            Arc::new(Field::new("name", DataType::Utf8, true)),
            Arc::new(Field::new("status", DataType::Int32, true)),
        ]
    }
}

/// Missing values print as empty text.
pub(crate) fn or_blank<T: std::fmt::Display>(value: Option<&T>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

impl std::fmt::Display for ItemModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}::{}",
            or_blank(self.id.as_ref()),
            or_blank(self.name.as_ref())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let item = ItemModel {
            id: Some(7),
            name: Some("pump".to_string()),
            status_id: Some(1),
        };
        assert_eq!(item.to_string(), "7::pump");

        let blank = ItemModel {
            id: None,
            name: None,
            status_id: None,
        };
        assert_eq!(blank.to_string(), "::");
    }

    #[test]
    fn test_columns() {
        assert_eq!(ItemModel::column_names(), vec!["id", "name", "status"]);
    }
}
