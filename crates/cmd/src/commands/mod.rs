// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod items;
pub mod schema;

pub use items::{DEFAULT_STATUSES, ItemsArgs, items_command};
pub use schema::schema_command;
