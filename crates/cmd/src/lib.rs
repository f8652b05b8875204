// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod commands;
pub mod config;
pub mod model;

pub use commands::{ItemsArgs, items_command, schema_command};
pub use config::{BlobConfig, ConfigOverrides, load_config, validate_config};
pub use model::ItemModel;
