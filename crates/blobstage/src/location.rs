// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Container and object path of a remote object

use object_store::path::Path;

/// Separator trimmed from both ends of container names and object paths.
pub const PATH_SEPARATOR: char = '/';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    container: String,
    path: String,
}

impl ObjectLocation {
    /// Normalizes both parts by trimming [`PATH_SEPARATOR`] from each end.
    pub fn new(container: impl AsRef<str>, path: impl AsRef<str>) -> Self {
        Self {
            container: normalize(container.as_ref()),
            path: normalize(path.as_ref()),
        }
    }

    #[must_use]
    pub fn container(&self) -> &str {
        &self.container
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Key of the object inside its container's store.
    #[must_use]
    pub fn object_path(&self) -> Path {
        Path::from(self.path.as_str())
    }
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.container, PATH_SEPARATOR, self.path)
    }
}

#[must_use]
pub fn normalize(value: &str) -> String {
    value.trim_matches(PATH_SEPARATOR).to_string()
}
