//! Config validation logic.
//! Only checks settings that do not need the filesystem; path checks live in
//! `fs_ops::resolve` so they run against the canonical paths.

use std::path::MAIN_SEPARATOR;

use crate::errors::ReorgError;

use super::types::Config;

impl Config {
    /// Reject settings that would make the scan meaningless.
    pub fn validate(&self) -> Result<(), ReorgError> {
        if self.marker_suffix.is_empty() {
            return Err(ReorgError::InvalidConfig(
                "marker suffix must not be empty".into(),
            ));
        }
        if self.marker_suffix.contains('/') || self.marker_suffix.contains(MAIN_SEPARATOR) {
            return Err(ReorgError::InvalidConfig(format!(
                "marker suffix '{}' must not contain a path separator",
                self.marker_suffix
            )));
        }
        if self.source.as_os_str().is_empty() {
            return Err(ReorgError::InvalidConfig("source path is empty".into()));
        }
        if self.target.as_ref().is_some_and(|t| t.as_os_str().is_empty()) {
            return Err(ReorgError::InvalidConfig("target path is empty".into()));
        }
        Ok(())
    }
}
