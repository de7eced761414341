//! Versioned fixture files: per-tag service baselines and expected diffs.
//!
//! ```text
//! <root>/<tag>/baseline-services.json
//! <root>/<tag>/expected-diff.json
//! ```

use crate::error::HarnessError;
use crate::services::{parse_services, BaselineDiff, ServiceState};
use crate::tag::Tag;
use std::path::{Path, PathBuf};
use tracing::debug;

#[cfg(test)]
mod tests;

pub const BASELINE_FILE: &str = "baseline-services.json";
pub const EXPECTED_DIFF_FILE: &str = "expected-diff.json";

#[derive(Debug, Clone)]
pub struct FixtureSet {
    root: PathBuf,
}

impl FixtureSet {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn baseline_path(&self, tag: Tag) -> PathBuf {
        self.root.join(tag.as_str()).join(BASELINE_FILE)
    }

    pub fn expected_diff_path(&self, tag: Tag) -> PathBuf {
        self.root.join(tag.as_str()).join(EXPECTED_DIFF_FILE)
    }

    /// Services the image is expected to start from
    pub fn baseline(&self, tag: Tag) -> Result<Vec<ServiceState>, HarnessError> {
        load_services(&self.baseline_path(tag))
    }

    /// Known drift between the baseline and the image for this tag
    pub fn expected_diff(&self, tag: Tag) -> Result<BaselineDiff, HarnessError> {
        load_expected_diff(&self.expected_diff_path(tag))
    }
}

/// Read a service snapshot (array of `{Name, StartType}`) from a file
pub fn load_services(path: &Path) -> Result<Vec<ServiceState>, HarnessError> {
    let data = read(path)?;
    let services = parse_services(&data, &path.display().to_string())?;
    debug!("Loaded {} services from {:?}", services.len(), path);
    Ok(services)
}

/// Read an expected diff (`key -> [baseline | null, actual | null]`) from a file
pub fn load_expected_diff(path: &Path) -> Result<BaselineDiff, HarnessError> {
    let data = read(path)?;
    let expected: BaselineDiff =
        serde_json::from_slice(&data).map_err(|source| HarnessError::Json {
            origin: path.display().to_string(),
            source,
        })?;
    debug!("Loaded {} expected diff entries from {:?}", expected.len(), path);
    Ok(expected)
}

fn read(path: &Path) -> Result<Vec<u8>, HarnessError> {
    std::fs::read(path).map_err(|source| HarnessError::Read {
        path: path.to_path_buf(),
        source,
    })
}
