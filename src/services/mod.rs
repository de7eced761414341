//! Windows service snapshots and the baseline differ.
//!
//! A snapshot is the JSON produced by `Get-Service | ConvertTo-JSON` inside a
//! container, or a fixture file with the same shape. [`diff`] pairs a baseline
//! snapshot with an actual one by case-insensitive service name and keeps only
//! the services whose records differ.

use crate::error::HarnessError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;


/// Point-in-time state of one Windows service
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceState {
    #[serde(rename = "Name")]
    pub name: String,
    /// Startup mode as reported by the OS; compared only for equality
    #[serde(rename = "StartType")]
    pub start_type: i64,
}

impl ServiceState {
    pub fn new(name: impl Into<String>, start_type: i64) -> Self {
        Self {
            name: name.into(),
            start_type,
        }
    }

    /// Key under which this service is compared against the other snapshot
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(StartType={})", self.name, self.start_type)
    }
}

/// Baseline state first, actual state second; `None` when the service is absent on that side
pub type ServicePair = (Option<ServiceState>, Option<ServiceState>);

/// Services whose baseline and actual states differ, keyed by lowercase name
pub type BaselineDiff = BTreeMap<String, ServicePair>;

/// Compute the services whose state differs between `baseline` and `actual`.
///
/// When the same lowercase name occurs twice within one side, the later record wins.
pub fn diff(baseline: &[ServiceState], actual: &[ServiceState]) -> BaselineDiff {
    let mut diffs = BaselineDiff::new();

    for service in baseline {
        diffs.insert(service.key(), (Some(service.clone()), None));
    }

    for service in actual {
        diffs
            .entry(service.key())
            .and_modify(|pair| pair.1 = Some(service.clone()))
            .or_insert_with(|| (None, Some(service.clone())));
    }

    diffs.retain(|_, (left, right)| left != right);
    diffs
}

/// Decode a service snapshot.
///
/// Tolerates a UTF-8 byte order mark and a bare object in place of a
/// one-element array, both of which PowerShell produces. `origin` names the
/// source in error messages.
pub fn parse_services(bytes: &[u8], origin: &str) -> Result<Vec<ServiceState>, HarnessError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<ServiceState>),
        One(ServiceState),
    }

    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let parsed: OneOrMany = serde_json::from_slice(bytes).map_err(|source| HarnessError::Json {
        origin: origin.to_string(),
        source,
    })?;

    Ok(match parsed {
        OneOrMany::Many(services) => services,
        OneOrMany::One(service) => vec![service],
    })
}

/// Structural difference between an expected and an observed [`BaselineDiff`]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DiffMismatch {
    /// Expected entries that were not observed
    pub missing: BTreeMap<String, ServicePair>,
    /// Observed entries that were not expected
    pub unexpected: BTreeMap<String, ServicePair>,
    /// Entries present in both with different pairs: (expected, observed)
    pub changed: BTreeMap<String, (ServicePair, ServicePair)>,
}

impl DiffMismatch {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty() && self.changed.is_empty()
    }
}

/// Compare the oracle for a tag against the diff computed from a live snapshot
pub fn compare_diffs(expected: &BaselineDiff, actual: &BaselineDiff) -> DiffMismatch {
    let mut mismatch = DiffMismatch::default();

    for (key, expected_pair) in expected {
        match actual.get(key) {
            None => {
                mismatch.missing.insert(key.clone(), expected_pair.clone());
            }
            Some(actual_pair) if actual_pair != expected_pair => {
                mismatch
                    .changed
                    .insert(key.clone(), (expected_pair.clone(), actual_pair.clone()));
            }
            Some(_) => {}
        }
    }

    for (key, actual_pair) in actual {
        if !expected.contains_key(key) {
            mismatch.unexpected.insert(key.clone(), actual_pair.clone());
        }
    }

    mismatch
}

fn side(state: &Option<ServiceState>) -> String {
    state
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "<absent>".to_string())
}

fn pair(pair: &ServicePair) -> String {
    format!("{} -> {}", side(&pair.0), side(&pair.1))
}

impl fmt::Display for DiffMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, expected) in &self.missing {
            writeln!(f, "- {}: expected {}, not observed", key, pair(expected))?;
        }
        for (key, actual) in &self.unexpected {
            writeln!(f, "+ {}: observed {}, not expected", key, pair(actual))?;
        }
        for (key, (expected, actual)) in &self.changed {
            writeln!(
                f,
                "~ {}: expected {}, observed {}",
                key,
                pair(expected),
                pair(actual)
            )?;
        }
        Ok(())
    }
}
