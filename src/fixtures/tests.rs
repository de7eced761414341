use super::*;
use crate::services::diff;
use std::fs;
use tempfile::tempdir;

fn shipped() -> FixtureSet {
    FixtureSet::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures"))
}

/// Build the snapshot an image would report if it drifted exactly as `expected` says
fn snapshot_with_drift(baseline: &[ServiceState], expected: &BaselineDiff) -> Vec<ServiceState> {
    let mut actual: Vec<ServiceState> = baseline
        .iter()
        .filter(|s| !expected.contains_key(&s.key()))
        .cloned()
        .collect();
    actual.extend(expected.values().filter_map(|(_, right)| right.clone()));
    actual
}

#[test]
fn test_shipped_fixtures_load_for_every_tag() {
    let fixtures = shipped();
    for tag in Tag::ALL {
        let baseline = fixtures.baseline(tag).unwrap();
        assert!(!baseline.is_empty(), "empty baseline for {}", tag);
        fixtures.expected_diff(tag).unwrap();
    }
}

#[test]
fn test_1709_identical_snapshot_matches_empty_oracle() {
    let fixtures = shipped();
    let baseline = fixtures.baseline(Tag::V1709).unwrap();
    let expected = fixtures.expected_diff(Tag::V1709).unwrap();

    assert!(expected.is_empty());
    assert_eq!(diff(&baseline, &baseline), expected);
}

#[test]
fn test_oracles_are_reproducible_from_baseline() {
    let fixtures = shipped();
    for tag in [Tag::V1803, Tag::V2019] {
        let baseline = fixtures.baseline(tag).unwrap();
        let expected = fixtures.expected_diff(tag).unwrap();
        assert!(!expected.is_empty());

        let actual = snapshot_with_drift(&baseline, &expected);
        assert_eq!(diff(&baseline, &actual), expected, "tag {}", tag);
    }
}

#[test]
fn test_2019_oracle_entries() {
    let expected = shipped().expected_diff(Tag::V2019).unwrap();
    assert_eq!(expected.len(), 16);
    assert_eq!(
        expected["sppsvc"],
        (
            Some(ServiceState::new("sppsvc", 2)),
            Some(ServiceState::new("sppsvc", 4))
        )
    );
    assert_eq!(
        expected["waasmedicsvc"],
        (None, Some(ServiceState::new("WaaSMedicSvc", 4)))
    );
}

#[test]
fn test_missing_fixture_is_an_error() {
    let dir = tempdir().unwrap();
    let fixtures = FixtureSet::new(dir.path());

    let err = fixtures.baseline(Tag::V1803).unwrap_err();
    assert!(matches!(err, HarnessError::Read { .. }));
    assert!(err.to_string().contains(BASELINE_FILE));
}

#[test]
fn test_malformed_expected_diff_is_an_error() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("2019")).unwrap();
    fs::write(
        dir.path().join("2019").join(EXPECTED_DIFF_FILE),
        r#"{"spooler": [{"Name": "Spooler"}]}"#,
    )
    .unwrap();

    let err = FixtureSet::new(dir.path())
        .expected_diff(Tag::V2019)
        .unwrap_err();
    assert!(matches!(err, HarnessError::Json { .. }));
    assert!(err.to_string().contains(EXPECTED_DIFF_FILE));
}
