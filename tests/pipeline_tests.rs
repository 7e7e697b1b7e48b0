//! End-to-end comparisons through the library API

mod common;

use common::{Fixture, PEOPLE, PEOPLE_EDITED};

use tabcompare::config::{Config, Pairing, SimilarityConfig};
use tabcompare::diff::Provenance;
use tabcompare::error::{Error, IngestionError, Side};
use tabcompare::explain::CellDiffExplainer;
use tabcompare::loader::{Delimiter, Encoding, NoProgress};
use tabcompare::pipeline::{compare_tables, load_tables, run};

fn run_default(config: &Config) -> tabcompare::Result<tabcompare::ComparisonReport> {
    run(config, None, &mut NoProgress, &mut NoProgress)
}

#[test]
fn test_identical_files() {
    let fixture = Fixture::new();
    let left = fixture.create_csv("left.csv", PEOPLE);
    let right = fixture.create_csv("right.csv", PEOPLE);

    let report = run_default(&Config::new(left, right)).unwrap();

    assert!(report.identical());
    assert!(report.similar_pairs.is_empty());
    assert_eq!(report.left.row_count, 3);
    assert!(report.diff.merge_diff.is_empty());
}

#[test]
fn test_edited_row_is_paired() {
    let fixture = Fixture::new();
    let left = fixture.create_csv("left.csv", PEOPLE);
    let right = fixture.create_csv("right.csv", PEOPLE_EDITED);

    let report = run_default(&Config::new(left, right)).unwrap();
    let diff = &report.diff;

    assert!(!report.identical());
    assert_eq!(diff.stats.common_rows, 2);
    assert_eq!(diff.partition.only_left.len(), 1);
    assert_eq!(diff.partition.only_right.len(), 1);
    assert_eq!(diff.merge_diff.rows.len(), 2);
    assert_eq!(diff.merge_diff.rows[0].provenance, Provenance::LeftOnly);
    assert_eq!(diff.merge_diff.rows[1].provenance, Provenance::RightOnly);

    assert_eq!(report.similar_pairs.len(), 1);
    let pair = &report.similar_pairs[0].pair;
    assert_eq!(pair.left.source_line, 4);
    assert!(pair.ratio > 0.9);
}

#[test]
fn test_threshold_excludes_pair() {
    let fixture = Fixture::new();
    let left = fixture.create_csv("left.csv", PEOPLE);
    let right = fixture.create_csv("right.csv", PEOPLE_EDITED);

    let config = Config::new(left, right)
        .with_similarity(SimilarityConfig::default().with_threshold(0.99));
    let report = run_default(&config).unwrap();

    assert!(!report.identical());
    assert!(report.similar_pairs.is_empty());
}

#[test]
fn test_removed_row() {
    let fixture = Fixture::new();
    let left = fixture.create_csv("left.csv", PEOPLE);
    let right = fixture.create_csv("right.csv", &PEOPLE[..3]);

    let report = run_default(&Config::new(left, right)).unwrap();

    assert_eq!(report.diff.stats.row_count_delta, -1);
    assert_eq!(report.diff.partition.only_left.len(), 1);
    assert!(report.diff.partition.only_right.is_empty());
    assert!(report.similar_pairs.is_empty());
}

#[test]
fn test_wrong_delimiter_names_side_and_file() {
    let fixture = Fixture::new();
    let left = fixture.create_csv("left.csv", PEOPLE);
    let right = fixture.create_delimited("right.csv", ";", PEOPLE);

    let err = run_default(&Config::new(left, right)).unwrap_err();
    let failures = err.load_failures();

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].side, Side::Right);
    assert!(failures[0].name.ends_with("right.csv"));
    assert!(matches!(
        failures[0].source,
        IngestionError::DelimiterNotFound { .. }
    ));
}

#[test]
fn test_both_sides_fail_independently() {
    let fixture = Fixture::new();
    let left = fixture.create_bytes("left.csv", b"");
    let right = fixture.create_csv("right.xlsx", PEOPLE);

    let err = run_default(&Config::new(left, right)).unwrap_err();
    let failures = err.load_failures();

    assert_eq!(failures.len(), 2);
    assert!(matches!(failures[0].source, IngestionError::Empty));
    assert!(matches!(
        failures[1].source,
        IngestionError::UnsupportedFileType { .. }
    ));
}

#[test]
fn test_per_side_delimiter_and_encoding() {
    let fixture = Fixture::new();
    let left = fixture.create_csv("left.csv", PEOPLE);
    let right = fixture.create_bytes(
        "right.txt",
        b"id|name|city\n1|Ann Lee|Oslo\n2|Bob Stone|Rome\n123|Jon Smith|Par\xeds\n",
    );

    let config = Config::new(&left, &right);
    let config = config
        .clone()
        .with_right(config.right.with_delimiter(Delimiter::Pipe).with_encoding(Encoding::Latin1));
    let report = run_default(&config).unwrap();

    assert_eq!(report.diff.stats.common_rows, 2);
    assert_eq!(report.similar_pairs.len(), 1);
    assert_eq!(report.similar_pairs[0].pair.right.text(), "123|Jon Smith|París");
}

#[test]
fn test_disjoint_columns_are_incompatible() {
    let fixture = Fixture::new();
    let left = fixture.create_csv("left.csv", &[&["a", "b"], &["1", "2"]]);
    let right = fixture.create_csv("right.csv", &[&["c", "d"], &["1", "2"]]);

    let err = run_default(&Config::new(left, right)).unwrap_err();
    match err {
        Error::IncompatibleSchema(e) => {
            assert_eq!(e.left_columns, vec!["a", "b"]);
            assert_eq!(e.right_columns, vec!["c", "d"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_explained_pairs() {
    let fixture = Fixture::new();
    let left = fixture.create_csv("left.csv", PEOPLE);
    let right = fixture.create_csv("right.csv", PEOPLE_EDITED);

    let config = Config::new(left, right)
        .with_explain(true)
        .with_similarity(SimilarityConfig::default().with_pairing(Pairing::Exclusive));
    let (left, right) = load_tables(&config, &mut NoProgress, &mut NoProgress).unwrap();
    let explainer = CellDiffExplainer::new(
        left.column_names().iter().map(|s| s.to_string()).collect(),
        right.column_names().iter().map(|s| s.to_string()).collect(),
    );

    let report = compare_tables(&config, &left, &right, Some(&explainer)).unwrap();
    let explanation = report.similar_pairs[0].explanation.as_ref().unwrap();

    assert!(explanation.is_available());
    let json = serde_json::to_value(explanation).unwrap();
    assert!(json["text"].as_str().unwrap().contains("name"));
}

#[test]
fn test_progress_reaches_one() {
    let fixture = Fixture::new();
    let left = fixture.create_csv("left.csv", PEOPLE);
    let right = fixture.create_csv("right.csv", PEOPLE);

    let mut left_reports: Vec<f64> = Vec::new();
    let mut right_reports: Vec<f64> = Vec::new();
    {
        let mut left_sink = |f: f64| left_reports.push(f);
        let mut right_sink = |f: f64| right_reports.push(f);
        load_tables(
            &Config::new(left, right).with_chunk_size(1),
            &mut left_sink,
            &mut right_sink,
        )
        .unwrap();
    }

    for reports in [&left_reports, &right_reports] {
        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(reports.last().copied(), Some(1.0));
    }
}
