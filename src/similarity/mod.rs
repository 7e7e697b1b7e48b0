//! Fuzzy pairing of rows left unmatched by the diff

mod ratio;

use std::time::Instant;

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::config::{Blocking, Pairing, SimilarityConfig};
use crate::model::Row;

pub use ratio::ratio;

use ratio::{char_counts, length_bound, multiset_bound, ratio_chars};

/// A left row and a right row whose text is similar
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityPair {
    pub left: Row,
    pub right: Row,
    pub ratio: f64,
}

/// Similarity between two rows' text forms
pub fn row_ratio(left: &Row, right: &Row) -> f64 {
    ratio(&left.text(), &right.text())
}

/// A row's text, prepared once for repeated scoring
struct PreparedRow {
    chars: Vec<char>,
    counts: FxHashMap<char, usize>,
    block: Option<String>,
}

impl PreparedRow {
    fn new(row: &Row, blocking: Blocking) -> Self {
        let chars: Vec<char> = row.text().chars().collect();
        let counts = char_counts(&chars);
        let block = match blocking {
            Blocking::None => None,
            Blocking::LeadingToken => Some(
                row.get(0)
                    .map(|c| c.text().trim().to_string())
                    .unwrap_or_default(),
            ),
        };
        Self {
            chars,
            counts,
            block,
        }
    }
}

/// Scores every left row against every right row
pub struct SimilarityMatcher {
    config: SimilarityConfig,
}

impl Default for SimilarityMatcher {
    fn default() -> Self {
        Self::new(SimilarityConfig::default())
    }
}

impl SimilarityMatcher {
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// Pairs whose ratio is strictly above the threshold.
    ///
    /// With `Pairing::AllPairs` a row may occur in several pairs; with
    /// `Pairing::Exclusive` each row is used at most once, best ratios
    /// first. Pairs come back in left-row order, then right-row order.
    pub fn match_rows(&self, only_left: &[Row], only_right: &[Row]) -> Vec<SimilarityPair> {
        let started = Instant::now();
        let threshold = self.config.threshold;
        let blocking = self.config.blocking;
        let prefilter = self.config.prefilter;

        let right: Vec<PreparedRow> = only_right
            .par_iter()
            .map(|row| PreparedRow::new(row, blocking))
            .collect();

        let per_left: Vec<(Vec<(usize, usize, f64)>, usize)> = only_left
            .par_iter()
            .enumerate()
            .map(|(i, row)| {
                let left = PreparedRow::new(row, blocking);
                let mut found = Vec::new();
                let mut scored = 0;
                for (j, candidate) in right.iter().enumerate() {
                    if left.block != candidate.block {
                        continue;
                    }
                    if prefilter && !may_exceed(&left, candidate, threshold) {
                        continue;
                    }
                    scored += 1;
                    let score = ratio_chars(&left.chars, &candidate.chars);
                    if score > threshold {
                        found.push((i, j, score));
                    }
                }
                (found, scored)
            })
            .collect();

        let scored: usize = per_left.iter().map(|(_, n)| n).sum();
        let mut candidates: Vec<(usize, usize, f64)> =
            per_left.into_iter().flat_map(|(found, _)| found).collect();

        if self.config.pairing == Pairing::Exclusive {
            candidates = exclusive(candidates, only_left.len(), only_right.len());
        }

        log::debug!(
            "Similarity: {} x {} rows, {} pairs scored, {} above {} ({:?})",
            only_left.len(),
            only_right.len(),
            scored,
            candidates.len(),
            threshold,
            started.elapsed()
        );

        candidates
            .into_iter()
            .map(|(i, j, ratio)| SimilarityPair {
                left: only_left[i].clone(),
                right: only_right[j].clone(),
                ratio,
            })
            .collect()
    }
}

/// Cheap upper bounds; a pair that cannot beat the threshold is skipped
fn may_exceed(a: &PreparedRow, b: &PreparedRow, threshold: f64) -> bool {
    let (la, lb) = (a.chars.len(), b.chars.len());
    length_bound(la, lb) > threshold && multiset_bound(&a.counts, la, &b.counts, lb) > threshold
}

/// Greedy one-to-one assignment by descending ratio
fn exclusive(
    mut candidates: Vec<(usize, usize, f64)>,
    left_len: usize,
    right_len: usize,
) -> Vec<(usize, usize, f64)> {
    candidates.sort_by(|a, b| b.2.total_cmp(&a.2).then(a.0.cmp(&b.0)).then(a.1.cmp(&b.1)));

    let mut left_used = vec![false; left_len];
    let mut right_used = vec![false; right_len];
    let mut chosen: Vec<(usize, usize, f64)> = candidates
        .into_iter()
        .filter(|&(i, j, _)| {
            if left_used[i] || right_used[j] {
                return false;
            }
            left_used[i] = true;
            right_used[j] = true;
            true
        })
        .collect();

    chosen.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, Table};

    fn rows(values: &[(&str, &str)]) -> Vec<Row> {
        Table::from_records(
            &["id", "name"],
            values
                .iter()
                .map(|(id, name)| vec![CellValue::from(*id), CellValue::from(*name)]),
        )
        .rows()
        .to_vec()
    }

    #[test]
    fn test_near_match_is_emitted() {
        let left = rows(&[("123", "Jon Smith")]);
        let right = rows(&[("123", "John Smith")]);

        let pairs = SimilarityMatcher::default().match_rows(&left, &right);
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].ratio > 0.8);
        assert_eq!(pairs[0].left.cells[1], CellValue::from("Jon Smith"));
        assert_eq!(pairs[0].right.cells[1], CellValue::from("John Smith"));
    }

    #[test]
    fn test_dissimilar_rows_are_not_paired() {
        let left = rows(&[("1", "alpha")]);
        let right = rows(&[("9", "omega")]);
        assert!(SimilarityMatcher::default().match_rows(&left, &right).is_empty());
    }

    #[test]
    fn test_all_pairs_allows_reuse() {
        let left = rows(&[("100", "Ann Lee")]);
        let right = rows(&[("100", "Anne Lee"), ("100", "Ann Leigh")]);

        let pairs = SimilarityMatcher::default().match_rows(&left, &right);
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_exclusive_uses_each_row_once() {
        let left = rows(&[("100", "Ann Lee")]);
        let right = rows(&[("100", "Ann Leigh"), ("100", "Anne Lee")]);

        let config = SimilarityConfig::default().with_pairing(Pairing::Exclusive);
        let pairs = SimilarityMatcher::new(config).match_rows(&left, &right);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].right.cells[1], CellValue::from("Anne Lee"));
    }

    #[test]
    fn test_prefilter_does_not_change_results() {
        let left = rows(&[("1", "Jon Smith"), ("2", "Mary Major"), ("3", "x")]);
        let right = rows(&[("1", "John Smith"), ("2", "Mary Majors"), ("4", "yz")]);

        let with = SimilarityMatcher::default().match_rows(&left, &right);
        let without = SimilarityMatcher::new(SimilarityConfig::default().with_prefilter(false))
            .match_rows(&left, &right);
        let key = |p: &SimilarityPair| (p.left.text(), p.right.text(), p.ratio);
        assert_eq!(
            with.iter().map(key).collect::<Vec<_>>(),
            without.iter().map(key).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_leading_token_blocking() {
        let left = rows(&[("123", "Jon Smith")]);
        let right = rows(&[("124", "Jon Smith")]);

        assert_eq!(SimilarityMatcher::default().match_rows(&left, &right).len(), 1);
        let config = SimilarityConfig::default().with_blocking(Blocking::LeadingToken);
        assert!(SimilarityMatcher::new(config).match_rows(&left, &right).is_empty());
    }

    #[test]
    fn test_row_ratio_symmetric_and_reflexive() {
        let r = rows(&[("123", "Jon Smith"), ("321", "John Smyth")]);
        assert_eq!(row_ratio(&r[0], &r[0]), 1.0);
        assert_eq!(row_ratio(&r[0], &r[1]), row_ratio(&r[1], &r[0]));
    }
}
