//! Boundary to the service that narrates the differences of a row pair

mod cell_diff;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;

use crate::error::AdapterError;
use crate::model::Row;
use crate::similarity::SimilarityPair;

pub use cell_diff::{percentage_change, CellChange, CellDiffExplainer};

/// Describes how two similar rows differ.
///
/// Implementations wrap whatever client talks to the describing service;
/// the caller builds that client once and hands it in.
pub trait Explainer: Send + Sync {
    fn explain(&self, left: &Row, right: &Row) -> Result<String, AdapterError>;
}

/// Outcome of one explanation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum Explanation {
    Available(String),
    /// The service failed or returned nothing; carries the reason
    Unavailable(String),
}

impl Explanation {
    pub fn is_available(&self) -> bool {
        matches!(self, Explanation::Available(_))
    }
}

/// A similar pair with its explanation, if one was requested
#[derive(Debug, Clone, Serialize)]
pub struct ExplainedPair {
    #[serde(flatten)]
    pub pair: SimilarityPair,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
}

impl From<SimilarityPair> for ExplainedPair {
    fn from(pair: SimilarityPair) -> Self {
        Self {
            pair,
            explanation: None,
        }
    }
}

fn explain_one(explainer: &dyn Explainer, pair: &SimilarityPair) -> Explanation {
    match explainer.explain(&pair.left, &pair.right) {
        Ok(text) if !text.trim().is_empty() => Explanation::Available(text),
        Ok(_) => {
            log::warn!(
                "Explanation for lines {}/{} unavailable: {}",
                pair.left.source_line,
                pair.right.source_line,
                AdapterError::Empty
            );
            Explanation::Unavailable(AdapterError::Empty.to_string())
        }
        Err(e) => {
            log::warn!(
                "Explanation for lines {}/{} unavailable: {}",
                pair.left.source_line,
                pair.right.source_line,
                e
            );
            Explanation::Unavailable(e.to_string())
        }
    }
}

/// Explain every pair, running at most `concurrency` calls at once.
///
/// A failing call never aborts the batch; that pair is marked unavailable.
pub fn explain_pairs(
    pairs: Vec<SimilarityPair>,
    explainer: &dyn Explainer,
    concurrency: usize,
) -> Vec<ExplainedPair> {
    let explanations: Vec<Explanation> =
        match ThreadPoolBuilder::new().num_threads(concurrency.max(1)).build() {
            Ok(pool) => pool.install(|| {
                pairs
                    .par_iter()
                    .map(|pair| explain_one(explainer, pair))
                    .collect()
            }),
            Err(e) => {
                log::warn!("Could not start explanation pool ({}); running sequentially", e);
                pairs.iter().map(|pair| explain_one(explainer, pair)).collect()
            }
        };

    let available = explanations.iter().filter(|e| e.is_available()).count();
    log::info!("Explained {} of {} similar pairs", available, explanations.len());

    pairs
        .into_iter()
        .zip(explanations)
        .map(|(pair, explanation)| ExplainedPair {
            pair,
            explanation: Some(explanation),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    struct Flaky;

    impl Explainer for Flaky {
        fn explain(&self, left: &Row, _right: &Row) -> Result<String, AdapterError> {
            match left.source_line {
                2 => Ok("name changed".to_string()),
                3 => Ok("   ".to_string()),
                _ => Err(AdapterError::Unavailable("timeout".to_string())),
            }
        }
    }

    fn pair(line: usize) -> SimilarityPair {
        SimilarityPair {
            left: Row::new(vec![CellValue::from("a")], line),
            right: Row::new(vec![CellValue::from("b")], line),
            ratio: 0.9,
        }
    }

    #[test]
    fn test_failures_become_unavailable() {
        let explained = explain_pairs(vec![pair(2), pair(3), pair(4)], &Flaky, 2);

        assert_eq!(explained.len(), 3);
        assert_eq!(
            explained[0].explanation,
            Some(Explanation::Available("name changed".to_string()))
        );
        assert_eq!(
            explained[1].explanation,
            Some(Explanation::Unavailable(AdapterError::Empty.to_string()))
        );
        assert!(matches!(
            &explained[2].explanation,
            Some(Explanation::Unavailable(reason)) if reason.contains("timeout")
        ));
        assert_eq!(explained[2].pair.left.source_line, 4);
    }

    #[test]
    fn test_zero_concurrency_still_runs() {
        let explained = explain_pairs(vec![pair(2)], &Flaky, 0);
        assert!(explained[0].explanation.as_ref().unwrap().is_available());
    }
}
