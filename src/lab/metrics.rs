//! Aggregate metrics over a group of engine results

use crate::types::EngineResult;
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary statistics for one group of runs. All rates are in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub valid_rate: f64,
    pub average_latency: f64,
    pub retry_rate: f64,
    pub average_word_count: f64,
    pub violation_frequency: BTreeMap<String, usize>,
}

/// Compute summary metrics over a slice of results.
///
/// Empty input yields the all-zero summary rather than NaN rates. The
/// word-count average covers only runs that produced a counted
/// candidate; when none did, it is zero.
pub fn compute_metrics(results: &[EngineResult]) -> MetricsSummary {
    if results.is_empty() {
        return MetricsSummary::default();
    }

    let total = results.len() as f64;
    let valid = results.iter().filter(|result| result.is_valid()).count() as f64;
    let retried = results.iter().filter(|result| result.retries > 0).count() as f64;
    let latency_sum: u64 = results.iter().map(|result| result.latency_ms).sum();

    let word_counts: Vec<usize> = results
        .iter()
        .filter_map(|result| result.commit.as_ref().and_then(|commit| commit.word_count))
        .collect();
    let average_word_count = if word_counts.is_empty() {
        0.0
    } else {
        word_counts.iter().sum::<usize>() as f64 / word_counts.len() as f64
    };

    let mut violation_frequency = BTreeMap::new();
    for result in results {
        for violation in &result.violations {
            *violation_frequency.entry(violation.clone()).or_insert(0) += 1;
        }
    }

    MetricsSummary {
        valid_rate: valid / total,
        average_latency: latency_sum as f64 / total,
        retry_rate: retried / total,
        average_word_count,
        violation_frequency,
    }
}
