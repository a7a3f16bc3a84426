//! Configuration ranking
//!
//! Collapses a metrics summary into one scalar score and orders
//! configurations by it. Scoring weights validity first, retry cost
//! second, and latency last.

use crate::lab::metrics::MetricsSummary;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Score a summary: validity dominates, retries penalize, latency
/// tie-breaks at millisecond scale.
pub fn score_metrics(summary: &MetricsSummary) -> f64 {
    100.0 * summary.valid_rate - 20.0 * summary.retry_rate - summary.average_latency / 1000.0
}

/// Rank configurations by descending score; equal scores order by
/// ascending configuration id so the ranking is deterministic.
pub fn compare_configs(groups: &BTreeMap<String, MetricsSummary>) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = groups
        .iter()
        .map(|(id, summary)| (id.clone(), score_metrics(summary)))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(valid_rate: f64, retry_rate: f64, average_latency: f64) -> MetricsSummary {
        MetricsSummary {
            valid_rate,
            retry_rate,
            average_latency,
            ..Default::default()
        }
    }

    #[test]
    fn validity_dominates_latency() {
        let fast_invalid = summary(0.5, 0.0, 100.0);
        let slow_valid = summary(1.0, 0.0, 5000.0);
        assert!(score_metrics(&slow_valid) > score_metrics(&fast_invalid));
    }

    #[test]
    fn ranking_is_descending_with_id_tie_break() {
        let mut groups = BTreeMap::new();
        groups.insert("b:cfg".to_string(), summary(1.0, 0.0, 200.0));
        groups.insert("a:cfg".to_string(), summary(1.0, 0.0, 200.0));
        groups.insert("c:cfg".to_string(), summary(0.5, 0.5, 200.0));

        let ranked = compare_configs(&groups);
        assert_eq!(ranked[0].0, "a:cfg");
        assert_eq!(ranked[1].0, "b:cfg");
        assert_eq!(ranked[2].0, "c:cfg");
        assert!(ranked[0].1 > ranked[2].1);
    }
}
