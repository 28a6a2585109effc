use approx::assert_relative_eq;
use mmlu_eval_core::CoreError;
use mmlu_eval_metrics::aggregators::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;

fn result(subject: &str, cors: Vec<bool>, latency_ms: u64, models: &[&str]) -> SubjectResult {
    SubjectResult::new(
        subject,
        cors,
        Duration::from_millis(latency_ms),
        models.iter().copied().collect(),
        5,
    )
}

// ===== ModelCounts Tests =====

#[test]
fn test_model_counts_record_and_get() {
    let mut counts = ModelCounts::new();
    counts.record("llama");
    counts.record("llama");
    counts.record("mistral");

    assert_eq!(counts.get("llama"), 2);
    assert_eq!(counts.get("mistral"), 1);
    assert_eq!(counts.get("unknown"), 0);
    assert_eq!(counts.total(), 3);
    assert_eq!(counts.len(), 2);
}

#[test]
fn test_model_counts_merge_sums_keywise() {
    let mut left: ModelCounts = ["a", "a", "b"].into_iter().collect();
    let right: ModelCounts = ["b", "c"].into_iter().collect();

    left.merge(&right);

    let merged: Vec<_> = left.iter().collect();
    assert_eq!(merged, vec![("a", 2), ("b", 2), ("c", 1)]);
}

#[test]
fn test_model_counts_display_is_sorted() {
    let counts: ModelCounts = ["zeta", "alpha", "zeta"].into_iter().collect();
    assert_eq!(counts.to_string(), "alpha: 1, zeta: 2");
}

#[test]
fn test_model_counts_serializes_as_plain_map() {
    let counts: ModelCounts = ["m1", "m1", "m2"].into_iter().collect();
    let json = serde_json::to_value(&counts).unwrap();

    assert_eq!(json, serde_json::json!({"m1": 2, "m2": 1}));
}

#[test]
fn test_percentages_with_zero_total() {
    let counts: ModelCounts = ["m1"].into_iter().collect();
    assert_eq!(counts.percentages(0), vec![("m1".to_string(), 0.0)]);
}

// ===== SubjectResult Tests =====

#[test]
fn test_subject_result_accuracy_is_mean() {
    let result = result("anatomy", vec![true, false], 120, &["m", "m"]);

    assert_relative_eq!(result.accuracy, 0.5);
    assert_eq!(result.num_questions(), 2);
    assert_eq!(result.num_correct(), 1);
}

#[test]
fn test_subject_result_empty_is_zero() {
    let result = result("empty", vec![], 0, &[]);
    assert_eq!(result.accuracy, 0.0);
}

// ===== RunAggregator Tests =====

#[test]
fn test_weighted_accuracy_counts_questions_not_subjects() {
    let mut aggregator = RunAggregator::new();
    aggregator.record(&result("small", vec![true], 100, &["m"]));
    aggregator.record(&result("large", vec![false, false, false], 300, &["m", "m", "m"]));

    let summary = aggregator.summary().unwrap();

    // Unweighted mean of per-subject accuracies would be 0.5.
    assert_relative_eq!(summary.accuracy, 0.25);
    assert_eq!(summary.num_requests, 4);
    assert_eq!(summary.subjects, 2);
}

#[test]
fn test_summary_sums_latency_and_merges_models() {
    let mut aggregator = RunAggregator::new();
    aggregator.record(&result("a", vec![true, true], 250, &["m1", "m2"]));
    aggregator.record(&result("b", vec![true], 750, &["m2"]));

    let summary = aggregator.summary().unwrap();

    assert_eq!(summary.total_latency, Duration::from_secs(1));
    assert_eq!(summary.model_counts.get("m1"), 1);
    assert_eq!(summary.model_counts.get("m2"), 2);
}

#[test]
fn test_model_percentages() {
    let mut aggregator = RunAggregator::new();
    aggregator.record(&result("a", vec![true; 4], 10, &["m1", "m1", "m1", "m2"]));

    let percentages = aggregator.summary().unwrap().model_percentages();

    assert_eq!(percentages[0].0, "m1");
    assert_relative_eq!(percentages[0].1, 75.0);
    assert_relative_eq!(percentages[1].1, 25.0);
}

#[test]
fn test_empty_aggregator_has_no_summary() {
    let aggregator = RunAggregator::new();
    let err = aggregator.summary().unwrap_err();

    assert!(matches!(err, CoreError::Data(_)));
    assert_eq!(aggregator.subjects(), 0);
}

// ===== Rounding Tests =====

#[test]
fn test_round_decimal_three_places() {
    assert_eq!(round_decimal(0.5, 3), Decimal::from_str("0.5").unwrap());
    assert_eq!(round_decimal(0.66666, 3), Decimal::from_str("0.667").unwrap());
    assert_eq!(round_decimal(12.3456, 3), Decimal::from_str("12.346").unwrap());
}

#[rstest]
#[case(247.0 / 2000.0, "0.123")]
#[case(0.0005, "0.001")]
#[case(2.0005, "2.001")]
#[case(0.0625, "0.062")]
fn test_round_decimal_midpoints_follow_binary_value(#[case] value: f64, #[case] expected: &str) {
    assert_eq!(round_decimal(value, 3), Decimal::from_str(expected).unwrap());
}

// ===== Properties =====

proptest! {
    #[test]
    fn prop_percentages_sum_to_hundred(models in prop::collection::vec("[a-d]", 1..200)) {
        let counts: ModelCounts = models.iter().cloned().collect();
        let total: f64 = counts.percentages(models.len()).iter().map(|(_, p)| p).sum();

        prop_assert!((total - 100.0).abs() < 1e-6);
    }

    #[test]
    fn prop_weighted_accuracy_is_correct_over_total(
        subjects in prop::collection::vec(prop::collection::vec(any::<bool>(), 1..50), 1..10)
    ) {
        let mut aggregator = RunAggregator::new();
        for (i, cors) in subjects.iter().enumerate() {
            let models = vec!["m"; cors.len()];
            aggregator.record(&result(&format!("s{}", i), cors.clone(), 1, &models));
        }

        let summary = aggregator.summary().unwrap();
        let total: usize = subjects.iter().map(Vec::len).sum();
        let correct = subjects.iter().flatten().filter(|c| **c).count();

        prop_assert_eq!(summary.num_requests, total);
        prop_assert!((summary.accuracy - correct as f64 / total as f64).abs() < 1e-12);
        prop_assert_eq!(summary.model_counts.total(), total);
    }
}
