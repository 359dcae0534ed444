//! Unit tests for confidence-based address validation

use geo_bulk_fetcher::fetcher::FetchOutcome;
use geo_bulk_fetcher::validation::{
    Confidence, ValidationStatus, ValidationThresholds, NO_RESULT_REASON, UNKNOWN_REASON,
};
use serde_json::json;

fn confidence(overall: f64, city: f64, street: f64, building: f64) -> Confidence {
    Confidence {
        overall,
        city,
        street,
        building,
    }
}

fn defaults() -> ValidationThresholds {
    ValidationThresholds::new(0.9, 0.5).unwrap()
}

#[test]
fn test_overall_score_decides_outright_verdicts() {
    let verdict = defaults().validate(&confidence(0.95, 0.0, 0.0, 0.0));
    assert_eq!(verdict.status, ValidationStatus::Confirmed);
    assert_eq!(verdict.reason, "");

    let verdict = defaults().validate(&confidence(0.9, 0.0, 0.0, 0.0));
    assert_eq!(verdict.status, ValidationStatus::Confirmed);

    let verdict = defaults().validate(&confidence(0.5, 1.0, 1.0, 1.0));
    assert_eq!(verdict.status, ValidationStatus::NotConfirmed);
    assert_eq!(verdict.reason, "");
}

#[test]
fn test_first_weak_level_names_the_reason() {
    let cases = [
        (confidence(0.7, 0.0, 0.2, 0.2), "CITY_NOT_CONFIRMED"),
        (confidence(0.7, 0.4, 0.0, 0.0), "LOW_CITY_LEVEL_CONFIDENCE"),
        (confidence(0.7, 0.8, 0.0, 0.0), "CITY_LEVEL_DOUBTS"),
        (confidence(0.7, 0.95, 0.0, 0.3), "STREET_NOT_CONFIRMED"),
        (confidence(0.7, 0.95, 0.3, 0.0), "LOW_STREET_LEVEL_CONFIDENCE"),
        (confidence(0.7, 0.95, 0.6, 0.0), "STREET_LEVEL_DOUBTS"),
        (confidence(0.7, 0.95, 0.95, 0.0), "BUILDING_NOT_CONFIRMED"),
        (confidence(0.7, 0.95, 0.95, 0.5), "LOW_BUILDING_LEVEL_CONFIDENCE"),
        (confidence(0.7, 0.95, 0.95, 0.9), "BUILDING_LEVEL_DOUBTS"),
    ];

    for (scores, reason) in cases {
        let verdict = defaults().validate(&scores);
        assert_eq!(verdict.status, ValidationStatus::PartiallyConfirmed);
        assert_eq!(verdict.reason, reason, "scores {scores:?}");
    }
}

#[test]
fn test_all_levels_strong_but_overall_middling_is_unknown() {
    let verdict = defaults().validate(&confidence(0.7, 0.95, 0.95, 0.95));
    assert_eq!(verdict.status, ValidationStatus::PartiallyConfirmed);
    assert_eq!(verdict.reason, UNKNOWN_REASON);
}

#[test]
fn test_missing_rank_reads_as_zero() {
    let result = json!({"formatted": "Somewhere", "rank": {"confidence": 0.7}});
    let scores = Confidence::from_result(&result);
    assert_eq!(scores, confidence(0.7, 0.0, 0.0, 0.0));

    let verdict = defaults().classify(&FetchOutcome::Success(result));
    assert_eq!(verdict.reason, "CITY_NOT_CONFIRMED");
}

#[test]
fn test_geocoding_result_is_read_from_rank() {
    let result = json!({
        "rank": {
            "confidence": 1.0,
            "confidence_city_level": 1.0,
            "confidence_street_level": 1.0,
            "confidence_building_level": 1.0
        }
    });
    let verdict = defaults().classify(&FetchOutcome::Success(result));
    assert_eq!(verdict.status, ValidationStatus::Confirmed);
}

#[test]
fn test_missing_results_are_not_confirmed() {
    let verdict = defaults().classify(&FetchOutcome::NotFound);
    assert_eq!(verdict.status, ValidationStatus::NotConfirmed);
    assert_eq!(verdict.reason, NO_RESULT_REASON);

    let verdict = defaults().classify(&FetchOutcome::RateLimited);
    assert_eq!(verdict.status, ValidationStatus::NotConfirmed);
    assert!(verdict.reason.starts_with(NO_RESULT_REASON));
    assert!(verdict.reason.contains("rate limit"));
}

#[test]
fn test_thresholds_must_be_within_unit_interval() {
    assert!(ValidationThresholds::new(1.2, 0.5).is_err());
    assert!(ValidationThresholds::new(0.9, -0.1).is_err());
    // inverted but in range is allowed
    assert!(ValidationThresholds::new(0.4, 0.6).is_ok());
}

#[test]
fn test_status_labels() {
    assert_eq!(ValidationStatus::Confirmed.to_string(), "CONFIRMED");
    assert_eq!(
        ValidationStatus::PartiallyConfirmed.to_string(),
        "PARTIALLY_CONFIRMED"
    );
    assert_eq!(ValidationStatus::NotConfirmed.to_string(), "NOT_CONFIRMED");
}
