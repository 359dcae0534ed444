//! Address validation verdicts
//!
//! A pure decision table over the provider's confidence scores. The overall
//! `rank.confidence` decides CONFIRMED / NOT_CONFIRMED outright; anything in
//! between is PARTIALLY_CONFIRMED with a reason naming the first weak level
//! (city, then street, then building).

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tracing::warn;

use crate::fetcher::FetchOutcome;
use crate::scheduler::config::{DEFAULT_MAX_NOT_CONFIRMED, DEFAULT_MIN_CONFIRMED};

/// Reason given when the address did not geocode at all
pub const NO_RESULT_REASON: &str = "No geocoding result";

/// Reason given when every level passed but the overall score did not
pub const UNKNOWN_REASON: &str = "Unknown";

/// Threshold configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Threshold outside [0, 1]
    #[error("{name} must be within [0, 1], got {value}")]
    OutOfRange {
        /// Option name
        name: &'static str,
        /// Rejected value
        value: f64,
    },
}

/// Verdict for one address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    /// Overall confidence at or above `min_confirmed`
    Confirmed,
    /// No result, or overall confidence at or below `max_not_confirmed`
    NotConfirmed,
    /// Overall confidence between the thresholds
    PartiallyConfirmed,
}

impl ValidationStatus {
    /// Report label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "CONFIRMED",
            Self::NotConfirmed => "NOT_CONFIRMED",
            Self::PartiallyConfirmed => "PARTIALLY_CONFIRMED",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address granularity levels, in scan order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// City
    City,
    /// Street
    Street,
    /// Building
    Building,
}

impl Level {
    /// Scan order
    pub const ALL: [Level; 3] = [Level::City, Level::Street, Level::Building];

    /// Upper-case name used in reasons
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::City => "CITY",
            Self::Street => "STREET",
            Self::Building => "BUILDING",
        }
    }

    /// Key under `rank`
    fn rank_key(&self) -> &'static str {
        match self {
            Self::City => "confidence_city_level",
            Self::Street => "confidence_street_level",
            Self::Building => "confidence_building_level",
        }
    }
}

/// Confidence scores of one geocoding result. Missing scores are 0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Confidence {
    /// Overall score
    pub overall: f64,
    /// City-level score
    pub city: f64,
    /// Street-level score
    pub street: f64,
    /// Building-level score
    pub building: f64,
}

impl Confidence {
    /// Read `rank.confidence*` from a geocoding result
    pub fn from_result(result: &Value) -> Self {
        let score = |key: &str| {
            result
                .get("rank")
                .and_then(|rank| rank.get(key))
                .and_then(Value::as_f64)
                .unwrap_or(0.0)
        };
        Self {
            overall: score("confidence"),
            city: score(Level::City.rank_key()),
            street: score(Level::Street.rank_key()),
            building: score(Level::Building.rank_key()),
        }
    }

    /// Score for one level
    pub fn level(&self, level: Level) -> f64 {
        match level {
            Level::City => self.city,
            Level::Street => self.street,
            Level::Building => self.building,
        }
    }
}

/// Verdict plus its reason (empty for outright verdicts)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// Verdict
    pub status: ValidationStatus,
    /// Why; empty when the overall score decided
    pub reason: String,
}

impl Verdict {
    fn new(status: ValidationStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }
}

/// The two confidence cut-offs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationThresholds {
    min_confirmed: f64,
    max_not_confirmed: f64,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            min_confirmed: DEFAULT_MIN_CONFIRMED,
            max_not_confirmed: DEFAULT_MAX_NOT_CONFIRMED,
        }
    }
}

impl ValidationThresholds {
    /// Build thresholds, each within [0, 1].
    ///
    /// `max_not_confirmed` above `min_confirmed` is accepted but logged, since
    /// it leaves no room for PARTIALLY_CONFIRMED.
    pub fn new(min_confirmed: f64, max_not_confirmed: f64) -> Result<Self, ValidationError> {
        check_unit("min_confirmed", min_confirmed)?;
        check_unit("max_not_confirmed", max_not_confirmed)?;
        if max_not_confirmed > min_confirmed {
            warn!(
                "max_not_confirmed ({}) is above min_confirmed ({}); verdicts depend on check order",
                max_not_confirmed, min_confirmed
            );
        }
        Ok(Self {
            min_confirmed,
            max_not_confirmed,
        })
    }

    /// CONFIRMED cut-off
    pub fn min_confirmed(&self) -> f64 {
        self.min_confirmed
    }

    /// NOT_CONFIRMED cut-off
    pub fn max_not_confirmed(&self) -> f64 {
        self.max_not_confirmed
    }

    /// Classify confidence scores
    pub fn validate(&self, confidence: &Confidence) -> Verdict {
        if confidence.overall >= self.min_confirmed {
            return Verdict::new(ValidationStatus::Confirmed, "");
        }
        if confidence.overall <= self.max_not_confirmed {
            return Verdict::new(ValidationStatus::NotConfirmed, "");
        }

        for level in Level::ALL {
            let score = confidence.level(level);
            let name = level.as_str();
            let reason = if score == 0.0 {
                format!("{name}_NOT_CONFIRMED")
            } else if score <= self.max_not_confirmed {
                format!("LOW_{name}_LEVEL_CONFIDENCE")
            } else if score <= self.min_confirmed {
                format!("{name}_LEVEL_DOUBTS")
            } else {
                continue;
            };
            return Verdict::new(ValidationStatus::PartiallyConfirmed, reason);
        }

        warn!(
            overall = confidence.overall,
            "All levels above min_confirmed ({}) but overall is not; reporting Unknown",
            self.min_confirmed
        );
        Verdict::new(ValidationStatus::PartiallyConfirmed, UNKNOWN_REASON)
    }

    /// Classify one geocoding outcome
    pub fn classify(&self, outcome: &FetchOutcome<Value>) -> Verdict {
        match outcome {
            FetchOutcome::Success(result) => self.validate(&Confidence::from_result(result)),
            FetchOutcome::NotFound => Verdict::new(ValidationStatus::NotConfirmed, NO_RESULT_REASON),
            failed => Verdict::new(
                ValidationStatus::NotConfirmed,
                format!("{NO_RESULT_REASON}: {}", failed.describe()),
            ),
        }
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { name, value })
    }
}
