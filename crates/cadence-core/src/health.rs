//! Health metric scoring.
//!
//! Produces an overall 0-100 health score from the latest readings, validates
//! raw readings, and turns health snapshots into the energy samples consumed
//! by [`crate::energy::EnergyProfileBuilder`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::energy::EnergySample;
use crate::error::ValidationError;

/// One set of health readings. Every metric is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    /// Beats per minute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    /// Hydration level (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hydration: Option<f64>,
    /// Self-reported or derived energy (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<f64>,
    /// Hours slept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep: Option<f64>,
}

/// Health readings taken at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub metrics: HealthMetrics,
}

/// Normalization range for one metric.
#[derive(Debug, Clone, Copy)]
struct MetricRange {
    min: f64,
    optimal: f64,
    max: f64,
    weight: f64,
}

impl MetricRange {
    /// 0.0-1.0, rising to the optimum and falling after it.
    fn normalize(&self, value: f64) -> f64 {
        let score = if value <= self.optimal {
            (value - self.min) / (self.optimal - self.min)
        } else {
            1.0 - (value - self.optimal) / (self.max - self.optimal)
        };
        score.clamp(0.0, 1.0)
    }
}

const HEART_RATE: MetricRange = MetricRange { min: 60.0, optimal: 70.0, max: 100.0, weight: 0.25 };
const HYDRATION: MetricRange = MetricRange { min: 0.0, optimal: 80.0, max: 100.0, weight: 0.20 };
const ENERGY: MetricRange = MetricRange { min: 0.0, optimal: 85.0, max: 100.0, weight: 0.25 };
const STEPS: MetricRange = MetricRange { min: 0.0, optimal: 10_000.0, max: 15_000.0, weight: 0.15 };
const SLEEP: MetricRange = MetricRange { min: 4.0, optimal: 8.0, max: 10.0, weight: 0.15 };

impl HealthMetrics {
    fn readings(&self) -> [(Option<f64>, MetricRange); 5] {
        [
            (self.heart_rate, HEART_RATE),
            (self.hydration, HYDRATION),
            (self.energy, ENERGY),
            (self.steps, STEPS),
            (self.sleep, SLEEP),
        ]
    }

    /// Reject readings outside physically plausible ranges.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let checks = [
            ("heart_rate", self.heart_rate, 30.0, 200.0),
            ("hydration", self.hydration, 0.0, 100.0),
            ("energy", self.energy, 0.0, 100.0),
            ("steps", self.steps, 0.0, f64::MAX),
            ("sleep", self.sleep, 0.0, 24.0),
        ];
        for (field, value, min, max) in checks {
            if let Some(v) = value {
                if !v.is_finite() || v < min || v > max {
                    return Err(ValidationError::value(
                        field,
                        format!("{v} is outside the accepted range"),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Weighted 0-100 health score over the metrics that are present; 0 when
/// none are.
pub fn overall_score(metrics: &HealthMetrics) -> u32 {
    let (total, weight) = metrics
        .readings()
        .iter()
        .filter_map(|(value, range)| value.filter(|v| v.is_finite()).map(|v| (v, range)))
        .fold((0.0, 0.0), |(total, weight), (v, range)| {
            (total + range.normalize(v) * range.weight, weight + range.weight)
        });

    if weight > 0.0 {
        (total / weight * 100.0).round() as u32
    } else {
        0
    }
}

/// Energy samples from the snapshots that carry an energy reading.
pub fn energy_samples(snapshots: &[HealthSnapshot]) -> Vec<EnergySample> {
    snapshots
        .iter()
        .filter_map(|s| s.metrics.energy.map(|e| EnergySample::new(s.timestamp, e)))
        .collect()
}
