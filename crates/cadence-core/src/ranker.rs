//! Task ranking.
//!
//! Orders tasks by a weighted combination of three factors:
//! - Priority (caller-assigned, 1-5)
//! - Energy fit (available energy at the preferred time vs. requirement)
//! - Performance fit (smoothed historical success rate of the category)
//!
//! Tasks with a deadline inside the scheduling horizon are elevated above
//! all others and ordered by deadline first. The sort is stable, so tasks
//! that score the same keep their input order.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::energy::EnergyProfile;
use crate::error::ValidationError;
use crate::performance::PerformanceModel;
use crate::task::Task;

/// Floor applied to energy requirements before dividing.
const EPSILON: f64 = 1e-6;

/// Allowed distance of the weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Ranking weights, guaranteed to be non-negative and to sum to ~1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankingWeights {
    priority: f64,
    energy: f64,
    performance: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            priority: 0.4,
            energy: 0.3,
            performance: 0.3,
        }
    }
}

impl RankingWeights {
    /// Validate and build a weight set.
    pub fn new(priority: f64, energy: f64, performance: f64) -> Result<Self, ValidationError> {
        let invalid = |message: String| ValidationError::InvalidWeights {
            priority,
            energy,
            performance,
            message,
        };

        if [priority, energy, performance]
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(invalid("weights must be finite and non-negative".to_string()));
        }

        let sum = priority + energy + performance;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(invalid(format!("weights sum to {sum:.3}, expected 1.0")));
        }

        Ok(Self {
            priority,
            energy,
            performance,
        })
    }

    /// Merge caller overrides over these weights and validate the result.
    pub fn with_overrides(&self, preferences: &Preferences) -> Result<Self, ValidationError> {
        Self::new(
            preferences.priority_weight.unwrap_or(self.priority),
            preferences.energy_weight.unwrap_or(self.energy),
            preferences.performance_weight.unwrap_or(self.performance),
        )
    }

    pub fn priority(&self) -> f64 {
        self.priority
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn performance(&self) -> f64 {
        self.performance
    }
}

/// Caller preferences for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_weight: Option<f64>,
    /// Caller goals (transport, health...); carried through, not interpreted.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub goals: serde_json::Value,
}

/// Per-task factor values computed during ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskScore {
    pub energy_fit: f64,
    pub performance_fit: f64,
    pub composite: f64,
}

/// Orders tasks for slot assignment.
#[derive(Debug, Clone)]
pub struct TaskRanker {
    weights: RankingWeights,
    default_preferred_time: NaiveTime,
    /// `[start, end)` of the scheduling horizon, for deadline elevation
    horizon: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl Default for TaskRanker {
    fn default() -> Self {
        Self::new(RankingWeights::default())
    }
}

impl TaskRanker {
    pub fn new(weights: RankingWeights) -> Self {
        Self {
            weights,
            default_preferred_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            horizon: None,
        }
    }

    pub fn with_default_preferred_time(mut self, time: NaiveTime) -> Self {
        self.default_preferred_time = time;
        self
    }

    /// Only deadlines before `end` elevate a task. Without a horizon every
    /// deadline does.
    pub fn with_horizon(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.horizon = Some((start, end));
        self
    }

    pub fn weights(&self) -> &RankingWeights {
        &self.weights
    }

    /// `min(energy_at(preferred) / max(requirement, ε), 1.0)`; 1.0 for
    /// tasks that need no energy.
    pub fn energy_fit(&self, task: &Task, energy: &EnergyProfile) -> f64 {
        let requirement = task.resolved_energy_requirement();
        if requirement <= EPSILON {
            return 1.0;
        }
        let time = task.preferred_time.unwrap_or(self.default_preferred_time);
        (energy.energy_at(time) / requirement.max(EPSILON)).min(1.0)
    }

    pub fn performance_fit(&self, task: &Task, performance: &PerformanceModel) -> f64 {
        performance.expected_performance(task.performance_key())
    }

    pub fn score(&self, task: &Task, energy: &EnergyProfile, performance: &PerformanceModel) -> TaskScore {
        let energy_fit = self.energy_fit(task, energy);
        let performance_fit = self.performance_fit(task, performance);
        let composite = self.weights.priority * task.priority as f64
            + self.weights.energy * energy_fit
            + self.weights.performance * performance_fit;
        TaskScore {
            energy_fit,
            performance_fit,
            composite,
        }
    }

    /// Composite comparison score of `a` against `b`; positive means `a`
    /// should come first.
    pub fn comparison_score(
        &self,
        a: &Task,
        b: &Task,
        energy: &EnergyProfile,
        performance: &PerformanceModel,
    ) -> f64 {
        let sa = self.score(a, energy, performance);
        let sb = self.score(b, energy, performance);
        self.weights.priority * (a.priority as f64 - b.priority as f64)
            + self.weights.energy * (sa.energy_fit - sb.energy_fit)
            + self.weights.performance * (sa.performance_fit - sb.performance_fit)
    }

    fn elevated_deadline(&self, task: &Task) -> Option<DateTime<Utc>> {
        let deadline = task.deadline?;
        match self.horizon {
            Some((_, end)) if deadline >= end => None,
            _ => Some(deadline),
        }
    }

    /// Rank tasks, best first. The output is a permutation of the input.
    pub fn rank(
        &self,
        tasks: &[Task],
        energy: &EnergyProfile,
        performance: &PerformanceModel,
    ) -> Vec<Task> {
        let mut keyed: Vec<(Option<DateTime<Utc>>, TaskScore, &Task)> = tasks
            .iter()
            .map(|task| (self.elevated_deadline(task), self.score(task, energy, performance), task))
            .collect();

        // Vec::sort_by is stable
        keyed.sort_by(|(da, sa, _), (db, sb, _)| {
            let by_deadline = match (da, db) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            by_deadline.then_with(|| sb.composite.total_cmp(&sa.composite))
        });

        for (position, (deadline, score, task)) in keyed.iter().enumerate() {
            tracing::debug!(
                position,
                task_id = %task.id,
                elevated = deadline.is_some(),
                composite = score.composite,
                energy_fit = score.energy_fit,
                performance_fit = score.performance_fit,
                "ranked task"
            );
        }

        keyed.into_iter().map(|(_, _, task)| task.clone()).collect()
    }
}
