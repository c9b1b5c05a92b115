//! Schedule optimization entry point.
//!
//! One run is a pure, synchronous pipeline over caller-supplied snapshots:
//!
//! ```text
//! validate -> EnergyProfile + PerformanceModel -> TaskRanker -> SlotAssigner -> InsightGenerator
//! ```
//!
//! Nothing reads the clock or shared state, so identical inputs always yield
//! identical results and runs may execute concurrently on any thread.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, ScheduleConfig};
use crate::energy::{EnergyProfile, EnergyProfileBuilder, EnergySample};
use crate::error::{Result, ValidationError};
use crate::insights::{dropped_insight, InsightGenerator, OptimizationFactors};
use crate::performance::{OutcomeRecord, PerformanceModel};
use crate::ranker::{Preferences, TaskRanker};
use crate::scheduler::{Constraints, SlotAssigner};
use crate::task::{
    DroppedTask, ScheduleEntry, Task, MAX_DURATION_MINUTES, MAX_PRIORITY, MIN_PRIORITY,
};

/// The terminal artifact of one optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub schedule: Vec<ScheduleEntry>,
    pub efficiency_score: f64,
    pub insights: Vec<String>,
    pub factors: OptimizationFactors,
    /// Tasks that could not be placed, with the reason
    pub dropped: Vec<DroppedTask>,
}

/// All inputs of one run, as a single serializable document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub energy_history: Vec<EnergySample>,
    #[serde(default)]
    pub performance_history: Vec<OutcomeRecord>,
    #[serde(default)]
    pub preferences: Preferences,
    pub constraints: Constraints,
}

impl OptimizationRequest {
    /// Parse a request document, taking constraint fields the document
    /// leaves out from `schedule`.
    pub fn from_json_with_defaults(json: &str, schedule: &ScheduleConfig) -> Result<Self> {
        let mut value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(constraints) = value
            .get_mut("constraints")
            .and_then(serde_json::Value::as_object_mut)
        {
            let defaults = Constraints::from_config(schedule, DateTime::<Utc>::UNIX_EPOCH);
            let defaults = serde_json::to_value(&defaults)?;
            if let Some(defaults) = defaults.as_object() {
                for (key, default) in defaults {
                    if key != "planning_start" && !constraints.contains_key(key) {
                        constraints.insert(key.clone(), default.clone());
                    }
                }
            }
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Runs the optimization pipeline with a fixed engine configuration.
#[derive(Debug, Clone, Default)]
pub struct ScheduleOptimizer {
    config: EngineConfig,
}

impl ScheduleOptimizer {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the energy profile a run would use.
    pub fn energy_profile(&self, history: &[EnergySample], constraints: &Constraints) -> EnergyProfile {
        EnergyProfileBuilder::from_config(&self.config.energy)
            .build(history, constraints.planning_start)
    }

    pub fn optimize_request(&self, request: &OptimizationRequest) -> Result<OptimizationResult> {
        self.optimize(
            &request.tasks,
            &request.energy_history,
            &request.performance_history,
            &request.preferences,
            &request.constraints,
        )
    }

    /// Rank, place and score `tasks`.
    ///
    /// # Errors
    ///
    /// Returns a validation error, before any scoring, when weights do not
    /// sum to 1.0, a task has an out-of-range duration or other fields,
    /// task ids repeat, or a constraint interval is inverted. Tasks that
    /// merely do not fit are reported in [`OptimizationResult::dropped`].
    pub fn optimize(
        &self,
        tasks: &[Task],
        energy_history: &[EnergySample],
        performance_history: &[OutcomeRecord],
        preferences: &Preferences,
        constraints: &Constraints,
    ) -> Result<OptimizationResult> {
        self.config.validate()?;
        let base_weights = self.config.ranking_weights()?;
        let weights = base_weights.with_overrides(preferences)?;
        validate_tasks(tasks)?;
        constraints.validate()?;

        let energy = self.energy_profile(energy_history, constraints);
        let performance = PerformanceModel::from_history(performance_history);

        let ranker = TaskRanker::new(weights)
            .with_default_preferred_time(self.config.ranking.default_preferred_time)
            .with_horizon(constraints.planning_start, constraints.horizon_end());
        let ranked = ranker.rank(tasks, &energy, &performance);

        let assignment = SlotAssigner::new(constraints).assign(&ranked, &energy);

        let summary = InsightGenerator::new(constraints, self.config.insights.clone())
            .summarize(&assignment.entries, &energy);

        let mut insights: Vec<String> = summary.insights.iter().map(ToString::to_string).collect();
        if let Some(insight) = dropped_insight(&assignment.dropped) {
            insights.push(insight.to_string());
        }

        tracing::info!(
            tasks = tasks.len(),
            scheduled = assignment.entries.len(),
            dropped = assignment.dropped.len(),
            efficiency_score = summary.efficiency_score,
            "optimized schedule"
        );

        Ok(OptimizationResult {
            schedule: assignment.entries,
            efficiency_score: summary.efficiency_score,
            insights,
            factors: summary.factors,
            dropped: assignment.dropped,
        })
    }
}

fn validate_tasks(tasks: &[Task]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen.insert(task.id.as_str()) {
            return Err(ValidationError::DuplicateTaskId(task.id.clone()));
        }
        if !(1..=MAX_DURATION_MINUTES).contains(&task.duration_minutes) {
            return Err(ValidationError::InvalidDuration {
                task_id: task.id.clone(),
                minutes: task.duration_minutes,
            });
        }
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&task.priority) {
            return Err(ValidationError::value(
                format!("tasks[{}].priority", task.id),
                format!("{} is outside {MIN_PRIORITY}-{MAX_PRIORITY}", task.priority),
            ));
        }
        if !task.energy_requirement.is_finite() || !(0.0..=1.0).contains(&task.energy_requirement) {
            return Err(ValidationError::value(
                format!("tasks[{}].energy_requirement", task.id),
                format!("{} is outside 0.0-1.0", task.energy_requirement),
            ));
        }
    }
    Ok(())
}
