//! Task and schedule entry types.
//!
//! A [`Task`] is a caller's unit of work submitted to an optimization run.
//! The slot assigner turns it into a [`ScheduleEntry`] once a concrete time
//! has been chosen. Both are plain data and never mutated by the engine.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock;

/// Lowest accepted task priority.
pub const MIN_PRIORITY: u8 = 1;
/// Highest accepted task priority.
pub const MAX_PRIORITY: u8 = 5;
/// Longest accepted task duration (one year).
pub const MAX_DURATION_MINUTES: i64 = 366 * 24 * 60;

/// A candidate task for scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    /// Required working time in minutes (must be positive)
    pub duration_minutes: i64,
    /// 1 (lowest) to 5 (highest)
    pub priority: u8,
    /// Preferred time of day (`HH:MM`)
    #[serde(default, with = "clock::hhmm_opt", skip_serializing_if = "Option::is_none")]
    pub preferred_time: Option<NaiveTime>,
    /// Hard deadline; the task is dropped rather than placed after it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    /// How energy-intensive the task is (0.0-1.0)
    #[serde(default = "default_energy_requirement")]
    pub energy_requirement: f64,
    /// Key into the performance history (falls back to the id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

fn default_energy_requirement() -> f64 {
    0.5
}

impl Task {
    /// Create a task with a generated identifier.
    pub fn new(title: impl Into<String>, duration_minutes: i64, priority: u8) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            duration_minutes,
            priority,
            preferred_time: None,
            deadline: None,
            energy_requirement: default_energy_requirement(),
            category: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_preferred_time(mut self, time: NaiveTime) -> Self {
        self.preferred_time = Some(time);
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_energy_requirement(mut self, requirement: f64) -> Self {
        self.energy_requirement = requirement;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Duration clamped into `0..=MAX_DURATION_MINUTES`.
    pub fn duration(&self) -> Duration {
        Duration::try_minutes(self.duration_minutes.clamp(0, MAX_DURATION_MINUTES))
            .unwrap_or_else(Duration::zero)
    }

    /// Key used to look the task up in the performance model.
    pub fn performance_key(&self) -> &str {
        self.category.as_deref().unwrap_or(&self.id)
    }

    /// Energy requirement clamped into 0.0-1.0.
    pub fn resolved_energy_requirement(&self) -> f64 {
        if self.energy_requirement.is_finite() {
            self.energy_requirement.clamp(0.0, 1.0)
        } else {
            default_energy_requirement()
        }
    }
}

/// A task placed into a concrete `[start, end)` slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub task_id: String,
    pub title: String,
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, with = "clock::hhmm_opt", skip_serializing_if = "Option::is_none")]
    pub preferred_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Requirement used when scoring this entry
    pub energy_requirement: f64,
    /// Estimated available energy at `start`
    pub available_energy: f64,
}

impl ScheduleEntry {
    pub(crate) fn place(task: &Task, start: DateTime<Utc>, available_energy: f64) -> Self {
        Self {
            task_id: task.id.clone(),
            title: task.title.clone(),
            priority: task.priority,
            category: task.category.clone(),
            preferred_time: task.preferred_time,
            deadline: task.deadline,
            start,
            end: start + task.duration(),
            energy_requirement: task.resolved_energy_requirement(),
            available_energy,
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Check if this entry overlaps with a time range
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }
}

/// Why a task was left out of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// No slot ends before the task's deadline
    DeadlineUnreachable,
    /// The task is longer than a whole working-hours window
    ExceedsWorkingDay,
    /// No slot was found within the planning horizon
    HorizonExhausted,
}

impl DropReason {
    pub fn describe(&self) -> &'static str {
        match self {
            DropReason::DeadlineUnreachable => "cannot finish before its deadline",
            DropReason::ExceedsWorkingDay => "is longer than the working-hours window",
            DropReason::HorizonExhausted => "does not fit within the planning horizon",
        }
    }
}

/// A task the assigner could not place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedTask {
    pub task_id: String,
    pub title: String,
    pub reason: DropReason,
}

impl DroppedTask {
    pub(crate) fn new(task: &Task, reason: DropReason) -> Self {
        Self {
            task_id: task.id.clone(),
            title: task.title.clone(),
            reason,
        }
    }
}
