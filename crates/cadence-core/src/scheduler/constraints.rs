//! Scheduling constraints.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::config::{self, ScheduleConfig};
use crate::error::ValidationError;

/// Longest accepted gap between consecutive entries (one day).
pub const MAX_BUFFER_MINUTES: i64 = 24 * 60;
/// Longest accepted planning horizon.
pub const MAX_HORIZON_DAYS: u32 = 366;

/// Daily working-hours window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    #[serde(with = "clock::hhmm")]
    pub start: NaiveTime,
    #[serde(with = "clock::hhmm")]
    pub end: NaiveTime,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start: config::default_work_start(),
            end: config::default_work_end(),
        }
    }
}

impl WorkingHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Midpoint of the window, splitting the day into halves.
    pub fn midpoint(&self) -> NaiveTime {
        self.start + self.duration() / 2
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.start && time < self.end
    }
}

/// An already-occupied interval the schedule must avoid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Check if this interval overlaps with a time range
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }
}

/// Constraints for one optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default)]
    pub working_hours: WorkingHours,
    #[serde(default)]
    pub busy: Vec<BusyInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tasks_per_day: Option<u32>,
    #[serde(default)]
    pub min_buffer_minutes: i64,
    /// The run's notion of "now"; nothing is placed before it
    pub planning_start: DateTime<Utc>,
    /// Days (counting the planning day) the assigner may roll into
    #[serde(default = "config::default_horizon_days")]
    pub horizon_days: u32,
}

impl Constraints {
    /// Default constraints (09:00-17:00, no buffer, 7-day horizon).
    pub fn new(planning_start: DateTime<Utc>) -> Self {
        Self::from_config(&ScheduleConfig::default(), planning_start)
    }

    pub fn from_config(config: &ScheduleConfig, planning_start: DateTime<Utc>) -> Self {
        Self {
            working_hours: WorkingHours::new(config.work_start, config.work_end),
            busy: Vec::new(),
            max_tasks_per_day: config.max_tasks_per_day,
            min_buffer_minutes: config.min_buffer_minutes,
            planning_start,
            horizon_days: config.horizon_days,
        }
    }

    /// End of the scheduling horizon (midnight after the last day),
    /// saturating at the latest representable instant.
    pub fn horizon_end(&self) -> DateTime<Utc> {
        let start_of_day = self.planning_start.date_naive().and_time(NaiveTime::MIN).and_utc();
        Duration::try_days(i64::from(self.horizon_days))
            .and_then(|days| start_of_day.checked_add_signed(days))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.working_hours.start >= self.working_hours.end {
            return Err(ValidationError::InvalidTimeRange {
                what: "working hours".to_string(),
                start: clock::format_hhmm(self.working_hours.start),
                end: clock::format_hhmm(self.working_hours.end),
            });
        }
        for (i, busy) in self.busy.iter().enumerate() {
            if busy.start >= busy.end {
                return Err(ValidationError::InvalidTimeRange {
                    what: busy
                        .label
                        .clone()
                        .unwrap_or_else(|| format!("busy interval #{i}")),
                    start: busy.start.to_rfc3339(),
                    end: busy.end.to_rfc3339(),
                });
            }
        }
        if !(0..=MAX_BUFFER_MINUTES).contains(&self.min_buffer_minutes) {
            return Err(ValidationError::value(
                "min_buffer_minutes",
                format!("{} is outside 0-{MAX_BUFFER_MINUTES}", self.min_buffer_minutes),
            ));
        }
        if self.max_tasks_per_day == Some(0) {
            return Err(ValidationError::value("max_tasks_per_day", "must be at least 1"));
        }
        if !(1..=MAX_HORIZON_DAYS).contains(&self.horizon_days) {
            return Err(ValidationError::value(
                "horizon_days",
                format!("{} is outside 1-{MAX_HORIZON_DAYS}", self.horizon_days),
            ));
        }
        Ok(())
    }
}
