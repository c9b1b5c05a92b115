//! Schedule scoring and insights.
//!
//! Inspects a finished schedule and the energy profile and produces:
//! - Three sub-scores (energy alignment, priority balance, time efficiency)
//! - A priority-weighted efficiency score
//! - Template insights, each tied to a threshold on the sub-scores
//!
//! All scores are finite and within 0-100. An empty schedule scores 0
//! everywhere.

use std::fmt;

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::config::InsightThresholds;
use crate::energy::EnergyProfile;
use crate::scheduler::{within_working_hours, Constraints};
use crate::task::{DroppedTask, ScheduleEntry};

/// Share of an entry's contribution that comes from energy fit; the rest
/// comes from its position.
const ENERGY_CONTRIBUTION: f64 = 0.6;

/// Sub-scores of a schedule, each 0-100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationFactors {
    pub energy_alignment: f64,
    pub priority_balance: f64,
    pub time_efficiency: f64,
}

/// An explanatory observation about a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insight {
    /// High-energy entries exist and alignment >= alignment threshold
    PerfectEnergyAlignment,
    /// High-energy entries exist and alignment < alignment threshold
    EnergyOptimizationOpportunity { misaligned: usize },
    /// Non-empty schedule built from an empty energy history
    LimitedEnergyHistory,
    /// Time efficiency >= time-efficiency threshold
    CompactSchedule,
    /// Time efficiency < time-efficiency threshold
    ScheduleGaps { idle_starts: usize },
    /// At least two entries, balance < balance threshold, first half heavier
    FrontLoadedPriorities,
    /// At least two entries, balance < balance threshold, second half heavier
    BackLoadedPriorities,
    /// Tasks were dropped by the assigner
    UnscheduledTasks { count: usize },
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insight::PerfectEnergyAlignment => write!(
                f,
                "Perfect energy alignment: Your demanding tasks are scheduled during peak energy hours."
            ),
            Insight::EnergyOptimizationOpportunity { misaligned } => write!(
                f,
                "Energy optimization opportunity: {misaligned} high-energy task(s) fall outside your peak hours. Consider moving them to your peak performance hours."
            ),
            Insight::LimitedEnergyHistory => write!(
                f,
                "Limited energy history: scheduling used a neutral energy baseline. Log more energy readings for personalized timing."
            ),
            Insight::CompactSchedule => write!(
                f,
                "Compact schedule: tasks follow each other with minimal idle time."
            ),
            Insight::ScheduleGaps { idle_starts } => write!(
                f,
                "Schedule gaps: {idle_starts} task(s) start after idle time longer than your buffer."
            ),
            Insight::FrontLoadedPriorities => write!(
                f,
                "Front-loaded priorities: most important work sits in the first half of the day. Consider spreading it out."
            ),
            Insight::BackLoadedPriorities => write!(
                f,
                "Back-loaded priorities: most important work sits in the second half of the day. Consider starting with some of it earlier."
            ),
            Insight::UnscheduledTasks { count } => write!(
                f,
                "Unscheduled tasks: {count} task(s) could not be placed within your constraints."
            ),
        }
    }
}

/// Scores and insights for one schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub efficiency_score: f64,
    pub factors: OptimizationFactors,
    pub insights: Vec<Insight>,
}

/// Per-entry measurements shared by the sub-scores.
struct EntryMetrics {
    within_hours: bool,
    idle_minutes: i64,
}

/// Scores finished schedules.
#[derive(Debug, Clone)]
pub struct InsightGenerator<'a> {
    constraints: &'a Constraints,
    thresholds: InsightThresholds,
    /// Busy intervals sorted and merged, so overlapping ones count once
    busy: Vec<(DateTime<Utc>, DateTime<Utc>)>,
}

impl<'a> InsightGenerator<'a> {
    pub fn new(constraints: &'a Constraints, thresholds: InsightThresholds) -> Self {
        Self {
            constraints,
            thresholds,
            busy: merge_busy(constraints),
        }
    }

    /// Score a schedule and pick the insights its sub-scores support.
    pub fn summarize(&self, entries: &[ScheduleEntry], energy: &EnergyProfile) -> Summary {
        if entries.is_empty() {
            return Summary {
                efficiency_score: 0.0,
                factors: OptimizationFactors::default(),
                insights: Vec::new(),
            };
        }

        let metrics = self.measure(entries);
        let buffer = self.constraints.min_buffer_minutes.max(0);

        let efficient = metrics
            .iter()
            .filter(|m| m.within_hours && m.idle_minutes <= buffer)
            .count();
        let time_efficiency = efficient as f64 / entries.len() as f64 * 100.0;

        let high_energy: Vec<&ScheduleEntry> = entries
            .iter()
            .filter(|e| e.energy_requirement > self.thresholds.high_energy_threshold)
            .collect();
        let aligned = high_energy
            .iter()
            .filter(|e| energy.is_peak_hour(e.start.hour() as u8))
            .count();
        let energy_alignment = if high_energy.is_empty() {
            100.0
        } else {
            aligned as f64 / high_energy.len() as f64 * 100.0
        };

        let (first_half, second_half) = self.priority_halves(entries);
        let priority_balance = balance(first_half, second_half);

        let factors = OptimizationFactors {
            energy_alignment: bounded(energy_alignment),
            priority_balance: bounded(priority_balance),
            time_efficiency: bounded(time_efficiency),
        };
        let efficiency_score = bounded(self.efficiency_score(entries, &metrics));

        let mut insights = Vec::new();
        if !high_energy.is_empty() {
            if factors.energy_alignment >= self.thresholds.alignment_threshold * 100.0 {
                insights.push(Insight::PerfectEnergyAlignment);
            } else {
                insights.push(Insight::EnergyOptimizationOpportunity {
                    misaligned: high_energy.len() - aligned,
                });
            }
        }
        if !energy.has_history() {
            insights.push(Insight::LimitedEnergyHistory);
        }
        if factors.time_efficiency >= self.thresholds.time_efficiency_threshold * 100.0 {
            insights.push(Insight::CompactSchedule);
        } else {
            insights.push(Insight::ScheduleGaps {
                idle_starts: entries.len() - efficient,
            });
        }
        if entries.len() >= 2 && factors.priority_balance < self.thresholds.balance_threshold * 100.0 {
            if first_half >= second_half {
                insights.push(Insight::FrontLoadedPriorities);
            } else {
                insights.push(Insight::BackLoadedPriorities);
            }
        }

        tracing::debug!(
            efficiency_score,
            energy_alignment = factors.energy_alignment,
            priority_balance = factors.priority_balance,
            time_efficiency = factors.time_efficiency,
            "summarized schedule"
        );

        Summary {
            efficiency_score,
            factors,
            insights,
        }
    }

    /// Idle time before each entry, since the previous entry of the same day
    /// or since the day's effective start, not counting busy time.
    fn measure(&self, entries: &[ScheduleEntry]) -> Vec<EntryMetrics> {
        let hours = &self.constraints.working_hours;
        let planning_start = self.constraints.planning_start;
        let mut previous: Option<&ScheduleEntry> = None;

        entries
            .iter()
            .map(|entry| {
                let day = entry.start.date_naive();
                let since = match previous {
                    Some(prev) if prev.end.date_naive() == day && prev.end <= entry.start => prev.end,
                    _ => {
                        let day_start = clock::at(day, hours.start);
                        if planning_start.date_naive() == day {
                            day_start.max(planning_start)
                        } else {
                            day_start
                        }
                    }
                };
                previous = Some(entry);

                EntryMetrics {
                    within_hours: within_working_hours(entry, hours),
                    idle_minutes: self.idle_minutes(since, entry.start),
                }
            })
            .collect()
    }

    fn idle_minutes(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
        if to <= from {
            return 0;
        }
        let busy: Duration = self
            .busy
            .iter()
            .map(|&(start, end)| clock::overlap(from, to, start, end))
            .fold(Duration::zero(), |acc, d| acc + d);
        clock::minutes_between(from, to) - busy.num_minutes().min(clock::minutes_between(from, to))
    }

    /// Summed priorities starting before / after the working-hours midpoint.
    fn priority_halves(&self, entries: &[ScheduleEntry]) -> (f64, f64) {
        let midpoint = self.constraints.working_hours.midpoint();
        entries.iter().fold((0.0, 0.0), |(first, second), e| {
            if e.start.time() < midpoint {
                (first + e.priority as f64, second)
            } else {
                (first, second + e.priority as f64)
            }
        })
    }

    /// Priority-weighted mean of per-entry contributions, 0-100.
    fn efficiency_score(&self, entries: &[ScheduleEntry], metrics: &[EntryMetrics]) -> f64 {
        let window_minutes = self.constraints.working_hours.duration().num_minutes().max(1) as f64;
        let buffer = self.constraints.min_buffer_minutes.max(0);

        let (weighted, weights) = entries.iter().zip(metrics).fold(
            (0.0, 0.0),
            |(weighted, weights), (entry, m)| {
                let position = if !m.within_hours {
                    0.0
                } else if m.idle_minutes <= buffer {
                    1.0
                } else {
                    (1.0 - (m.idle_minutes - buffer) as f64 / window_minutes).max(0.0)
                };
                let contribution =
                    ENERGY_CONTRIBUTION * entry_energy_fit(entry) + (1.0 - ENERGY_CONTRIBUTION) * position;
                let weight = entry.priority as f64;
                (weighted + contribution * weight, weights + weight)
            },
        );

        if weights > 0.0 {
            weighted / weights * 100.0
        } else {
            0.0
        }
    }
}

fn merge_busy(constraints: &Constraints) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut intervals: Vec<_> = constraints.busy.iter().map(|b| (b.start, b.end)).collect();
    intervals.sort();

    let mut merged: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Insight for tasks the assigner dropped, if any.
pub fn dropped_insight(dropped: &[DroppedTask]) -> Option<Insight> {
    if dropped.is_empty() {
        None
    } else {
        Some(Insight::UnscheduledTasks {
            count: dropped.len(),
        })
    }
}

/// Energy fit of an entry at its actual start.
fn entry_energy_fit(entry: &ScheduleEntry) -> f64 {
    if entry.energy_requirement <= 1e-6 {
        1.0
    } else {
        (entry.available_energy / entry.energy_requirement).min(1.0)
    }
}

/// 100 minus the normalized variance of the two halves' priority shares.
fn balance(first: f64, second: f64) -> f64 {
    let total = first + second;
    if total <= 0.0 {
        return 100.0;
    }
    let skew = (first - second) / total;
    100.0 * (1.0 - skew * skew)
}

/// Clamp into 0-100 and round to one decimal.
fn bounded(score: f64) -> f64 {
    if !score.is_finite() {
        return 0.0;
    }
    (score.clamp(0.0, 100.0) * 10.0).round() / 10.0
}
