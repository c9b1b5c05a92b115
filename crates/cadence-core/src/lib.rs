//! # Cadence Core Library
//!
//! This library provides the scheduling engine behind the `cadence` CLI. It
//! turns a list of tasks plus a snapshot of the user's history into a
//! concrete, conflict-free schedule with explanatory scores.
//!
//! ## Architecture
//!
//! - **Energy**: hourly energy curve and peak hours built from timestamped
//!   self-reports
//! - **Performance**: smoothed per-category success rates from past outcomes
//! - **Ranking**: weighted composite of priority, energy fit and performance
//!   fit, with deadline escalation
//! - **Scheduling**: single-pass slot assignment inside working hours,
//!   around busy intervals
//! - **Insights**: efficiency score, factor scores and advisory messages
//! - **Config**: TOML-based engine defaults
//!
//! ## Key Components
//!
//! - [`ScheduleOptimizer`]: the `optimize` entry point
//! - [`EnergyProfile`]: 24-hour energy curve
//! - [`TaskRanker`]: priority ordering
//! - [`SlotAssigner`]: time-slot placement
//! - [`InsightGenerator`]: schedule scoring
//! - [`EngineConfig`]: configuration management

pub mod clock;
pub mod config;
pub mod energy;
pub mod error;
pub mod health;
pub mod insights;
pub mod optimizer;
pub mod performance;
pub mod ranker;
pub mod scheduler;
pub mod task;

pub use config::{EngineConfig, EnergyConfig, InsightThresholds, RankingConfig, ScheduleConfig};
pub use energy::{EnergyProfile, EnergyProfileBuilder, EnergySample, HourBucket};
pub use error::{ConfigError, CoreError, Result, ValidationError};
pub use health::{HealthMetrics, HealthSnapshot};
pub use insights::{Insight, InsightGenerator, OptimizationFactors, Summary};
pub use optimizer::{OptimizationRequest, OptimizationResult, ScheduleOptimizer};
pub use performance::{CategoryStats, OutcomeRecord, PerformanceModel, TaskOutcome};
pub use ranker::{Preferences, RankingWeights, TaskRanker, TaskScore};
pub use scheduler::{Assignment, BusyInterval, Constraints, SlotAssigner, WorkingHours};
pub use task::{DropReason, DroppedTask, ScheduleEntry, Task};
