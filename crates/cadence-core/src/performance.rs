//! Task performance model.
//!
//! Aggregates historical task outcomes per category and turns them into an
//! expected-performance multiplier used by the ranker.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Performance reported for categories with no history.
pub const NEUTRAL_PERFORMANCE: f64 = 0.5;

/// How a past task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    CompletedOnTime,
    CompletedLate,
    Abandoned,
}

/// One historical outcome for a task category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub category: String,
    pub outcome: TaskOutcome,
}

impl OutcomeRecord {
    pub fn new(category: impl Into<String>, outcome: TaskOutcome) -> Self {
        Self {
            category: category.into(),
            outcome,
        }
    }
}

/// Outcome counts for one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub attempts: u64,
    pub on_time: u64,
    pub late: u64,
    pub abandoned: u64,
}

impl CategoryStats {
    fn record(&mut self, outcome: TaskOutcome) {
        self.attempts += 1;
        match outcome {
            TaskOutcome::CompletedOnTime => self.on_time += 1,
            TaskOutcome::CompletedLate => self.late += 1,
            TaskOutcome::Abandoned => self.abandoned += 1,
        }
    }

    /// Laplace-smoothed on-time rate: `(on_time + 1) / (attempts + 2)`.
    pub fn smoothed_success_rate(&self) -> f64 {
        (self.on_time as f64 + 1.0) / (self.attempts as f64 + 2.0)
    }
}

/// Per-category expected performance, read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceModel {
    categories: BTreeMap<String, CategoryStats>,
}

impl PerformanceModel {
    pub fn from_history(history: &[OutcomeRecord]) -> Self {
        let mut categories: BTreeMap<String, CategoryStats> = BTreeMap::new();
        for record in history {
            categories
                .entry(record.category.clone())
                .or_default()
                .record(record.outcome);
        }

        tracing::debug!(
            records = history.len(),
            categories = categories.len(),
            "built performance model"
        );

        Self { categories }
    }

    /// Expected performance multiplier for a category; 0.5 when unknown.
    pub fn expected_performance(&self, category: &str) -> f64 {
        self.categories
            .get(category)
            .map(CategoryStats::smoothed_success_rate)
            .unwrap_or(NEUTRAL_PERFORMANCE)
    }

    pub fn stats(&self, category: &str) -> Option<&CategoryStats> {
        self.categories.get(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &CategoryStats)> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Share of all recorded tasks that were completed, late or not.
    pub fn completion_rate(&self) -> f64 {
        let (attempts, completed) = self
            .categories
            .values()
            .fold((0u64, 0u64), |(a, c), s| (a + s.attempts, c + s.on_time + s.late));
        if attempts == 0 {
            NEUTRAL_PERFORMANCE
        } else {
            completed as f64 / attempts as f64
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
