//! Property tests for ranking, slot assignment and scoring.

use cadence_core::scheduler::within_working_hours;
use cadence_core::{
    BusyInterval, Constraints, EnergyProfile, EnergyProfileBuilder, EnergySample,
    PerformanceModel, Preferences, ScheduleOptimizer, Task, TaskRanker,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

fn planning_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap()
}

fn arb_task() -> impl Strategy<Value = Task> {
    (
        15i64..=300,
        1u8..=5,
        0.0..=1.0f64,
        proptest::option::of(0i64..(5 * 24 * 60)),
    )
        .prop_map(|(minutes, priority, requirement, deadline_offset)| {
            let task = Task::new("task", minutes, priority).with_energy_requirement(requirement);
            match deadline_offset {
                Some(offset) => task.with_deadline(planning_start() + Duration::minutes(offset)),
                None => task,
            }
        })
}

/// Tasks with unique sequential ids.
fn arb_tasks() -> impl Strategy<Value = Vec<Task>> {
    proptest::collection::vec(arb_task(), 0..12).prop_map(|tasks| {
        tasks
            .into_iter()
            .enumerate()
            .map(|(i, t)| t.with_id(format!("t{i}")))
            .collect()
    })
}

fn arb_history() -> impl Strategy<Value = Vec<EnergySample>> {
    proptest::collection::vec((0i64..(20 * 24), 0.0..=100.0f64), 0..40).prop_map(|samples| {
        samples
            .into_iter()
            .map(|(hours_back, energy)| {
                EnergySample::new(planning_start() - Duration::hours(hours_back), energy)
            })
            .collect()
    })
}

fn arb_constraints() -> impl Strategy<Value = Constraints> {
    (
        proptest::collection::vec((0i64..(3 * 24 * 60), 15i64..180), 0..4),
        0i64..30,
        proptest::option::of(1u32..4),
    )
        .prop_map(|(busy, buffer, cap)| {
            let mut constraints = Constraints::new(planning_start());
            constraints.busy = busy
                .into_iter()
                .map(|(offset, len)| {
                    let start = planning_start() + Duration::minutes(offset);
                    BusyInterval::new(start, start + Duration::minutes(len))
                })
                .collect();
            constraints.min_buffer_minutes = buffer;
            constraints.max_tasks_per_day = cap;
            constraints
        })
}

proptest! {
    #[test]
    fn prop_rank_is_a_deterministic_permutation(tasks in arb_tasks(), history in arb_history()) {
        let energy = EnergyProfileBuilder::new().build(&history, planning_start());
        let ranker = TaskRanker::default();
        let performance = PerformanceModel::default();

        let ranked = ranker.rank(&tasks, &energy, &performance);
        let mut ids: Vec<&str> = ranked.iter().map(|t| t.id.as_str()).collect();
        ids.sort_unstable();
        let mut expected: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        expected.sort_unstable();
        prop_assert_eq!(ids, expected);

        prop_assert_eq!(ranker.rank(&tasks, &energy, &performance), ranked);
    }

    #[test]
    fn prop_energy_curve_is_bounded(history in arb_history()) {
        let profile = EnergyProfileBuilder::new().build(&history, planning_start());
        for hour in 0..24u8 {
            let e = profile.energy_at_hour(hour);
            prop_assert!((0.0..=1.0).contains(&e));
        }
        for hour in profile.peak_hours() {
            prop_assert!(*hour < 24);
        }
    }

    #[test]
    fn prop_schedule_respects_constraints(
        tasks in arb_tasks(),
        history in arb_history(),
        constraints in arb_constraints(),
    ) {
        let result = ScheduleOptimizer::default()
            .optimize(&tasks, &history, &[], &Preferences::default(), &constraints)
            .unwrap();

        // Every task is accounted for exactly once
        prop_assert_eq!(result.schedule.len() + result.dropped.len(), tasks.len());

        for (i, entry) in result.schedule.iter().enumerate() {
            prop_assert!(entry.start >= constraints.planning_start);
            prop_assert!(within_working_hours(entry, &constraints.working_hours));
            for busy in &constraints.busy {
                prop_assert!(!busy.overlaps(entry.start, entry.end));
            }
            for other in &result.schedule[i + 1..] {
                prop_assert!(!entry.overlaps(other.start, other.end));
            }
            let task = tasks.iter().find(|t| t.id == entry.task_id).unwrap();
            if let Some(deadline) = task.deadline {
                prop_assert!(entry.end <= deadline);
            }
        }

        if let Some(cap) = constraints.max_tasks_per_day {
            let mut per_day = std::collections::BTreeMap::new();
            for entry in &result.schedule {
                *per_day.entry(entry.start.date_naive()).or_insert(0u32) += 1;
            }
            prop_assert!(per_day.values().all(|n| *n <= cap));
        }

        for score in [
            result.efficiency_score,
            result.factors.energy_alignment,
            result.factors.priority_balance,
            result.factors.time_efficiency,
        ] {
            prop_assert!((0.0..=100.0).contains(&score));
        }
    }
}

#[test]
fn neutral_profile_is_flat() {
    let profile = EnergyProfile::default();
    assert!(profile.peak_hours().is_empty());
    assert!((0..24u8).all(|h| profile.energy_at_hour(h) == 0.5));
}
