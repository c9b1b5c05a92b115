//! Integration tests for the full optimization pipeline.

use cadence_core::{
    BusyInterval, Constraints, CoreError, DropReason, EngineConfig, EnergySample,
    OptimizationRequest, OptimizationResult, OutcomeRecord, Preferences, ScheduleOptimizer, Task,
    TaskOutcome, ValidationError,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn monday(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap()
}

fn optimize(tasks: &[Task], history: &[EnergySample], constraints: &Constraints) -> OptimizationResult {
    ScheduleOptimizer::default()
        .optimize(tasks, history, &[], &Preferences::default(), constraints)
        .unwrap()
}

/// Energy history over the previous week with peaks at 9-11 and 14-16.
fn two_peak_history() -> Vec<EnergySample> {
    let mut samples = Vec::new();
    for days_back in 1..=7 {
        let day = monday(0, 0) - Duration::days(days_back);
        for hour in [8, 9, 10, 11, 12, 13, 14, 15, 16, 17] {
            let energy = if matches!(hour, 9..=11 | 14..=16) { 90.0 } else { 40.0 };
            samples.push(EnergySample::new(day + Duration::hours(hour), energy));
        }
    }
    samples
}

#[test]
fn test_single_task_on_empty_history() {
    let tasks = vec![Task::new("Write report", 60, 5).with_id("report")];
    let result = optimize(&tasks, &[], &Constraints::new(monday(8, 0)));

    assert_eq!(result.schedule.len(), 1);
    assert_eq!(result.schedule[0].start, monday(9, 0));
    assert_eq!(result.schedule[0].end, monday(10, 0));
    assert_eq!(result.factors.energy_alignment, 100.0);
    assert!(result.efficiency_score > 0.0);
    assert!(result.dropped.is_empty());
    assert!(result
        .insights
        .iter()
        .any(|i| i.starts_with("Limited energy history")));
}

#[test]
fn test_equal_tasks_keep_input_order() {
    let forward = vec![
        Task::new("First", 30, 3).with_id("first"),
        Task::new("Second", 30, 3).with_id("second"),
    ];
    let reversed: Vec<Task> = forward.iter().rev().cloned().collect();
    let constraints = Constraints::new(monday(8, 0));

    let ids = |tasks: &[Task]| -> Vec<String> {
        optimize(tasks, &[], &constraints)
            .schedule
            .into_iter()
            .map(|e| e.task_id)
            .collect()
    };

    assert_eq!(ids(&forward), vec!["first", "second"]);
    assert_eq!(ids(&reversed), vec!["second", "first"]);
}

#[test]
fn test_unreachable_deadline_is_reported_not_scheduled() {
    let mut constraints = Constraints::new(monday(8, 0));
    constraints
        .busy
        .push(BusyInterval::new(monday(9, 0), monday(12, 0)).with_label("offsite"));

    let tasks = vec![
        Task::new("Submit form", 60, 4)
            .with_id("form")
            .with_deadline(monday(10, 30)),
        Task::new("Review", 30, 2).with_id("review"),
    ];
    let result = optimize(&tasks, &[], &constraints);

    assert!(result.schedule.iter().all(|e| e.task_id != "form"));
    assert_eq!(result.dropped.len(), 1);
    assert_eq!(result.dropped[0].task_id, "form");
    assert_eq!(result.dropped[0].reason, DropReason::DeadlineUnreachable);
    assert_eq!(result.schedule[0].start, monday(12, 0));
    assert!(result
        .insights
        .iter()
        .any(|i| i.starts_with("Unscheduled tasks: 1")));
}

#[test]
fn test_high_energy_task_in_peak_hour_is_fully_aligned() {
    let mut constraints = Constraints::new(monday(8, 0));
    constraints
        .busy
        .push(BusyInterval::new(monday(9, 0), monday(10, 0)));
    let tasks = vec![Task::new("Deep work", 60, 4)
        .with_id("deep")
        .with_energy_requirement(0.9)];

    let result = optimize(&tasks, &two_peak_history(), &constraints);

    assert_eq!(result.schedule[0].start, monday(10, 0));
    assert_eq!(result.factors.energy_alignment, 100.0);
    assert!(result
        .insights
        .iter()
        .any(|i| i.starts_with("Perfect energy alignment")));
}

#[test]
fn test_peak_hours_from_history() {
    let optimizer = ScheduleOptimizer::default();
    let profile = optimizer.energy_profile(&two_peak_history(), &Constraints::new(monday(8, 0)));
    assert_eq!(profile.peak_hours(), &[9, 10, 11, 14, 15, 16]);
    assert!((profile.energy_at_hour(10) - 0.9).abs() < 1e-9);
    // Unpopulated early hours take the nearest populated hour
    assert!((profile.energy_at_hour(3) - 0.4).abs() < 1e-9);
}

#[test]
fn test_identical_inputs_serialize_identically() {
    let tasks = vec![
        Task::new("A", 45, 5).with_id("a").with_category("writing"),
        Task::new("B", 90, 2).with_id("b").with_energy_requirement(0.8),
        Task::new("C", 30, 3)
            .with_id("c")
            .with_deadline(monday(15, 0)),
    ];
    let history = two_peak_history();
    let outcomes = vec![
        OutcomeRecord::new("writing", TaskOutcome::CompletedOnTime),
        OutcomeRecord::new("writing", TaskOutcome::Abandoned),
    ];
    let constraints = Constraints::new(monday(8, 0));
    let optimizer = ScheduleOptimizer::default();

    let run = || {
        let result = optimizer
            .optimize(&tasks, &history, &outcomes, &Preferences::default(), &constraints)
            .unwrap();
        serde_json::to_string(&result).unwrap()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_deadline_task_scheduled_first() {
    let tasks = vec![
        Task::new("Important", 60, 5).with_id("important"),
        Task::new("Due soon", 60, 1)
            .with_id("due")
            .with_deadline(monday(16, 0)),
    ];
    let result = optimize(&tasks, &[], &Constraints::new(monday(8, 0)));
    assert_eq!(result.schedule[0].task_id, "due");
    assert_eq!(result.schedule[1].task_id, "important");
}

#[test]
fn test_invalid_inputs_are_rejected() {
    let constraints = Constraints::new(monday(8, 0));
    let optimizer = ScheduleOptimizer::default();

    let err = optimizer
        .optimize(
            &[Task::new("Empty", -5, 3)],
            &[],
            &[],
            &Preferences::default(),
            &constraints,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::InvalidDuration { minutes: -5, .. })
    ));

    let err = optimizer
        .optimize(
            &[Task::new("Forever", i64::MAX, 3)],
            &[],
            &[],
            &Preferences::default(),
            &constraints,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::InvalidDuration { minutes: i64::MAX, .. })
    ));

    let tasks = vec![Task::new("Report", 60, 3)];
    let mut far = Constraints::new(monday(8, 0));
    far.horizon_days = 200_000_000;
    let mut spaced = Constraints::new(monday(8, 0));
    spaced.min_buffer_minutes = i64::MAX;
    for constraints in [far, spaced] {
        let err = optimizer
            .optimize(&tasks, &[], &[], &Preferences::default(), &constraints)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidValue { .. })
        ));
    }

    let mut config = EngineConfig::default();
    config.energy.lookback_days = i64::MAX;
    let err = ScheduleOptimizer::new(config)
        .optimize(&tasks, &[], &[], &Preferences::default(), &constraints)
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::InvalidValue { .. })
    ));

    let prefs = Preferences {
        priority_weight: Some(0.5),
        energy_weight: Some(0.5),
        performance_weight: Some(0.5),
        ..Default::default()
    };
    let err = optimizer
        .optimize(&[], &[], &[], &prefs, &constraints)
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::InvalidWeights { .. })
    ));
}

#[test]
fn test_preferences_override_weights() {
    let tasks = vec![
        Task::new("Hard", 30, 5).with_id("hard").with_energy_requirement(1.0),
        Task::new("Easy", 30, 1).with_id("easy").with_energy_requirement(0.1),
    ];
    let constraints = Constraints::new(monday(8, 0));
    let first = |prefs: &Preferences| {
        ScheduleOptimizer::default()
            .optimize(&tasks, &[], &[], prefs, &constraints)
            .unwrap()
            .schedule[0]
            .task_id
            .clone()
    };

    assert_eq!(first(&Preferences::default()), "hard");

    // Energy-only ranking prefers the task the neutral curve can carry
    let energy_only = Preferences {
        priority_weight: Some(0.0),
        energy_weight: Some(1.0),
        performance_weight: Some(0.0),
        ..Default::default()
    };
    assert_eq!(first(&energy_only), "easy");
}

#[test]
fn test_config_drives_engine() {
    let mut config = EngineConfig::default();
    config.ranking.priority_weight = 0.6;
    config.ranking.energy_weight = 0.2;
    config.ranking.performance_weight = 0.2;
    config.set("schedule.min_buffer_minutes", "10").unwrap();
    // A lone weight change breaks the sum and is refused
    assert!(config.set("ranking.priority_weight", "0.9").is_err());

    let schedule = config.schedule.clone();
    let optimizer = ScheduleOptimizer::new(config);
    let constraints = Constraints::from_config(&schedule, monday(8, 0));
    let tasks = vec![
        Task::new("A", 30, 3).with_id("a"),
        Task::new("B", 30, 3).with_id("b"),
    ];
    let result = optimizer
        .optimize(&tasks, &[], &[], &Preferences::default(), &constraints)
        .unwrap();

    assert_eq!(result.schedule[1].start, monday(9, 40));
    assert_eq!(result.factors.time_efficiency, 100.0);
}

#[test]
fn test_request_document_end_to_end() {
    let json = r#"{
        "tasks": [
            {"id": "t1", "title": "Plan sprint", "duration_minutes": 60, "priority": 4,
             "preferred_time": "10:00", "energy_requirement": 0.8, "category": "planning"},
            {"id": "t2", "title": "Inbox", "duration_minutes": 30, "priority": 2}
        ],
        "energy_history": [
            {"timestamp": "2024-03-03T10:00:00Z", "energy": 85},
            {"timestamp": "2024-03-03T15:00:00Z", "energy": 35}
        ],
        "performance_history": [
            {"category": "planning", "outcome": "completed_on_time"}
        ],
        "constraints": {
            "planning_start": "2024-03-04T08:00:00Z",
            "working_hours": {"start": "09:00", "end": "12:00"},
            "busy": [{"start": "2024-03-04T09:00:00Z", "end": "2024-03-04T09:30:00Z"}]
        }
    }"#;
    let request: OptimizationRequest = serde_json::from_str(json).unwrap();
    let result = ScheduleOptimizer::default().optimize_request(&request).unwrap();

    assert_eq!(result.schedule.len(), 2);
    assert_eq!(result.schedule[0].task_id, "t1");
    assert_eq!(result.schedule[0].start, monday(9, 30));
    assert_eq!(result.schedule[1].start, monday(10, 30));
    for entry in &result.schedule {
        assert!(entry.end <= monday(12, 0));
    }

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["factors"]["energy_alignment"].is_number());
    assert_eq!(json["schedule"][0]["start"], "2024-03-04T09:30:00Z");
}
