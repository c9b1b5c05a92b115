//! Slot assignment.
//!
//! Walks a ranked task list once and places each task into the first free
//! slot after a moving cursor:
//! - Slots stay inside the daily working-hours window
//! - Slots never overlap busy intervals or each other
//! - A minimum buffer separates consecutive entries
//! - A per-day cap rolls remaining tasks to the next day
//!
//! Tasks that cannot be placed are reported as dropped, never discarded.

mod constraints;

pub use constraints::{
    BusyInterval, Constraints, WorkingHours, MAX_BUFFER_MINUTES, MAX_HORIZON_DAYS,
};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::clock;
use crate::energy::EnergyProfile;
use crate::task::{DropReason, DroppedTask, ScheduleEntry, Task};

/// Outcome of one assignment pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub entries: Vec<ScheduleEntry>,
    pub dropped: Vec<DroppedTask>,
}

/// Places ranked tasks into concrete time slots.
#[derive(Debug, Clone)]
pub struct SlotAssigner<'a> {
    constraints: &'a Constraints,
    busy: Vec<BusyInterval>,
}

impl<'a> SlotAssigner<'a> {
    pub fn new(constraints: &'a Constraints) -> Self {
        let mut busy = constraints.busy.clone();
        busy.sort_by_key(|b| (b.start, b.end));
        Self { constraints, busy }
    }

    fn day_start(&self, day: NaiveDate) -> DateTime<Utc> {
        clock::at(day, self.constraints.working_hours.start)
    }

    fn day_end(&self, day: NaiveDate) -> DateTime<Utc> {
        clock::at(day, self.constraints.working_hours.end)
    }

    fn next_day_start(&self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
        instant.date_naive().succ_opt().map(|day| self.day_start(day))
    }

    /// Last calendar day slots may be placed on.
    fn last_day(&self) -> NaiveDate {
        let first = self.constraints.planning_start.date_naive();
        let extra = self.constraints.horizon_days.saturating_sub(1) as i64;
        first
            .checked_add_signed(Duration::days(extra))
            .unwrap_or(NaiveDate::MAX)
    }

    /// First busy interval overlapping `[start, end)`.
    fn conflict(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<&BusyInterval> {
        self.busy.iter().find(|b| b.overlaps(start, end))
    }

    /// Initial cursor: the planning day's window start, or the planning
    /// start itself when that is later.
    fn initial_cursor(&self) -> DateTime<Utc> {
        let start = self.constraints.planning_start;
        start.max(self.day_start(start.date_naive()))
    }

    /// Assign ranked tasks to slots.
    ///
    /// Every input task ends up in exactly one of `entries` or `dropped`.
    pub fn assign(&self, ordered_tasks: &[Task], energy: &EnergyProfile) -> Assignment {
        let mut assignment = Assignment::default();
        let mut cursor = self.initial_cursor();
        let mut per_day: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        let window = self.constraints.working_hours.duration();
        let buffer_minutes = self.constraints.min_buffer_minutes.clamp(0, MAX_BUFFER_MINUTES);
        let buffer = Duration::try_minutes(buffer_minutes).unwrap_or_else(Duration::zero);

        for task in ordered_tasks {
            if task.duration() > window {
                self.drop_task(&mut assignment, task, DropReason::ExceedsWorkingDay);
                continue;
            }

            match self.find_slot(task, cursor, &per_day) {
                Ok(start) => {
                    let entry = ScheduleEntry::place(task, start, energy.energy_at(start.time()));
                    tracing::debug!(
                        task_id = %task.id,
                        start = %entry.start,
                        end = %entry.end,
                        "placed task"
                    );
                    *per_day.entry(start.date_naive()).or_insert(0) += 1;
                    cursor = entry.end + buffer;
                    assignment.entries.push(entry);
                }
                Err(reason) => self.drop_task(&mut assignment, task, reason),
            }
        }

        assignment
    }

    fn drop_task(&self, assignment: &mut Assignment, task: &Task, reason: DropReason) {
        tracing::warn!(task_id = %task.id, ?reason, "dropped task");
        assignment.dropped.push(DroppedTask::new(task, reason));
    }

    /// Search forward from `cursor` for the first valid start.
    fn find_slot(
        &self,
        task: &Task,
        cursor: DateTime<Utc>,
        per_day: &BTreeMap<NaiveDate, u32>,
    ) -> Result<DateTime<Utc>, DropReason> {
        let last_day = self.last_day();
        let mut slot = cursor;

        loop {
            let day = slot.date_naive();
            if day > last_day {
                return Err(DropReason::HorizonExhausted);
            }

            let day_start = self.day_start(day);
            if slot < day_start {
                slot = day_start;
            }

            let end = slot + task.duration();
            if let Some(deadline) = task.deadline {
                if end > deadline {
                    return Err(DropReason::DeadlineUnreachable);
                }
            }

            let day_full = match self.constraints.max_tasks_per_day {
                Some(cap) => per_day.get(&day).copied().unwrap_or(0) >= cap,
                None => false,
            };
            if day_full || end > self.day_end(day) {
                slot = self.next_day_start(slot).ok_or(DropReason::HorizonExhausted)?;
                continue;
            }

            if let Some(busy) = self.conflict(slot, end) {
                slot = busy.end;
                continue;
            }

            return Ok(slot);
        }
    }
}

/// Whether an entry lies fully inside its day's working-hours window.
pub fn within_working_hours(entry: &ScheduleEntry, hours: &WorkingHours) -> bool {
    let day = entry.start.date_naive();
    entry.start >= clock::at(day, hours.start) && entry.end <= clock::at(day, hours.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};

    fn t(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn task(id: &str, minutes: i64) -> Task {
        Task::new(id, minutes, 3).with_id(id)
    }

    fn constraints() -> Constraints {
        Constraints::new(t(8, 0))
    }

    fn assign(constraints: &Constraints, tasks: &[Task]) -> Assignment {
        SlotAssigner::new(constraints).assign(tasks, &EnergyProfile::default())
    }

    #[test]
    fn first_task_starts_at_working_hours() {
        let c = constraints();
        let result = assign(&c, &[task("a", 60)]);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].start, t(9, 0));
        assert_eq!(result.entries[0].end, t(10, 0));
        assert!(result.dropped.is_empty());
    }

    #[test]
    fn cursor_starts_at_planning_start_when_later() {
        let c = Constraints::new(t(13, 15));
        let result = assign(&c, &[task("a", 30)]);
        assert_eq!(result.entries[0].start, t(13, 15));
    }

    #[test]
    fn tasks_follow_each_other_with_buffer() {
        let mut c = constraints();
        c.min_buffer_minutes = 15;
        let result = assign(&c, &[task("a", 60), task("b", 30)]);
        assert_eq!(result.entries[1].start, t(10, 15));
        assert_eq!(result.entries[1].end, t(10, 45));
    }

    #[test]
    fn oversized_buffer_and_duration_do_not_overflow() {
        let mut c = constraints();
        c.min_buffer_minutes = i64::MAX;
        let result = assign(&c, &[task("a", 60), task("b", 30), task("huge", i64::MAX)]);
        assert_eq!(result.entries[0].start, t(9, 0));
        assert!(result.entries[1].start >= t(10, 0) + Duration::days(1));
        assert_eq!(result.dropped.len(), 1);
        assert_eq!(result.dropped[0].task_id, "huge");
    }

    #[test]
    fn busy_intervals_are_skipped() {
        let mut c = constraints();
        c.busy.push(BusyInterval::new(t(9, 30), t(11, 0)));
        let result = assign(&c, &[task("a", 60), task("b", 30)]);
        assert_eq!(result.entries[0].start, t(11, 0));
        assert_eq!(result.entries[1].start, t(12, 0));
    }

    #[test]
    fn short_task_fits_before_busy_interval() {
        let mut c = constraints();
        c.busy.push(BusyInterval::new(t(10, 0), t(11, 0)));
        let result = assign(&c, &[task("a", 60)]);
        assert_eq!(result.entries[0].start, t(9, 0));
        assert_eq!(result.entries[0].end, t(10, 0));
    }

    #[test]
    fn overflow_rolls_to_next_day() {
        let c = constraints();
        let result = assign(&c, &[task("a", 420), task("b", 120)]);
        assert_eq!(result.entries[1].start, Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap());
    }

    #[test]
    fn per_day_cap_rolls_to_next_day() {
        let mut c = constraints();
        c.max_tasks_per_day = Some(2);
        let result = assign(&c, &[task("a", 30), task("b", 30), task("c", 30)]);
        assert_eq!(result.entries[1].start, t(9, 30));
        assert_eq!(result.entries[2].start, Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap());
    }

    #[test]
    fn unreachable_deadline_is_dropped() {
        let mut c = constraints();
        c.busy.push(BusyInterval::new(t(9, 0), t(12, 0)));
        let tasks = vec![task("urgent", 60).with_deadline(t(11, 0)), task("other", 30)];
        let result = assign(&c, &tasks);
        assert_eq!(result.dropped.len(), 1);
        assert_eq!(result.dropped[0].task_id, "urgent");
        assert_eq!(result.dropped[0].reason, DropReason::DeadlineUnreachable);
        // The drop does not move the cursor
        assert_eq!(result.entries[0].task_id, "other");
        assert_eq!(result.entries[0].start, t(12, 0));
    }

    #[test]
    fn task_longer_than_window_is_dropped() {
        let c = constraints();
        let result = assign(&c, &[task("marathon", 9 * 60)]);
        assert!(result.entries.is_empty());
        assert_eq!(result.dropped[0].reason, DropReason::ExceedsWorkingDay);
    }

    #[test]
    fn horizon_limits_rolling() {
        let mut c = constraints();
        c.horizon_days = 1;
        let result = assign(&c, &[task("a", 480), task("b", 30)]);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.dropped[0].reason, DropReason::HorizonExhausted);
    }

    #[test]
    fn custom_working_hours() {
        let mut c = constraints();
        c.working_hours = WorkingHours::new(hm(7, 30), hm(12, 0));
        let result = assign(&c, &[task("a", 60), task("b", 240)]);
        assert_eq!(result.entries[0].start, t(8, 0));
        assert_eq!(result.entries[1].start, Utc.with_ymd_and_hms(2024, 3, 5, 7, 30, 0).unwrap());
        for entry in &result.entries {
            assert!(within_working_hours(entry, &c.working_hours));
        }
    }

    #[test]
    fn entries_record_energy() {
        let c = constraints();
        let result = assign(&c, &[task("a", 30).with_energy_requirement(1.3)]);
        assert_eq!(result.entries[0].energy_requirement, 1.0);
        assert_eq!(result.entries[0].available_energy, 0.5);
    }
}
