use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::Serialize;

use crate::metrics::Snapshot;
use crate::metrics::filter::{AssignmentStatus, assignment_status, is_past};
use crate::models::Assignment;

pub const DUE_SOON_LIMIT: usize = 5;
pub const OVERDUE_LIMIT: usize = 3;
pub const PROGRESS_COURSE_LIMIT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssignmentCounts {
    pub total: usize,
    pub completed: usize,
    pub overdue: usize,
    pub upcoming: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseProgress {
    pub course_id: i64,
    pub code: String,
    pub color: String,
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub counts: AssignmentCounts,
    pub due_soon: Vec<Assignment>,
    pub overdue: Vec<Assignment>,
    pub course_progress: Vec<CourseProgress>,
}

pub fn assignment_counts(assignments: &[Assignment], now: DateTime<Utc>) -> AssignmentCounts {
    let mut counts = AssignmentCounts {
        total: assignments.len(),
        completed: 0,
        overdue: 0,
        upcoming: 0,
    };
    for assignment in assignments {
        match assignment_status(assignment, now) {
            AssignmentStatus::Completed => counts.completed += 1,
            AssignmentStatus::Overdue => counts.overdue += 1,
            AssignmentStatus::Pending => counts.upcoming += 1,
        }
    }
    counts
}

/// End of the due-soon window: the later of the close of the current
/// Sunday-start week and the close of tomorrow, both in UTC.
pub fn due_soon_horizon(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    let days_left_in_week = 7 - i64::from(today.weekday().num_days_from_sunday());
    let week_end = today + Duration::days(days_left_in_week);
    let tomorrow_end = today + Duration::days(2);
    week_end.max(tomorrow_end).and_time(NaiveTime::MIN).and_utc()
}

fn by_due_date(mut assignments: Vec<&Assignment>, limit: usize) -> Vec<Assignment> {
    assignments.sort_by_key(|a| a.due_date);
    assignments.into_iter().take(limit).cloned().collect()
}

pub fn dashboard(snapshot: &Snapshot, now: DateTime<Utc>) -> DashboardSummary {
    let assignments = snapshot.assignments();
    let horizon = due_soon_horizon(now);

    let due_soon = by_due_date(
        assignments
            .iter()
            .filter(|a| !a.completed && !is_past(a.due_date, now) && a.due_date < horizon)
            .collect(),
        DUE_SOON_LIMIT,
    );

    let overdue = by_due_date(
        assignments
            .iter()
            .filter(|a| assignment_status(a, now) == AssignmentStatus::Overdue)
            .collect(),
        OVERDUE_LIMIT,
    );

    let course_progress = snapshot
        .courses()
        .iter()
        .take(PROGRESS_COURSE_LIMIT)
        .map(|course| {
            let own = assignments.iter().filter(|a| a.course_id == course.id);
            let (completed, total) = own.fold((0, 0), |(done, all), a| {
                (done + usize::from(a.completed), all + 1)
            });
            CourseProgress {
                course_id: course.id,
                code: course.code.clone(),
                color: course.color.clone(),
                completed,
                total,
            }
        })
        .collect();

    DashboardSummary {
        counts: assignment_counts(assignments, now),
        due_soon,
        overdue,
        course_progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, Priority};
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
    }

    fn assignment(id: i64, due: DateTime<Utc>, completed: bool) -> Assignment {
        Assignment {
            id,
            title: format!("Task {}", id),
            course_id: 1,
            description: None,
            due_date: due,
            priority: Priority::Medium,
            completed,
            grade: None,
            max_points: 100,
            created_at: at(1, 0),
        }
    }

    #[test]
    fn test_horizon_midweek_is_next_sunday() {
        // 2026-10-14 is a Wednesday.
        assert_eq!(due_soon_horizon(at(14, 9)), at(18, 0));
    }

    #[test]
    fn test_horizon_on_saturday_covers_tomorrow() {
        // 2026-10-17 is a Saturday; the week closes at midnight but tomorrow
        // runs through Sunday.
        assert_eq!(due_soon_horizon(at(17, 9)), at(19, 0));
    }

    #[test]
    fn test_counts_partition_assignments() {
        let now = at(14, 12);
        let assignments = vec![
            assignment(1, at(10, 9), false),
            assignment(2, at(10, 9), true),
            assignment(3, at(20, 9), false),
            assignment(4, at(21, 9), false),
        ];
        let counts = assignment_counts(&assignments, now);
        assert_eq!(counts.total, 4);
        assert_eq!(counts.overdue, 1);
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.upcoming, 2);
        assert_eq!(counts.overdue + counts.completed + counts.upcoming, counts.total);
    }

    #[test]
    fn test_due_soon_and_overdue_lists_are_capped_and_ordered() {
        let now = at(14, 12);
        let mut assignments: Vec<Assignment> = (0..7)
            .map(|i| assignment(i, at(17, 20 - i as u32), false))
            .collect();
        assignments.extend((10..15).map(|i| assignment(i, at(i as u32, 8), false)));
        assignments.push(assignment(20, at(25, 9), false));

        let course = Course {
            id: 1,
            name: "Statistics".to_string(),
            code: "STAT 200".to_string(),
            instructor: String::new(),
            credits: 3,
            color: "#16a34a".to_string(),
            semester: "Fall".to_string(),
            year: 2026,
        };
        let snapshot = Snapshot::new(vec![course], assignments).unwrap();
        let summary = dashboard(&snapshot, now);
        assert_eq!(summary.due_soon.len(), DUE_SOON_LIMIT);
        assert!(summary.due_soon.windows(2).all(|w| w[0].due_date <= w[1].due_date));
        assert!(summary.due_soon.iter().all(|a| a.id != 20));

        assert_eq!(summary.overdue.len(), OVERDUE_LIMIT);
        assert_eq!(
            summary.overdue.iter().map(|a| a.id).collect::<Vec<_>>(),
            vec![10, 11, 12]
        );
        assert_eq!(summary.course_progress.len(), 1);
        assert_eq!(summary.course_progress[0].total, 13);
    }
}
