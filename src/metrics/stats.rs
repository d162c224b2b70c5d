use serde::Serialize;

use crate::metrics::Snapshot;
use crate::models::Assignment;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CourseStats {
    pub count: usize,
    pub graded: usize,
    pub completed: usize,
    /// Points-weighted percentage over graded assignments. `None` when
    /// nothing is graded yet.
    pub average_percentage: Option<f64>,
}

/// Aggregates the assignments that belong to `course_id`.
///
/// The average is `100 * sum(grade) / sum(max_points)` over the graded
/// subset, so larger assignments weigh proportionally more. A zero
/// denominator yields `None` rather than a division by zero.
pub fn course_stats(snapshot: &Snapshot, course_id: i64) -> CourseStats {
    let mut count = 0;
    let mut graded = 0;
    let mut completed = 0;
    let mut earned = 0.0;
    let mut possible = 0.0;

    for assignment in snapshot.assignments().iter().filter(|a| a.course_id == course_id) {
        count += 1;
        if assignment.completed {
            completed += 1;
        }
        if let Some(grade) = assignment.grade {
            graded += 1;
            earned += grade;
            possible += f64::from(assignment.max_points);
        }
    }

    let average_percentage = if graded == 0 || possible <= 0.0 {
        None
    } else {
        Some(100.0 * earned / possible)
    };

    CourseStats {
        count,
        graded,
        completed,
        average_percentage,
    }
}

/// Percentage for a single graded assignment. Non-finite grades have none.
pub fn assignment_percentage(assignment: &Assignment) -> Option<f64> {
    match assignment.grade {
        Some(grade) if grade.is_finite() && assignment.max_points > 0 => {
            Some(100.0 * grade / f64::from(assignment.max_points))
        }
        _ => None,
    }
}
