//! Pure academic metrics over in-memory course and assignment collections.
//!
//! Nothing here touches the record store or the clock. Callers pass a
//! snapshot of both collections plus `now` where status matters.

pub mod dashboard;
pub mod filter;
pub mod gpa;
pub mod stats;

use std::collections::HashSet;

pub use dashboard::{AssignmentCounts, CourseProgress, DashboardSummary, dashboard};
pub use filter::{
    AssignmentStatus, FilterCriteria, assignment_status, filter_assignments, search_courses,
};
pub use gpa::{
    GradeDistribution, GradeStanding, RECENT_GRADES_LIMIT, gpa_point, grade_distribution,
    letter_grade, overall_gpa, recent_grades,
};
pub use stats::{CourseStats, assignment_percentage, course_stats};

use crate::error::AppError;
use crate::models::{Assignment, Course};

/// Course and assignment collections that have passed validation.
///
/// Building one rejects records that would corrupt the arithmetic:
/// non-positive credits or points, negative or non-finite grades, and
/// assignments pointing at a course the snapshot does not contain.
#[derive(Debug, Clone)]
pub struct Snapshot {
    courses: Vec<Course>,
    assignments: Vec<Assignment>,
}

impl Snapshot {
    pub fn new(courses: Vec<Course>, assignments: Vec<Assignment>) -> Result<Self, AppError> {
        let mut course_ids = HashSet::with_capacity(courses.len());
        for course in &courses {
            if course.credits == 0 {
                return Err(AppError::InvalidInput(format!(
                    "course {} has no credits",
                    course.id
                )));
            }
            course_ids.insert(course.id);
        }

        for assignment in &assignments {
            if assignment.max_points == 0 {
                return Err(AppError::InvalidInput(format!(
                    "assignment {} has no max points",
                    assignment.id
                )));
            }
            if let Some(grade) = assignment.grade {
                if !grade.is_finite() || grade < 0.0 {
                    return Err(AppError::InvalidInput(format!(
                        "assignment {} has an invalid grade: {}",
                        assignment.id, grade
                    )));
                }
            }
            if !course_ids.contains(&assignment.course_id) {
                return Err(AppError::course_not_found(assignment.course_id));
            }
        }

        Ok(Self {
            courses,
            assignments,
        })
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn course(&self, id: i64) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    pub fn into_parts(self) -> (Vec<Course>, Vec<Assignment>) {
        (self.courses, self.assignments)
    }
}
