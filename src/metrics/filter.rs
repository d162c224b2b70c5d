use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Assignment, Course, Priority};

/// Exclusive status of an assignment at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Pending,
    Completed,
    Overdue,
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentStatus::Pending => write!(f, "pending"),
            AssignmentStatus::Completed => write!(f, "completed"),
            AssignmentStatus::Overdue => write!(f, "overdue"),
        }
    }
}

impl FromStr for AssignmentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(AssignmentStatus::Pending),
            "completed" => Ok(AssignmentStatus::Completed),
            "overdue" => Ok(AssignmentStatus::Overdue),
            other => Err(AppError::InvalidInput(format!("unknown status: {}", other))),
        }
    }
}

/// A due date is past once it is strictly earlier than `now`.
pub fn is_past(due_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    due_date < now
}

pub fn assignment_status(assignment: &Assignment, now: DateTime<Utc>) -> AssignmentStatus {
    if assignment.completed {
        AssignmentStatus::Completed
    } else if is_past(assignment.due_date, now) {
        AssignmentStatus::Overdue
    } else {
        AssignmentStatus::Pending
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub search: Option<String>,
    pub course_id: Option<i64>,
    pub priority: Option<Priority>,
    pub status: Option<AssignmentStatus>,
}

impl FilterCriteria {
    /// Number of filters that actually narrow the result.
    pub fn active_count(&self) -> usize {
        [
            self.search_text().is_some(),
            self.course_id.is_some(),
            self.priority.is_some(),
            self.status.is_some(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    fn search_text(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    fn matches(&self, assignment: &Assignment, needle: Option<&str>, now: DateTime<Utc>) -> bool {
        if let Some(needle) = needle {
            let in_title = assignment.title.to_lowercase().contains(needle);
            let in_description = assignment
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle));
            if !in_title && !in_description {
                return false;
            }
        }
        if let Some(course_id) = self.course_id {
            if assignment.course_id != course_id {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if assignment.priority != priority {
                return false;
            }
        }
        if let Some(status) = self.status {
            if assignment_status(assignment, now) != status {
                return false;
            }
        }
        true
    }
}

/// Returns the assignments matching every set criterion, ordered by due date.
/// Equal due dates keep their input order.
pub fn filter_assignments<'a>(
    assignments: &'a [Assignment],
    criteria: &FilterCriteria,
    now: DateTime<Utc>,
) -> Vec<&'a Assignment> {
    let needle = criteria.search_text();
    let mut matched: Vec<&Assignment> = assignments
        .iter()
        .filter(|a| criteria.matches(a, needle.as_deref(), now))
        .collect();
    matched.sort_by_key(|a| a.due_date);
    matched
}

/// Case-insensitive match against course name, code or instructor.
pub fn search_courses<'a>(courses: &'a [Course], text: Option<&str>) -> Vec<&'a Course> {
    let needle = match text.map(str::trim).filter(|s| !s.is_empty()) {
        Some(t) => t.to_lowercase(),
        None => return courses.iter().collect(),
    };
    courses
        .iter()
        .filter(|c| {
            c.name.to_lowercase().contains(&needle)
                || c.code.to_lowercase().contains(&needle)
                || c.instructor.to_lowercase().contains(&needle)
        })
        .collect()
}
