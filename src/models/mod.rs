pub mod assignment;
pub mod course;

use std::fmt;

use serde::Serialize;

pub use assignment::{Assignment, AssignmentUpdate, NewAssignment, Priority};
pub use course::{Course, CourseFields};

/// The two record collections held by the record service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Course,
    Assignment,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Course => write!(f, "course"),
            RecordKind::Assignment => write!(f, "assignment"),
        }
    }
}
