pub mod planner;

pub use planner::{
    AssignmentList, CourseGrade, CourseOverview, GradedAssignment, GradesReport, PlannerService,
};
