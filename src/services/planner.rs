use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::AppError;
use crate::metrics::{
    self, CourseStats, DashboardSummary, FilterCriteria, GradeDistribution, GradeStanding,
    Snapshot,
};
use crate::models::{Assignment, AssignmentUpdate, Course, CourseFields, NewAssignment};
use crate::store::RecordStore;

#[derive(Debug, Clone, Serialize)]
pub struct CourseOverview {
    #[serde(flatten)]
    pub course: Course,
    pub stats: CourseStats,
    pub letter_grade: Option<&'static str>,
    pub standing: Option<GradeStanding>,
}

impl CourseOverview {
    fn new(course: Course, snapshot: &Snapshot) -> Self {
        let stats = metrics::course_stats(snapshot, course.id);
        Self {
            course,
            stats,
            letter_grade: stats.average_percentage.map(metrics::letter_grade),
            standing: stats.average_percentage.map(GradeStanding::for_percentage),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentList {
    pub total: usize,
    pub active_filters: usize,
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseGrade {
    pub course_id: i64,
    pub name: String,
    pub code: String,
    pub credits: u32,
    pub total: usize,
    pub graded: usize,
    pub percentage: Option<f64>,
    pub letter_grade: Option<&'static str>,
    pub gpa_point: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradedAssignment {
    pub assignment_id: i64,
    pub course_id: i64,
    pub course_code: String,
    pub title: String,
    pub grade: f64,
    pub max_points: u32,
    pub percentage: f64,
    pub letter_grade: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradesReport {
    pub overall_gpa: Option<f64>,
    pub graded_courses: usize,
    pub courses: Vec<CourseGrade>,
    pub distribution: GradeDistribution,
    /// Newest graded records first.
    pub recent_grades: Vec<GradedAssignment>,
}

/// Coordinates the record store and the metrics engine. The store and the
/// clock are handed in by the caller.
pub struct PlannerService {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl PlannerService {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Loads both collections and validates them together.
    pub async fn snapshot(&self) -> Result<Snapshot, AppError> {
        let (courses, assignments) =
            tokio::try_join!(self.store.list_courses(), self.store.list_assignments())?;
        debug!(
            "loaded snapshot: {} courses, {} assignments",
            courses.len(),
            assignments.len()
        );
        Snapshot::new(courses, assignments).inspect_err(|e| {
            warn!("rejected record snapshot: {}", e);
        })
    }

    pub async fn list_courses(&self, search: Option<&str>) -> Result<Vec<CourseOverview>, AppError> {
        let snapshot = self.snapshot().await?;
        Ok(metrics::search_courses(snapshot.courses(), search)
            .into_iter()
            .map(|course| CourseOverview::new(course.clone(), &snapshot))
            .collect())
    }

    pub async fn get_course(&self, id: i64) -> Result<Course, AppError> {
        self.store.get_course(id).await
    }

    pub async fn course_overview(&self, id: i64) -> Result<CourseOverview, AppError> {
        let snapshot = self.snapshot().await?;
        let course = snapshot
            .course(id)
            .cloned()
            .ok_or_else(|| AppError::course_not_found(id))?;
        Ok(CourseOverview::new(course, &snapshot))
    }

    pub async fn create_course(&self, fields: CourseFields) -> Result<Course, AppError> {
        fields.validate()?;
        let course = self.store.create_course(fields).await?;
        info!("created course {} ({})", course.id, course.code);
        Ok(course)
    }

    pub async fn update_course(&self, id: i64, fields: CourseFields) -> Result<Course, AppError> {
        fields.validate()?;
        self.store.update_course(id, fields).await
    }

    /// Deletes a course unless assignments still reference it.
    pub async fn delete_course(&self, id: i64) -> Result<(), AppError> {
        let course = self.store.get_course(id).await?;
        let referencing = self
            .store
            .list_assignments()
            .await?
            .iter()
            .filter(|a| a.course_id == id)
            .count();
        if referencing > 0 {
            warn!(
                "refusing to delete course {} with {} assignments",
                course.code, referencing
            );
            return Err(AppError::Conflict(format!(
                "course {} still has {} assignment(s)",
                course.code, referencing
            )));
        }
        self.store.delete_course(id).await?;
        info!("deleted course {} ({})", id, course.code);
        Ok(())
    }

    pub async fn list_assignments(&self, criteria: &FilterCriteria) -> Result<AssignmentList, AppError> {
        let snapshot = self.snapshot().await?;
        let now = self.clock.now();
        let assignments = metrics::filter_assignments(snapshot.assignments(), criteria, now)
            .into_iter()
            .cloned()
            .collect();
        Ok(AssignmentList {
            total: snapshot.assignments().len(),
            active_filters: criteria.active_count(),
            assignments,
        })
    }

    pub async fn get_assignment(&self, id: i64) -> Result<Assignment, AppError> {
        self.store.get_assignment(id).await
    }

    pub async fn create_assignment(&self, req: NewAssignment) -> Result<Assignment, AppError> {
        req.validate()?;
        self.store.get_course(req.course_id).await?;
        let assignment = self.store.create_assignment(req).await?;
        info!(
            "created assignment {} for course {}",
            assignment.id, assignment.course_id
        );
        Ok(assignment)
    }

    pub async fn update_assignment(
        &self,
        id: i64,
        update: AssignmentUpdate,
    ) -> Result<Assignment, AppError> {
        update.validate()?;
        if let Some(course_id) = update.course_id {
            self.store.get_course(course_id).await?;
        }
        self.store.update_assignment(id, update).await
    }

    pub async fn set_completed(&self, id: i64, completed: bool) -> Result<Assignment, AppError> {
        let update = AssignmentUpdate {
            completed: Some(completed),
            ..Default::default()
        };
        self.store.update_assignment(id, update).await
    }

    pub async fn delete_assignment(&self, id: i64) -> Result<(), AppError> {
        self.store.delete_assignment(id).await?;
        info!("deleted assignment {}", id);
        Ok(())
    }

    pub async fn grades_report(&self) -> Result<GradesReport, AppError> {
        let snapshot = self.snapshot().await?;

        let courses: Vec<CourseGrade> = snapshot
            .courses()
            .iter()
            .map(|course| {
                let stats = metrics::course_stats(&snapshot, course.id);
                CourseGrade {
                    course_id: course.id,
                    name: course.name.clone(),
                    code: course.code.clone(),
                    credits: course.credits,
                    total: stats.count,
                    graded: stats.graded,
                    percentage: stats.average_percentage,
                    letter_grade: stats.average_percentage.map(metrics::letter_grade),
                    gpa_point: stats.average_percentage.map(metrics::gpa_point),
                }
            })
            .collect();

        let recent_grades = metrics::recent_grades(&snapshot)
            .into_iter()
            .filter_map(|a| {
                let grade = a.grade?;
                let percentage = metrics::assignment_percentage(a)?;
                Some(GradedAssignment {
                    assignment_id: a.id,
                    course_id: a.course_id,
                    course_code: snapshot
                        .course(a.course_id)
                        .map(|c| c.code.clone())
                        .unwrap_or_default(),
                    title: a.title.clone(),
                    grade,
                    max_points: a.max_points,
                    percentage,
                    letter_grade: metrics::letter_grade(percentage),
                })
            })
            .collect();

        Ok(GradesReport {
            overall_gpa: metrics::overall_gpa(&snapshot),
            graded_courses: courses.iter().filter(|c| c.percentage.is_some()).count(),
            courses,
            distribution: metrics::grade_distribution(&snapshot),
            recent_grades,
        })
    }

    pub async fn dashboard(&self) -> Result<DashboardSummary, AppError> {
        let snapshot = self.snapshot().await?;
        Ok(metrics::dashboard(&snapshot, self.clock.now()))
    }

    pub async fn health(&self) -> Result<(), AppError> {
        self.store.ping().await
    }
}
