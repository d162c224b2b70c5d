pub mod dto;
pub mod hosted;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Assignment, AssignmentUpdate, Course, CourseFields, NewAssignment};

pub use hosted::{HostedConfig, HostedStore};
pub use sqlite::SqliteStore;

/// Record service holding courses and assignments.
///
/// Lookups, updates and deletes of an absent id return
/// [`AppError::NotFound`]. Transport and upstream failures are returned as
/// errors and never turned into empty results.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn ping(&self) -> Result<(), AppError>;

    /// All courses, newest id first.
    async fn list_courses(&self) -> Result<Vec<Course>, AppError>;
    async fn get_course(&self, id: i64) -> Result<Course, AppError>;
    async fn create_course(&self, fields: CourseFields) -> Result<Course, AppError>;
    async fn update_course(&self, id: i64, fields: CourseFields) -> Result<Course, AppError>;
    async fn delete_course(&self, id: i64) -> Result<(), AppError>;

    /// All assignments, earliest due date first.
    async fn list_assignments(&self) -> Result<Vec<Assignment>, AppError>;
    async fn get_assignment(&self, id: i64) -> Result<Assignment, AppError>;
    async fn create_assignment(&self, req: NewAssignment) -> Result<Assignment, AppError>;
    async fn update_assignment(
        &self,
        id: i64,
        update: AssignmentUpdate,
    ) -> Result<Assignment, AppError>;
    async fn delete_assignment(&self, id: i64) -> Result<(), AppError>;
}
