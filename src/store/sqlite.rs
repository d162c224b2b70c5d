use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::AppError;
use crate::models::{Assignment, AssignmentUpdate, Course, CourseFields, NewAssignment};
use crate::store::RecordStore;

const COURSE_COLUMNS: &str = "id, name, code, instructor, credits, color, semester, year";
const ASSIGNMENT_COLUMNS: &str =
    "id, title, course_id, description, due_date, priority, completed, grade, max_points, created_at";

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: i64,
    title: String,
    course_id: i64,
    description: Option<String>,
    due_date: DateTime<Utc>,
    priority: String,
    completed: bool,
    grade: Option<f64>,
    max_points: u32,
    created_at: DateTime<Utc>,
}

impl TryFrom<AssignmentRow> for Assignment {
    type Error = AppError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        Ok(Assignment {
            id: row.id,
            title: row.title,
            course_id: row.course_id,
            description: row.description,
            due_date: row.due_date,
            priority: row.priority.parse()?,
            completed: row.completed,
            grade: row.grade,
            max_points: row.max_points,
            created_at: row.created_at,
        })
    }
}

/// Local record store backed by SQLite.
#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .map_err(|e| AppError::Database(e.into()))?;
        Ok(Self::new(db))
    }

    /// Single-connection in-memory database with migrations applied.
    pub async fn in_memory() -> Result<Self, AppError> {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .map_err(|e| AppError::Database(e.into()))?;
        Ok(Self::new(db))
    }

    async fn find_assignment(&self, id: i64) -> Result<Option<Assignment>, AppError> {
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {} FROM assignments WHERE id = ?",
            ASSIGNMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(Assignment::try_from).transpose()
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("select 1").execute(&self.db).await?;
        Ok(())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {} FROM courses ORDER BY id DESC",
            COURSE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(courses)
    }

    async fn get_course(&self, id: i64) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(&format!(
            "SELECT {} FROM courses WHERE id = ?",
            COURSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::course_not_found(id))
    }

    async fn create_course(&self, fields: CourseFields) -> Result<Course, AppError> {
        let id = sqlx::query(
            r#"
            INSERT INTO courses (name, code, instructor, credits, color, semester, year)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.code)
        .bind(&fields.instructor)
        .bind(fields.credits)
        .bind(&fields.color)
        .bind(&fields.semester)
        .bind(fields.year)
        .execute(&self.db)
        .await?
        .last_insert_rowid();
        debug!("inserted course {} ({})", id, fields.code);

        Ok(Course {
            id,
            name: fields.name,
            code: fields.code,
            instructor: fields.instructor,
            credits: fields.credits,
            color: fields.color,
            semester: fields.semester,
            year: fields.year,
        })
    }

    async fn update_course(&self, id: i64, fields: CourseFields) -> Result<Course, AppError> {
        let affected = sqlx::query(
            r#"
            UPDATE courses
            SET name = ?1,
                code = ?2,
                instructor = ?3,
                credits = ?4,
                color = ?5,
                semester = ?6,
                year = ?7
            WHERE id = ?8
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.code)
        .bind(&fields.instructor)
        .bind(fields.credits)
        .bind(&fields.color)
        .bind(&fields.semester)
        .bind(fields.year)
        .bind(id)
        .execute(&self.db)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(AppError::course_not_found(id));
        }
        self.get_course(id).await
    }

    async fn delete_course(&self, id: i64) -> Result<(), AppError> {
        let affected = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(AppError::course_not_found(id));
        }
        Ok(())
    }

    async fn list_assignments(&self) -> Result<Vec<Assignment>, AppError> {
        let rows = sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {} FROM assignments ORDER BY due_date ASC, id ASC",
            ASSIGNMENT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(Assignment::try_from).collect()
    }

    async fn get_assignment(&self, id: i64) -> Result<Assignment, AppError> {
        self.find_assignment(id)
            .await?
            .ok_or_else(|| AppError::assignment_not_found(id))
    }

    async fn create_assignment(&self, req: NewAssignment) -> Result<Assignment, AppError> {
        let created_at = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO assignments
                (title, course_id, description, due_date, priority,
                completed, grade, max_points, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&req.title)
        .bind(req.course_id)
        .bind(&req.description)
        .bind(req.due_date)
        .bind(req.priority.as_str())
        .bind(req.completed)
        .bind(req.grade)
        .bind(req.max_points)
        .bind(created_at)
        .execute(&self.db)
        .await?
        .last_insert_rowid();
        debug!("inserted assignment {} for course {}", id, req.course_id);

        Ok(Assignment {
            id,
            title: req.title,
            course_id: req.course_id,
            description: req.description,
            due_date: req.due_date,
            priority: req.priority,
            completed: req.completed,
            grade: req.grade,
            max_points: req.max_points,
            created_at,
        })
    }

    async fn update_assignment(
        &self,
        id: i64,
        update: AssignmentUpdate,
    ) -> Result<Assignment, AppError> {
        let mut current = self.get_assignment(id).await?;
        update.apply(&mut current);

        sqlx::query(
            r#"
            UPDATE assignments
            SET title = ?1,
                course_id = ?2,
                description = ?3,
                due_date = ?4,
                priority = ?5,
                completed = ?6,
                grade = ?7,
                max_points = ?8
            WHERE id = ?9
            "#,
        )
        .bind(&current.title)
        .bind(current.course_id)
        .bind(&current.description)
        .bind(current.due_date)
        .bind(current.priority.as_str())
        .bind(current.completed)
        .bind(current.grade)
        .bind(current.max_points)
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(current)
    }

    async fn delete_assignment(&self, id: i64) -> Result<(), AppError> {
        let affected = sqlx::query("DELETE FROM assignments WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(AppError::assignment_not_found(id));
        }
        Ok(())
    }
}
