//! Wire shapes of the hosted record service and the adapter that turns them
//! into the canonical models.
//!
//! The service suffixes every custom field with `_c` and is loose about
//! types: numbers may arrive as strings, and the course foreign key is
//! sometimes a bare id and sometimes a `{Id, Name}` reference. All of that
//! is resolved here, once, so the rest of the crate sees one shape.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Assignment, Course, CourseFields, Priority};

pub const COURSE_TABLE: &str = "course_c";
pub const ASSIGNMENT_TABLE: &str = "assignment_c";

pub const COURSE_FIELDS: &[&str] = &[
    "Id",
    "name_c",
    "code_c",
    "instructor_c",
    "credits_c",
    "color_c",
    "semester_c",
    "year_c",
];

pub const ASSIGNMENT_FIELDS: &[&str] = &[
    "Id",
    "title_c",
    "course_id_c",
    "description_c",
    "due_date_c",
    "priority_c",
    "completed_c",
    "grade_c",
    "max_points_c",
    "created_at_c",
];

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
    pub results: Option<Vec<RecordResult<T>>>,
}

#[derive(Debug, Deserialize)]
pub struct RecordResult<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FieldRef {
    pub field: FieldName,
}

#[derive(Debug, Serialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field_name: &'static str,
    pub sorttype: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PagingInfo {
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Serialize)]
pub struct FetchRequest {
    pub fields: Vec<FieldRef>,
    #[serde(rename = "orderBy", skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(rename = "pagingInfo", skip_serializing_if = "Option::is_none")]
    pub paging_info: Option<PagingInfo>,
}

impl FetchRequest {
    pub fn new(fields: &[&'static str]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|name| FieldRef {
                    field: FieldName { name: *name },
                })
                .collect(),
            order_by: Vec::new(),
            paging_info: None,
        }
    }

    pub fn order_by(mut self, field_name: &'static str, sorttype: &'static str) -> Self {
        self.order_by.push(OrderBy {
            field_name,
            sorttype,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.paging_info = Some(PagingInfo { limit, offset: 0 });
        self
    }
}

#[derive(Debug, Serialize)]
pub struct RecordsRequest<T> {
    pub records: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct DeleteRequest {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<i64>,
}

/// A number the service may have sent as a JSON number or as text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn to_f64(&self, field: &str) -> Result<Option<f64>, AppError> {
        let value = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) if s.trim().is_empty() => return Ok(None),
            Numeric::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                AppError::InvalidInput(format!("{} is not numeric: {:?}", field, s))
            })?,
        };
        if !value.is_finite() {
            return Err(AppError::InvalidInput(format!("{} is not a finite number", field)));
        }
        Ok(Some(value))
    }
}

/// Course foreign key as it appears on assignment records.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CourseRef {
    Reference {
        #[serde(rename = "Id")]
        id: i64,
    },
    Plain(Numeric),
}

impl CourseRef {
    fn course_id(&self) -> Result<i64, AppError> {
        match self {
            CourseRef::Reference { id, .. } => Ok(*id),
            CourseRef::Plain(n) => integer(Some(n), "course_id_c"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CourseRecord {
    #[serde(rename = "Id")]
    pub id: i64,
    pub name_c: Option<String>,
    pub code_c: Option<String>,
    pub instructor_c: Option<String>,
    pub credits_c: Option<Numeric>,
    pub color_c: Option<String>,
    pub semester_c: Option<String>,
    pub year_c: Option<Numeric>,
}

#[derive(Debug, Deserialize)]
pub struct AssignmentRecord {
    #[serde(rename = "Id")]
    pub id: i64,
    pub title_c: Option<String>,
    pub course_id_c: Option<CourseRef>,
    pub description_c: Option<String>,
    pub due_date_c: Option<String>,
    pub priority_c: Option<String>,
    pub completed_c: Option<bool>,
    pub grade_c: Option<Numeric>,
    pub max_points_c: Option<Numeric>,
    pub created_at_c: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CourseWrite {
    #[serde(rename = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name_c: String,
    pub code_c: String,
    pub instructor_c: String,
    pub credits_c: u32,
    pub color_c: String,
    pub semester_c: String,
    pub year_c: i32,
}

impl CourseWrite {
    pub fn from_fields(id: Option<i64>, fields: CourseFields) -> Self {
        Self {
            id,
            name_c: fields.name,
            code_c: fields.code,
            instructor_c: fields.instructor,
            credits_c: fields.credits,
            color_c: fields.color,
            semester_c: fields.semester,
            year_c: fields.year,
        }
    }
}

/// Full assignment payload. `grade_c` is always sent so a cleared grade
/// reaches the service as `null`.
#[derive(Debug, Serialize)]
pub struct AssignmentWrite {
    #[serde(rename = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title_c: String,
    pub course_id_c: i64,
    pub description_c: String,
    pub due_date_c: String,
    pub priority_c: &'static str,
    pub completed_c: bool,
    pub grade_c: Option<f64>,
    pub max_points_c: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_c: Option<String>,
}

fn text(value: Option<String>) -> String {
    value.unwrap_or_default()
}

fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput(format!("missing required field {}", field)))
}

fn integer(value: Option<&Numeric>, field: &str) -> Result<i64, AppError> {
    let n = value
        .map(|n| n.to_f64(field))
        .transpose()?
        .flatten()
        .ok_or_else(|| AppError::InvalidInput(format!("missing required field {}", field)))?;
    if n.fract() != 0.0 || n < i64::MIN as f64 || n > i64::MAX as f64 {
        return Err(AppError::InvalidInput(format!("{} is not an integer: {}", field, n)));
    }
    Ok(n as i64)
}

fn positive_u32(value: Option<&Numeric>, field: &str) -> Result<u32, AppError> {
    let n = integer(value, field)?;
    u32::try_from(n)
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| AppError::InvalidInput(format!("{} must be a positive integer: {}", field, n)))
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM[:SS]` (taken as UTC), or a
/// bare date (midnight UTC).
pub fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    Err(AppError::InvalidInput(format!("{} is not a timestamp: {:?}", field, raw)))
}

impl TryFrom<CourseRecord> for Course {
    type Error = AppError;

    fn try_from(record: CourseRecord) -> Result<Self, Self::Error> {
        let year = integer(record.year_c.as_ref(), "year_c")?;
        Ok(Course {
            id: record.id,
            name: required_text(record.name_c, "name_c")?,
            code: required_text(record.code_c, "code_c")?,
            instructor: text(record.instructor_c),
            credits: positive_u32(record.credits_c.as_ref(), "credits_c")?,
            color: text(record.color_c),
            semester: text(record.semester_c),
            year: i32::try_from(year)
                .map_err(|_| AppError::InvalidInput(format!("year_c out of range: {}", year)))?,
        })
    }
}

impl TryFrom<AssignmentRecord> for Assignment {
    type Error = AppError;

    fn try_from(record: AssignmentRecord) -> Result<Self, Self::Error> {
        let course_id = record
            .course_id_c
            .as_ref()
            .ok_or_else(|| AppError::InvalidInput("missing required field course_id_c".to_string()))?
            .course_id()?;
        let due_date = record
            .due_date_c
            .as_deref()
            .ok_or_else(|| AppError::InvalidInput("missing required field due_date_c".to_string()))
            .and_then(|raw| parse_timestamp(raw, "due_date_c"))?;
        let created_at = record
            .created_at_c
            .as_deref()
            .ok_or_else(|| AppError::InvalidInput("missing required field created_at_c".to_string()))
            .and_then(|raw| parse_timestamp(raw, "created_at_c"))?;
        let priority = match record.priority_c.as_deref() {
            None | Some("") => Priority::default(),
            Some(raw) => raw.parse()?,
        };
        let grade = match &record.grade_c {
            Some(n) => n.to_f64("grade_c")?,
            None => None,
        };
        if let Some(g) = grade {
            if g < 0.0 {
                return Err(AppError::InvalidInput(format!("grade_c must not be negative: {}", g)));
            }
        }

        Ok(Assignment {
            id: record.id,
            title: required_text(record.title_c, "title_c")?,
            course_id,
            description: record.description_c.filter(|d| !d.is_empty()),
            due_date,
            priority,
            completed: record.completed_c.unwrap_or(false),
            grade,
            max_points: positive_u32(record.max_points_c.as_ref(), "max_points_c")?,
            created_at,
        })
    }
}

impl AssignmentWrite {
    pub fn from_assignment(id: Option<i64>, assignment: &Assignment, created_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id,
            title_c: assignment.title.clone(),
            course_id_c: assignment.course_id,
            description_c: assignment.description.clone().unwrap_or_default(),
            due_date_c: assignment.due_date.to_rfc3339(),
            priority_c: assignment.priority.as_str(),
            completed_c: assignment.completed,
            grade_c: assignment.grade,
            max_points_c: assignment.max_points,
            created_at_c: created_at.map(|dt| dt.to_rfc3339()),
        }
    }
}
