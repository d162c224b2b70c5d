use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(AppError::InvalidInput(format!("unknown priority: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub title: String,
    pub course_id: i64,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub completed: bool,
    pub grade: Option<f64>,
    pub max_points: u32,
    pub created_at: DateTime<Utc>,
}

fn default_max_points() -> u32 {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssignment {
    pub title: String,
    pub course_id: i64,
    #[serde(default)]
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub grade: Option<f64>,
    #[serde(default = "default_max_points")]
    pub max_points: u32,
}

impl NewAssignment {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::InvalidInput("assignment title is required".to_string()));
        }
        validate_max_points(self.max_points)?;
        if let Some(grade) = self.grade {
            validate_grade(grade)?;
        }
        Ok(())
    }
}

/// Partial update. In `description` and `grade`, a missing key leaves the
/// value alone and an explicit `null` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub course_id: Option<i64>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub grade: Option<Option<f64>>,
    #[serde(default)]
    pub max_points: Option<u32>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl AssignmentUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(AppError::InvalidInput("assignment title is required".to_string()));
            }
        }
        if let Some(max_points) = self.max_points {
            validate_max_points(max_points)?;
        }
        if let Some(Some(grade)) = self.grade {
            validate_grade(grade)?;
        }
        Ok(())
    }

    /// Applies the set fields onto `current`.
    pub fn apply(self, current: &mut Assignment) {
        if let Some(title) = self.title {
            current.title = title;
        }
        if let Some(course_id) = self.course_id {
            current.course_id = course_id;
        }
        if let Some(description) = self.description {
            current.description = description.filter(|d| !d.trim().is_empty());
        }
        if let Some(due_date) = self.due_date {
            current.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            current.priority = priority;
        }
        if let Some(completed) = self.completed {
            current.completed = completed;
        }
        if let Some(grade) = self.grade {
            current.grade = grade;
        }
        if let Some(max_points) = self.max_points {
            current.max_points = max_points;
        }
    }
}

fn validate_max_points(max_points: u32) -> Result<(), AppError> {
    if max_points == 0 {
        return Err(AppError::InvalidInput(
            "max points must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_grade(grade: f64) -> Result<(), AppError> {
    if !grade.is_finite() {
        return Err(AppError::InvalidInput(format!("grade is not a number: {}", grade)));
    }
    if grade < 0.0 {
        return Err(AppError::InvalidInput(format!("grade must not be negative: {}", grade)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_new_assignment_defaults() {
        let req: NewAssignment = serde_json::from_str(
            r#"{"title":"Essay","course_id":3,"due_date":"2026-10-20T23:59:00Z"}"#,
        )
        .unwrap();
        assert_eq!(req.priority, Priority::Medium);
        assert_eq!(req.max_points, 100);
        assert!(!req.completed);
        assert!(req.grade.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_new_assignment_rejects_negative_grade() {
        let req: NewAssignment = serde_json::from_str(
            r#"{"title":"Quiz","course_id":1,"due_date":"2026-10-20T10:00:00Z","grade":-1}"#,
        )
        .unwrap();
        assert!(matches!(req.validate(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_update_distinguishes_missing_and_null_grade() {
        let untouched: AssignmentUpdate = serde_json::from_str(r#"{"title":"Lab 2"}"#).unwrap();
        assert_eq!(untouched.grade, None);

        let cleared: AssignmentUpdate = serde_json::from_str(r#"{"grade":null}"#).unwrap();
        assert_eq!(cleared.grade, Some(None));

        let set: AssignmentUpdate = serde_json::from_str(r#"{"grade":42.5}"#).unwrap();
        assert_eq!(set.grade, Some(Some(42.5)));
    }

    #[test]
    fn test_update_can_clear_description() {
        let mut current = Assignment {
            id: 1,
            title: "Reading".to_string(),
            course_id: 2,
            description: Some("Chapters 1-3".to_string()),
            due_date: "2026-10-20T10:00:00Z".parse().unwrap(),
            priority: Priority::Low,
            completed: false,
            grade: None,
            max_points: 10,
            created_at: "2026-10-01T10:00:00Z".parse().unwrap(),
        };

        let untouched: AssignmentUpdate = serde_json::from_str(r#"{"title":"Reading 1"}"#).unwrap();
        assert_eq!(untouched.description, None);
        untouched.apply(&mut current);
        assert_eq!(current.description.as_deref(), Some("Chapters 1-3"));

        let cleared: AssignmentUpdate = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));
        cleared.apply(&mut current);
        assert_eq!(current.description, None);
    }

    #[test]
    fn test_update_rejects_zero_max_points() {
        let req = AssignmentUpdate {
            max_points: Some(0),
            ..Default::default()
        };
        assert!(matches!(req.validate(), Err(AppError::InvalidInput(_))));
    }
}
