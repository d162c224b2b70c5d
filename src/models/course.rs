use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub instructor: String,
    pub credits: u32,
    pub color: String,
    pub semester: String,
    pub year: i32,
}

/// Create and replace payload for a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseFields {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub instructor: String,
    pub credits: u32,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub semester: String,
    pub year: i32,
}

impl CourseFields {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::InvalidInput("course name is required".to_string()));
        }
        if self.code.trim().is_empty() {
            return Err(AppError::InvalidInput("course code is required".to_string()));
        }
        if self.credits == 0 {
            return Err(AppError::InvalidInput(
                "course credits must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> CourseFields {
        CourseFields {
            name: "Linear Algebra".to_string(),
            code: "MATH 221".to_string(),
            instructor: "Dr. Okafor".to_string(),
            credits: 4,
            color: "#4f46e5".to_string(),
            semester: "Fall".to_string(),
            year: 2026,
        }
    }

    #[test]
    fn test_validate_accepts_complete_fields() {
        assert!(fields().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_credits() {
        let mut req = fields();
        req.credits = 0;
        assert!(matches!(req.validate(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_blank_code() {
        let mut req = fields();
        req.code = "   ".to_string();
        assert!(matches!(req.validate(), Err(AppError::InvalidInput(_))));
    }
}
