use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::patch;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Deserialize;
use tracing::error;

use crate::error::AppError;
use crate::metrics::{AssignmentStatus, DashboardSummary, FilterCriteria};
use crate::models::*;
use crate::services::{AssignmentList, CourseOverview, GradesReport};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CourseQuery {
    #[serde(default)]
    pub search: Option<String>,
}

/// Raw assignment filter parameters. Empty values are treated as absent.
#[derive(Debug, Default, Deserialize)]
pub struct AssignmentQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TryFrom<AssignmentQuery> for FilterCriteria {
    type Error = AppError;

    fn try_from(query: AssignmentQuery) -> Result<Self, Self::Error> {
        let course_id = non_empty(query.course_id)
            .map(|raw| {
                raw.parse::<i64>()
                    .map_err(|_| AppError::InvalidInput(format!("invalid course_id: {}", raw)))
            })
            .transpose()?;
        let priority = non_empty(query.priority)
            .map(|raw| raw.parse::<Priority>())
            .transpose()?;
        let status = non_empty(query.status)
            .map(|raw| raw.parse::<AssignmentStatus>())
            .transpose()?;

        Ok(FilterCriteria {
            search: non_empty(query.search),
            course_id,
            priority,
            status,
        })
    }
}

/// Record ids arrive as path text so a malformed one gets the JSON error body.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::InvalidInput(format!("invalid id: {}", raw)))
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub completed: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/courses/{id}/stats", get(course_stats))
        .route("/assignments", get(list_assignments).post(create_assignment))
        .route(
            "/assignments/{id}",
            get(get_assignment)
                .patch(update_assignment)
                .delete(delete_assignment),
        )
        .route("/assignments/{id}/complete", patch(complete_assignment))
        .route("/grades", get(grades))
        .route("/dashboard", get(dashboard))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> StatusCode {
    match state.planner().health().await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            error!("health check failed: {}", err);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn list_courses(
    State(state): State<AppState>,
    Query(params): Query<CourseQuery>,
) -> Result<Json<Vec<CourseOverview>>, AppError> {
    let courses = state.planner().list_courses(params.search.as_deref()).await?;
    Ok(Json(courses))
}

async fn create_course(
    State(state): State<AppState>,
    Json(req): Json<CourseFields>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = state.planner().create_course(req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Course>, AppError> {
    let id = parse_id(&id)?;
    let course = state.planner().get_course(id).await?;
    Ok(Json(course))
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CourseFields>,
) -> Result<Json<Course>, AppError> {
    let id = parse_id(&id)?;
    let course = state.planner().update_course(id, req).await?;
    Ok(Json(course))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    state.planner().delete_course(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn course_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CourseOverview>, AppError> {
    let id = parse_id(&id)?;
    let overview = state.planner().course_overview(id).await?;
    Ok(Json(overview))
}

async fn list_assignments(
    State(state): State<AppState>,
    Query(params): Query<AssignmentQuery>,
) -> Result<Json<AssignmentList>, AppError> {
    let criteria = FilterCriteria::try_from(params)?;
    let list = state.planner().list_assignments(&criteria).await?;
    Ok(Json(list))
}

async fn create_assignment(
    State(state): State<AppState>,
    Json(req): Json<NewAssignment>,
) -> Result<(StatusCode, Json<Assignment>), AppError> {
    let assignment = state.planner().create_assignment(req).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

async fn get_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Assignment>, AppError> {
    let id = parse_id(&id)?;
    let assignment = state.planner().get_assignment(id).await?;
    Ok(Json(assignment))
}

async fn update_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AssignmentUpdate>,
) -> Result<Json<Assignment>, AppError> {
    let id = parse_id(&id)?;
    let assignment = state.planner().update_assignment(id, req).await?;
    Ok(Json(assignment))
}

async fn complete_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<Assignment>, AppError> {
    let id = parse_id(&id)?;
    let assignment = state.planner().set_completed(id, req.completed).await?;
    Ok(Json(assignment))
}

async fn delete_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    state.planner().delete_assignment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn grades(State(state): State<AppState>) -> Result<Json<GradesReport>, AppError> {
    let report = state.planner().grades_report().await?;
    Ok(Json(report))
}

async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardSummary>, AppError> {
    let summary = state.planner().dashboard().await?;
    Ok(Json(summary))
}
