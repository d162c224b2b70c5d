use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;

use planner::api::router;
use planner::clock::FixedClock;
use planner::state::AppState;
use planner::store::SqliteStore;

async fn setup_app() -> Router {
    let store = SqliteStore::in_memory()
        .await
        .expect("Failed to create in-memory store");
    // Wednesday
    let now = Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap();
    router(AppState::new(Arc::new(store), Arc::new(FixedClock(now))))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_course(app: &Router, code: &str, credits: u32) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/courses",
        Some(json!({
            "name": format!("{} Lecture", code),
            "code": code,
            "instructor": "Dr. Rivera",
            "credits": credits,
            "color": "#aa3355",
            "semester": "Fall",
            "year": 2026
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

async fn create_assignment(app: &Router, course_id: i64, title: &str, extra: Value) -> i64 {
    let mut payload = json!({
        "title": title,
        "course_id": course_id,
        "due_date": "2026-10-16T17:00:00Z"
    });
    if let (Some(target), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }
    let (status, body) = send(app, "POST", "/assignments", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", body);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = setup_app().await;
    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_course_crud_and_delete_guard() {
    let app = setup_app().await;
    let course_id = create_course(&app, "CHEM101", 4).await;
    let assignment_id = create_assignment(&app, course_id, "Lab 1", json!({})).await;

    let (status, body) = send(&app, "DELETE", &format!("/courses/{}", course_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("CHEM101"));

    let (status, _) = send(&app, "DELETE", &format!("/assignments/{}", assignment_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "DELETE", &format!("/courses/{}", course_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", &format!("/courses/{}", course_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("course {} not found", course_id));
}

#[tokio::test]
async fn test_update_course_replaces_fields() {
    let app = setup_app().await;
    let course_id = create_course(&app, "HIST210", 3).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/courses/{}", course_id),
        Some(json!({"name": "Modern History", "code": "HIST210", "credits": 4, "year": 2027})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Modern History");
    assert_eq!(body["credits"], 4);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/courses/{}", course_id),
        Some(json!({"name": "Modern History", "code": "HIST210", "credits": 0, "year": 2027})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_course_search() {
    let app = setup_app().await;
    create_course(&app, "MATH201", 3).await;
    create_course(&app, "PHYS150", 4).await;

    let (status, body) = send(&app, "GET", "/courses?search=phys", None).await;
    assert_eq!(status, StatusCode::OK);
    let courses = body.as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["code"], "PHYS150");
    assert!(courses[0]["stats"]["average_percentage"].is_null());
}

#[tokio::test]
async fn test_assignment_for_missing_course_is_not_found() {
    let app = setup_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/assignments",
        Some(json!({"title": "Orphan", "course_id": 42, "due_date": "2026-10-20T10:00:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "course 42 not found");
}

#[tokio::test]
async fn test_assignment_filters() {
    let app = setup_app().await;
    let course_id = create_course(&app, "BIO110", 3).await;
    create_assignment(&app, course_id, "Cell essay", json!({"priority": "high"})).await;
    create_assignment(
        &app,
        course_id,
        "Past quiz",
        json!({"due_date": "2026-10-10T09:00:00Z"}),
    )
    .await;

    let (status, body) = send(&app, "GET", "/assignments?status=overdue&priority=", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["active_filters"], 1);
    assert_eq!(body["assignments"][0]["title"], "Past quiz");

    let (status, body) = send(&app, "GET", "/assignments?search=ESSAY", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignments"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "GET", "/assignments?status=late", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/assignments?course_id=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_complete_and_grade_updates() {
    let app = setup_app().await;
    let course_id = create_course(&app, "ENG102", 3).await;
    let id = create_assignment(&app, course_id, "Draft", json!({"max_points": 50})).await;

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/assignments/{}/complete", id),
        Some(json!({"completed": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed"], true);

    let (_, body) = send(
        &app,
        "PATCH",
        &format!("/assignments/{}", id),
        Some(json!({"grade": 45.0})),
    )
    .await;
    assert_eq!(body["grade"], 45.0);
    assert_eq!(body["completed"], true);

    let (_, body) = send(
        &app,
        "PATCH",
        &format!("/assignments/{}", id),
        Some(json!({"grade": null})),
    )
    .await;
    assert!(body["grade"].is_null());

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/assignments/{}", id + 100),
        Some(json!({"title": "Missing"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_grades_report() {
    let app = setup_app().await;
    let graded_course = create_course(&app, "CS240", 4).await;
    let empty_course = create_course(&app, "ART100", 2).await;
    create_assignment(
        &app,
        graded_course,
        "Project",
        json!({"grade": 90.0, "max_points": 100, "completed": true}),
    )
    .await;
    create_assignment(&app, empty_course, "Sketch", json!({})).await;

    let (status, body) = send(&app, "GET", "/grades", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall_gpa"], 3.3);
    assert_eq!(body["graded_courses"], 1);
    assert_eq!(body["distribution"]["graded"], 1);
    assert_eq!(body["recent_grades"].as_array().unwrap().len(), 1);
    assert_eq!(body["recent_grades"][0]["letter_grade"], "A-");
    assert_eq!(body["recent_grades"][0]["course_code"], "CS240");

    let (status, body) = send(&app, "GET", &format!("/courses/{}/stats", graded_course), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["average_percentage"], 90.0);
    assert_eq!(body["letter_grade"], "A-");
    assert_eq!(body["standing"], "excellent");
}

#[tokio::test]
async fn test_dashboard_summary() {
    let app = setup_app().await;
    let course_id = create_course(&app, "ECON300", 3).await;
    create_assignment(&app, course_id, "Problem set", json!({})).await;
    create_assignment(
        &app,
        course_id,
        "Late memo",
        json!({"due_date": "2026-10-12T09:00:00Z"}),
    )
    .await;
    create_assignment(
        &app,
        course_id,
        "Term paper",
        json!({"due_date": "2026-11-30T09:00:00Z"}),
    )
    .await;

    let (status, body) = send(&app, "GET", "/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counts"]["total"], 3);
    assert_eq!(body["counts"]["overdue"], 1);
    assert_eq!(body["counts"]["upcoming"], 2);
    assert_eq!(body["due_soon"].as_array().unwrap().len(), 1);
    assert_eq!(body["due_soon"][0]["title"], "Problem set");
    assert_eq!(body["overdue"][0]["title"], "Late memo");
    assert_eq!(body["course_progress"][0]["total"], 3);
}

#[tokio::test]
async fn test_recent_grades_are_newest_first_and_capped() {
    let app = setup_app().await;
    let course_id = create_course(&app, "STAT200", 3).await;
    for i in 1..=10 {
        create_assignment(
            &app,
            course_id,
            &format!("Problem set {}", i),
            json!({"grade": 70.0 + i as f64, "completed": true}),
        )
        .await;
    }

    let (status, body) = send(&app, "GET", "/grades", None).await;
    assert_eq!(status, StatusCode::OK);
    let recent = body["recent_grades"].as_array().unwrap();
    assert_eq!(recent.len(), 8);
    assert_eq!(body["distribution"]["graded"], 10);
    let created: Vec<i64> = recent
        .iter()
        .map(|g| g["assignment_id"].as_i64().unwrap())
        .collect();
    assert!(created.windows(2).all(|w| w[0] > w[1]));
}

#[tokio::test]
async fn test_malformed_id_gets_json_error() {
    let app = setup_app().await;
    let (status, body) = send(&app, "GET", "/courses/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid id: abc");

    let (status, body) = send(&app, "DELETE", "/assignments/1x", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_description_can_be_cleared() {
    let app = setup_app().await;
    let course_id = create_course(&app, "PHIL110", 3).await;
    let id = create_assignment(
        &app,
        course_id,
        "Response paper",
        json!({"description": "Kant, chapter 2"}),
    )
    .await;

    let (_, body) = send(
        &app,
        "PATCH",
        &format!("/assignments/{}", id),
        Some(json!({"title": "Response paper 1"})),
    )
    .await;
    assert_eq!(body["description"], "Kant, chapter 2");

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/assignments/{}", id),
        Some(json!({"description": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["description"].is_null());
}
